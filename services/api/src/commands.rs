use crate::infra::{load_evidence_file, parse_category, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use incident_ai::config::AppConfig;
use incident_ai::error::AppError;
use incident_ai::telemetry;
use incident_ai::workflows::incident::validation::first_invalid_before;
use incident_ai::workflows::incident::{
    EvidenceCategory, IncidentAssistant, IncidentData, OpenAiChatClient, ReportData, WizardStep,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Path to an incident JSON document in the wizard's camelCase format
    #[arg(long)]
    pub(crate) incident: PathBuf,
    /// Override today's date (YYYY-MM-DD) used for the future-date check
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the report as markdown instead of JSON
    #[arg(long)]
    pub(crate) markdown: bool,
    /// Also draft a message to legal counsel from the generated report
    #[arg(long)]
    pub(crate) draft: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeEvidenceArgs {
    /// File to analyze
    pub(crate) path: PathBuf,
    /// Incident narrative the evidence relates to
    #[arg(long, default_value = "")]
    pub(crate) narrative: String,
    /// Free-text description of the file
    #[arg(long)]
    pub(crate) description: Option<String>,
    /// Evidence category label (Screenshot, Document, Audio, Video, Other)
    #[arg(long, value_parser = parse_category)]
    pub(crate) category: Option<EvidenceCategory>,
    /// Override the MIME type guessed from the file extension
    #[arg(long)]
    pub(crate) mime: Option<String>,
}

fn assistant() -> Result<IncidentAssistant<OpenAiChatClient>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    config.model.warn_if_unconfigured();
    let client = OpenAiChatClient::new(config.model)?;
    Ok(IncidentAssistant::new(Arc::new(client)))
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.incident)?;
    let incident: IncidentData = serde_json::from_str(&raw)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    if let Some((step, errors)) = first_invalid_before(&incident, WizardStep::Review, today) {
        return Err(AppError::Incomplete { step, errors });
    }

    let assistant = assistant()?;
    let report = assistant.generate_report(&incident).await?;
    info!(title = %report.title, severity = ?report.severity, "report generated");
    print_report(&report, args.markdown)?;

    if args.draft {
        let draft = assistant
            .generate_draft(
                &report.professional_summary,
                &report.legal_insights,
                &incident.date,
                report.case_number.as_deref(),
            )
            .await?;
        println!("\n{draft}");
    }
    Ok(())
}

fn print_report(report: &ReportData, markdown: bool) -> Result<(), AppError> {
    if markdown {
        println!("{}", report.to_markdown());
    } else {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

pub(crate) async fn run_analyze_evidence(args: AnalyzeEvidenceArgs) -> Result<(), AppError> {
    let file = load_evidence_file(
        &args.path,
        args.mime.as_deref(),
        args.category,
        args.description,
    )?;
    let assistant = assistant()?;
    let analysis = assistant.analyze_evidence(&file, &args.narrative).await?;
    info!(file = %file.name, mime = %file.mime_type, "evidence analyzed");
    println!("{analysis}");
    Ok(())
}
