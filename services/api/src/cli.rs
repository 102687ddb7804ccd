use crate::commands::{run_analyze_evidence, run_report, AnalyzeEvidenceArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use incident_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Incident Intake Assistant",
    about = "Serve the co-parenting incident wizard or generate reports from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Generate a structured report from an incident JSON file
    Report(ReportArgs),
    /// Analyze a single evidence file against an incident narrative
    AnalyzeEvidence(AnalyzeEvidenceArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args).await,
        Command::AnalyzeEvidence(args) => run_analyze_evidence(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use incident_ai::workflows::incident::EvidenceCategory;
    use std::path::PathBuf;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["incident-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "incident-ai-api",
            "report",
            "--incident",
            "incident.json",
            "--today",
            "2024-01-10",
            "--markdown",
            "--draft",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Report(args)) => {
                assert_eq!(args.incident, PathBuf::from("incident.json"));
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 1, 10));
                assert!(args.markdown);
                assert!(args.draft);
            }
            other => panic!("expected report command, got {other:?}"),
        }
    }

    #[test]
    fn analyze_evidence_parses_category() {
        let cli = Cli::try_parse_from([
            "incident-ai-api",
            "analyze-evidence",
            "texts.png",
            "--narrative",
            "Messages sent after midnight.",
            "--category",
            "screenshot",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::AnalyzeEvidence(args)) => {
                assert_eq!(args.path, PathBuf::from("texts.png"));
                assert_eq!(args.category, Some(EvidenceCategory::Screenshot));
                assert!(args.mime.is_none());
            }
            other => panic!("expected analyze-evidence command, got {other:?}"),
        }
    }

    #[test]
    fn malformed_today_is_rejected() {
        let result = Cli::try_parse_from([
            "incident-ai-api",
            "report",
            "--incident",
            "incident.json",
            "--today",
            "10/01/2024",
        ]);
        assert!(result.is_err());
    }
}
