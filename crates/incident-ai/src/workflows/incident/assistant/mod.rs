//! Model-backed generation: structured reports, lawyer correspondence drafts, and per-file
//! evidence summaries. Every operation funnels through one chat-completion call.

mod error;
mod evidence;
mod prompts;
mod transport;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use error::{ApiError, ApiFailure};
pub use evidence::EvidenceStrategy;
pub use prompts::strip_disclaimer;
pub use transport::{
    ChatCompletions, ChatMessage, ChatRequest, ChatRole, ContentPart, ImageUrl, MessageContent,
    OpenAiChatClient, ResponseFormat,
};

use super::domain::{EvidenceFile, IncidentData, ReportData};
use evidence::{DOCUMENT_FALLBACK, IMAGE_FALLBACK};

/// Facade over a [`ChatCompletions`] transport.
pub struct IncidentAssistant<C> {
    transport: Arc<C>,
}

impl<C> Clone for IncidentAssistant<C> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<C> IncidentAssistant<C>
where
    C: ChatCompletions + 'static,
{
    pub fn new(transport: Arc<C>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &C {
        &self.transport
    }

    async fn call_model(
        &self,
        messages: Vec<ChatMessage>,
        response_format: Option<ResponseFormat>,
        max_tokens: Option<u32>,
    ) -> Result<String, ApiError> {
        let request = ChatRequest {
            messages,
            response_format,
            max_tokens,
        };
        self.transport.complete(&request).await
    }

    /// Produce a structured report for a fully validated incident. The case number is always
    /// taken from the incident, never from the model.
    pub async fn generate_report(&self, incident: &IncidentData) -> Result<ReportData, ApiError> {
        info!(
            jurisdiction = %incident.jurisdiction,
            evidence = incident.evidence.len(),
            "generating incident report"
        );

        let content = self
            .call_model(
                vec![
                    ChatMessage::system(prompts::REPORT_SYSTEM_PROMPT),
                    ChatMessage::user(prompts::report_user_prompt(incident)),
                ],
                Some(ResponseFormat::JsonObject),
                None,
            )
            .await
            .map_err(|err| err.context("Report generation failed"))?;

        let mut report: ReportData = serde_json::from_str(content.trim()).map_err(|err| {
            warn!(error = %err, "model returned a report that does not match the schema");
            ApiError::with_cause(
                "Report generation failed: the AI response could not be parsed",
                ApiFailure::MalformedBody(err),
            )
        })?;

        if !report.starts_with_disclaimer() {
            warn!("legal insights do not open with the disclaimer");
        }
        report.case_number = incident.case_number().map(str::to_string);

        info!(
            category = %report.category,
            severity = %report.severity,
            "incident report generated"
        );
        Ok(report)
    }

    /// Draft an email to the user's lawyer from an existing report.
    pub async fn generate_draft(
        &self,
        professional_summary: &str,
        legal_insights: &str,
        incident_date: &str,
        case_number: Option<&str>,
    ) -> Result<String, ApiError> {
        debug!(incident_date, has_case_number = case_number.is_some(), "drafting communication");

        let content = self
            .call_model(
                vec![
                    ChatMessage::system(prompts::DRAFT_SYSTEM_PROMPT),
                    ChatMessage::user(prompts::draft_user_prompt(
                        professional_summary,
                        legal_insights,
                        incident_date,
                        case_number,
                    )),
                ],
                None,
                None,
            )
            .await
            .map_err(|err| err.context("Draft generation failed"))?;

        let draft = content.trim();
        if draft.is_empty() {
            return Err(ApiError::with_cause(
                "Draft generation failed: the AI returned an empty response",
                ApiFailure::EmptyCompletion,
            ));
        }
        Ok(draft.to_string())
    }

    /// One-sentence relevance summary for an attached file. Audio, video, and unknown types
    /// resolve to fixed text without a network call.
    pub async fn analyze_evidence(
        &self,
        file: &EvidenceFile,
        narrative: &str,
    ) -> Result<String, ApiError> {
        let strategy = EvidenceStrategy::for_mime(&file.mime_type);
        debug!(file = %file.name, mime = %file.mime_type, ?strategy, "analyzing evidence");

        match strategy {
            EvidenceStrategy::Image => {
                let payload = file
                    .base64
                    .as_deref()
                    .filter(|data| !data.is_empty())
                    .ok_or_else(|| {
                        ApiError::with_cause(
                            format!("Evidence analysis failed for {}", file.name),
                            ApiFailure::MissingPayload,
                        )
                    })?;

                let message = ChatMessage::user_parts(vec![
                    ContentPart::Text {
                        text: prompts::image_evidence_prompt(file, narrative),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: format!("data:{};base64,{payload}", file.mime_type),
                        },
                    },
                ]);
                let content = self
                    .call_model(vec![message], None, Some(prompts::EVIDENCE_MAX_TOKENS))
                    .await
                    .map_err(|err| err.context("Evidence analysis failed"))?;
                Ok(non_empty_or(content, IMAGE_FALLBACK))
            }
            EvidenceStrategy::Document => {
                let content = self
                    .call_model(
                        vec![ChatMessage::user(prompts::document_evidence_prompt(
                            file, narrative,
                        ))],
                        None,
                        Some(prompts::EVIDENCE_MAX_TOKENS),
                    )
                    .await
                    .map_err(|err| err.context("Evidence analysis failed"))?;
                Ok(non_empty_or(content, DOCUMENT_FALLBACK))
            }
            other => Ok(other.placeholder().unwrap_or_default()),
        }
    }
}

fn non_empty_or(content: String, fallback: &str) -> String {
    match content.trim() {
        "" => fallback.to_string(),
        text => text.to_string(),
    }
}
