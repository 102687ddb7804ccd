use serde_json::{json, Value};

use crate::workflows::incident::domain::{
    EvidenceFile, IncidentData, ReportCategory, Severity, LEGAL_DISCLAIMER,
};

pub(crate) const REPORT_SYSTEM_PROMPT: &str = "You are a meticulous, senior family law paralegal and certified mediator AI. Your task is to transmute a user's potentially emotional narrative into a sterile, factual, and comprehensive report suitable for a court filing. Respond with ONLY a valid JSON object that strictly adheres to the provided JSON Schema. Do not include any explanatory text before or after the JSON.";

pub(crate) const DRAFT_SYSTEM_PROMPT: &str = "You are an AI assistant helping a user draft a clear, concise, and professional email to their lawyer. The goal is to provide an update on a recent co-parenting incident. The response should be only the draft email text itself, including a subject line, salutation, body, and closing. Do not use overly emotional language.";

/// Generation cap for the one-sentence evidence summaries.
pub(crate) const EVIDENCE_MAX_TOKENS: u32 = 100;

const NOT_SPECIFIED: &str = "None specified";

/// JSON schema the model must follow. Nine required fields.
pub(crate) fn report_schema() -> Value {
    let categories: Vec<&str> = ReportCategory::ordered()
        .into_iter()
        .map(ReportCategory::label)
        .collect();
    let severities: Vec<&str> = Severity::ordered().into_iter().map(Severity::label).collect();

    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": "A brief, factual title for the incident report. Example: 'Dispute Regarding Parenting Time Exchange on YYYY-MM-DD'."
            },
            "professionalSummary": {
                "type": "string",
                "description": "A comprehensive, objective summary formatted as exactly three paragraphs separated by single newline characters ('\\n'). Paragraph 1: Context. Paragraph 2: Chronology. Paragraph 3: Outcome."
            },
            "category": {
                "type": "string",
                "enum": categories,
                "description": "The single best category for the incident from the provided list."
            },
            "severity": {
                "type": "string",
                "enum": severities,
                "description": "The assigned severity level."
            },
            "severityJustification": {
                "type": "string",
                "description": "Justification for the assigned severity level in one or two sentences, linking a fact from the narrative to the severity criteria."
            },
            "legalInsights": {
                "type": "string",
                "description": format!("A 2-3 paragraph analysis. Must begin with the disclaimer '{LEGAL_DISCLAIMER}'. Mentioned legal statutes must be formatted as markdown hyperlinks to official government sources for the specified jurisdiction.")
            },
            "sources": {
                "type": "array",
                "items": { "type": "string", "format": "uri" },
                "description": "An array of 2-3 full URL strings to official government or reputable legal aid organization pages relevant to family law in the specified jurisdiction."
            },
            "observedImpact": {
                "type": "string",
                "description": "A 1-2 paragraph neutral, child-centric analysis of the potential or observed impact on the children, based strictly on the narrative."
            },
            "aiNotes": {
                "type": "string",
                "description": "A markdown string with exactly four sections using these headings: '**Evidence Analysis:**', '**Evidence Gaps & Recommendations:**', '**Communication Strategy:**', and '**Documentation Best Practices:**'. Provide concise, bulleted, actionable points under each."
            }
        },
        "required": [
            "title",
            "professionalSummary",
            "category",
            "severity",
            "severityJustification",
            "legalInsights",
            "sources",
            "observedImpact",
            "aiNotes"
        ]
    })
}

fn join_or_default(values: &[String]) -> String {
    if values.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        values.join(", ")
    }
}

fn describe_evidence(evidence: &[EvidenceFile]) -> String {
    if evidence.is_empty() {
        return NOT_SPECIFIED.to_string();
    }

    evidence
        .iter()
        .map(|file| {
            let description = match file.description.trim() {
                "" => "N/A",
                text => text,
            };
            format!(
                "- File: {} (Category: {})\n  Description: {}",
                file.name,
                file.category_label(),
                description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain-text rendering of the incident fields shared by the report prompt.
pub(crate) fn incident_context(incident: &IncidentData) -> String {
    format!(
        "INCIDENT DETAILS:\n\
         - Date: {date}\n\
         - Time: {time}\n\
         - Jurisdiction: {jurisdiction}\n\
         - Case Number: {case_number}\n\
         - Parties Involved: {parties}\n\
         - Children Present/Affected: {children}\n\
         - Evidence Attached:\n{evidence}\n\
         - Original Account: {narrative}\n",
        date = incident.date,
        time = incident.time,
        jurisdiction = incident.jurisdiction,
        case_number = incident.case_number().unwrap_or("N/A"),
        parties = incident.parties.join(", "),
        children = join_or_default(&incident.children),
        evidence = describe_evidence(&incident.evidence),
        narrative = incident.narrative,
    )
}

pub(crate) fn report_user_prompt(incident: &IncidentData) -> String {
    let schema = serde_json::to_string_pretty(&report_schema()).unwrap_or_default();
    format!(
        "Analyze the following incident details and use your knowledge to find relevant legal information for the specified jurisdiction: {jurisdiction}.\n\n\
         JSON Schema to follow:\n{schema}\n\n\
         Incident Details to analyze:\n{context}",
        jurisdiction = incident.jurisdiction,
        context = incident_context(incident),
    )
}

/// Remove the fixed disclaimer so it is not repeated in correspondence.
pub fn strip_disclaimer(legal_insights: &str) -> String {
    legal_insights.replacen(LEGAL_DISCLAIMER, "", 1).trim().to_string()
}

pub(crate) fn draft_user_prompt(
    professional_summary: &str,
    legal_insights: &str,
    incident_date: &str,
    case_number: Option<&str>,
) -> String {
    let case_number = case_number.map(str::trim).filter(|value| !value.is_empty());
    let case_number_info = case_number
        .map(|number| format!(" for case file: {number}"))
        .unwrap_or_default();
    let subject_line = match case_number {
        Some(number) => format!("Incident Report for Case File: {number}"),
        None => format!("Update re: Incident on {incident_date}"),
    };
    let insights = strip_disclaimer(legal_insights);

    format!(
        "Please draft an email to my lawyer summarizing a co-parenting incident that occurred on {incident_date}{case_number_info}.\n\n\
         The email should have the following structure:\n\
         1. **Subject Line:** {subject_line}\n\
         2. **Salutation:** A professional opening (e.g., \"Dear [Lawyer's Name],\").\n\
         3. **Body Paragraph 1 (Summary):** State the purpose is to document an incident and incorporate this professional summary:\n\
         ---\n{professional_summary}\n---\n\
         4. **Body Paragraph 2 (Key Insights):** Mention an AI tool provided preliminary context and include these key insights (without the disclaimer):\n\
         ---\n{insights}\n---\n\
         5. **Closing:** End with a call to action, like \"Please let me know if you require any further information or if this documentation is sufficient. A more detailed report with evidence is available upon request.\"\n\
         6. **Sign-off:** A professional closing (e.g., \"Best regards,\" followed by \"[Your Name]\").\n\n\
         Use placeholders like [Lawyer's Name] and [Your Name].\n"
    )
}

fn described(file: &EvidenceFile) -> &str {
    match file.description.trim() {
        "" => "Not provided.",
        text => text,
    }
}

pub(crate) fn image_evidence_prompt(file: &EvidenceFile, narrative: &str) -> String {
    format!(
        "As a neutral, objective legal assistant, analyze the attached image evidence in the context of the following co-parenting incident narrative:\n\
         ---\nNARRATIVE: \"{narrative}\"\n---\n\
         FILE DETAILS:\n\
         - Name: {name}\n\
         - User Description: {description}\n\
         ---\n\
         INSTRUCTIONS: Provide a concise, one-sentence summary of this image's potential relevance and evidentiary value. Be factual and avoid speculation.\n\n\
         Example Analysis: \"This screenshot appears to corroborate the user's claim of receiving a message at the specified time.\"",
        name = file.name,
        description = described(file),
    )
}

pub(crate) fn document_evidence_prompt(file: &EvidenceFile, narrative: &str) -> String {
    format!(
        "As a neutral, objective legal assistant, analyze the *potential relevance* of the attached document based on its metadata, in the context of the following co-parenting incident narrative:\n\
         ---\nNARRATIVE: \"{narrative}\"\n---\n\
         DOCUMENT DETAILS:\n\
         - Name: {name}\n\
         - Type: {mime_type}\n\
         - User Description: {description}\n\
         ---\n\
         INSTRUCTIONS: Based *only* on the file name and user-provided description, provide a concise, one-sentence summary of this document's likely relevance and evidentiary value. Do not speculate about the document's specific contents, as you cannot read them.\n\n\
         Example Analysis: \"A document named 'school_report.pdf' could be relevant if its contents detail the child's academic performance or behavior during the period of the incident.\"",
        name = file.name,
        mime_type = file.mime_type,
        description = described(file),
    )
}
