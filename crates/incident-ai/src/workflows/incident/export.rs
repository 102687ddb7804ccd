use std::fmt::Write;

use super::domain::ReportData;

impl ReportData {
    /// Render the report as a standalone markdown document for download or printing.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", self.title.trim());

        if let Some(case_number) = self.case_number.as_deref().filter(|v| !v.trim().is_empty()) {
            let _ = writeln!(out, "**Case Number:** {}  ", case_number.trim());
        }
        let _ = writeln!(out, "**Category:** {}  ", self.category);
        let _ = writeln!(out, "**Severity:** {}\n", self.severity);
        let _ = writeln!(out, "> {}\n", self.severity_justification.trim());

        section(&mut out, "Professional Summary", &self.professional_summary);
        section(&mut out, "Observed Impact on Children", &self.observed_impact);
        section(&mut out, "Legal Insights", &self.legal_insights);

        if !self.sources.is_empty() {
            out.push_str("## Sources\n\n");
            for source in &self.sources {
                let _ = writeln!(out, "- <{}>", source.trim());
            }
            out.push('\n');
        }

        section(&mut out, "AI Notes & Recommendations", &self.ai_notes);
        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    }
}

fn section(out: &mut String, heading: &str, body: &str) {
    let body = body.trim();
    if body.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {heading}\n");
    // Summaries arrive as single-newline paragraphs; markdown needs blank lines between them.
    for paragraph in body.split('\n').map(str::trim_end) {
        let _ = writeln!(out, "{paragraph}");
        if !paragraph.is_empty() && !paragraph.starts_with(['-', '*', '#']) {
            out.push('\n');
        }
    }
    if !out.ends_with("\n\n") {
        out.push('\n');
    }
}
