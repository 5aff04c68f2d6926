//! Report rendering for research sessions.
//!
//! All renderers are pure functions of a [`ResearchSession`] snapshot.

mod pdf;

pub use pdf::to_pdf;

use crate::error::ReportError;
use crate::models::ResearchSession;
use std::fmt::Write;

pub const REPORT_TITLE: &str = "AI Research Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Markdown,
    Pdf,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Json, ReportFormat::Markdown, ReportFormat::Pdf];

    pub fn file_name(self) -> &'static str {
        match self {
            ReportFormat::Json => "research_report.json",
            ReportFormat::Markdown => "research_report.md",
            ReportFormat::Pdf => "research_report.pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Markdown => "text/markdown; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "md" | "markdown" => Some(ReportFormat::Markdown),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub format: ReportFormat,
    pub bytes: Vec<u8>,
}

impl RenderedReport {
    pub fn file_name(&self) -> &'static str {
        self.format.file_name()
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

pub fn render(format: ReportFormat, session: &ResearchSession) -> Result<RenderedReport, ReportError> {
    let bytes = match format {
        ReportFormat::Json => to_json(session)?.into_bytes(),
        ReportFormat::Markdown => to_markdown(session).into_bytes(),
        ReportFormat::Pdf => to_pdf(session)?,
    };
    Ok(RenderedReport { format, bytes })
}

/// Same schema as the persisted session file.
pub fn to_json(session: &ResearchSession) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(session)?)
}

pub fn to_markdown(session: &ResearchSession) -> String {
    let mut report = String::new();
    // Writing into a String cannot fail.
    let _ = write!(report, "# {REPORT_TITLE}\n\n");
    let _ = write!(report, "**Topic:** {}\n\n", session.topic);
    let _ = write!(report, "## Summary\n\n{}\n\n", session.summary);

    if !session.followups.is_empty() {
        report.push_str("## Follow-Up Questions\n\n");
        for item in &session.followups {
            let _ = write!(report, "**Q:** {}\n\n", item.question);
            let _ = write!(report, "**A:** {}\n\n", item.answer);
        }
    }

    report
}
