use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The single research context the assistant works on: a topic, the summary
/// produced for it and the follow-up conversation held against that summary.
///
/// `topic` is stored under `initial_query` so persisted files and JSON exports
/// share one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSession {
    #[serde(rename = "initial_query", default)]
    pub topic: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub followups: Vec<FollowUp>,
}

impl ResearchSession {
    pub fn new(topic: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            summary: summary.into(),
            followups: Vec::new(),
        }
    }

    pub fn has_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }

    /// A follow-up can only exist once there is a summary to anchor it.
    pub fn is_consistent(&self) -> bool {
        self.has_summary() || self.followups.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub question: String,
    pub answer: String,
}

impl FollowUp {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Workflow state shared between the research tasks through the graph context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchContext {
    pub topic: String,
    pub urls: Vec<String>,
    pub pages: Vec<PageText>,
    pub aggregate: String,
    pub search_error: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub llm_error: Option<LlmError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub url: String,
    pub text: String,
    pub error: Option<String>,
}

impl PageText {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub topic: String,
    pub summary: String,
    pub pages: Vec<PageText>,
    pub task_times: HashMap<String, u64>,
    pub total_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub topic: String,
    pub summary: String,
    pub urls: Vec<String>,
    pub failed_urls: Vec<String>,
    pub total_time_ms: u64,
    pub task_times: HashMap<String, u64>,
}

impl From<ResearchOutcome> for ResearchResponse {
    fn from(outcome: ResearchOutcome) -> Self {
        let failed_urls = outcome
            .pages
            .iter()
            .filter(|p| p.is_failed())
            .map(|p| p.url.clone())
            .collect();
        Self {
            topic: outcome.topic,
            summary: outcome.summary,
            urls: outcome.pages.into_iter().map(|p| p.url).collect(),
            failed_urls,
            total_time_ms: outcome.total_time_ms,
            task_times: outcome.task_times,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchRequest {
    pub query: String,
    pub max_results: usize,
    pub search_depth: String,
    pub include_raw_content: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilySearchResponse {
    pub results: Vec<TavilyResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}
