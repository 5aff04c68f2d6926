mod scrape;
mod search;
mod summarizer;

pub use scrape::ScrapeTask;
pub use search::SearchTask;
pub use summarizer::SummarizerTask;

use crate::models::ResearchContext;
use graph_flow::{Context, GraphError};
use std::collections::HashMap;
use std::time::Instant;

pub const RESEARCH_CONTEXT_KEY: &str = "research_context";
pub const TASK_TIMES_KEY: &str = "task_times";

async fn load_research_context(context: &Context) -> Result<ResearchContext, GraphError> {
    context
        .get(RESEARCH_CONTEXT_KEY)
        .await
        .ok_or_else(|| GraphError::ContextError("Research context not found".to_string()))
}

async fn record_task_time(context: &Context, task_id: &str, start_time: Instant) {
    let elapsed = start_time.elapsed().as_millis() as u64;
    let mut task_times: HashMap<String, u64> =
        context.get(TASK_TIMES_KEY).await.unwrap_or_default();
    task_times.insert(task_id.to_string(), elapsed);
    context.set(TASK_TIMES_KEY, task_times).await;
}
