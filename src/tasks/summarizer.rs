use super::{load_research_context, record_task_time, RESEARCH_CONTEXT_KEY};
use crate::pipeline::{ProgressEvent, ProgressFn};
use crate::prompts::summary_prompt;
use crate::tools::llm::LanguageModel;
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct SummarizerTask {
    model: Arc<dyn LanguageModel>,
    char_budget: usize,
    progress: ProgressFn,
}

impl SummarizerTask {
    pub const ID: &'static str = "summarize";

    pub fn new(model: Arc<dyn LanguageModel>, char_budget: usize, progress: ProgressFn) -> Self {
        Self {
            model,
            char_budget,
            progress,
        }
    }
}

#[async_trait]
impl Task for SummarizerTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut research_context = load_research_context(&context).await?;

        (self.progress)(&ProgressEvent::Summarizing);
        let prompt = summary_prompt(&research_context.aggregate, self.char_budget);
        let status = match self.model.complete(&prompt).await {
            Ok(summary) => {
                info!("Generated summary with {} characters", summary.len());
                research_context.summary = summary;
                "Summary generated successfully"
            }
            Err(e) => {
                // Task errors reach the runner only as text; keep the typed error.
                warn!("Summarization failed: {}", e);
                research_context.llm_error = Some(e);
                "Summarization failed"
            }
        };
        context.set(RESEARCH_CONTEXT_KEY, research_context).await;
        record_task_time(&context, Self::ID, start_time).await;

        Ok(TaskResult::new(Some(status.to_string()), NextAction::End))
    }
}
