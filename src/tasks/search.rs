use super::{load_research_context, record_task_time, RESEARCH_CONTEXT_KEY};
use crate::pipeline::{ProgressEvent, ProgressFn};
use crate::tools::search::SearchProvider;
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct SearchTask {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
    progress: ProgressFn,
}

impl SearchTask {
    pub const ID: &'static str = "search";

    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize, progress: ProgressFn) -> Self {
        Self {
            provider,
            max_results,
            progress,
        }
    }
}

#[async_trait]
impl Task for SearchTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut research_context = load_research_context(&context).await?;

        (self.progress)(&ProgressEvent::Searching {
            query: research_context.topic.clone(),
        });
        info!(provider = self.provider.name(), "Searching the web");

        match self
            .provider
            .search(&research_context.topic, self.max_results)
            .await
        {
            Ok(urls) => research_context.urls = urls,
            Err(e) => {
                warn!("Search failed: {}", e);
                research_context.search_error = Some(e.to_string());
            }
        }

        let found = research_context.urls.len();
        info!("Search returned {} URLs", found);
        context.set(RESEARCH_CONTEXT_KEY, research_context).await;
        record_task_time(&context, Self::ID, start_time).await;

        let next = if found == 0 {
            NextAction::End
        } else {
            NextAction::ContinueAndExecute
        };
        Ok(TaskResult::new(Some(format!("Found {} URLs", found)), next))
    }
}
