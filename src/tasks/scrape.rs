use super::{load_research_context, record_task_time, RESEARCH_CONTEXT_KEY};
use crate::pipeline::{ProgressEvent, ProgressFn};
use crate::tools::fetcher::{aggregate, fetch_page, PageFetcher};
use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ScrapeTask {
    fetcher: Arc<dyn PageFetcher>,
    progress: ProgressFn,
}

impl ScrapeTask {
    pub const ID: &'static str = "scrape";

    pub fn new(fetcher: Arc<dyn PageFetcher>, progress: ProgressFn) -> Self {
        Self { fetcher, progress }
    }
}

#[async_trait]
impl Task for ScrapeTask {
    fn id(&self) -> &str {
        Self::ID
    }

    #[instrument(skip(self, context))]
    async fn run(&self, context: Context) -> Result<TaskResult, GraphError> {
        let start_time = std::time::Instant::now();
        let mut research_context = load_research_context(&context).await?;

        let mut pages = Vec::with_capacity(research_context.urls.len());
        for url in &research_context.urls {
            (self.progress)(&ProgressEvent::Scraping { url: url.clone() });
            let page = fetch_page(self.fetcher.as_ref(), url).await;
            if let Some(error) = &page.error {
                (self.progress)(&ProgressEvent::ScrapeFailed {
                    url: url.clone(),
                    error: error.clone(),
                });
            }
            pages.push(page);
        }

        research_context.aggregate = aggregate(&pages);
        let failed = pages.iter().filter(|p| p.is_failed()).count();
        info!(
            "Scraped {} pages ({} failed), {} chars of text",
            pages.len(),
            failed,
            research_context.aggregate.len()
        );
        research_context.pages = pages;

        let has_text = !research_context.aggregate.trim().is_empty();
        context.set(RESEARCH_CONTEXT_KEY, research_context).await;
        record_task_time(&context, Self::ID, start_time).await;

        let next = if has_text {
            NextAction::ContinueAndExecute
        } else {
            NextAction::End
        };
        Ok(TaskResult::new(
            Some("Scraping completed".to_string()),
            next,
        ))
    }
}
