//! The research workflow: search, scrape, summarize.
//!
//! Each research action runs as its own `graph-flow` session on a fresh
//! in-memory store. Tasks execute strictly in sequence, so every page is
//! fetched before the summary is requested.

use crate::error::AssistantError;
use crate::models::{ResearchContext, ResearchOutcome};
use crate::tasks::{ScrapeTask, SearchTask, SummarizerTask, RESEARCH_CONTEXT_KEY, TASK_TIMES_KEY};
use crate::tools::fetcher::PageFetcher;
use crate::tools::llm::LanguageModel;
use crate::tools::search::SearchProvider;
use graph_flow::{
    ExecutionStatus, FlowRunner, Graph, GraphBuilder, InMemorySessionStorage, Session,
    SessionStorage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Searching { query: String },
    Scraping { url: String },
    ScrapeFailed { url: String, error: String },
    Summarizing,
}

pub type ProgressFn = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

pub fn silent_progress() -> ProgressFn {
    Arc::new(|_| {})
}

pub struct ResearchPipeline {
    graph: Arc<Graph>,
}

impl ResearchPipeline {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        model: Arc<dyn LanguageModel>,
        max_results: usize,
        char_budget: usize,
        progress: ProgressFn,
    ) -> Self {
        let graph = GraphBuilder::new("research_workflow")
            .add_task(Arc::new(SearchTask::new(search, max_results, progress.clone())))
            .add_task(Arc::new(ScrapeTask::new(fetcher, progress.clone())))
            .add_task(Arc::new(SummarizerTask::new(model, char_budget, progress)))
            .add_edge(SearchTask::ID, ScrapeTask::ID)
            .add_edge(ScrapeTask::ID, SummarizerTask::ID)
            .build();

        Self {
            graph: Arc::new(graph),
        }
    }

    /// Runs the workflow for `topic` and returns the summary with its sources.
    #[instrument(skip(self))]
    pub async fn run(&self, topic: &str) -> Result<ResearchOutcome, AssistantError> {
        let start_time = std::time::Instant::now();
        let session_id = Uuid::new_v4().to_string();
        let storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
        let runner = FlowRunner::new(self.graph.clone(), storage.clone());

        info!("Starting research workflow for session {}", session_id);

        let session = Session::new_from_task(session_id.clone(), SearchTask::ID);
        let context = ResearchContext {
            topic: topic.to_string(),
            ..Default::default()
        };
        session.context.set(RESEARCH_CONTEXT_KEY, context).await;
        storage
            .save(session)
            .await
            .map_err(|e| AssistantError::Pipeline(e.to_string()))?;

        loop {
            let result = runner
                .run(&session_id)
                .await
                .map_err(|e| AssistantError::Pipeline(e.to_string()))?;

            match result.status {
                ExecutionStatus::Completed => {
                    info!("Workflow completed in {:?}", start_time.elapsed());
                    break;
                }
                ExecutionStatus::Paused { next_task_id, .. } => {
                    debug!("Workflow paused, next task: {}", next_task_id);
                    continue;
                }
                ExecutionStatus::Error(e) => {
                    return Err(AssistantError::Pipeline(e.to_string()));
                }
                _ => {
                    return Err(AssistantError::Pipeline(
                        "workflow stopped waiting for input".to_string(),
                    ));
                }
            }
        }

        let session = storage
            .get(&session_id)
            .await
            .map_err(|e| AssistantError::Pipeline(e.to_string()))?
            .ok_or_else(|| AssistantError::Pipeline("workflow session vanished".to_string()))?;

        let mut research_context: ResearchContext = session
            .context
            .get(RESEARCH_CONTEXT_KEY)
            .await
            .ok_or_else(|| AssistantError::Pipeline("research context missing".to_string()))?;
        let task_times: HashMap<String, u64> =
            session.context.get(TASK_TIMES_KEY).await.unwrap_or_default();
        debug!(?task_times, "Task timings");

        if let Some(err) = research_context.llm_error.take() {
            return Err(AssistantError::Llm(err));
        }
        if research_context.summary.trim().is_empty() {
            return Err(AssistantError::NothingToSummarize(empty_reason(
                &research_context,
            )));
        }

        Ok(ResearchOutcome {
            topic: research_context.topic,
            summary: research_context.summary,
            pages: research_context.pages,
            task_times,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

fn empty_reason(context: &ResearchContext) -> String {
    if let Some(error) = &context.search_error {
        format!("search failed ({})", error)
    } else if context.urls.is_empty() {
        "the search returned no results".to_string()
    } else {
        format!("no readable text in the {} pages fetched", context.urls.len())
    }
}
