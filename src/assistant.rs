//! One user action at a time against the session store.

use crate::error::{AssistantError, AssistantResult};
use crate::models::{FollowUp, ResearchOutcome, ResearchSession};
use crate::pipeline::ResearchPipeline;
use crate::prompts::followup_prompt;
use crate::report::{self, RenderedReport, ReportFormat};
use crate::session::SessionStore;
use crate::tools::llm::LanguageModel;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

pub struct ResearchAssistant {
    store: SessionStore,
    pipeline: ResearchPipeline,
    model: Arc<dyn LanguageModel>,
}

impl ResearchAssistant {
    pub fn new(store: SessionStore, pipeline: ResearchPipeline, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            store,
            pipeline,
            model,
        }
    }

    pub fn has_session(&self) -> bool {
        self.store.is_active()
    }

    pub fn snapshot(&self) -> Option<ResearchSession> {
        self.store.snapshot()
    }

    pub fn session_path(&self) -> &Path {
        self.store.path()
    }

    /// Rewrites the session file from memory, if a session is active.
    pub fn save(&self) -> AssistantResult<()> {
        if self.store.is_active() {
            self.store.persist()?;
        }
        Ok(())
    }

    /// Searches, scrapes and summarizes `topic`, then starts a new session.
    ///
    /// Nothing is stored unless a summary was produced.
    #[instrument(skip(self))]
    pub async fn research(&mut self, topic: &str) -> AssistantResult<ResearchOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AssistantError::EmptyInput("topic"));
        }

        let outcome = self.pipeline.run(topic).await?;
        self.store
            .start_new_session(outcome.topic.clone(), outcome.summary.clone())?;
        info!("Started new research session on {:?}", outcome.topic);
        Ok(outcome)
    }

    /// Answers `question` using the current summary as context and records it.
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> AssistantResult<FollowUp> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyInput("question"));
        }

        let summary = match self.store.snapshot() {
            Some(session) if self.store.is_active() => session.summary,
            _ => return Err(AssistantError::NoActiveSession),
        };

        let answer = self.model.complete(&followup_prompt(&summary, question)).await?;
        self.store.append_followup(question, answer.clone())?;
        info!("Recorded follow-up question");
        Ok(FollowUp::new(question, answer))
    }

    pub fn export(&self, format: ReportFormat) -> AssistantResult<RenderedReport> {
        let session = self.active_snapshot()?;
        Ok(report::render(format, &session)?)
    }

    /// Renders `format` into `dir` under its standard file name.
    pub fn export_to_dir(&self, format: ReportFormat, dir: &Path) -> AssistantResult<PathBuf> {
        let rendered = self.export(format)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(rendered.file_name());
        fs::write(&path, &rendered.bytes)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }

    fn active_snapshot(&self) -> AssistantResult<ResearchSession> {
        match self.store.snapshot() {
            Some(session) if self.store.is_active() => Ok(session),
            _ => Err(AssistantError::NoActiveSession),
        }
    }
}
