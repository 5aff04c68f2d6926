//! Persistent store for the single active research session.
//!
//! The store owns the [`ResearchSession`] for the lifetime of the process.
//! Every mutation is written to disk before it is committed to memory, so the
//! session file always mirrors what callers observe.

use crate::error::SessionError;
use crate::models::{FollowUp, ResearchSession};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub struct SessionStore {
    path: PathBuf,
    session: Option<ResearchSession>,
}

impl SessionStore {
    /// Creates an empty store backed by `path` without touching the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            session: None,
        }
    }

    /// Opens the store, reloading a previous session from `path` if one exists.
    ///
    /// A missing, unreadable or malformed file means "no prior session".
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.session = read_session(&store.path);
        if let Some(session) = &store.session {
            info!(
                topic = %session.topic,
                followups = session.followups.len(),
                "Restored research session from {}",
                store.path.display()
            );
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(ResearchSession::has_summary)
    }

    /// Replaces the current session with a fresh one and persists it.
    pub fn start_new_session(
        &mut self,
        topic: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<(), SessionError> {
        let session = ResearchSession::new(topic, summary);
        if !session.has_summary() {
            return Err(SessionError::EmptySummary);
        }
        self.commit(session)
    }

    /// Appends a follow-up to the active session and persists it.
    pub fn append_followup(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<(), SessionError> {
        let mut session = match &self.session {
            Some(session) if session.has_summary() => session.clone(),
            _ => return Err(SessionError::NoActiveSession),
        };
        session.followups.push(FollowUp::new(question, answer));
        self.commit(session)
    }

    /// Rewrites the session file from the in-memory session.
    pub fn persist(&self) -> Result<(), SessionError> {
        match &self.session {
            Some(session) => write_session(&self.path, session),
            None => Err(SessionError::NoActiveSession),
        }
    }

    /// Returns an owned copy for rendering; the store's state stays private.
    pub fn snapshot(&self) -> Option<ResearchSession> {
        self.session.clone()
    }

    fn commit(&mut self, session: ResearchSession) -> Result<(), SessionError> {
        write_session(&self.path, &session)?;
        self.session = Some(session);
        Ok(())
    }
}

fn read_session(path: &Path) -> Option<ResearchSession> {
    if !path.exists() {
        debug!("No session file at {}", path.display());
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            return None;
        }
    };

    let session: ResearchSession = match serde_json::from_str(&content) {
        Ok(session) => session,
        Err(e) => {
            warn!("Ignoring malformed session file {}: {}", path.display(), e);
            return None;
        }
    };

    if !session.is_consistent() {
        warn!(
            "Ignoring session file {}: follow-ups recorded without a summary",
            path.display()
        );
        return None;
    }

    session.has_summary().then_some(session)
}

fn write_session(path: &Path, session: &ResearchSession) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(session)?;

    let tmp_path = temp_path(path);
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(json.as_bytes())?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    debug!(
        followups = session.followups.len(),
        "Persisted session to {}",
        path.display()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "session.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
