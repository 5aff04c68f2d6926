//! In-memory adapter doubles shared by the unit tests.

use crate::error::{FetchError, LlmError, SearchError};
use crate::tools::fetcher::PageFetcher;
use crate::tools::llm::LanguageModel;
use crate::tools::search::SearchProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct StaticSearch {
    urls: Vec<String>,
    fail: bool,
}

impl StaticSearch {
    pub fn new(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            urls: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        if self.fail {
            return Err(SearchError::Api {
                status: 503,
                message: "search backend down".to_string(),
            });
        }
        Ok(self.urls.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Serves canned page text by URL; an `Err(status)` entry fails with that status.
pub struct MapFetcher {
    pages: HashMap<String, Result<String, u16>>,
    requested: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new(pages: &[(&str, Result<&str, u16>)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, page)| (url.to_string(), page.map(|text| text.to_string())))
                .collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(status)) => Err(FetchError::Status(*status)),
            None => Err(FetchError::Http(format!("no route to {}", url))),
        }
    }
}

/// Answers prompts from a queue and records every prompt it receives.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<Vec<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Self {
        let model = Self::default();
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies.lock().unwrap().push(Err(message.to_string()));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        replies.remove(0).map_err(LlmError::Request)
    }
}
