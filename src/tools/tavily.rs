use crate::error::SearchError;
use crate::models::{TavilySearchRequest, TavilySearchResponse};
use crate::tools::search::SearchProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::env;
use std::time::Duration;
use tracing::{debug, instrument};

const TAVILY_URL: &str = "https://api.tavily.com/search";
const API_KEY_VAR: &str = "TAVILY_API_KEY";

/// Tavily search API. Reads `TAVILY_API_KEY` per request.
pub struct TavilySearch {
    client: Client,
    timeout_secs: u64,
}

impl TavilySearch {
    pub fn new(timeout_secs: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SearchError::Api {
                status: 0,
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let api_key = env::var(API_KEY_VAR).map_err(|_| SearchError::MissingApiKey(API_KEY_VAR))?;

        let request = TavilySearchRequest {
            query: query.to_string(),
            max_results: limit,
            search_depth: "basic".to_string(),
            include_raw_content: false,
        };

        let response = self
            .client
            .post(TAVILY_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    SearchError::Api {
                        status: 0,
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(SearchError::Api {
                status: response.status().as_u16(),
                message: "Tavily request failed".to_string(),
            });
        }

        let search_response: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        let urls = collect_urls(search_response, limit);
        debug!("Tavily returned {} URLs", urls.len());
        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}

fn collect_urls(response: TavilySearchResponse, limit: usize) -> Vec<String> {
    response
        .results
        .into_iter()
        .map(|r| r.url)
        .filter(|url| !url.trim().is_empty())
        .take(limit)
        .collect()
}
