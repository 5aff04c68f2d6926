//! Page fetching and paragraph extraction.

use crate::error::FetchError;
use crate::models::PageText;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns its readable text.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// One GET per page through a shared `reqwest` client.
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("research-assistant/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching content from: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let text = extract_paragraphs(&html);
        info!("Fetched {} chars from: {}", text.len(), url);
        Ok(text)
    }
}

/// Text of every `<p>` element, joined with single spaces.
pub fn extract_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetches one page, folding any failure into the returned [`PageText`].
pub async fn fetch_page(fetcher: &dyn PageFetcher, url: &str) -> PageText {
    match fetcher.fetch(url).await {
        Ok(text) => PageText {
            url: url.to_string(),
            text,
            error: None,
        },
        Err(e) => {
            warn!("Error scraping {}: {}", url, e);
            PageText {
                url: url.to_string(),
                text: String::new(),
                error: Some(format!("Error scraping {}: {}", url, e)),
            }
        }
    }
}

/// Fetches every URL in order; a failed page never stops the others.
pub async fn fetch_all(fetcher: &dyn PageFetcher, urls: &[String]) -> Vec<PageText> {
    let mut pages = Vec::with_capacity(urls.len());
    for url in urls {
        pages.push(fetch_page(fetcher, url).await);
    }
    pages
}

/// Concatenates page texts in order, each followed by a blank line.
pub fn aggregate(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|page| format!("{}\n\n", page.text))
        .collect()
}
