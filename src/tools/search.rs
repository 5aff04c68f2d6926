//! Web search adapters.

use crate::error::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns up to `limit` result URLs, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError>;

    fn name(&self) -> &'static str;
}

/// DuckDuckGo's HTML endpoint. Needs no API key.
pub struct DuckDuckGoSearch {
    client: Client,
    timeout_secs: u64,
}

impl DuckDuckGoSearch {
    pub fn new(timeout_secs: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
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
impl SearchProvider for DuckDuckGoSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .post(DDG_HTML_URL)
            .form(&[("q", query)])
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
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(SearchError::Api {
                status: response.status().as_u16(),
                message: "DuckDuckGo request failed".to_string(),
            });
        }

        let html = response.text().await.map_err(|e| SearchError::Api {
            status: 0,
            message: e.to_string(),
        })?;

        let urls = parse_ddg_html(&html, limit);
        debug!("DuckDuckGo returned {} URLs", urls.len());
        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

fn parse_ddg_html(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a.result__a") else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for href in document.select(&selector).filter_map(|a| a.value().attr("href")) {
        if urls.len() >= limit {
            break;
        }
        if let Some(url) = resolve_ddg_link(href) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Result links are redirects like `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn resolve_ddg_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    let target = match parsed.query_pairs().find(|(key, _)| key == "uddg") {
        Some((_, value)) => Url::parse(&value).ok()?,
        None => parsed,
    };

    if target.host_str().is_some_and(|h| h.ends_with("duckduckgo.com")) {
        return None;
    }
    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_HTML: &str = r##"
        <html><body>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FQubit&rut=abc">Qubit</a>
            <a class="result__snippet" href="#">A qubit is...</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://example.com/quantum">Quantum</a>
          </div>
          <div class="result">
            <a class="result__a" href="//duckduckgo.com/y.js?ad_provider=x">Ad</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://example.com/quantum">Duplicate</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://ibm.com/quantum">IBM</a>
          </div>
        </body></html>
    "##;

    #[test]
    fn test_parse_decodes_redirects_and_skips_ads() {
        let urls = parse_ddg_html(RESULTS_HTML, 10);
        assert_eq!(
            urls,
            vec![
                "https://en.wikipedia.org/wiki/Qubit",
                "https://example.com/quantum",
                "https://ibm.com/quantum",
            ]
        );
    }

    #[test]
    fn test_parse_honours_limit() {
        let urls = parse_ddg_html(RESULTS_HTML, 2);
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn test_parse_empty_html() {
        assert!(parse_ddg_html("", 3).is_empty());
    }

    #[test]
    fn test_resolve_rejects_non_http_targets() {
        assert_eq!(resolve_ddg_link("javascript:void(0)"), None);
        assert_eq!(
            resolve_ddg_link("//duckduckgo.com/l/?uddg=ftp%3A%2F%2Fexample.com"),
            None
        );
    }

    #[test]
    fn test_provider_name() {
        let provider = DuckDuckGoSearch::new(10).unwrap();
        assert_eq!(provider.name(), "duckduckgo");
    }
}
