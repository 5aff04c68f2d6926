use crate::error::SearchError;
use crate::tools::fetcher::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::tools::llm::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::tools::search::{DuckDuckGoSearch, SearchProvider};
use crate::tools::tavily::TavilySearch;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchBackend {
    Duckduckgo,
    Tavily,
}

/// Runtime settings, read from flags first and environment second.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// JSON file holding the current research session
    #[arg(long, env = "RESEARCH_SESSION_FILE", default_value = "data.json")]
    pub session_file: PathBuf,

    /// Number of search results to scrape
    #[arg(long, env = "RESEARCH_MAX_RESULTS", default_value_t = 3)]
    pub max_results: usize,

    /// Per-page fetch timeout in seconds
    #[arg(long, env = "RESEARCH_FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Characters of scraped text sent to the model
    #[arg(long, env = "RESEARCH_CHAR_BUDGET", default_value_t = 4000)]
    pub char_budget: usize,

    /// Chat model used for summaries and follow-up answers
    #[arg(long, env = "RESEARCH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature for every completion
    #[arg(long, env = "RESEARCH_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f64,

    #[arg(long, env = "RESEARCH_SEARCH_PROVIDER", value_enum, default_value_t = SearchBackend::Duckduckgo)]
    pub search_provider: SearchBackend,

    /// Directory export files are written to
    #[arg(long, env = "RESEARCH_EXPORT_DIR", default_value = ".")]
    pub export_dir: PathBuf,
}

impl Settings {
    pub fn build_search_provider(&self) -> Result<Arc<dyn SearchProvider>, SearchError> {
        let provider: Arc<dyn SearchProvider> = match self.search_provider {
            SearchBackend::Duckduckgo => Arc::new(DuckDuckGoSearch::new(self.fetch_timeout_secs)?),
            SearchBackend::Tavily => Arc::new(TavilySearch::new(self.fetch_timeout_secs)?),
        };
        Ok(provider)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_file: PathBuf::from("data.json"),
            max_results: 3,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            char_budget: 4000,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            search_provider: SearchBackend::Duckduckgo,
            export_dir: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = TestCli::parse_from([
            "test",
            "--session-file",
            "/tmp/s.json",
            "--max-results",
            "5",
            "--temperature",
            "0.2",
            "--search-provider",
            "tavily",
        ]);
        assert_eq!(cli.settings.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(cli.settings.max_results, 5);
        assert_eq!(cli.settings.temperature, 0.2);
        assert_eq!(cli.settings.search_provider, SearchBackend::Tavily);
    }

    #[test]
    fn test_default_matches_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.max_results, 3);
        assert_eq!(settings.fetch_timeout_secs, 10);
        assert_eq!(settings.char_budget, 4000);
        assert_eq!(settings.temperature, 0.5);
    }

    #[test]
    fn test_search_provider_selection() {
        let mut settings = Settings::default();
        assert_eq!(settings.build_search_provider().unwrap().name(), "duckduckgo");
        settings.search_provider = SearchBackend::Tavily;
        assert_eq!(settings.build_search_provider().unwrap().name(), "tavily");
    }
}
