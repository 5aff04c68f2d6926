pub mod fetcher;
pub mod llm;
pub mod search;
pub mod tavily;
