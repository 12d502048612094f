//! Search and scrape capabilities over a pluggable [`WebProvider`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::{Capability, CapabilityHandle, parse_args};
use crate::io::config::WebConfig;
use crate::io::process::{command_from_argv, run_command_with_timeout};

/// Backend for internet access.
pub trait WebProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<String>;
    fn scrape(&self, url: &str) -> Result<String>;
}

pub fn web_capabilities(provider: Arc<dyn WebProvider>) -> Vec<CapabilityHandle> {
    vec![
        Arc::new(SearchInternet::new(Arc::clone(&provider))),
        Arc::new(WebScrape::new(provider)),
    ]
}

/// Provider that shells out to the configured search and scrape commands,
/// appending the query or URL as the last argument.
#[derive(Debug, Clone)]
pub struct CommandWebProvider {
    search_command: Vec<String>,
    scrape_command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandWebProvider {
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            search_command: config.search_command.clone(),
            scrape_command: config.scrape_command.clone(),
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    #[instrument(skip(self, argv, payload))]
    fn run(&self, label: &str, argv: &[String], payload: &str) -> Result<String> {
        if argv.is_empty() {
            return Err(anyhow!("{label} provider not configured"));
        }
        let cmd = command_from_argv(argv, &[payload])?;
        let output = run_command_with_timeout(cmd, None, self.timeout, self.output_limit_bytes)?;
        output.ensure_success(label, self.timeout)?;
        Ok(output.stdout_lossy().trim_end().to_string())
    }
}

impl WebProvider for CommandWebProvider {
    fn search(&self, query: &str) -> Result<String> {
        self.run("search", &self.search_command, query)
    }

    fn scrape(&self, url: &str) -> Result<String> {
        let content = self.run("scrape", &self.scrape_command, url)?;
        if content.is_empty() {
            return Ok("No content extracted".to_string());
        }
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct ScrapeArgs {
    url: String,
}

pub struct SearchInternet {
    provider: Arc<dyn WebProvider>,
}

impl SearchInternet {
    pub fn new(provider: Arc<dyn WebProvider>) -> Self {
        Self { provider }
    }
}

impl Capability for SearchInternet {
    fn name(&self) -> &str {
        "search_internet"
    }

    fn description(&self) -> &str {
        "Search the internet and return the top results as text. Args: {\"query\": string}."
    }

    fn invoke(&self, args: &Value) -> String {
        let args: SearchArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(message) => return message,
        };
        self.provider
            .search(&args.query)
            .unwrap_or_else(|err| format!("Search error: {err:#}"))
    }
}

pub struct WebScrape {
    provider: Arc<dyn WebProvider>,
}

impl WebScrape {
    pub fn new(provider: Arc<dyn WebProvider>) -> Self {
        Self { provider }
    }
}

impl Capability for WebScrape {
    fn name(&self) -> &str {
        "web_scrape"
    }

    fn description(&self) -> &str {
        "Fetch a web page and return its content as markdown. Args: {\"url\": string}."
    }

    fn invoke(&self, args: &Value) -> String {
        let args: ScrapeArgs = match parse_args(self.name(), args) {
            Ok(args) => args,
            Err(message) => return message,
        };
        self.provider
            .scrape(&args.url)
            .unwrap_or_else(|err| format!("Scrape error: {err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider(search: &str, scrape: &str) -> Arc<dyn WebProvider> {
        let argv = |script: &str| {
            if script.is_empty() {
                Vec::new()
            } else {
                vec!["sh".to_string(), "-c".to_string(), script.to_string(), "sh".to_string()]
            }
        };
        Arc::new(CommandWebProvider::from_config(&WebConfig {
            search_command: argv(search),
            scrape_command: argv(scrape),
            timeout_secs: 5,
            ..WebConfig::default()
        }))
    }

    #[test]
    fn search_passes_query_as_last_argument() {
        let search = SearchInternet::new(provider("echo \"results for $1\"", ""));
        assert_eq!(
            search.invoke(&json!({ "query": "rust ownership" })),
            "results for rust ownership"
        );
    }

    #[test]
    fn unconfigured_provider_reports_error() {
        let search = SearchInternet::new(provider("", ""));
        assert_eq!(
            search.invoke(&json!({ "query": "anything" })),
            "Search error: search provider not configured"
        );
        let scrape = WebScrape::new(provider("", ""));
        assert_eq!(
            scrape.invoke(&json!({ "url": "https://example.com" })),
            "Scrape error: scrape provider not configured"
        );
    }

    #[test]
    fn failing_command_becomes_scrape_error() {
        let scrape = WebScrape::new(provider("", "echo boom >&2; exit 3"));
        let out = scrape.invoke(&json!({ "url": "https://example.com" }));
        assert!(out.starts_with("Scrape error: scrape failed"), "{out}");
        assert!(out.contains("boom"));
    }

    #[test]
    fn empty_scrape_yields_placeholder() {
        let scrape = WebScrape::new(provider("", "true"));
        assert_eq!(
            scrape.invoke(&json!({ "url": "https://example.com" })),
            "No content extracted"
        );
    }

    #[test]
    fn missing_url_is_described() {
        let scrape = WebScrape::new(provider("", ""));
        assert!(
            scrape
                .invoke(&json!({ "link": "x" }))
                .starts_with("Error: invalid arguments for 'web_scrape':")
        );
    }
}
