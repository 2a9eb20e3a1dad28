//! Tool adapters the research agent can call.
//!
//! Every adapter has the same text-in/text-out contract so the reasoning loop
//! can treat them uniformly. The registry always builds the same four adapters
//! in the same order; [`selector`] narrows them down per request.

mod arxiv;
mod python;
pub mod selector;
mod web;
mod wikipedia;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::ToolsConfig;
use crate::error::ResearchError;

pub use arxiv::ArxivSearch;
pub use python::PythonRepl;
pub use selector::{select_tools, validate_mapping, Capability};
pub use web::WebSearch;
pub use wikipedia::WikipediaSearch;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; ResearchAgent/0.1)";

/// A named capability with a uniform text invocation contract.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable identifying name the model uses to call the tool.
    fn name(&self) -> &str;

    /// Natural-language description shown to the model.
    fn description(&self) -> &str;

    /// Run the tool on a single textual input.
    async fn invoke(&self, input: &str) -> anyhow::Result<String>;
}

/// Name and description of a tool, for prompts and listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// The fixed, ordered set of tool adapters.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Construct every adapter: web search, Wikipedia, arXiv, Python REPL.
    ///
    /// Adapters only set up clients here; no network I/O happens until a tool
    /// is invoked. If any adapter fails to build, no registry is returned.
    pub fn build_all(config: &ToolsConfig) -> Result<Self, ResearchError> {
        let http = http_client(config.http_timeout_secs)?;

        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(WebSearch::new(http.clone())),
            Arc::new(WikipediaSearch::new(
                http.clone(),
                config.wikipedia_top_k,
                config.wikipedia_max_chars,
            )),
            Arc::new(ArxivSearch::new(http, config.arxiv_top_k)),
            Arc::new(PythonRepl::new(
                config.python_bin.clone(),
                Duration::from_secs(config.python_timeout_secs),
            )),
        ];

        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }
}

/// Name/description pairs for a tool slice, in order.
pub fn describe(tools: &[Arc<dyn Tool>]) -> Vec<ToolInfo> {
    tools
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
        })
        .collect()
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ResearchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ResearchError::Construction(format!("tool HTTP client: {}", e)))
}

/// Decode HTML entities in one pass, so `&amp;lt;` becomes `&lt;` and not `<`.
///
/// Handles the common named entities and decimal/hex character references;
/// anything else is left as written.
fn html_decode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail[1..]
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..=end]).map(|c| (c, end + 2)));

        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Truncate on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_four_tools_in_fixed_order() {
        let registry = ToolRegistry::build_all(&ToolsConfig::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec!["duckduckgo_search", "wikipedia", "arxiv", "python_repl"]
        );
    }

    #[test]
    fn registry_build_is_deterministic() {
        let config = ToolsConfig::default();
        let first = ToolRegistry::build_all(&config).unwrap();
        let second = ToolRegistry::build_all(&config).unwrap();
        assert_eq!(describe(first.tools()), describe(second.tools()));
    }

    #[test]
    fn every_tool_has_a_description() {
        let registry = ToolRegistry::build_all(&ToolsConfig::default()).unwrap();
        for info in describe(registry.tools()) {
            assert!(!info.description.is_empty(), "{} has no description", info.name);
        }
    }

    #[test]
    fn html_decode_handles_common_entities() {
        assert_eq!(
            html_decode("a &amp; b &lt;c&gt; &quot;d&quot; &#x27;e&#39;"),
            "a & b <c> \"d\" 'e'"
        );
    }

    #[test]
    fn html_decode_is_single_pass_and_numeric() {
        assert_eq!(
            html_decode("a &amp;lt;b&amp;gt; &#8217;"),
            "a &lt;b&gt; \u{2019}"
        );
        assert_eq!(html_decode("AT&T &bogus; &#xZZ; &"), "AT&T &bogus; &#xZZ; &");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
