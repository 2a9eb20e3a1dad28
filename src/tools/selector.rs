//! Maps user-facing capability labels to tool adapters.
//!
//! Matching is by substring of the adapter's name. Since a substring can hit
//! zero or several adapters, [`validate_mapping`] checks the registry once at
//! startup that every capability resolves to exactly one adapter.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use super::Tool;
use crate::error::ResearchError;

/// Capability a user can enable for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WebSearch,
    Wikipedia,
    Arxiv,
    PythonRepl,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::WebSearch,
        Capability::Wikipedia,
        Capability::Arxiv,
        Capability::PythonRepl,
    ];

    /// Capabilities enabled when the form is first shown.
    pub const DEFAULTS: [Capability; 2] = [Capability::WebSearch, Capability::Wikipedia];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::WebSearch => "Web Search",
            Self::Wikipedia => "Wikipedia",
            Self::Arxiv => "Arxiv",
            Self::PythonRepl => "Python REPL",
        }
    }

    /// Machine id, also accepted when parsing.
    pub fn id(self) -> &'static str {
        match self {
            Self::WebSearch => "web_search",
            Self::Wikipedia => "wikipedia",
            Self::Arxiv => "arxiv",
            Self::PythonRepl => "python_repl",
        }
    }

    /// Substring an adapter name must contain to serve this capability.
    pub fn match_substring(self) -> &'static str {
        match self {
            Self::WebSearch => "duckduckgo",
            Self::Wikipedia => "wikipedia",
            Self::Arxiv => "arxiv",
            Self::PythonRepl => "python_repl",
        }
    }

    pub fn is_default(self) -> bool {
        Self::DEFAULTS.contains(&self)
    }

    fn matches(self, tool: &dyn Tool) -> bool {
        tool.name().contains(self.match_substring())
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Capability {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.label().eq_ignore_ascii_case(wanted) || c.id().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ResearchError::UnknownCapability(wanted.to_string()))
    }
}

/// Parse labels into an ordered selection without duplicates.
pub fn parse_selection<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Capability>, ResearchError> {
    let mut selection = Vec::with_capacity(labels.len());
    for label in labels {
        if label.as_ref().trim().is_empty() {
            continue;
        }
        let capability: Capability = label.as_ref().parse()?;
        if !selection.contains(&capability) {
            selection.push(capability);
        }
    }
    Ok(selection)
}

/// Pick the adapters serving `labels`.
///
/// Iterates labels in order, and for each label every adapter in registry
/// order. An empty result is a precondition failure for the caller.
pub fn select_tools(labels: &[Capability], all: &[Arc<dyn Tool>]) -> Vec<Arc<dyn Tool>> {
    let mut seen = Vec::with_capacity(labels.len());
    let mut selected = Vec::new();

    for &label in labels {
        if seen.contains(&label) {
            continue;
        }
        seen.push(label);

        selected.extend(
            all.iter()
                .filter(|tool| label.matches(tool.as_ref()))
                .cloned(),
        );
    }

    selected
}

/// Check that every capability matches exactly one adapter.
pub fn validate_mapping(all: &[Arc<dyn Tool>]) -> Result<(), ResearchError> {
    for capability in Capability::ALL {
        let matches: Vec<&str> = all
            .iter()
            .filter(|tool| capability.matches(tool.as_ref()))
            .map(|tool| tool.name())
            .collect();

        match matches.len() {
            1 => {}
            0 => {
                return Err(ResearchError::ToolMapping(format!(
                    "'{}' matches no tool (expected a name containing '{}')",
                    capability.label(),
                    capability.match_substring()
                )))
            }
            _ => {
                return Err(ResearchError::ToolMapping(format!(
                    "'{}' is ambiguous, matches: {}",
                    capability.label(),
                    matches.join(", ")
                )))
            }
        }
    }
    Ok(())
}
