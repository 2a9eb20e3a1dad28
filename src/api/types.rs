//! API request and response types.

use serde::Serialize;

use crate::tools::Capability;

/// One entry of `GET /api/tools`.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityInfo {
    /// Stable identifier (e.g., "web_search")
    pub id: &'static str,

    /// Label accepted in requests (e.g., "Web Search")
    pub label: &'static str,

    /// Enabled on a fresh page
    pub default: bool,

    /// Adapter this label selects
    pub tool: Option<String>,

    pub description: Option<String>,
}

impl CapabilityInfo {
    pub fn new(capability: Capability) -> Self {
        Self {
            id: capability.id(),
            label: capability.label(),
            default: capability.is_default(),
            tool: None,
            description: None,
        }
    }
}

/// Response for `GET /api/tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<CapabilityInfo>,
}

/// Response for `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the server is up
    pub status: String,

    pub version: String,

    /// Default model for new requests
    pub model: String,
}

/// Submission parsed from the page form.
///
/// The form repeats `tools` once per checked box, which a plain
/// `Form<T>` extractor cannot collect into a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchForm {
    pub api_key: String,
    pub tools: Vec<String>,
    pub query: String,
}

impl ResearchForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "api_key" => form.api_key = value.into_owned(),
                "tools" => form.tools.push(value.into_owned()),
                "query" => form.query = value.into_owned(),
                _ => {}
            }
        }
        form
    }
}
