//! Web search through DuckDuckGo's HTML endpoint (no API key needed).

use async_trait::async_trait;

use super::{html_decode, Tool};

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 4;

/// Search the web via DuckDuckGo.
pub struct WebSearch {
    client: reqwest::Client,
}

impl WebSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "duckduckgo_search"
    }

    fn description(&self) -> &str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer questions about current events. Input should be a search query. Output is a list of results with snippet, title and link."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(anyhow::anyhow!("Search query is empty"));
        }

        let url = format!("{}?q={}", DDG_HTML_URL, urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("DuckDuckGo returned HTTP {}", status));
        }

        let html = response.text().await?;
        let results = extract_ddg_results(&html);

        if results.is_empty() {
            Ok("No good DuckDuckGo Search Result was found".to_string())
        } else {
            Ok(results
                .iter()
                .map(SearchResult::render)
                .collect::<Vec<_>>()
                .join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SearchResult {
    title: String,
    snippet: String,
    link: String,
}

impl SearchResult {
    fn render(&self) -> String {
        format!(
            "[snippet: {}, title: {}, link: {}]",
            self.snippet, self.title, self.link
        )
    }
}

/// Extract search results from DuckDuckGo HTML.
fn extract_ddg_results(html: &str) -> Vec<SearchResult> {
    let mut results = Vec::new();

    for chunk in html.split("result__body").skip(1) {
        if results.len() >= MAX_RESULTS {
            break;
        }

        let title = inner_text_after(chunk, "class=\"result__a\"").unwrap_or_default();
        if title.is_empty() {
            continue;
        }

        let snippet = inner_text_after(chunk, "class=\"result__snippet\"").unwrap_or_default();
        let link = inner_text_after(chunk, "class=\"result__url\"").unwrap_or_default();

        results.push(SearchResult {
            title: html_decode(&title),
            snippet: html_decode(&snippet),
            link: normalize_link(&link),
        });
    }

    results
}

/// Text between the end of the tag carrying `marker` and the closing tag.
///
/// Nested inline markup (DuckDuckGo bolds matched terms) is stripped.
fn inner_text_after(chunk: &str, marker: &str) -> Option<String> {
    let rest = chunk.split(marker).nth(1)?;
    let body = &rest[rest.find('>')? + 1..];
    let end = body.find("</a>").or_else(|| body.find("</div>"))?;

    let mut text = String::new();
    let mut in_tag = false;
    for c in body[..end].chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn normalize_link(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("http") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
