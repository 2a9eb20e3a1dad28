//! Wikipedia lookup through the MediaWiki API.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use super::{truncate_chars, Tool};

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const MAX_QUERY_CHARS: usize = 300;

/// Search Wikipedia and return the intro of the top pages.
pub struct WikipediaSearch {
    client: reqwest::Client,
    top_k_results: usize,
    doc_content_chars_max: usize,
}

impl WikipediaSearch {
    pub fn new(
        client: reqwest::Client,
        top_k_results: usize,
        doc_content_chars_max: usize,
    ) -> Self {
        Self {
            client,
            top_k_results,
            doc_content_chars_max,
        }
    }

    async fn search_titles(&self, query: &str) -> anyhow::Result<Vec<String>> {
        let limit = self.top_k_results.to_string();
        let response: SearchResponse = self
            .client
            .get(WIKIPEDIA_API_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    async fn page_summary(&self, title: &str) -> anyhow::Result<Option<String>> {
        let response: ExtractResponse = self
            .client
            .get(WIKIPEDIA_API_URL)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(first_extract(response))
    }
}

#[async_trait]
impl Tool for WikipediaSearch {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "A wrapper around Wikipedia. Useful for when you need to answer general questions about people, places, companies, facts, historical events, or other subjects. Input should be a search query."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let query = truncate_chars(input.trim(), MAX_QUERY_CHARS);
        if query.is_empty() {
            return Err(anyhow::anyhow!("Search query is empty"));
        }

        let titles = self.search_titles(&query).await?;
        let summaries = join_all(titles.iter().map(|t| self.page_summary(t))).await;

        let mut pages = Vec::new();
        for (title, summary) in titles.iter().zip(summaries) {
            match summary {
                Ok(Some(text)) => pages.push((title.clone(), text)),
                Ok(None) => {}
                Err(e) => tracing::warn!(page = %title, "Failed to load Wikipedia page: {}", e),
            }
        }

        Ok(format_pages(&pages, self.doc_content_chars_max))
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Deserialize)]
struct ExtractQuery {
    pages: HashMap<String, ExtractPage>,
}

#[derive(Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

fn first_extract(response: ExtractResponse) -> Option<String> {
    response
        .query?
        .pages
        .into_values()
        .filter_map(|p| p.extract)
        .map(|e| e.trim().to_string())
        .find(|e| !e.is_empty())
}

fn format_pages(pages: &[(String, String)], max_chars: usize) -> String {
    if pages.is_empty() {
        return "No good Wikipedia Search Result was found".to_string();
    }

    let text = pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n");

    truncate_chars(&text, max_chars)
}
