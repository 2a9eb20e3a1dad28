//! Academic paper lookup through the arXiv export API.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use super::{html_decode, truncate_chars, Tool};

const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
const MAX_QUERY_CHARS: usize = 300;
const DOC_CONTENT_CHARS_MAX: usize = 4000;

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap());
static PUBLISHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<published>(\d{4}-\d{2}-\d{2})[^<]*</published>").unwrap());
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap());
static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>").unwrap());
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").unwrap());
static ARXIV_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}\.\d{4,5}(v\d+)?|[a-z\-]+(\.[A-Z]{2})?/\d{7}(v\d+)?)$").unwrap()
});

/// Search arXiv for papers and return their metadata and abstracts.
pub struct ArxivSearch {
    client: reqwest::Client,
    top_k_results: usize,
}

impl ArxivSearch {
    pub fn new(client: reqwest::Client, top_k_results: usize) -> Self {
        Self {
            client,
            top_k_results,
        }
    }
}

#[async_trait]
impl Tool for ArxivSearch {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "A wrapper around Arxiv.org. Useful for when you need to answer questions about Physics, Mathematics, Computer Science, Quantitative Biology, Quantitative Finance, Statistics, Electrical Engineering, and Economics from scientific articles on arxiv.org. Input should be a search query or an arXiv identifier."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        let query = truncate_chars(input.trim(), MAX_QUERY_CHARS);
        if query.is_empty() {
            return Err(anyhow::anyhow!("Search query is empty"));
        }

        let limit = self.top_k_results.to_string();
        let mut params = vec![("max_results", limit.as_str())];
        if ARXIV_ID_RE.is_match(&query) {
            params.push(("id_list", query.as_str()));
        } else {
            params.push(("search_query", query.as_str()));
        }

        let feed = self
            .client
            .get(ARXIV_API_URL)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let papers = parse_feed(&feed);
        if papers.is_empty() {
            return Ok("No good Arxiv Result was found".to_string());
        }

        let text = papers
            .iter()
            .map(Paper::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(truncate_chars(&text, DOC_CONTENT_CHARS_MAX))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Paper {
    published: String,
    title: String,
    authors: Vec<String>,
    summary: String,
}

impl Paper {
    fn render(&self) -> String {
        format!(
            "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
            self.published,
            self.title,
            self.authors.join(", "),
            self.summary
        )
    }
}

/// Parse the Atom feed returned by the export API.
///
/// The feed-level `<title>` lives outside `<entry>` so it never leaks into a paper.
fn parse_feed(feed: &str) -> Vec<Paper> {
    ENTRY_RE
        .captures_iter(feed)
        .filter_map(|caps| {
            let entry = caps.get(1)?.as_str();
            let title = clean(TITLE_RE.captures(entry)?.get(1)?.as_str());
            // arXiv reports bad id_list lookups as an entry titled "Error".
            if title == "Error" {
                return None;
            }

            let published = PUBLISHED_RE
                .captures(entry)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let summary = SUMMARY_RE
                .captures(entry)
                .and_then(|c| c.get(1))
                .map(|m| clean(m.as_str()))
                .unwrap_or_default();
            let authors = AUTHOR_RE
                .captures_iter(entry)
                .filter_map(|c| c.get(1))
                .map(|m| clean(m.as_str()))
                .collect();

            Some(Paper {
                published,
                title,
                authors,
                summary,
            })
        })
        .collect()
}

fn clean(raw: &str) -> String {
    html_decode(&raw.split_whitespace().collect::<Vec<_>>().join(" "))
}
