//! Server-rendered research page.

use std::fmt::Write;

use crate::agent::AgentStep;
use crate::controller::ResearchOutcome;
use crate::tools::Capability;

const EXAMPLE_QUERIES: [&str; 4] = [
    "Explain quantum computing basics using Wikipedia and recent arXiv papers",
    "Calculate prime numbers up to 100 using Python and explain the math",
    "Compare Wikipedia's entries on AI and machine learning",
    "Find recent arXiv papers about neural networks and summarize them",
];

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 18rem; padding: 1.5rem; background: #f4f5f7; }
main { flex: 1; padding: 1.5rem 2rem; max-width: 60rem; }
textarea { width: 100%; height: 150px; }
input[type=password] { width: 100%; }
.answer { background: #e8f5e9; padding: 1rem; border-radius: 4px; white-space: pre-wrap; }
.error { background: #fdecea; padding: 1rem; border-radius: 4px; }
pre { background: #272822; color: #f8f8f2; padding: 1rem; overflow-x: auto; }
"#;

/// Everything the page shows for one render.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub query: &'a str,
    /// Checked capabilities; `None` means a fresh page with defaults checked
    pub selected: Option<&'a [String]>,
    pub outcome: Option<&'a ResearchOutcome>,
}

pub fn render(view: &PageView<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Research Agent</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str("<form method=\"post\" action=\"/\" style=\"display: contents\">\n");

    render_sidebar(&mut html, view.selected);

    html.push_str("<main>\n<h1>Multi-Tool Research Agent</h1>\n");
    html.push_str("<p>Integrated tools: Web Search, Wikipedia, Arxiv, Python REPL</p>\n");
    let _ = write!(
        html,
        "<label for=\"query\">Enter your query:</label>\n<textarea id=\"query\" name=\"query\">{}</textarea>\n",
        escape(view.query)
    );
    html.push_str("<p><button type=\"submit\">Execute</button></p>\n");

    if let Some(outcome) = view.outcome {
        render_outcome(&mut html, outcome);
    }

    html.push_str("<details>\n<summary>Example Queries</summary>\n<ul>\n");
    for example in EXAMPLE_QUERIES {
        let _ = writeln!(html, "<li>\"{}\"</li>", escape(example));
    }
    html.push_str("</ul>\n</details>\n");

    html.push_str(
        "<hr>\n<p><strong>Security Note:</strong></p>\n<ul>\n\
         <li>Python REPL executes real code - use cautiously</li>\n\
         <li>Avoid enabling Python REPL in public deployments</li>\n</ul>\n",
    );

    html.push_str("</main>\n</form>\n</body>\n</html>\n");
    html
}

fn render_sidebar(html: &mut String, selected: Option<&[String]>) {
    html.push_str("<aside>\n<h2>Configuration</h2>\n");
    // The key field is always rendered empty.
    html.push_str(
        "<label for=\"api_key\">OpenAI API Key:</label>\n\
         <input type=\"password\" id=\"api_key\" name=\"api_key\" autocomplete=\"off\">\n",
    );
    html.push_str("<fieldset>\n<legend>Enable Tools:</legend>\n");
    for capability in Capability::ALL {
        let checked = match selected {
            Some(labels) => labels
                .iter()
                .any(|l| l.parse::<Capability>().ok() == Some(capability)),
            None => capability.is_default(),
        };
        let _ = writeln!(
            html,
            "<label><input type=\"checkbox\" name=\"tools\" value=\"{label}\"{checked}> {label}</label><br>",
            label = capability.label(),
            checked = if checked { " checked" } else { "" },
        );
    }
    html.push_str("</fieldset>\n</aside>\n");
}

fn render_outcome(html: &mut String, outcome: &ResearchOutcome) {
    match outcome {
        ResearchOutcome::Succeeded {
            answer,
            template,
            steps,
        } => {
            html.push_str("<h2>Final Answer</h2>\n");
            let _ = writeln!(html, "<div class=\"answer\">{}</div>", escape(answer));
            html.push_str("<h2>Execution Details</h2>\n");
            let _ = writeln!(html, "<pre><code>{}</code></pre>", escape(template));
            if !steps.is_empty() {
                render_steps(html, steps);
            }
        }
        ResearchOutcome::Failed { message, .. } => {
            let _ = writeln!(
                html,
                "<div class=\"error\">Error: {}</div>",
                escape(message)
            );
        }
    }
}

fn render_steps(html: &mut String, steps: &[AgentStep]) {
    html.push_str("<ol class=\"steps\">\n");
    for step in steps {
        let label = if step.action.is_empty() {
            "(invalid format)".to_string()
        } else {
            format!("{}({})", step.action, step.input)
        };
        let _ = writeln!(
            html,
            "<li><code>{}</code><pre>{}</pre></li>",
            escape(&label),
            escape(&step.observation)
        );
    }
    html.push_str("</ol>\n");
}

/// Minimal HTML escaping for text and attribute content.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
