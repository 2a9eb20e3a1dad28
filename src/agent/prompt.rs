//! Zero-shot ReAct prompt template.

use crate::tools::ToolInfo;

pub const INPUT_PLACEHOLDER: &str = "{input}";
pub const SCRATCHPAD_PLACEHOLDER: &str = "{agent_scratchpad}";

/// Stop sequence keeping the model from inventing its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

const PREFIX: &str = "Answer the following questions as best you can. You have access to the following tools:";

const FORMAT_INSTRUCTIONS: &str = r#"Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question"#;

const SUFFIX: &str = r#"Begin!

Question: {input}
Thought:{agent_scratchpad}"#;

/// Build the template for a tool set.
///
/// Tool descriptions and names are filled in; `{input}` and
/// `{agent_scratchpad}` stay as placeholders for [`render`].
pub fn build_template(tools: &[ToolInfo]) -> String {
    let tool_descriptions = tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_names = tools
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{PREFIX}\n\n{tool_descriptions}\n\n{}\n\n{SUFFIX}",
        FORMAT_INSTRUCTIONS.replace("{tool_names}", &tool_names)
    )
}

/// Fill the per-run placeholders in a single pass, so braces inside the
/// question or an observation are never expanded.
pub fn render(template: &str, input: &str, scratchpad: &str) -> String {
    let mut out = String::with_capacity(template.len() + input.len() + scratchpad.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix(INPUT_PLACEHOLDER) {
            out.push_str(input);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(SCRATCHPAD_PLACEHOLDER) {
            out.push_str(scratchpad);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}
