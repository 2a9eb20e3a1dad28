//! ReAct output parser.
//!
//! Turns one model completion into either a tool call or a final answer:
//!
//! ```text
//! Thought: I should look this up
//! Action: wikipedia
//! Action Input: quantum computing
//! ```
//!
//! or
//!
//! ```text
//! Thought: I now know the final answer
//! Final Answer: ...
//! ```

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

const FINAL_ANSWER_MARKER: &str = "Final Answer:";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .unwrap()
});
static ACTION_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action\s*\d*\s*:").unwrap());
static ACTION_INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").unwrap());

/// What the model decided to do this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    /// Invoke `tool` with `input`.
    Action {
        tool: String,
        input: String,
        /// Raw completion, kept for the scratchpad.
        log: String,
    },
    /// Stop and answer.
    Finish { answer: String, log: String },
}

/// Malformed model output. The message is fed back to the model verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction,

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput,

    #[error("Parsing LLM output produced both a final answer and a parse-able action")]
    AnswerAndAction,

    #[error("Could not parse LLM output: `{0}`")]
    Unparseable(String),
}

/// Parse a single completion.
pub fn parse_output(text: &str) -> Result<AgentDecision, ParseError> {
    let includes_answer = text.contains(FINAL_ANSWER_MARKER);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return Err(ParseError::AnswerAndAction);
        }

        let tool = caps.get(1).map_or("", |m| m.as_str()).trim();
        let input = caps
            .get(2)
            .map_or("", |m| m.as_str())
            .trim()
            .trim_matches('"');

        return Ok(AgentDecision::Action {
            tool: tool.to_string(),
            input: input.to_string(),
            log: text.to_string(),
        });
    }

    if includes_answer {
        let answer = text
            .rsplit(FINAL_ANSWER_MARKER)
            .next()
            .unwrap_or_default()
            .trim();
        return Ok(AgentDecision::Finish {
            answer: answer.to_string(),
            log: text.to_string(),
        });
    }

    if !ACTION_ONLY_RE.is_match(text) {
        Err(ParseError::MissingAction)
    } else if !ACTION_INPUT_RE.is_match(text) {
        Err(ParseError::MissingActionInput)
    } else {
        Err(ParseError::Unparseable(text.trim().to_string()))
    }
}
