//! Core reasoning loop implementation.

use std::sync::Arc;

use serde::Serialize;

use crate::config::LoopLimits;
use crate::error::ResearchError;
use crate::llm::{ChatMessage, LlmClient};
use crate::tools::{self, Tool};

use super::prompt::{build_template, render, OBSERVATION_STOP};
use super::react::{parse_output, AgentDecision};

/// Kind of a transcript step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The model called a tool
    ToolCall,
    /// The model's output could not be parsed and was sent back for correction
    InvalidFormat,
}

/// One think/act/observe round.
#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    pub kind: StepKind,

    /// Tool name (empty for invalid-format steps)
    pub action: String,

    /// Tool input (empty for invalid-format steps)
    pub input: String,

    /// What was fed back to the model
    pub observation: String,
}

/// Result of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    pub answer: String,
    pub steps: Vec<AgentStep>,
    pub iterations: usize,
}

/// A zero-shot ReAct agent over a fixed tool set.
///
/// `run` keeps its transcript on the stack, so a single instance can serve
/// concurrent runs.
pub struct ReasoningLoop {
    llm: Arc<dyn LlmClient>,
    tools: Vec<Arc<dyn Tool>>,
    limits: LoopLimits,
    template: String,
}

impl std::fmt::Debug for ReasoningLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningLoop")
            .field("model", &self.llm.config().model)
            .field("tools", &self.tool_names())
            .field("limits", &self.limits)
            .finish()
    }
}

impl ReasoningLoop {
    /// Create a loop over `tools`.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError::NoToolsSelected` if `tools` is empty.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Vec<Arc<dyn Tool>>,
        limits: LoopLimits,
    ) -> Result<Self, ResearchError> {
        if tools.is_empty() {
            return Err(ResearchError::NoToolsSelected);
        }

        let template = build_template(&tools::describe(&tools));
        Ok(Self {
            llm,
            tools,
            limits,
            template,
        })
    }

    /// The prompt template driving each step, with tools filled in.
    pub fn prompt_template(&self) -> &str {
        &self.template
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Run the loop until the model produces a final answer.
    pub async fn run(&self, query: &str) -> Result<AgentRun, ResearchError> {
        let stop = vec![OBSERVATION_STOP.to_string()];
        let mut scratchpad = String::new();
        let mut steps = Vec::new();
        let mut parse_failures = 0usize;

        for iteration in 0..self.limits.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let prompt = render(&self.template, query, &scratchpad);
            let completion = self
                .llm
                .chat_completion(&[ChatMessage::user(prompt)], &stop)
                .await?;

            let (step, log) = match parse_output(&completion) {
                Ok(AgentDecision::Finish { answer, .. }) => {
                    tracing::info!(
                        iterations = iteration + 1,
                        steps = steps.len(),
                        "Agent produced final answer"
                    );
                    return Ok(AgentRun {
                        answer,
                        steps,
                        iterations: iteration + 1,
                    });
                }
                Ok(AgentDecision::Action { tool, input, log }) => {
                    let observation = self.execute_tool(&tool, &input).await;
                    let step = AgentStep {
                        timestamp: now(),
                        kind: StepKind::ToolCall,
                        action: tool,
                        input,
                        observation,
                    };
                    (step, log)
                }
                Err(e) => {
                    parse_failures += 1;
                    tracing::warn!(
                        attempt = parse_failures,
                        "Could not parse model output: {}",
                        e
                    );
                    if parse_failures > self.limits.max_parse_retries {
                        return Err(ResearchError::ParseRetriesExhausted(parse_failures));
                    }
                    let step = AgentStep {
                        timestamp: now(),
                        kind: StepKind::InvalidFormat,
                        action: String::new(),
                        input: String::new(),
                        observation: e.to_string(),
                    };
                    (step, completion)
                }
            };

            scratchpad.push_str(&log);
            scratchpad.push_str("\nObservation: ");
            scratchpad.push_str(&step.observation);
            scratchpad.push_str("\nThought:");
            steps.push(step);
        }

        Err(ResearchError::MaxIterations(self.limits.max_iterations))
    }

    /// Invoke a tool and turn the outcome into observation text.
    ///
    /// Tool failures are reported to the model rather than aborting the run.
    async fn execute_tool(&self, name: &str, input: &str) -> String {
        let Some(tool) = self.find_tool(name) else {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tool_names().join(", ")
            );
        };

        tracing::info!(tool = tool.name(), "Calling tool");
        match tool.invoke(input).await {
            Ok(output) => {
                tracing::debug!(
                    tool = tool.name(),
                    "Tool result: {}",
                    truncate_for_log(&output, 200)
                );
                output
            }
            Err(e) => {
                tracing::warn!(tool = tool.name(), "Tool failed: {}", e);
                format!("Error: {}", e)
            }
        }
    }

    fn find_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        let name = name.trim();
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .or_else(|| self.tools.iter().find(|t| t.name().eq_ignore_ascii_case(name)))
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &s[..cut])
}
