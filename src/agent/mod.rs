//! Agent module - the zero-shot ReAct reasoning loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Render the prompt with tool descriptions, the question and the scratchpad
//! 2. Ask the model for the next Thought/Action or a Final Answer
//! 3. If it picks a tool, invoke it and append the observation to the scratchpad
//! 4. Repeat until a final answer, the iteration bound or the parse-retry budget

mod agent_loop;
mod cache;
mod prompt;
mod react;

#[cfg(test)]
pub(crate) mod testing;

pub use agent_loop::{AgentRun, AgentStep, ReasoningLoop, StepKind};
pub use cache::{AgentCache, AgentKey};
pub use prompt::{build_template, render};
pub use react::{parse_output, AgentDecision, ParseError};
