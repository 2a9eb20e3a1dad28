//! Scripted model and tool doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::ResearchError;
use crate::llm::{ChatMessage, LlmClient};
use crate::tools::Tool;

/// Model double that replays canned completions and records prompts.
pub struct ScriptedLlm {
    config: LlmConfig,
    script: Mutex<VecDeque<String>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            config: LlmConfig::default(),
            script: Mutex::new(responses.into_iter().map(String::from).collect()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `response`.
    pub fn repeating(response: &str) -> Self {
        Self {
            repeat: Some(response.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn config(&self) -> &LlmConfig {
        &self.config
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        _stop: &[String],
    ) -> Result<String, ResearchError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return Ok(next);
        }
        self.repeat
            .clone()
            .ok_or_else(|| ResearchError::Llm("script exhausted".to_string()))
    }
}

/// Tool that echoes its input.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes the input back."
    }

    async fn invoke(&self, input: &str) -> anyhow::Result<String> {
        Ok(format!("echo: {}", input))
    }
}

/// Tool that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "broken"
    }

    fn description(&self) -> &str {
        "Always fails."
    }

    async fn invoke(&self, _input: &str) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("backend unreachable"))
    }
}

pub fn echo_tools() -> Vec<std::sync::Arc<dyn Tool>> {
    vec![std::sync::Arc::new(EchoTool)]
}
