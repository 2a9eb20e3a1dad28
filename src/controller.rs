//! Interaction controller.
//!
//! Turns one research request (credential, tool labels, question) into a
//! displayable outcome. Validation happens before anything is constructed;
//! every later failure is converted into a `Failed` outcome with no partial
//! answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentCache, AgentRun, AgentStep};
use crate::config::{Config, LlmConfig, LoopLimits};
use crate::error::{ErrorKind, ResearchError};
use crate::llm::{Credential, LlmClient, OpenAiClient};
use crate::tools::selector::parse_selection;
use crate::tools::{select_tools, Tool, ToolRegistry};

/// Source of the full adapter list.
pub trait ToolProvider: Send + Sync {
    fn build_all(&self) -> Result<Vec<Arc<dyn Tool>>, ResearchError>;
}

impl ToolProvider for ToolRegistry {
    fn build_all(&self) -> Result<Vec<Arc<dyn Tool>>, ResearchError> {
        Ok(self.tools().to_vec())
    }
}

/// Builds a model client for a caller's credential.
pub trait ModelProvider: Send + Sync {
    fn build(
        &self,
        credential: Credential,
        config: LlmConfig,
    ) -> Result<Arc<dyn LlmClient>, ResearchError>;
}

/// OpenAI-compatible chat completions.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiProvider;

impl ModelProvider for OpenAiProvider {
    fn build(
        &self,
        credential: Credential,
        config: LlmConfig,
    ) -> Result<Arc<dyn LlmClient>, ResearchError> {
        let client = OpenAiClient::new(credential, config)?;
        Ok(Arc::new(client))
    }
}

/// One submission from the page or the JSON API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResearchRequest {
    #[serde(default)]
    pub api_key: String,

    /// Capability labels, e.g. "Web Search"
    #[serde(default)]
    pub tools: Vec<String>,

    #[serde(default)]
    pub query: String,
}

/// What the user sees after a submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResearchOutcome {
    Succeeded {
        answer: String,
        /// Prompt template of the loop that answered
        template: String,
        steps: Vec<AgentStep>,
    },
    Failed {
        kind: ErrorKind,
        #[serde(rename = "error")]
        message: String,
    },
}

impl ResearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Succeeded { answer, .. } => Some(answer),
            Self::Failed { .. } => None,
        }
    }
}

impl From<ResearchError> for ResearchOutcome {
    fn from(err: ResearchError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Lifecycle of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Validating,
    ToolFiltering,
    AgentReady,
    Executing,
    Succeeded,
    Failed,
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::ToolFiltering => "tool_filtering",
            Self::AgentReady => "agent_ready",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

pub struct InteractionController {
    tools: Arc<dyn ToolProvider>,
    models: Arc<dyn ModelProvider>,
    llm_config: LlmConfig,
    limits: LoopLimits,
    cache: AgentCache,
}

impl InteractionController {
    pub fn new(
        tools: Arc<dyn ToolProvider>,
        models: Arc<dyn ModelProvider>,
        llm_config: LlmConfig,
        limits: LoopLimits,
        cache_capacity: usize,
    ) -> Self {
        Self {
            tools,
            models,
            llm_config,
            limits,
            cache: AgentCache::new(cache_capacity),
        }
    }

    /// Controller over a prebuilt registry and the OpenAI client.
    pub fn from_config(config: &Config, registry: ToolRegistry) -> Self {
        Self::new(
            Arc::new(registry),
            Arc::new(OpenAiProvider),
            config.llm.clone(),
            config.limits,
            config.agent_cache_capacity,
        )
    }

    pub fn cache(&self) -> &AgentCache {
        &self.cache
    }

    /// Handle one submission to completion.
    pub async fn handle(&self, request: ResearchRequest) -> ResearchOutcome {
        let request_id = Uuid::new_v4();
        enter(request_id, RequestPhase::Idle);

        match self.process(request_id, request).await {
            Ok((run, template)) => {
                enter(request_id, RequestPhase::Succeeded);
                tracing::info!(
                    %request_id,
                    iterations = run.iterations,
                    steps = run.steps.len(),
                    "Research request succeeded"
                );
                ResearchOutcome::Succeeded {
                    answer: run.answer,
                    template,
                    steps: run.steps,
                }
            }
            Err(e) => {
                enter(request_id, RequestPhase::Failed);
                tracing::warn!(%request_id, kind = %e.kind(), "Research request failed: {}", e);
                e.into()
            }
        }
    }

    async fn process(
        &self,
        request_id: Uuid,
        request: ResearchRequest,
    ) -> Result<(AgentRun, String), ResearchError> {
        enter(request_id, RequestPhase::Validating);

        let credential = Credential::new(request.api_key);
        if credential.is_blank() {
            return Err(ResearchError::MissingCredential);
        }
        if request.query.trim().is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        let labels = parse_selection(&request.tools)?;

        enter(request_id, RequestPhase::ToolFiltering);
        let all = self.tools.build_all()?;
        let selected = select_tools(&labels, &all);
        if selected.is_empty() {
            return Err(ResearchError::NoToolsSelected);
        }

        let llm = self.models.build(credential.clone(), self.llm_config.clone())?;
        let agent = self
            .cache
            .get_or_create(selected, llm, self.limits, &credential)
            .await?;
        enter(request_id, RequestPhase::AgentReady);

        tracing::info!(
            %request_id,
            tools = ?agent.tool_names(),
            "Running research query"
        );
        enter(request_id, RequestPhase::Executing);
        let run = agent.run(&request.query).await?;

        Ok((run, agent.prompt_template().to_string()))
    }
}

fn enter(request_id: Uuid, phase: RequestPhase) {
    tracing::debug!(%request_id, %phase, "Request phase");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::agent::testing::ScriptedLlm;

    struct StubTool(&'static str);

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "stub"
        }

        async fn invoke(&self, input: &str) -> anyhow::Result<String> {
            Ok(format!("{} result for {}", self.0, input))
        }
    }

    #[derive(Default)]
    struct MockTools {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ToolProvider for MockTools {
        fn build_all(&self) -> Result<Vec<Arc<dyn Tool>>, ResearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ResearchError::Construction("arxiv client".to_string()));
            }
            Ok(vec![
                Arc::new(StubTool("duckduckgo_search")),
                Arc::new(StubTool("wikipedia")),
                Arc::new(StubTool("arxiv")),
                Arc::new(StubTool("python_repl")),
            ])
        }
    }

    struct MockModels {
        llm: Arc<ScriptedLlm>,
        calls: AtomicUsize,
    }

    impl MockModels {
        fn new(llm: ScriptedLlm) -> Self {
            Self {
                llm: Arc::new(llm),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ModelProvider for MockModels {
        fn build(
            &self,
            _credential: Credential,
            _config: LlmConfig,
        ) -> Result<Arc<dyn LlmClient>, ResearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.llm.clone())
        }
    }

    fn controller(
        tools: Arc<MockTools>,
        models: Arc<MockModels>,
    ) -> InteractionController {
        InteractionController::new(
            tools,
            models,
            LlmConfig::default(),
            LoopLimits::default(),
            8,
        )
    }

    fn request(api_key: &str, tools: &[&str], query: &str) -> ResearchRequest {
        ResearchRequest {
            api_key: api_key.to_string(),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            query: query.to_string(),
        }
    }

    fn failed_kind(outcome: &ResearchOutcome) -> Option<ErrorKind> {
        match outcome {
            ResearchOutcome::Failed { kind, .. } => Some(*kind),
            ResearchOutcome::Succeeded { .. } => None,
        }
    }

    #[tokio::test]
    async fn missing_credential_constructs_nothing() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools.clone(), models.clone());

        let outcome = controller
            .handle(request("   ", &["Web Search"], "2+2"))
            .await;

        match outcome {
            ResearchOutcome::Failed { kind, message } => {
                assert_eq!(kind, ErrorKind::Configuration);
                assert_eq!(message, "OpenAI API key is required");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(tools.calls.load(Ordering::SeqCst), 0);
        assert_eq!(models.calls.load(Ordering::SeqCst), 0);
        assert!(controller.cache().is_empty().await);
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools.clone(), models);

        let outcome = controller.handle(request("sk-test", &["Wikipedia"], "  ")).await;
        assert_eq!(failed_kind(&outcome), Some(ErrorKind::Configuration));
        assert_eq!(tools.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_tools_selected_fails_before_model_is_built() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools, models.clone());

        let outcome = controller.handle(request("sk-test", &[], "2+2")).await;
        match outcome {
            ResearchOutcome::Failed { message, .. } => {
                assert_eq!(message, "No tools selected! Please enable at least one tool.");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(models.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_label_is_a_configuration_error() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools, models);

        let outcome = controller
            .handle(request("sk-test", &["Calculator"], "2+2"))
            .await;
        assert_eq!(failed_kind(&outcome), Some(ErrorKind::Configuration));
    }

    #[tokio::test]
    async fn successful_run_displays_exact_answer() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::new(vec![
            " Simple arithmetic.\nFinal Answer: 4",
        ])));
        let controller = controller(tools, models);

        let outcome = controller
            .handle(request("sk-test", &["Python REPL"], "What is 2+2?"))
            .await;

        match outcome {
            ResearchOutcome::Succeeded {
                answer,
                template,
                steps,
            } => {
                assert_eq!(answer, "4");
                assert!(template.contains("python_repl: stub"));
                assert!(!template.contains("wikipedia"));
                assert!(steps.is_empty());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn tool_steps_are_reported() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::new(vec![
            " Look it up.\nAction: wikipedia\nAction Input: Rust",
            " I now know the final answer\nFinal Answer: a language",
        ])));
        let controller = controller(tools, models);

        let outcome = controller
            .handle(request("sk-test", &["Web Search", "Wikipedia"], "What is Rust?"))
            .await;

        match outcome {
            ResearchOutcome::Succeeded { answer, steps, .. } => {
                assert_eq!(answer, "a language");
                assert_eq!(steps.len(), 1);
                assert_eq!(steps[0].action, "wikipedia");
                assert_eq!(steps[0].observation, "wikipedia result for Rust");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn execution_failure_yields_no_answer() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::new(vec![])));
        let controller = controller(tools, models);

        let outcome = controller
            .handle(request("sk-test", &["Arxiv"], "latest papers"))
            .await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.answer(), None);
        assert_eq!(failed_kind(&outcome), Some(ErrorKind::Execution));
    }

    #[tokio::test]
    async fn registry_failure_is_a_construction_error() {
        let tools = Arc::new(MockTools {
            fail: true,
            ..MockTools::default()
        });
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools, models);

        let outcome = controller.handle(request("sk-test", &["Arxiv"], "q")).await;
        assert_eq!(failed_kind(&outcome), Some(ErrorKind::Construction));
    }

    #[tokio::test]
    async fn identical_requests_reuse_cached_agent() {
        let tools = Arc::new(MockTools::default());
        let models = Arc::new(MockModels::new(ScriptedLlm::repeating("Final Answer: 4")));
        let controller = controller(tools, models);

        for _ in 0..2 {
            let outcome = controller
                .handle(request("sk-test", &["Web Search", "Wikipedia"], "2+2"))
                .await;
            assert_eq!(outcome.answer(), Some("4"));
        }
        assert_eq!(controller.cache().len().await, 1);

        controller
            .handle(request("sk-test", &["Arxiv"], "2+2"))
            .await;
        assert_eq!(controller.cache().len().await, 2);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let failed: ResearchOutcome = ResearchError::NoToolsSelected.into();
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "configuration");
        assert_eq!(
            json["error"],
            "No tools selected! Please enable at least one tool."
        );
    }
}
