//! Memoization of constructed reasoning loops.
//!
//! Loops are keyed by content, not object identity: the sorted tool names,
//! the model settings, the loop limits and a fingerprint of the credential.
//! Requests with different keys never share a loop, so one caller's API key
//! is never used for another caller's query.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::config::LoopLimits;
use crate::error::ResearchError;
use crate::llm::{Credential, LlmClient};
use crate::tools::Tool;

use super::agent_loop::ReasoningLoop;

/// Content hash identifying an agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentKey(String);

impl AgentKey {
    pub fn new(
        tools: &[Arc<dyn Tool>],
        llm: &dyn LlmClient,
        limits: LoopLimits,
        credential: &Credential,
    ) -> Self {
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();

        let config = llm.config();
        let mut hasher = Sha256::new();
        hasher.update(format!("tools={}\n", names.join(",")));
        hasher.update(format!("model={}\n", config.model));
        hasher.update(format!("base_url={}\n", config.base_url));
        hasher.update(format!("temperature={}\n", config.temperature));
        hasher.update(format!("max_tokens={}\n", config.max_tokens));
        hasher.update(format!("max_iterations={}\n", limits.max_iterations));
        hasher.update(format!("max_parse_retries={}\n", limits.max_parse_retries));
        hasher.update(format!("credential={}\n", credential.fingerprint()));

        Self(hex::encode(hasher.finalize()))
    }

    /// Abbreviated form for logs.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

struct CacheInner {
    loops: HashMap<AgentKey, Arc<ReasoningLoop>>,
    insertion_order: VecDeque<AgentKey>,
}

/// Shared cache of reasoning loops, oldest entry evicted first when full.
pub struct AgentCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

impl AgentCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                loops: HashMap::new(),
                insertion_order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached loop for this configuration, building it if needed.
    pub async fn get_or_create(
        &self,
        tools: Vec<Arc<dyn Tool>>,
        llm: Arc<dyn LlmClient>,
        limits: LoopLimits,
        credential: &Credential,
    ) -> Result<Arc<ReasoningLoop>, ResearchError> {
        let key = AgentKey::new(&tools, llm.as_ref(), limits, credential);

        if let Some(existing) = self.inner.read().await.loops.get(&key) {
            tracing::debug!(key = %key.short(), "Reusing cached agent");
            return Ok(existing.clone());
        }

        let mut inner = self.inner.write().await;
        // Another request may have built it while we waited for the lock.
        if let Some(existing) = inner.loops.get(&key) {
            return Ok(existing.clone());
        }

        let agent = Arc::new(ReasoningLoop::new(llm, tools, limits)?);
        tracing::info!(
            key = %key.short(),
            tools = ?agent.tool_names(),
            "Constructed new agent"
        );

        while inner.loops.len() >= self.capacity {
            let Some(oldest) = inner.insertion_order.pop_front() else {
                break;
            };
            inner.loops.remove(&oldest);
        }

        inner.loops.insert(key.clone(), agent.clone());
        inner.insertion_order.push_back(key);
        Ok(agent)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.loops.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{echo_tools, FailingTool, ScriptedLlm};
    use crate::config::LlmConfig;

    fn llm() -> Arc<dyn LlmClient> {
        Arc::new(ScriptedLlm::repeating("Final Answer: ok"))
    }

    fn both_tools() -> Vec<Arc<dyn Tool>> {
        let mut tools = echo_tools();
        tools.push(Arc::new(FailingTool));
        tools
    }

    #[tokio::test]
    async fn identical_configuration_reuses_instance() {
        let cache = AgentCache::new(8);
        let credential = Credential::new("sk-a");

        let first = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &credential)
            .await
            .unwrap();
        let second = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &credential)
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn different_tool_set_builds_new_instance() {
        let cache = AgentCache::new(8);
        let credential = Credential::new("sk-a");

        let first = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &credential)
            .await
            .unwrap();
        let second = cache
            .get_or_create(both_tools(), llm(), LoopLimits::default(), &credential)
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn different_credentials_never_share() {
        let cache = AgentCache::new(8);
        let first = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &Credential::new("sk-a"))
            .await
            .unwrap();
        let second = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &Credential::new("sk-b"))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn model_settings_are_part_of_key() {
        let credential = Credential::new("sk-a");
        let warm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm::new(vec![]).with_config(LlmConfig {
            temperature: 0.9,
            ..LlmConfig::default()
        }));

        let tools = echo_tools();
        let a = AgentKey::new(&tools, llm().as_ref(), LoopLimits::default(), &credential);
        let b = AgentKey::new(&tools, warm.as_ref(), LoopLimits::default(), &credential);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn tool_order_does_not_change_key() {
        let credential = Credential::new("sk-a");
        let forward = both_tools();
        let mut reversed = both_tools();
        reversed.reverse();

        let a = AgentKey::new(&forward, llm().as_ref(), LoopLimits::default(), &credential);
        let b = AgentKey::new(&reversed, llm().as_ref(), LoopLimits::default(), &credential);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn key_does_not_contain_credential() {
        let credential = Credential::new("sk-secret-value");
        let key = AgentKey::new(&echo_tools(), llm().as_ref(), LoopLimits::default(), &credential);
        assert!(!format!("{:?}", key).contains("sk-secret-value"));
    }

    #[tokio::test]
    async fn oldest_entry_is_evicted_at_capacity() {
        let cache = AgentCache::new(1);
        let first = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &Credential::new("sk-a"))
            .await
            .unwrap();
        cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &Credential::new("sk-b"))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);

        let again = cache
            .get_or_create(echo_tools(), llm(), LoopLimits::default(), &Credential::new("sk-a"))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
    }

    #[tokio::test]
    async fn empty_tool_set_is_not_cached() {
        let cache = AgentCache::new(4);
        let result = cache
            .get_or_create(vec![], llm(), LoopLimits::default(), &Credential::new("sk-a"))
            .await;
        assert!(matches!(result, Err(ResearchError::NoToolsSelected)));
        assert!(cache.is_empty().await);
    }
}
