//! # Research Agent
//!
//! A multi-tool research assistant behind a small web page.
//!
//! This library provides:
//! - An HTTP surface with a research page and a JSON API
//! - Four tool adapters: DuckDuckGo web search, Wikipedia, arXiv and a Python runner
//! - A zero-shot ReAct reasoning loop over an OpenAI-compatible chat model
//!
//! ## Architecture
//!
//! A request flows through the interaction controller:
//! 1. Validate the caller's credential, question and tool labels
//! 2. Select the adapters matching the enabled labels
//! 3. Fetch or build a cached reasoning loop for that tool set and model
//! 4. Run the loop until it produces a final answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_agent::{config::Config, controller::{InteractionController, ResearchRequest}};
//! use research_agent::tools::ToolRegistry;
//!
//! let config = Config::from_env()?;
//! let registry = ToolRegistry::build_all(&config.tools)?;
//! let controller = InteractionController::from_config(&config, registry);
//! let outcome = controller
//!     .handle(ResearchRequest {
//!         api_key: "sk-...".into(),
//!         tools: vec!["Wikipedia".into()],
//!         query: "Explain quantum computing basics".into(),
//!     })
//!     .await;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod llm;
pub mod tools;

pub use config::Config;
pub use error::{ErrorKind, ResearchError};
