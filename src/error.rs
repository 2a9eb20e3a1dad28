//! Error taxonomy for a research request.
//!
//! Every failure is classified into one of three kinds so the HTTP layer can
//! pick a status code and the page can render a single error block.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a [`ResearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected before any tool or model was constructed.
    Configuration,
    /// A tool adapter or the model client could not be initialized.
    Construction,
    /// The reasoning loop failed while running.
    Execution,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Construction => write!(f, "construction"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("OpenAI API key is required")]
    MissingCredential,

    #[error("No tools selected! Please enable at least one tool.")]
    NoToolsSelected,

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Unknown tool label: {0}")]
    UnknownCapability(String),

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Tool mapping error: {0}")]
    ToolMapping(String),

    #[error("Failed to construct {0}")]
    Construction(String),

    #[error("Language model error: {0}")]
    Llm(String),

    #[error("Could not parse model output after {0} attempts")]
    ParseRetriesExhausted(usize),

    #[error("Agent stopped after {0} iterations without a final answer")]
    MaxIterations(usize),
}

impl ResearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential
            | Self::NoToolsSelected
            | Self::EmptyQuery
            | Self::UnknownCapability(_)
            | Self::InvalidRequest(_)
            | Self::ToolMapping(_) => ErrorKind::Configuration,
            Self::Construction(_) => ErrorKind::Construction,
            Self::Llm(_)
            | Self::ParseRetriesExhausted(_)
            | Self::MaxIterations(_) => ErrorKind::Execution,
        }
    }
}
