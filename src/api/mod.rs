//! HTTP API for the research agent.
//!
//! ## Endpoints
//!
//! - `GET /` - Research page
//! - `POST /` - Submit the page form, re-render with the outcome
//! - `POST /api/research` - Run a research request (JSON)
//! - `GET /api/tools` - List capabilities and the adapters they select
//! - `GET /api/health` - Health check

mod page;
mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
