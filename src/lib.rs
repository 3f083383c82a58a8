//! kaiwa - client library for a threaded AI chat backend
//!
//! The layers, leaf first:
//! - [`traits`] / [`adapters`]: the `HttpClient` seam and its reqwest and mock implementations
//! - [`api`]: one method per backend resource
//! - [`store`]: thread and message caches with per-request status
//! - [`session`]: route-driven orchestration of both stores
//! - [`cli`]: the `kaiwa` command-line front end

pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod routing;
pub mod session;
pub mod store;
pub mod traits;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use session::ChatSession;
pub use store::{MessageStore, StoreError, StoreResult, ThreadStore};
