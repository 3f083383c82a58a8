//! Shared fixtures for integration tests.

pub mod backend;

use std::sync::Arc;

use kaiwa::{ApiClient, ClientConfig};

pub use backend::FakeBackend;

/// Base URL the fake backend answers on.
pub const FAKE_BASE_URL: &str = "http://fake.backend/api";

/// An `ApiClient` wired to `backend`.
pub fn api_for(backend: &FakeBackend) -> Arc<ApiClient> {
    Arc::new(ApiClient::with_http(
        ClientConfig::default().with_base_url(FAKE_BASE_URL),
        Arc::new(backend.clone()),
    ))
}
