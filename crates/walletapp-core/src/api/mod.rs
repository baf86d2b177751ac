//! REST API client module for the wallet backend.
//!
//! This module provides the `ApiClient` for talking to the backend's
//! `/auth/` and `/api/` endpoints, and typed resource clients for
//! accounts, categories, transactions and budgets.
//!
//! The backend issues JWT access/refresh token pairs; expired access tokens
//! are renewed transparently on the first 401.

pub mod client;
pub mod error;
pub mod resources;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use error::ApiError;
pub use resources::{Resource, ResourceClient};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
