//! Core library for the wallet client.
//!
//! Talks to the wallet backend on behalf of a front end: keeps the JWT
//! token pair, renews expired access tokens, tracks the logged-in user and
//! exposes typed clients for accounts, categories, transactions and budgets.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionContext, TokenPair, TokenStore};
pub use config::Config;
