//! Authentication module for managing tokens and the user session.
//!
//! This module provides:
//! - `TokenStore`: the persisted access/refresh token pair
//! - `TokenBackend`: file, keychain and in-memory storage for that pair
//! - `SessionContext`: login, register, logout and restore-on-start
//!
//! Tokens are kept until logout or until a refresh attempt fails.

pub mod session;
pub mod tokens;

pub use session::{Session, SessionContext, SessionState};
pub use tokens::{FileBackend, KeyringBackend, MemoryBackend, TokenBackend, TokenPair, TokenStore};
