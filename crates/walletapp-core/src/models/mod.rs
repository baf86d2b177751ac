//! Data models for wallet backend entities.
//!
//! This module contains the wire types exchanged with the backend:
//!
//! - `User`, `Credentials`, `Registration`: authentication payloads
//! - `Account`, `Category`, `Transaction`, `Budget`: CRUD resources
//! - `TransactionReport`, `VisualizationData`: read-only aggregates
//! - `Amount`: decimal values that arrive as strings or numbers

pub mod account;
pub mod amount;
pub mod budget;
pub mod category;
pub mod report;
pub mod transaction;
pub mod user;

pub use account::{Account, NewAccount};
pub use amount::Amount;
pub use budget::{Budget, BudgetProgress, NewBudget};
pub use category::{Category, NewCategory};
pub use report::{ReportRange, TransactionReport, VisualizationData};
pub use transaction::{
    daily_flows, DailyFlow, NewTransaction, Transaction, TransactionFilter, TransactionType,
};
pub use user::{Credentials, Registration, User};
