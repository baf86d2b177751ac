use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Amount;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance: Amount,
    #[serde(default)]
    pub total_balance: Option<Amount>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Balance as computed by the backend, falling back to the stored balance
    pub fn display_balance(&self) -> Amount {
        self.total_balance.unwrap_or(self.balance)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub balance: Amount,
}

/// Sum of balances across accounts, for dashboard headers
pub fn total_balance(accounts: &[Account]) -> Amount {
    accounts.iter().map(Account::display_balance).sum()
}
