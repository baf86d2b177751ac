use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Amount;
use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "IN")]
    Income,
    #[serde(rename = "OUT")]
    Expense,
    #[serde(rename = "TRANSFER")]
    Transfer,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "Income"),
            TransactionType::Expense => write!(f, "Expense"),
            TransactionType::Transfer => write!(f, "Transfer"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" | "INCOME" => Ok(TransactionType::Income),
            "OUT" | "EXPENSE" => Ok(TransactionType::Expense),
            "TRANSFER" => Ok(TransactionType::Transfer),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account: i64,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub category: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub amount: Amount,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub to_account: Option<i64>,
}

impl Transaction {
    /// Amount with a sign prefix: `+` for income, `-` otherwise
    pub fn signed_amount(&self) -> String {
        let sign = if self.kind == TransactionType::Income { '+' } else { '-' };
        format!("{}{}", sign, self.amount.abs())
    }

    pub fn category_display(&self) -> String {
        self.category_name.clone().unwrap_or_else(|| "-".to_string())
    }
}

/// Newest first, the order transaction lists are shown in
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub account: i64,
    pub category: Option<i64>,
    pub amount: Amount,
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub to_account: Option<i64>,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.amount.is_positive() {
            return Err(ApiError::InvalidInput("Amount must be positive".to_string()));
        }
        if self.kind == TransactionType::Transfer {
            match self.to_account {
                None => {
                    return Err(ApiError::InvalidInput(
                        "Transfer transactions require a destination account".to_string(),
                    ))
                }
                Some(to) if to == self.account => {
                    return Err(ApiError::InvalidInput(
                        "Transfer destination must differ from the source account".to_string(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Query parameters forwarded to `GET /api/transactions/`.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account: Option<i64>,
    pub category: Option<i64>,
    pub kind: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(account) = self.account {
            query.push(("account".to_string(), account.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category".to_string(), category.to_string()));
        }
        if let Some(kind) = self.kind {
            let code = match kind {
                TransactionType::Income => "IN",
                TransactionType::Expense => "OUT",
                TransactionType::Transfer => "TRANSFER",
            };
            query.push(("type".to_string(), code.to_string()));
        }
        if let Some(start) = self.start_date {
            query.push(("start_date".to_string(), start.to_string()));
        }
        if let Some(end) = self.end_date {
            query.push(("end_date".to_string(), end.to_string()));
        }
        query
    }
}

/// Income and expense totals for one day, for the dashboard chart
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub income: Amount,
    pub expense: Amount,
}

/// Group transactions into per-day income/expense totals, oldest day first.
/// Transfers move money between the user's own accounts and are left out.
pub fn daily_flows(transactions: &[Transaction]) -> Vec<DailyFlow> {
    let mut days: BTreeMap<NaiveDate, (Amount, Amount)> = BTreeMap::new();
    for tx in transactions {
        let entry = days.entry(tx.date).or_default();
        match tx.kind {
            TransactionType::Income => entry.0 += tx.amount,
            TransactionType::Expense => entry.1 += tx.amount,
            TransactionType::Transfer => {}
        }
    }
    days.into_iter()
        .map(|(date, (income, expense))| DailyFlow { date, income, expense })
        .collect()
}
