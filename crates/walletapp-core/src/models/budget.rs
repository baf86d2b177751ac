use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Amount;
use crate::api::ApiError;

/// Percentage at which a budget is flagged when the backend sends none
const DEFAULT_NOTIFICATION_THRESHOLD: f64 = 80.0;

fn default_threshold() -> Amount {
    Amount::new(DEFAULT_NOTIFICATION_THRESHOLD)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category: i64,
    #[serde(default)]
    pub category_name: Option<String>,
    pub limit: Amount,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_threshold")]
    pub notification_threshold: Amount,
    #[serde(default)]
    pub progress: Option<BudgetProgress>,
}

/// Response of `GET /api/budgets/{id}/progress/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub total_spent: Amount,
    #[serde(default)]
    pub remaining: Option<Amount>,
    #[serde(default)]
    pub percentage_used: Option<Amount>,
}

impl Budget {
    /// Share of the limit spent, in percent. A zero limit reads as 0%.
    pub fn percentage(&self, total_spent: Amount) -> f64 {
        if self.limit.value() > 0.0 {
            total_spent.value() / self.limit.value() * 100.0
        } else {
            0.0
        }
    }

    pub fn remaining(&self, total_spent: Amount) -> Amount {
        self.limit - total_spent
    }

    pub fn is_over_threshold(&self, total_spent: Amount) -> bool {
        self.percentage(total_spent) >= self.notification_threshold.value()
    }

    pub fn is_exceeded(&self, total_spent: Amount) -> bool {
        total_spent.value() > self.limit.value()
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn name(&self) -> String {
        self.category_name
            .clone()
            .unwrap_or_else(|| format!("Category #{}", self.category))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBudget {
    pub category: i64,
    pub limit: Amount,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_threshold: Option<Amount>,
}

impl NewBudget {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.start_date > self.end_date {
            return Err(ApiError::InvalidInput(
                "End date must be after start date".to_string(),
            ));
        }
        if !self.limit.is_positive() {
            return Err(ApiError::InvalidInput("Limit must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(limit: &str) -> Budget {
        serde_json::from_str(&format!(
            r#"{{"id": 7, "category": 2, "category_name": "Food", "limit": "{limit}",
                "start_date": "2024-05-01", "end_date": "2024-05-31"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_percentage_of_limit() {
        let b = budget("100.00");
        assert_eq!(b.percentage(Amount::new(25.0)), 25.0);
        assert_eq!(b.remaining(Amount::new(25.0)).value(), 75.0);
        assert!(!b.is_exceeded(Amount::new(25.0)));
        assert!(b.is_exceeded(Amount::new(100.01)));
    }

    #[test]
    fn test_zero_limit_is_zero_percent() {
        assert_eq!(budget("0").percentage(Amount::new(10.0)), 0.0);
    }

    #[test]
    fn test_default_threshold() {
        let b = budget("100.00");
        assert_eq!(b.notification_threshold.value(), 80.0);
        assert!(!b.is_over_threshold(Amount::new(79.0)));
        assert!(b.is_over_threshold(Amount::new(80.0)));
    }

    #[test]
    fn test_covers() {
        let b = budget("10");
        assert!(b.covers(NaiveDate::from_ymd_opt(2024, 5, 31).unwrap()));
        assert!(!b.covers(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
    }

    #[test]
    fn test_parse_progress() {
        let p: BudgetProgress = serde_json::from_str(
            r#"{"total_spent": "25.00", "remaining": "75.00", "percentage_used": 25.0}"#,
        )
        .unwrap();
        assert_eq!(p.total_spent.value(), 25.0);
        assert_eq!(p.remaining.unwrap().value(), 75.0);
    }

    #[test]
    fn test_new_budget_dates() {
        let nb = NewBudget {
            category: 1,
            limit: Amount::new(50.0),
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            notification_threshold: None,
        };
        assert!(nb.validate().is_err());
    }
}
