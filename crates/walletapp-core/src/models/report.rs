use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Amount;
use crate::api::ApiError;

/// Date range for `generate_report`. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, ApiError> {
        if start_date > end_date {
            return Err(ApiError::InvalidInput(
                "Start date must be before end date".to_string(),
            ));
        }
        Ok(Self { start_date, end_date })
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("start_date".to_string(), self.start_date.to_string()),
            ("end_date".to_string(), self.end_date.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionReport {
    #[serde(default)]
    pub period: Option<ReportRange>,
    #[serde(default)]
    pub summary: BTreeMap<String, Amount>,
    #[serde(default)]
    pub by_category: Vec<CategoryTotal>,
    #[serde(default)]
    pub by_account: Vec<AccountTotal>,
    #[serde(default)]
    pub daily_totals: Vec<DailyTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "category__name", default)]
    pub category_name: Option<String>,
    pub total: Amount,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountTotal {
    #[serde(rename = "account__name", default)]
    pub account_name: Option<String>,
    pub total: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTotal {
    pub day: NaiveDate,
    pub total: Amount,
}

impl TransactionReport {
    /// Summary rows with `snake_case` keys turned into labels
    pub fn summary_rows(&self) -> Vec<(String, Amount)> {
        self.summary
            .iter()
            .map(|(key, value)| (key.replace('_', " "), *value))
            .collect()
    }
}

/// Chart-ready series from `visualization_data`. Point shapes are
/// backend-defined, so they are kept as JSON objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualizationData {
    #[serde(default)]
    pub time_series: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub category_distribution: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_order() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(ReportRange::new(a, b).is_ok());
        assert!(ReportRange::new(a, a).is_ok());
        assert!(ReportRange::new(b, a).is_err());
    }

    #[test]
    fn test_parse_report() {
        let json = r#"{
            "period": {"start_date": "2024-01-01", "end_date": "2024-01-31"},
            "summary": {"total_income": "500.00", "total_expenses": "120.25"},
            "by_category": [{"category__name": "Food", "total": "80.25", "count": 4}],
            "by_account": [{"account__name": "Cash", "total": "120.25"}],
            "daily_totals": [{"day": "2024-01-03", "total": "40.00"}]
        }"#;
        let report: TransactionReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.by_category[0].count, Some(4));
        assert_eq!(report.daily_totals[0].total.value(), 40.0);
        let rows = report.summary_rows();
        assert_eq!(rows[0].0, "total expenses");
        assert_eq!(rows[1].1.value(), 500.0);
    }

    #[test]
    fn test_parse_visualization() {
        let data: VisualizationData = serde_json::from_str(
            r#"{"time_series": [{"date": "2024-01-01", "total": "5.00"}]}"#,
        )
        .unwrap();
        assert_eq!(data.time_series.len(), 1);
        assert!(data.category_distribution.is_empty());
    }
}
