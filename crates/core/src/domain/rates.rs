use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One bank's standing for the requested term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRow {
    pub bank_name: String,
    #[serde(default)]
    pub list_rate: Option<f64>,
    #[serde(default, rename = "diff")]
    pub change: Option<f64>,
    #[serde(default, rename = "avgRate")]
    pub average_rate: Option<f64>,
    #[serde(default)]
    pub last_changed: Option<NaiveDate>,
}

impl RateRow {
    /// Rows with neither list rate, average rate nor change date carry no data for the term.
    pub fn has_data(&self) -> bool {
        self.list_rate.is_some() || self.average_rate.is_some() || self.last_changed.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResponse {
    #[serde(default)]
    pub average_month: Option<NaiveDate>,
    #[serde(default)]
    pub average_month_formatted: Option<String>,
    pub rows: Vec<RateRow>,
}

impl ComparisonResponse {
    pub fn validate(&self) -> anyhow::Result<()> {
        for row in &self.rows {
            anyhow::ensure!(
                !row.bank_name.trim().is_empty(),
                "comparison row bankName must be non-empty"
            );
        }
        Ok(())
    }
}
