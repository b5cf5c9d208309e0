use serde::{Deserialize, Serialize};
use std::fmt;

/// Binding period of a mortgage rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MortgageTerm {
    #[serde(rename = "VARIABLE_3M")]
    Variable3M,
    #[serde(rename = "FIXED_1Y")]
    Fixed1Y,
    #[serde(rename = "FIXED_2Y")]
    Fixed2Y,
    #[serde(rename = "FIXED_3Y")]
    Fixed3Y,
    #[serde(rename = "FIXED_4Y")]
    Fixed4Y,
    #[serde(rename = "FIXED_5Y")]
    Fixed5Y,
    #[serde(rename = "FIXED_6Y")]
    Fixed6Y,
    #[serde(rename = "FIXED_7Y")]
    Fixed7Y,
    #[serde(rename = "FIXED_8Y")]
    Fixed8Y,
    #[serde(rename = "FIXED_9Y")]
    Fixed9Y,
    #[serde(rename = "FIXED_10Y")]
    Fixed10Y,
}

impl MortgageTerm {
    pub const ALL: [MortgageTerm; 11] = [
        MortgageTerm::Variable3M,
        MortgageTerm::Fixed1Y,
        MortgageTerm::Fixed2Y,
        MortgageTerm::Fixed3Y,
        MortgageTerm::Fixed4Y,
        MortgageTerm::Fixed5Y,
        MortgageTerm::Fixed6Y,
        MortgageTerm::Fixed7Y,
        MortgageTerm::Fixed8Y,
        MortgageTerm::Fixed9Y,
        MortgageTerm::Fixed10Y,
    ];

    /// Wire name, e.g. `FIXED_3Y`.
    pub fn code(self) -> &'static str {
        match self {
            MortgageTerm::Variable3M => "VARIABLE_3M",
            MortgageTerm::Fixed1Y => "FIXED_1Y",
            MortgageTerm::Fixed2Y => "FIXED_2Y",
            MortgageTerm::Fixed3Y => "FIXED_3Y",
            MortgageTerm::Fixed4Y => "FIXED_4Y",
            MortgageTerm::Fixed5Y => "FIXED_5Y",
            MortgageTerm::Fixed6Y => "FIXED_6Y",
            MortgageTerm::Fixed7Y => "FIXED_7Y",
            MortgageTerm::Fixed8Y => "FIXED_8Y",
            MortgageTerm::Fixed9Y => "FIXED_9Y",
            MortgageTerm::Fixed10Y => "FIXED_10Y",
        }
    }

    /// The rates service publishes comparison tables for these terms only.
    pub const COMPARISON: [MortgageTerm; 8] = [
        MortgageTerm::Variable3M,
        MortgageTerm::Fixed1Y,
        MortgageTerm::Fixed2Y,
        MortgageTerm::Fixed3Y,
        MortgageTerm::Fixed4Y,
        MortgageTerm::Fixed5Y,
        MortgageTerm::Fixed7Y,
        MortgageTerm::Fixed10Y,
    ];

    /// `3m`, `1y`, ... `10y`.
    pub fn short_code(self) -> &'static str {
        match self {
            MortgageTerm::Variable3M => "3m",
            MortgageTerm::Fixed1Y => "1y",
            MortgageTerm::Fixed2Y => "2y",
            MortgageTerm::Fixed3Y => "3y",
            MortgageTerm::Fixed4Y => "4y",
            MortgageTerm::Fixed5Y => "5y",
            MortgageTerm::Fixed6Y => "6y",
            MortgageTerm::Fixed7Y => "7y",
            MortgageTerm::Fixed8Y => "8y",
            MortgageTerm::Fixed9Y => "9y",
            MortgageTerm::Fixed10Y => "10y",
        }
    }

    /// `term` query value of the comparison fetch; `None` for terms without a table.
    pub fn comparison_code(self) -> Option<&'static str> {
        Self::COMPARISON.contains(&self).then(|| self.short_code())
    }

    /// Accepts both the wire name and the short code.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.code().eq_ignore_ascii_case(s) || t.short_code().eq_ignore_ascii_case(s))
    }

    pub fn parse_comparison(s: &str) -> Option<Self> {
        Self::parse(s).filter(|t| t.comparison_code().is_some())
    }

    /// Every `FIXED_*` term belongs to the fixed family.
    pub fn is_fixed(self) -> bool {
        !matches!(self, MortgageTerm::Variable3M)
    }
}

impl fmt::Display for MortgageTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which family of future terms the visitor wants to compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatePreference {
    #[serde(rename = "VARIABLE_3M")]
    Variable3M,
    #[serde(rename = "SHORT")]
    Short,
    #[serde(rename = "LONG")]
    Long,
}

impl RatePreference {
    pub fn code(self) -> &'static str {
        match self {
            RatePreference::Variable3M => "VARIABLE_3M",
            RatePreference::Short => "SHORT",
            RatePreference::Long => "LONG",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VARIABLE_3M" | "VARIABLE" | "3M" => Some(RatePreference::Variable3M),
            "SHORT" => Some(RatePreference::Short),
            "LONG" => Some(RatePreference::Long),
            _ => None,
        }
    }
}

impl fmt::Display for RatePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
