use crate::comparison::collation::compare_names;
use crate::domain::locale::Language;
use crate::domain::rates::RateRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    BankName,
    ListRate,
    #[serde(rename = "diff")]
    Change,
    #[serde(rename = "avgRate")]
    AverageRate,
    LastChanged,
}

/// `Ascending` is shown as "down" in the table header, `Descending` as "up".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "down" | "asc" | "ascending" => Some(SortDirection::Ascending),
            "up" | "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

enum Strategy {
    Lexical,
    Numeric(fn(&RateRow) -> Option<f64>),
    Date(fn(&RateRow) -> Option<NaiveDate>),
}

impl SortColumn {
    pub const ALL: [SortColumn; 5] = [
        SortColumn::BankName,
        SortColumn::ListRate,
        SortColumn::Change,
        SortColumn::AverageRate,
        SortColumn::LastChanged,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SortColumn::BankName => "bankName",
            SortColumn::ListRate => "listRate",
            SortColumn::Change => "diff",
            SortColumn::AverageRate => "avgRate",
            SortColumn::LastChanged => "lastChanged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "change" | "diff" => Some(SortColumn::Change),
            "averagerate" | "average-rate" | "avgrate" => Some(SortColumn::AverageRate),
            "bank" | "bank-name" => Some(SortColumn::BankName),
            "list-rate" => Some(SortColumn::ListRate),
            "last-changed" => Some(SortColumn::LastChanged),
            _ => Self::ALL.into_iter().find(|c| c.key().eq_ignore_ascii_case(s)),
        }
    }

    /// Direction picked when the column is first selected.
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortColumn::LastChanged => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    fn strategy(self) -> Strategy {
        match self {
            SortColumn::BankName => Strategy::Lexical,
            SortColumn::ListRate => Strategy::Numeric(|r| r.list_rate),
            SortColumn::Change => Strategy::Numeric(|r| r.change),
            SortColumn::AverageRate => Strategy::Numeric(|r| r.average_rate),
            SortColumn::LastChanged => Strategy::Date(|r| r.last_changed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: SortColumn) -> Self {
        Self {
            column,
            direction: column.default_direction(),
        }
    }

    /// Header click: a new column starts at its default direction, the same column toggles.
    pub fn select(current: Option<SortSpec>, column: SortColumn) -> Self {
        match current {
            Some(spec) if spec.column == column => Self {
                column,
                direction: spec.direction.toggled(),
            },
            _ => Self::new(column),
        }
    }
}

/// Stable sort; absent values go last on numeric and date columns in either direction.
pub fn sort_rows(rows: &[RateRow], spec: SortSpec, language: Language) -> Vec<RateRow> {
    let strategy = spec.column.strategy();
    let mut out = rows.to_vec();
    out.sort_by(|a, b| match &strategy {
        Strategy::Lexical => spec
            .direction
            .apply(compare_names(&a.bank_name, &b.bank_name, language)),
        Strategy::Numeric(get) => nulls_last(get(a), get(b), spec.direction, |x, y| {
            x.total_cmp(y)
        }),
        Strategy::Date(get) => nulls_last(get(a), get(b), spec.direction, |x, y| x.cmp(y)),
    });
    out
}

fn nulls_last<T>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => direction.apply(cmp(&x, &y)),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    pub primary: Vec<RateRow>,
    pub no_data: Vec<RateRow>,
}

/// Splits already-sorted rows; both groups keep their relative order.
pub fn partition(rows: Vec<RateRow>) -> Partition {
    let (primary, no_data) = rows.into_iter().partition(RateRow::has_data);
    Partition { primary, no_data }
}
