use crate::domain::locale::Language;
use chrono::{Datelike, NaiveDate};

const SV_MONTHS: [&str; 12] = [
    "jan.", "feb.", "mars", "apr.", "maj", "juni", "juli", "aug.", "sep.", "okt.", "nov.", "dec.",
];

/// Caption for the average-rate column, e.g. `okt. 2025` or `Oct 2025`.
pub fn format_average_month(month: NaiveDate, language: Language) -> String {
    match language {
        Language::Sv => {
            let name = SV_MONTHS[month.month0() as usize];
            format!("{name} {}", month.year())
        }
        Language::En => month.format("%b %Y").to_string(),
    }
}

/// Prefers the service-provided caption and falls back to local formatting.
pub fn average_month_caption(
    month: Option<NaiveDate>,
    formatted: Option<&str>,
    language: Language,
) -> Option<String> {
    if let Some(s) = formatted.map(str::trim).filter(|s| !s.is_empty()) {
        return Some(s.to_string());
    }
    month.map(|m| format_average_month(m, language))
}
