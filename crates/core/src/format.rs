use crate::domain::locale::Language;

pub const PLACEHOLDER: &str = "–";

/// Two decimals with trailing zeros stripped: `3.50` -> `3.5`, `3.00` -> `3`.
pub fn format_rate(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => trim_decimals(format!("{v:.2}")),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(_) => format!("{}%", format_rate(value)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_delta(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return PLACEHOLDER.to_string();
    };
    let s = trim_decimals(format!("{v:.2}"));
    if s == "0" || s.starts_with('-') {
        s
    } else {
        format!("+{s}")
    }
}

/// Yearly cost effect in whole kronor, e.g. `12 500 kr dyrare per år`.
pub fn format_yearly_effect(value: Option<f64>, language: Language) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return PLACEHOLDER.to_string();
    };

    let rounded = v.round();
    if rounded == 0.0 {
        return match language {
            Language::Sv => "Ingen skillnad".to_string(),
            Language::En => "No difference".to_string(),
        };
    }

    let amount = group_thousands(rounded.abs() as u64, language);
    match (language, rounded > 0.0) {
        (Language::Sv, true) => format!("{amount} kr dyrare per år"),
        (Language::Sv, false) => format!("{amount} kr billigare per år"),
        (Language::En, true) => format!("{amount} SEK more expensive per year"),
        (Language::En, false) => format!("{amount} SEK cheaper per year"),
    }
}

pub fn group_thousands(n: u64, language: Language) -> String {
    let sep = match language {
        Language::Sv => '\u{a0}',
        Language::En => ',',
    };
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

fn trim_decimals(s: String) -> String {
    let trimmed = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_zeros() {
        assert_eq!(format_rate(Some(3.5)), "3.5");
        assert_eq!(format_rate(Some(3.0)), "3");
        assert_eq!(format_rate(Some(3.456)), "3.46");
        assert_eq!(format_rate(Some(10.05)), "10.05");
        assert_eq!(format_percent(Some(4.1)), "4.1%");
    }

    #[test]
    fn absent_and_non_finite_render_placeholder() {
        assert_eq!(format_rate(None), PLACEHOLDER);
        assert_eq!(format_rate(Some(f64::NAN)), PLACEHOLDER);
        assert_eq!(format_percent(None), PLACEHOLDER);
        assert_eq!(format_delta(Some(f64::INFINITY)), PLACEHOLDER);
        assert_eq!(format_yearly_effect(None, Language::Sv), PLACEHOLDER);
    }

    #[test]
    fn deltas_carry_a_sign() {
        assert_eq!(format_delta(Some(0.15)), "+0.15");
        assert_eq!(format_delta(Some(-0.1)), "-0.1");
        assert_eq!(format_delta(Some(0.0)), "0");
        assert_eq!(format_delta(Some(-0.001)), "0");
    }

    #[test]
    fn near_zero_yearly_effect_is_no_difference() {
        assert_eq!(format_yearly_effect(Some(-0.4), Language::En), "No difference");
        assert_eq!(format_yearly_effect(Some(0.49), Language::Sv), "Ingen skillnad");
    }

    #[test]
    fn yearly_effect_uses_sign_and_grouping() {
        assert_eq!(
            format_yearly_effect(Some(12_499.6), Language::En),
            "12,500 SEK more expensive per year"
        );
        assert_eq!(
            format_yearly_effect(Some(-1_234_567.0), Language::Sv),
            "1\u{a0}234\u{a0}567 kr billigare per år"
        );
        assert_eq!(format_yearly_effect(Some(-0.6), Language::En), "1 SEK cheaper per year");
    }

    #[test]
    fn groups_short_numbers_untouched() {
        assert_eq!(group_thousands(999, Language::En), "999");
        assert_eq!(group_thousands(1000, Language::En), "1,000");
    }
}
