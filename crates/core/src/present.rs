use crate::comparison::ComparisonView;
use crate::domain::contract::{Alternative, AssessmentResult, OfferAnalysis, ResultDetail};
use crate::domain::locale::Language;
use crate::domain::rates::RateRow;
use crate::format::{
    format_delta, format_percent, format_yearly_effect, group_thousands, PLACEHOLDER,
};
use crate::status::{Flow, Status, Tone};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub code: &'static str,
    pub label: &'static str,
    pub tone: Tone,
}

impl StatusBadge {
    pub fn new(status: Status, flow: Flow, language: Language) -> Self {
        let label = status.label(flow);
        Self {
            code: status.code(),
            label: label.text(language),
            tone: label.tone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeLine {
    pub term: &'static str,
    pub average_rate: String,
    pub difference_from_best: String,
    pub yearly_effect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferLine {
    pub term: &'static str,
    pub badge: StatusBadge,
    pub offered_rate: String,
    pub diff_from_best_market: String,
    pub diff_from_median_market: String,
    pub diff_from_bank_average: String,
    pub yearly_effect: String,
    pub analysis_text: Option<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummary {
    pub flow: Flow,
    pub badge: StatusBadge,
    pub bank: Option<String>,
    pub analyzed_term: Option<&'static str>,
    pub difference_from_bank_average: String,
    pub difference_from_best_market_average: String,
    pub analysis_text: String,
    pub additional_context: Option<String>,
    pub recommendation: Option<String>,
    pub yearly_saving: Option<String>,
    pub preference_advice: Option<String>,
    pub alternatives_intro: Option<String>,
    pub alternatives: Vec<AlternativeLine>,
    pub offers: Vec<OfferLine>,
}

pub fn summarize(result: &AssessmentResult, language: Language) -> AssessmentSummary {
    let (alternatives_intro, alternatives, offers) = match &result.detail {
        ResultDetail::SelfRate {
            alternatives_intro,
            alternatives,
        } => (
            alternatives_intro.clone(),
            alternatives
                .iter()
                .map(|a| alternative_line(a, language))
                .collect(),
            Vec::new(),
        ),
        ResultDetail::Offers { analyses, .. } => (
            None,
            Vec::new(),
            analyses
                .iter()
                .map(|a| offer_line(a, language))
                .collect(),
        ),
    };

    AssessmentSummary {
        flow: result.flow,
        badge: StatusBadge::new(result.status, result.flow, language),
        bank: result.bank.clone(),
        analyzed_term: result.analyzed_term.map(|t| t.code()),
        difference_from_bank_average: format_delta(result.difference_from_bank_average),
        difference_from_best_market_average: format_delta(
            result.difference_from_best_market_average,
        ),
        analysis_text: result.analysis_text.clone(),
        additional_context: non_empty(&result.additional_context),
        recommendation: non_empty(&result.recommendation),
        yearly_saving: yearly_saving(result.yearly_saving, language),
        preference_advice: result.preference_advice.clone(),
        alternatives_intro,
        alternatives,
        offers,
    }
}

fn alternative_line(alt: &Alternative, language: Language) -> AlternativeLine {
    AlternativeLine {
        term: alt.term.code(),
        average_rate: format_percent(alt.average_rate),
        difference_from_best: format_delta(alt.difference_from_best),
        yearly_effect: format_yearly_effect(alt.yearly_cost_difference, language),
    }
}

fn offer_line(analysis: &OfferAnalysis, language: Language) -> OfferLine {
    OfferLine {
        term: analysis.term.code(),
        badge: StatusBadge::new(analysis.status, Flow::Offer, language),
        offered_rate: format_percent(analysis.offered_rate),
        diff_from_best_market: format_delta(analysis.diff_from_best_market),
        diff_from_median_market: format_delta(analysis.diff_from_median_market),
        diff_from_bank_average: format_delta(analysis.diff_from_bank_average),
        yearly_effect: format_yearly_effect(analysis.yearly_cost_difference, language),
        analysis_text: analysis.analysis_text.as_deref().and_then(non_empty),
        recommendation: analysis.recommendation.as_deref().and_then(non_empty),
    }
}

fn yearly_saving(value: Option<f64>, language: Language) -> Option<String> {
    let rounded = value.filter(|v| v.is_finite())?.round();
    if rounded < 1.0 {
        return None;
    }
    let amount = group_thousands(rounded as u64, language);
    Some(match language {
        Language::Sv => format!("{amount} kr per år"),
        Language::En => format!("{amount} SEK per year"),
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowLine {
    pub bank_name: String,
    pub list_rate: String,
    pub change: String,
    pub average_rate: String,
    pub last_changed: String,
}

impl From<&RateRow> for RowLine {
    fn from(row: &RateRow) -> Self {
        Self {
            bank_name: row.bank_name.clone(),
            list_rate: format_percent(row.list_rate),
            change: format_delta(row.change),
            average_rate: format_percent(row.average_rate),
            last_changed: row
                .last_changed
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub term: &'static str,
    pub average_month: String,
    pub rows: Vec<RowLine>,
    pub no_data: Vec<String>,
}

impl From<&ComparisonView> for ComparisonSummary {
    fn from(view: &ComparisonView) -> Self {
        Self {
            term: view.term.code(),
            average_month: view
                .average_month
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            rows: view.rows.iter().map(RowLine::from).collect(),
            no_data: view.no_data.iter().map(|r| r.bank_name.clone()).collect(),
        }
    }
}
