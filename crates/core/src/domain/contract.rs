use crate::domain::locale::Language;
use crate::domain::term::{MortgageTerm, RatePreference};
use crate::status::{Flow, Status, StatusLabel};
use anyhow::ensure;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub term: MortgageTerm,
    pub rate: f64,
}

/// Flow-specific part of the outbound request. Only one can ever be populated.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestFlow {
    SelfRate {
        user_rate: f64,
        current_term: MortgageTerm,
        binding_end_date: Option<NaiveDate>,
        preference: RatePreference,
    },
    Offers(Vec<Offer>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub bank_id: i64,
    pub bank_name: String,
    pub loan_amount: Option<f64>,
    pub language: Language,
    pub flow: RequestFlow,
}

impl AssessmentRequest {
    pub fn flow_kind(&self) -> Flow {
        match self.flow {
            RequestFlow::SelfRate { .. } => Flow::SelfRate,
            RequestFlow::Offers(_) => Flow::Offer,
        }
    }

    pub fn with_language(&self, language: Language) -> Self {
        Self {
            language,
            ..self.clone()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    bank_id: i64,
    bank_name: &'a str,
    has_offer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    loan_amount: Option<f64>,
    language: Language,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_current_term: Option<MortgageTerm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    binding_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_preference: Option<RatePreference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offers: Option<&'a [Offer]>,
}

impl Serialize for AssessmentRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut wire = WireRequest {
            bank_id: self.bank_id,
            bank_name: &self.bank_name,
            has_offer: false,
            loan_amount: self.loan_amount,
            language: self.language,
            user_rate: None,
            user_current_term: None,
            binding_end_date: None,
            user_preference: None,
            offers: None,
        };

        match &self.flow {
            RequestFlow::SelfRate {
                user_rate,
                current_term,
                binding_end_date,
                preference,
            } => {
                wire.user_rate = Some(*user_rate);
                wire.user_current_term = Some(*current_term);
                wire.binding_end_date = *binding_end_date;
                wire.user_preference = Some(*preference);
            }
            RequestFlow::Offers(offers) => {
                wire.has_offer = true;
                wire.offers = Some(offers);
            }
        }

        wire.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub term: MortgageTerm,
    #[serde(default)]
    pub average_rate: Option<f64>,
    #[serde(default)]
    pub difference_from_best: Option<f64>,
    #[serde(default)]
    pub yearly_cost_difference: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAnalysis {
    pub term: MortgageTerm,
    #[serde(default)]
    pub offered_rate: Option<f64>,
    #[serde(default)]
    pub diff_from_best_market: Option<f64>,
    #[serde(default)]
    pub diff_from_median_market: Option<f64>,
    #[serde(default)]
    pub diff_from_bank_average: Option<f64>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub analysis_text: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub yearly_cost_difference: Option<f64>,
}

/// Response body of the assessment submission, as sent by the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    pub status: Status,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub analyzed_term: Option<MortgageTerm>,
    #[serde(default)]
    pub difference_from_bank_average: Option<f64>,
    #[serde(default)]
    pub difference_from_best_market_average: Option<f64>,
    pub analysis_text: String,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub yearly_saving: Option<f64>,
    #[serde(default)]
    pub preference_advice: Option<String>,
    #[serde(default)]
    pub alternatives: Option<Vec<Alternative>>,
    #[serde(default)]
    pub alternatives_intro: Option<String>,
    #[serde(default)]
    pub is_offer_flow: Option<bool>,
    #[serde(default)]
    pub offer_analyses: Option<Vec<OfferAnalysis>>,
    #[serde(default)]
    pub multiple_offers: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultDetail {
    SelfRate {
        alternatives_intro: Option<String>,
        alternatives: Vec<Alternative>,
    },
    Offers {
        analyses: Vec<OfferAnalysis>,
        multiple: bool,
    },
}

/// Decoded assessment, tagged with the flow that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentResult {
    pub flow: Flow,
    pub status: Status,
    pub bank: Option<String>,
    pub analyzed_term: Option<MortgageTerm>,
    pub difference_from_bank_average: Option<f64>,
    pub difference_from_best_market_average: Option<f64>,
    pub analysis_text: String,
    pub additional_context: String,
    pub recommendation: String,
    pub yearly_saving: Option<f64>,
    pub preference_advice: Option<String>,
    pub detail: ResultDetail,
}

impl AssessmentResult {
    pub fn label(&self) -> &'static StatusLabel {
        self.status.label(self.flow)
    }
}

impl AssessmentResponse {
    /// `flow` is the flow of the request that produced this response; the body is not
    /// inspected to guess it.
    pub fn validate_and_into_result(self, flow: Flow) -> anyhow::Result<AssessmentResult> {
        let analysis_text = self.analysis_text.trim().to_string();
        ensure!(!analysis_text.is_empty(), "analysisText must be non-empty");

        if let Some(is_offer_flow) = self.is_offer_flow {
            if is_offer_flow != (flow == Flow::Offer) {
                tracing::debug!(?flow, is_offer_flow, "service flow flag disagrees with request flow");
            }
        }

        let detail = match flow {
            Flow::SelfRate => ResultDetail::SelfRate {
                alternatives_intro: non_blank(self.alternatives_intro),
                alternatives: self.alternatives.unwrap_or_default(),
            },
            Flow::Offer => {
                let analyses = self.offer_analyses.unwrap_or_default();
                ensure!(
                    !analyses.is_empty(),
                    "offer flow response must contain at least one offer analysis"
                );
                let multiple = self.multiple_offers.unwrap_or(analyses.len() > 1);
                ResultDetail::Offers { analyses, multiple }
            }
        };

        Ok(AssessmentResult {
            flow,
            status: self.status,
            bank: non_blank(self.bank),
            analyzed_term: self.analyzed_term,
            difference_from_bank_average: self.difference_from_bank_average,
            difference_from_best_market_average: self.difference_from_best_market_average,
            analysis_text,
            additional_context: self.additional_context.unwrap_or_default().trim().to_string(),
            recommendation: self.recommendation.unwrap_or_default().trim().to_string(),
            yearly_saving: self.yearly_saving,
            preference_advice: non_blank(self.preference_advice),
            detail,
        })
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn self_rate_request() -> AssessmentRequest {
        AssessmentRequest {
            bank_id: 1,
            bank_name: "Swedbank".to_string(),
            loan_amount: Some(2_000_000.0),
            language: Language::Sv,
            flow: RequestFlow::SelfRate {
                user_rate: 3.9,
                current_term: MortgageTerm::Fixed2Y,
                binding_end_date: NaiveDate::from_ymd_opt(2026, 3, 1),
                preference: RatePreference::Short,
            },
        }
    }

    #[test]
    fn self_rate_payload_omits_offer_fields() {
        let v = serde_json::to_value(self_rate_request()).unwrap();
        assert_eq!(
            v,
            json!({
                "bankId": 1,
                "bankName": "Swedbank",
                "hasOffer": false,
                "loanAmount": 2000000.0,
                "language": "SV",
                "userRate": 3.9,
                "userCurrentTerm": "FIXED_2Y",
                "bindingEndDate": "2026-03-01",
                "userPreference": "SHORT",
            })
        );
    }

    #[test]
    fn offer_payload_omits_self_rate_fields() {
        let req = AssessmentRequest {
            bank_id: 4,
            bank_name: "SEB".to_string(),
            loan_amount: None,
            language: Language::En,
            flow: RequestFlow::Offers(vec![Offer {
                term: MortgageTerm::Fixed3Y,
                rate: 3.45,
            }]),
        };
        let v = serde_json::to_value(&req).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj["hasOffer"], json!(true));
        assert_eq!(obj["offers"], json!([{"term": "FIXED_3Y", "rate": 3.45}]));
        for key in ["userRate", "userCurrentTerm", "bindingEndDate", "userPreference", "loanAmount"] {
            assert!(!obj.contains_key(key), "{key} must be absent");
        }
    }

    #[test]
    fn with_language_changes_nothing_else() {
        let req = self_rate_request();
        let en = req.with_language(Language::En);
        assert_eq!(en.language, Language::En);
        assert_eq!(en.with_language(Language::Sv), req);
    }

    #[test]
    fn decodes_self_rate_result() {
        let body = json!({
            "status": "ORANGE",
            "bank": "Swedbank",
            "analyzedTerm": "VARIABLE_3M",
            "differenceFromBankAverage": 0.32,
            "differenceFromBestMarketAverage": 0.55,
            "analysisText": "Din ränta är högre än marknadens bästa snittränta.",
            "additionalContext": "",
            "recommendation": "Kontakta banken.",
            "yearlySaving": null,
            "preferenceAdvice": null,
            "alternatives": [
                {"term": "FIXED_1Y", "averageRate": 3.1, "differenceFromBest": -0.4, "yearlyCostDifference": -8000.0}
            ],
            "alternativesIntro": null,
            "isOfferFlow": false,
            "offerAnalyses": [],
            "multipleOffers": false
        });

        let parsed: AssessmentResponse = serde_json::from_value(body).unwrap();
        let result = parsed.validate_and_into_result(Flow::SelfRate).unwrap();
        assert_eq!(result.status, Status::Elevated);
        assert_eq!(result.label().en, "Above average");
        match result.detail {
            ResultDetail::SelfRate { alternatives, .. } => assert_eq!(alternatives.len(), 1),
            other => panic!("unexpected detail {other:?}"),
        }
    }

    #[test]
    fn unknown_status_decodes_to_unrecognized() {
        let body = json!({"status": "UNKNOWN", "analysisText": "Vi saknar data."});
        let parsed: AssessmentResponse = serde_json::from_value(body).unwrap();
        let result = parsed.validate_and_into_result(Flow::SelfRate).unwrap();
        assert_eq!(result.status, Status::Unrecognized);
    }

    #[test]
    fn offer_result_without_analyses_is_rejected() {
        let body = json!({"status": "GREEN", "analysisText": "Bra.", "offerAnalyses": []});
        let parsed: AssessmentResponse = serde_json::from_value(body).unwrap();
        assert!(parsed.validate_and_into_result(Flow::Offer).is_err());
    }

    #[test]
    fn missing_analysis_text_fails_to_decode() {
        let res = serde_json::from_value::<AssessmentResponse>(json!({"status": "GREEN"}));
        assert!(res.is_err());
    }

    #[test]
    fn flow_comes_from_request_not_body() {
        let body = json!({
            "status": "GREEN",
            "analysisText": "Bra erbjudande.",
            "isOfferFlow": false,
            "offerAnalyses": [
                {"term": "FIXED_3Y", "offeredRate": 3.2, "status": "GREEN", "yearlyCostDifference": -500.0}
            ]
        });
        let parsed: AssessmentResponse = serde_json::from_value(body).unwrap();
        let result = parsed.validate_and_into_result(Flow::Offer).unwrap();
        assert_eq!(result.flow, Flow::Offer);
        assert_eq!(result.label().en, "Good offer");
        assert!(matches!(result.detail, ResultDetail::Offers { multiple: false, .. }));
    }
}
