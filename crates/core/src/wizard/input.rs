use crate::domain::contract::Offer;
use crate::domain::term::{MortgageTerm, RatePreference};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferAnswer {
    #[default]
    Unanswered,
    No,
    Yes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfRateDraft {
    pub user_rate: Option<f64>,
    pub current_term: Option<MortgageTerm>,
    pub binding_end_date: Option<NaiveDate>,
    pub preference: Option<RatePreference>,
}

impl SelfRateDraft {
    /// The binding-end question only applies to fixed terms. Evaluated on every call so a
    /// term change is picked up immediately.
    pub fn binding_end_relevant(&self) -> bool {
        self.current_term.is_some_and(MortgageTerm::is_fixed)
    }

    pub fn effective_binding_end(&self) -> Option<NaiveDate> {
        self.binding_end_date
            .filter(|_| self.binding_end_relevant())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferDraft {
    pub term: Option<MortgageTerm>,
    pub rate: Option<f64>,
}

impl OfferDraft {
    pub fn complete(&self) -> Option<Offer> {
        let rate = self.rate.filter(|r| r.is_finite())?;
        Some(Offer {
            term: self.term?,
            rate,
        })
    }
}

/// Branch-specific answers. Only one branch can hold data at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum FlowDraft {
    #[default]
    Unanswered,
    SelfRate(SelfRateDraft),
    Offers { offers: Vec<OfferDraft> },
}

impl FlowDraft {
    pub fn answer(&self) -> OfferAnswer {
        match self {
            FlowDraft::Unanswered => OfferAnswer::Unanswered,
            FlowDraft::SelfRate(_) => OfferAnswer::No,
            FlowDraft::Offers { .. } => OfferAnswer::Yes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WizardInput {
    pub bank_key: Option<String>,
    pub loan_amount: Option<f64>,
    pub flow: FlowDraft,
}

impl WizardInput {
    /// Switching the answer discards the other branch's fields; repeating the current answer
    /// keeps them.
    pub fn answer_has_offer(&mut self, answer: OfferAnswer) {
        if self.flow.answer() == answer {
            return;
        }
        self.flow = match answer {
            OfferAnswer::Unanswered => FlowDraft::Unanswered,
            OfferAnswer::No => FlowDraft::SelfRate(SelfRateDraft::default()),
            OfferAnswer::Yes => FlowDraft::Offers {
                offers: vec![OfferDraft::default()],
            },
        };
    }

    pub fn self_rate_mut(&mut self) -> Option<&mut SelfRateDraft> {
        match &mut self.flow {
            FlowDraft::SelfRate(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn offers_mut(&mut self) -> Option<&mut Vec<OfferDraft>> {
        match &mut self.flow {
            FlowDraft::Offers { offers } => Some(offers),
            _ => None,
        }
    }

    pub fn add_offer(&mut self) -> Option<usize> {
        let offers = self.offers_mut()?;
        offers.push(OfferDraft::default());
        Some(offers.len() - 1)
    }

    /// The list never drops below one entry.
    pub fn remove_offer(&mut self, index: usize) -> bool {
        match self.offers_mut() {
            Some(offers) if offers.len() > 1 && index < offers.len() => {
                offers.remove(index);
                true
            }
            _ => false,
        }
    }
}
