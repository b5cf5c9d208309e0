use crate::domain::bank::BankDirectory;
use crate::domain::contract::{AssessmentRequest, RequestFlow};
use crate::domain::locale::Language;
use crate::wizard::input::{FlowDraft, SelfRateDraft, WizardInput};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "index", rename_all = "snake_case")]
pub enum Field {
    Bank,
    OfferAnswer,
    UserRate,
    CurrentTerm,
    Preference,
    Offers,
    Offer(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Problem {
    Required,
    UnknownBank,
    NoCompleteOffer,
    IncompleteOffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub problem: Problem,
}

impl FieldError {
    fn new(field: Field, problem: Problem) -> Self {
        Self { field, problem }
    }

    pub fn message(&self, language: Language) -> &'static str {
        let (sv, en) = match (self.field, self.problem) {
            (_, Problem::UnknownBank) => (
                "Vi känner inte igen den valda banken.",
                "The selected bank is not supported.",
            ),
            (_, Problem::NoCompleteOffer) => (
                "Fyll i bindningstid och ränta för minst ett erbjudande.",
                "Fill in term and rate for at least one offer.",
            ),
            (_, Problem::IncompleteOffer) => (
                "Fyll i både bindningstid och ränta.",
                "Fill in both term and rate.",
            ),
            (Field::Bank, Problem::Required) => ("Välj din bank.", "Select your bank."),
            (Field::OfferAnswer, Problem::Required) => (
                "Svara på om du har fått ett ränteerbjudande.",
                "Tell us whether you have received a rate offer.",
            ),
            (Field::UserRate, Problem::Required) => {
                ("Ange din nuvarande ränta.", "Enter your current rate.")
            }
            (Field::CurrentTerm, Problem::Required) => (
                "Välj din nuvarande bindningstid.",
                "Select your current term.",
            ),
            (Field::Preference, Problem::Required) => (
                "Välj vilken bindningstid du vill jämföra med.",
                "Choose which term you want to compare against.",
            ),
            (Field::Offers | Field::Offer(_), Problem::Required) => (
                "Fyll i bindningstid och ränta.",
                "Fill in term and rate.",
            ),
        };
        match language {
            Language::Sv => sv,
            Language::En => en,
        }
    }
}

/// Field-scoped problems found on submit. Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn contains(&self, field: Field, problem: Problem) -> bool {
        self.errors.contains(&FieldError::new(field, problem))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .errors
            .iter()
            .map(|e| e.message(Language::En))
            .collect();
        write!(f, "invalid input: {}", parts.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A request ready to send, plus the offer rows that were left out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSubmission {
    pub request: AssessmentRequest,
    pub incomplete_offers: Vec<usize>,
}

/// Checks the input for the active flow and builds the outbound request.
///
/// Accepts exactly the inputs that have every required field of their flow; nothing is
/// guessed or corrected.
pub fn assemble(
    input: &WizardInput,
    banks: &BankDirectory,
    language: Language,
) -> Result<ValidatedSubmission, ValidationErrors> {
    let mut errors = Vec::new();

    let bank = match input.bank_key.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new(Field::Bank, Problem::Required));
            None
        }
        Some(key) => {
            let bank = banks.resolve(key).or_else(|| banks.by_display_name(key));
            if bank.is_none() {
                errors.push(FieldError::new(Field::Bank, Problem::UnknownBank));
            }
            bank
        }
    };

    let mut incomplete_offers = Vec::new();
    let flow = match &input.flow {
        FlowDraft::Unanswered => {
            errors.push(FieldError::new(Field::OfferAnswer, Problem::Required));
            None
        }
        FlowDraft::SelfRate(draft) => self_rate_flow(draft, &mut errors),
        FlowDraft::Offers { offers } => {
            let mut complete = Vec::new();
            for (i, draft) in offers.iter().enumerate() {
                match draft.complete() {
                    Some(offer) => complete.push(offer),
                    None => incomplete_offers.push(i),
                }
            }
            if complete.is_empty() {
                errors.push(FieldError::new(Field::Offers, Problem::NoCompleteOffer));
                errors.extend(
                    incomplete_offers
                        .iter()
                        .map(|&i| FieldError::new(Field::Offer(i), Problem::IncompleteOffer)),
                );
                None
            } else {
                Some(RequestFlow::Offers(complete))
            }
        }
    };

    match (bank, flow) {
        (Some(bank), Some(flow)) if errors.is_empty() => Ok(ValidatedSubmission {
            request: AssessmentRequest {
                bank_id: bank.id,
                bank_name: bank.display_name.clone(),
                loan_amount: input.loan_amount.filter(|v| v.is_finite()),
                language,
                flow,
            },
            incomplete_offers,
        }),
        _ => Err(ValidationErrors { errors }),
    }
}

fn self_rate_flow(draft: &SelfRateDraft, errors: &mut Vec<FieldError>) -> Option<RequestFlow> {
    let user_rate = draft.user_rate.filter(|r| r.is_finite());
    if user_rate.is_none() {
        errors.push(FieldError::new(Field::UserRate, Problem::Required));
    }
    if draft.current_term.is_none() {
        errors.push(FieldError::new(Field::CurrentTerm, Problem::Required));
    }
    if draft.preference.is_none() {
        errors.push(FieldError::new(Field::Preference, Problem::Required));
    }

    Some(RequestFlow::SelfRate {
        user_rate: user_rate?,
        current_term: draft.current_term?,
        binding_end_date: draft.effective_binding_end(),
        preference: draft.preference?,
    })
}
