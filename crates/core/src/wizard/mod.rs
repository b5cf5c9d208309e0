//! Assessment wizard: input drafts, submit-time validation and the request lifecycle.

pub mod input;
pub mod machine;
pub mod validate;

pub use input::{FlowDraft, OfferAnswer, OfferDraft, SelfRateDraft, WizardInput};
pub use machine::{Phase, Settled, Submission, SubmissionKind, Wizard, WizardCommand};
pub use validate::{assemble, Field, FieldError, Problem, ValidatedSubmission, ValidationErrors};
