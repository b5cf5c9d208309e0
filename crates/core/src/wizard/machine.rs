use crate::client::RatesApi;
use crate::domain::bank::BankDirectory;
use crate::domain::contract::{AssessmentRequest, AssessmentResponse, AssessmentResult};
use crate::domain::locale::{Language, Locale};
use crate::wizard::input::{FlowDraft, WizardInput};
use crate::wizard::validate::{assemble, ValidationErrors};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

const REQUEST_FAILED: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    CollectingBank,
    CollectingOfferAnswer,
    CollectingSelfRateDetails,
    CollectingOffers,
    ReadyToSubmit,
    Submitting,
    Result,
    ValidationFailed,
    RequestFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    User,
    Resync,
}

/// A request the caller must send and report back through [`Wizard::complete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: u64,
    pub kind: SubmissionKind,
    pub request: AssessmentRequest,
}

#[derive(Debug, Clone)]
pub enum WizardCommand {
    Edit(WizardInput),
    Submit,
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub phase: Phase,
    pub language: Language,
    pub result: Option<AssessmentResult>,
}

#[derive(Debug, Clone)]
enum Outcome {
    None,
    Result(Box<AssessmentResult>),
    ValidationFailed(ValidationErrors),
    RequestFailed {
        message: String,
        previous: Option<Box<AssessmentResult>>,
    },
}

#[derive(Debug, Clone)]
struct InFlight {
    id: u64,
    kind: SubmissionKind,
    request: AssessmentRequest,
}

/// Rate assessment wizard. Performs no I/O itself: submissions are handed out and their
/// outcomes reported back, with at most one outstanding at a time.
#[derive(Debug, Clone)]
pub struct Wizard {
    banks: BankDirectory,
    locale: Locale,
    started: bool,
    input: WizardInput,
    outcome: Outcome,
    incomplete_offers: Vec<usize>,
    last_submitted: Option<AssessmentRequest>,
    in_flight: Option<InFlight>,
    resync_pending: bool,
    next_id: u64,
}

impl Wizard {
    pub fn new(banks: BankDirectory, locale: Locale) -> Self {
        Self {
            banks,
            locale,
            started: false,
            input: WizardInput::default(),
            outcome: Outcome::None,
            incomplete_offers: Vec::new(),
            last_submitted: None,
            in_flight: None,
            resync_pending: false,
            next_id: 0,
        }
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn input(&self) -> &WizardInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut WizardInput {
        self.started = true;
        &mut self.input
    }

    pub fn banks(&self) -> &BankDirectory {
        &self.banks
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn language(&self) -> Language {
        self.locale.contract_language()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        match &self.outcome {
            Outcome::Result(result) => Some(result.as_ref()),
            _ => None,
        }
    }

    /// The current result, or the one still on screen behind a failed resubmission.
    pub fn shown_result(&self) -> Option<&AssessmentResult> {
        match &self.outcome {
            Outcome::Result(result)
            | Outcome::RequestFailed {
                previous: Some(result),
                ..
            } => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match &self.outcome {
            Outcome::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn request_error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::RequestFailed { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn incomplete_offers(&self) -> &[usize] {
        &self.incomplete_offers
    }

    pub fn last_submitted(&self) -> Option<&AssessmentRequest> {
        self.last_submitted.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if !self.started {
            return Phase::Idle;
        }
        if self.in_flight.is_some() {
            return Phase::Submitting;
        }
        match self.outcome {
            Outcome::Result(_) => return Phase::Result,
            Outcome::ValidationFailed(_) => return Phase::ValidationFailed,
            Outcome::RequestFailed { .. } => return Phase::RequestFailed,
            Outcome::None => {}
        }

        if self.input.bank_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Phase::CollectingBank;
        }
        let ready = assemble(&self.input, &self.banks, self.language()).is_ok();
        match (&self.input.flow, ready) {
            (FlowDraft::Unanswered, _) => Phase::CollectingOfferAnswer,
            (_, true) => Phase::ReadyToSubmit,
            (FlowDraft::SelfRate(_), false) => Phase::CollectingSelfRateDetails,
            (FlowDraft::Offers { .. }, false) => Phase::CollectingOffers,
        }
    }

    /// Ignored while a submission is outstanding.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if let Some(in_flight) = &self.in_flight {
            tracing::debug!(id = in_flight.id, "submit ignored while a request is in flight");
            return None;
        }
        self.started = true;

        match assemble(&self.input, &self.banks, self.language()) {
            Err(errors) => {
                tracing::debug!(errors = errors.errors.len(), "assessment input rejected");
                self.outcome = Outcome::ValidationFailed(errors);
                self.incomplete_offers.clear();
                None
            }
            Ok(validated) => {
                self.incomplete_offers = validated.incomplete_offers;
                Some(self.dispatch(SubmissionKind::User, validated.request))
            }
        }
    }

    /// May return a follow-up resync when the language changed while `id` was in flight.
    pub fn complete(
        &mut self,
        id: u64,
        outcome: anyhow::Result<AssessmentResponse>,
    ) -> Option<Submission> {
        let in_flight = match self.in_flight.take() {
            Some(in_flight) if in_flight.id == id => in_flight,
            other => {
                tracing::debug!(id, "discarding response for a superseded submission");
                self.in_flight = other;
                return None;
            }
        };

        let flow = in_flight.request.flow_kind();
        let decoded = outcome.and_then(|response| response.validate_and_into_result(flow));

        match (in_flight.kind, decoded) {
            (kind, Ok(result)) => {
                tracing::info!(
                    id,
                    ?kind,
                    ?flow,
                    status = %result.status,
                    language = in_flight.request.language.code(),
                    "assessment received"
                );
                match &mut self.outcome {
                    Outcome::RequestFailed { previous, .. } if kind == SubmissionKind::Resync => {
                        *previous = Some(Box::new(result));
                    }
                    current => *current = Outcome::Result(Box::new(result)),
                }
                self.last_submitted = Some(in_flight.request);
            }
            (SubmissionKind::User, Err(err)) => {
                tracing::warn!(id, error = %err, "assessment request failed");
                let previous = match std::mem::replace(&mut self.outcome, Outcome::None) {
                    Outcome::Result(result) => Some(result),
                    Outcome::RequestFailed { previous, .. } => previous,
                    _ => None,
                };
                self.outcome = Outcome::RequestFailed {
                    message: REQUEST_FAILED.to_string(),
                    previous,
                };
            }
            (SubmissionKind::Resync, Err(err)) => {
                tracing::warn!(id, error = %err, "locale resubmission failed; keeping current result");
            }
        }

        if std::mem::take(&mut self.resync_pending) {
            return self.resync_if_needed();
        }
        None
    }

    pub fn set_locale(&mut self, locale: Locale) -> Option<Submission> {
        self.locale = locale;
        if self.in_flight.is_some() {
            self.resync_pending = true;
            return None;
        }
        self.resync_if_needed()
    }

    pub fn restart(&mut self) {
        self.started = true;
        self.input = WizardInput::default();
        self.outcome = Outcome::None;
        self.incomplete_offers.clear();
        self.last_submitted = None;
        self.in_flight = None;
        self.resync_pending = false;
    }

    pub async fn submit(&mut self, api: &dyn RatesApi) -> Phase {
        let submission = self.begin_submit();
        self.drive(api, submission).await;
        self.phase()
    }

    /// Handles user commands and locale changes in arrival order until `commands` closes.
    pub async fn run(
        &mut self,
        api: &dyn RatesApi,
        mut commands: mpsc::Receiver<WizardCommand>,
        mut locale: watch::Receiver<Locale>,
        settled: mpsc::Sender<Settled>,
    ) {
        let mut locale_open = true;
        loop {
            let submission = tokio::select! {
                command = commands.recv() => match command {
                    Some(WizardCommand::Edit(input)) => {
                        *self.input_mut() = input;
                        continue;
                    }
                    Some(WizardCommand::Submit) => self.begin_submit(),
                    Some(WizardCommand::Restart) => {
                        self.restart();
                        None
                    }
                    None => break,
                },
                changed = locale.changed(), if locale_open => {
                    if changed.is_err() {
                        tracing::debug!("locale signal closed");
                        locale_open = false;
                        continue;
                    }
                    let next = locale.borrow_and_update().clone();
                    match self.set_locale(next) {
                        Some(submission) => Some(submission),
                        None => continue,
                    }
                }
            };

            self.drive(api, submission).await;
            if settled.send(self.settled()).await.is_err() {
                tracing::debug!("settled receiver dropped");
            }
        }
        tracing::debug!(service = api.service_name(), "wizard commands closed");
    }

    fn settled(&self) -> Settled {
        Settled {
            phase: self.phase(),
            language: self.language(),
            result: self.shown_result().cloned(),
        }
    }

    async fn drive(&mut self, api: &dyn RatesApi, mut submission: Option<Submission>) {
        while let Some(s) = submission {
            tracing::debug!(service = api.service_name(), id = s.id, "sending assessment");
            let outcome = api.submit_assessment(&s.request).await;
            submission = self.complete(s.id, outcome);
        }
    }

    fn resync_if_needed(&mut self) -> Option<Submission> {
        self.shown_result()?;
        let language = self.language();
        let request = self
            .last_submitted
            .as_ref()
            .filter(|r| r.language != language)?
            .with_language(language);
        Some(self.dispatch(SubmissionKind::Resync, request))
    }

    fn dispatch(&mut self, kind: SubmissionKind, request: AssessmentRequest) -> Submission {
        self.next_id += 1;
        let id = self.next_id;
        tracing::debug!(id, ?kind, bank_id = request.bank_id, "submitting assessment");
        self.in_flight = Some(InFlight {
            id,
            kind,
            request: request.clone(),
        });
        Submission { id, kind, request }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::RequestFlow;
    use crate::domain::rates::ComparisonResponse;
    use crate::domain::term::{MortgageTerm, RatePreference};
    use crate::status::Status;
    use crate::wizard::input::{OfferAnswer, SelfRateDraft};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        fail: AtomicBool,
        seen: Mutex<Vec<AssessmentRequest>>,
    }

    impl FakeApi {
        fn seen(&self) -> Vec<AssessmentRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    fn response_for(language: Language) -> AssessmentResponse {
        serde_json::from_value(json!({
            "status": "GREEN",
            "analysisText": format!("analysis {}", language.code()),
        }))
        .unwrap()
    }

    #[async_trait::async_trait]
    impl RatesApi for FakeApi {
        fn service_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_comparison(&self, _term: MortgageTerm) -> anyhow::Result<ComparisonResponse> {
            anyhow::bail!("not used")
        }

        async fn submit_assessment(
            &self,
            request: &AssessmentRequest,
        ) -> anyhow::Result<AssessmentResponse> {
            self.seen.lock().unwrap().push(request.clone());
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("HTTP 503");
            }
            Ok(response_for(request.language))
        }
    }

    fn wizard(locale: &str) -> Wizard {
        Wizard::new(BankDirectory::default(), Locale::parse(locale))
    }

    fn fill_self_rate(w: &mut Wizard) {
        let input = w.input_mut();
        input.bank_key = Some("handelsbanken".to_string());
        input.answer_has_offer(OfferAnswer::No);
        *input.self_rate_mut().unwrap() = SelfRateDraft {
            user_rate: Some(4.05),
            current_term: Some(MortgageTerm::Variable3M),
            binding_end_date: None,
            preference: Some(RatePreference::Short),
        };
    }

    #[test]
    fn phases_follow_input() {
        let mut w = wizard("sv");
        assert_eq!(w.phase(), Phase::Idle);
        w.start();
        assert_eq!(w.phase(), Phase::CollectingBank);
        w.input_mut().bank_key = Some("sbab".to_string());
        assert_eq!(w.phase(), Phase::CollectingOfferAnswer);
        w.input_mut().answer_has_offer(OfferAnswer::Yes);
        assert_eq!(w.phase(), Phase::CollectingOffers);
        w.input_mut().answer_has_offer(OfferAnswer::No);
        assert_eq!(w.phase(), Phase::CollectingSelfRateDetails);
        fill_self_rate(&mut w);
        assert_eq!(w.phase(), Phase::ReadyToSubmit);
        assert!(w.begin_submit().is_some());
        assert_eq!(w.phase(), Phase::Submitting);
    }

    #[test]
    fn second_submit_while_loading_is_ignored() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let first = w.begin_submit().unwrap();
        assert!(w.is_loading());
        assert!(w.begin_submit().is_none());

        assert!(w.complete(first.id, Ok(response_for(Language::Sv))).is_none());
        assert!(!w.is_loading());
        assert_eq!(w.phase(), Phase::Result);
    }

    #[test]
    fn validation_failure_clears_result_and_sends_nothing() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let s = w.begin_submit().unwrap();
        w.complete(s.id, Ok(response_for(Language::Sv)));
        assert!(w.result().is_some());

        w.input_mut().self_rate_mut().unwrap().preference = None;
        assert!(w.begin_submit().is_none());
        assert_eq!(w.phase(), Phase::ValidationFailed);
        assert!(w.result().is_none());
        assert!(!w.is_loading());
        assert_eq!(w.validation_errors().unwrap().errors.len(), 1);
    }

    #[tokio::test]
    async fn request_failure_keeps_input_for_retry() {
        let api = FakeApi::default();
        api.fail.store(true, Ordering::SeqCst);
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let before = w.input().clone();

        assert_eq!(w.submit(&api).await, Phase::RequestFailed);
        assert_eq!(w.input(), &before);
        assert_eq!(w.request_error(), Some(REQUEST_FAILED));

        api.fail.store(false, Ordering::SeqCst);
        assert_eq!(w.submit(&api).await, Phase::Result);
        assert_eq!(api.seen().len(), 2);
    }

    #[test]
    fn malformed_response_is_a_request_failure() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let s = w.begin_submit().unwrap();
        let body: AssessmentResponse =
            serde_json::from_value(json!({"status": "GREEN", "analysisText": "  "})).unwrap();
        w.complete(s.id, Ok(body));
        assert_eq!(w.phase(), Phase::RequestFailed);
        assert!(w.result().is_none());
    }

    #[tokio::test]
    async fn locale_change_resends_same_request_in_new_language() {
        let api = FakeApi::default();
        let mut w = wizard("sv-SE");
        fill_self_rate(&mut w);
        w.submit(&api).await;

        let resync = w.set_locale(Locale::parse("en-GB")).unwrap();
        assert_eq!(resync.kind, SubmissionKind::Resync);
        let sent = api.seen()[0].clone();
        assert_eq!(resync.request, sent.with_language(Language::En));

        let outcome = api.submit_assessment(&resync.request).await;
        w.complete(resync.id, outcome);
        assert_eq!(w.result().unwrap().analysis_text, "analysis EN");
        assert_eq!(w.last_submitted().unwrap().language, Language::En);
    }

    #[tokio::test]
    async fn same_language_or_no_result_does_not_resend() {
        let api = FakeApi::default();
        let mut w = wizard("en");
        assert!(w.set_locale(Locale::parse("sv")).is_none());

        fill_self_rate(&mut w);
        w.submit(&api).await;
        assert!(w.set_locale(Locale::parse("sv-FI")).is_none());
        assert!(w.set_locale(Locale::parse("sv-SE")).is_none());
        assert_eq!(api.seen().len(), 1);
    }

    #[tokio::test]
    async fn failed_resync_keeps_displayed_result() {
        let api = FakeApi::default();
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        w.submit(&api).await;

        api.fail.store(true, Ordering::SeqCst);
        let resync = w.set_locale(Locale::parse("en")).unwrap();
        let outcome = api.submit_assessment(&resync.request).await;
        w.complete(resync.id, outcome);

        assert_eq!(w.phase(), Phase::Result);
        assert_eq!(w.result().unwrap().analysis_text, "analysis SV");
        assert_eq!(w.last_submitted().unwrap().language, Language::Sv);
    }

    #[test]
    fn locale_change_during_flight_resyncs_after_completion() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let s = w.begin_submit().unwrap();
        assert!(w.set_locale(Locale::parse("en")).is_none());

        let follow_up = w.complete(s.id, Ok(response_for(Language::Sv))).unwrap();
        assert_eq!(follow_up.request.language, Language::En);
        assert_eq!(follow_up.request, s.request.with_language(Language::En));
    }

    #[test]
    fn locale_flip_and_back_during_flight_needs_no_resync() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let s = w.begin_submit().unwrap();
        w.set_locale(Locale::parse("en"));
        w.set_locale(Locale::parse("sv"));
        assert!(w.complete(s.id, Ok(response_for(Language::Sv))).is_none());
    }

    #[test]
    fn response_after_restart_is_dropped() {
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        let s = w.begin_submit().unwrap();
        w.restart();

        assert!(w.complete(s.id, Ok(response_for(Language::Sv))).is_none());
        assert!(w.result().is_none());
        assert_eq!(w.phase(), Phase::CollectingBank);
        assert_eq!(w.input(), &WizardInput::default());
    }

    #[test]
    fn offer_flow_result_uses_offer_labels() {
        let mut w = wizard("en");
        let input = w.input_mut();
        input.bank_key = Some("seb".to_string());
        input.answer_has_offer(OfferAnswer::Yes);
        let offers = input.offers_mut().unwrap();
        offers[0].term = Some(MortgageTerm::Fixed3Y);
        offers[0].rate = Some(3.45);
        input.add_offer();

        let s = w.begin_submit().unwrap();
        assert!(matches!(s.request.flow, RequestFlow::Offers(ref o) if o.len() == 1));
        assert_eq!(w.incomplete_offers(), [1]);

        let body: AssessmentResponse = serde_json::from_value(json!({
            "status": "GREEN",
            "analysisText": "Good.",
            "offerAnalyses": [{"term": "FIXED_3Y", "offeredRate": 3.45, "status": "GREEN"}]
        }))
        .unwrap();
        w.complete(s.id, Ok(body));
        let result = w.result().unwrap();
        assert_eq!(result.status, Status::Favorable);
        assert_eq!(result.label().en, "Good offer");
    }

    #[tokio::test]
    async fn failed_resubmission_keeps_previous_result_for_locale_resync() {
        let api = FakeApi::default();
        let mut w = wizard("sv");
        fill_self_rate(&mut w);
        w.submit(&api).await;

        api.fail.store(true, Ordering::SeqCst);
        assert_eq!(w.submit(&api).await, Phase::RequestFailed);
        assert!(w.result().is_none());
        assert_eq!(w.shown_result().unwrap().analysis_text, "analysis SV");

        api.fail.store(false, Ordering::SeqCst);
        let resync = w.set_locale(Locale::parse("en")).unwrap();
        assert_eq!(resync.kind, SubmissionKind::Resync);
        let outcome = api.submit_assessment(&resync.request).await;
        w.complete(resync.id, outcome);

        assert_eq!(w.phase(), Phase::RequestFailed);
        assert_eq!(w.request_error(), Some(REQUEST_FAILED));
        assert_eq!(w.shown_result().unwrap().analysis_text, "analysis EN");
    }

    #[tokio::test]
    async fn run_interleaves_user_submit_and_locale_change() {
        let api = FakeApi::default();
        let mut w = wizard("sv");
        let mut input = WizardInput::default();
        input.bank_key = Some("handelsbanken".to_string());
        input.answer_has_offer(OfferAnswer::No);
        *input.self_rate_mut().unwrap() = SelfRateDraft {
            user_rate: Some(4.05),
            current_term: Some(MortgageTerm::Fixed2Y),
            binding_end_date: None,
            preference: Some(RatePreference::Long),
        };

        let (commands, command_rx) = mpsc::channel(4);
        let (locale_tx, locale_rx) = watch::channel(Locale::parse("sv"));
        let (settled_tx, mut settled_rx) = mpsc::channel::<Settled>(4);

        let script = async move {
            commands.send(WizardCommand::Edit(input)).await.unwrap();
            commands.send(WizardCommand::Submit).await.unwrap();
            let first = settled_rx.recv().await.unwrap();
            assert_eq!(first.phase, Phase::Result);
            assert_eq!(first.result.unwrap().analysis_text, "analysis SV");

            locale_tx.send(Locale::parse("en-US")).unwrap();
            let second = settled_rx.recv().await.unwrap();
            assert_eq!(second.language, Language::En);
            assert_eq!(second.result.unwrap().analysis_text, "analysis EN");

            commands.send(WizardCommand::Restart).await.unwrap();
            let third = settled_rx.recv().await.unwrap();
            assert_eq!(third.phase, Phase::CollectingBank);
            assert!(third.result.is_none());
        };
        tokio::join!(w.run(&api, command_rx, locale_rx, settled_tx), script);

        let seen = api.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], seen[0].with_language(Language::En));
        assert_eq!(w.phase(), Phase::CollectingBank);
    }
}
