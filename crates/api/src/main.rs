use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radar_core::client::{HttpRatesApi, RatesApi};
use radar_core::comparison::{ComparisonTable, ComparisonView, SortColumn, SortDirection, SortSpec};
use radar_core::domain::bank::{Bank, BankDirectory};
use radar_core::domain::contract::AssessmentResult;
use radar_core::domain::locale::Locale;
use radar_core::domain::term::{MortgageTerm, RatePreference};
use radar_core::present::{summarize, AssessmentSummary, ComparisonSummary};
use radar_core::wizard::{
    Field, FlowDraft, OfferAnswer, OfferDraft, Phase, Problem, SelfRateDraft, Wizard, WizardInput,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = radar_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let api: Option<Arc<dyn RatesApi>> = match HttpRatesApi::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "rates client unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        api,
        banks: Arc::new(BankDirectory::default()),
        default_locale: settings.locale(),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, locale = %state.default_locale, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/banks", get(list_banks))
        .route("/comparison", get(get_comparison))
        .route("/assessment", post(post_assessment))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    api: Option<Arc<dyn RatesApi>>,
    banks: Arc<BankDirectory>,
    default_locale: Locale,
}

impl AppState {
    fn locale(&self, lang: Option<&str>) -> Locale {
        lang.map(Locale::parse)
            .unwrap_or_else(|| self.default_locale.clone())
    }
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn list_banks(State(state): State<AppState>) -> Json<Vec<Bank>> {
    Json(state.banks.banks().to_vec())
}

#[derive(Debug, Deserialize)]
struct ComparisonQuery {
    term: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiComparison {
    view: ComparisonView,
    display: ComparisonSummary,
}

async fn get_comparison(
    State(state): State<AppState>,
    Query(q): Query<ComparisonQuery>,
) -> Response {
    let Some(api) = &state.api else {
        return error(StatusCode::SERVICE_UNAVAILABLE, "rates service not configured");
    };

    let term = match q.term.as_deref() {
        None => MortgageTerm::Variable3M,
        Some(s) => match MortgageTerm::parse_comparison(s) {
            Some(term) => term,
            None => return error(StatusCode::BAD_REQUEST, format!("unsupported term: {s}")),
        },
    };

    let sort = match q.sort.as_deref().map(|s| (s, SortColumn::parse(s))) {
        None => None,
        Some((s, None)) => {
            return error(StatusCode::BAD_REQUEST, format!("unknown sort column: {s}"))
        }
        Some((_, Some(column))) => {
            let direction = q
                .dir
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or_else(|| column.default_direction());
            Some(SortSpec { column, direction })
        }
    };

    let language = state.locale(q.lang.as_deref()).contract_language();

    let mut table = ComparisonTable::new(term);
    table.set_sort(sort);
    let ticket = table.begin_fetch(term);
    let outcome = api.fetch_comparison(term).await;
    if let Err(e) = &outcome {
        sentry_anyhow::capture_anyhow(e);
    }
    table.complete_fetch(ticket, outcome);

    match table.view(language) {
        Some(view) => {
            let display = ComparisonSummary::from(&view);
            Json(ApiComparison { view, display }).into_response()
        }
        None => error(
            StatusCode::BAD_GATEWAY,
            table.error().unwrap_or("rates unavailable"),
        ),
    }
}

/// Flat form as posted by the web client. Fields of the branch not chosen are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AssessmentForm {
    bank: Option<String>,
    loan_amount: Option<f64>,
    has_offer: OfferAnswer,
    user_rate: Option<f64>,
    current_term: Option<MortgageTerm>,
    binding_end_date: Option<NaiveDate>,
    preference: Option<RatePreference>,
    offers: Vec<OfferDraft>,
}

impl AssessmentForm {
    fn into_input(self) -> WizardInput {
        let mut input = WizardInput {
            bank_key: self.bank,
            loan_amount: self.loan_amount,
            flow: FlowDraft::Unanswered,
        };
        input.answer_has_offer(self.has_offer);

        if let Some(draft) = input.self_rate_mut() {
            *draft = SelfRateDraft {
                user_rate: self.user_rate,
                current_term: self.current_term,
                binding_end_date: self.binding_end_date,
                preference: self.preference,
            };
        }
        if let Some(offers) = input.offers_mut() {
            if !self.offers.is_empty() {
                *offers = self.offers;
            }
        }
        input
    }
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiFieldError {
    field: Field,
    problem: Problem,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiValidationErrors {
    errors: Vec<ApiFieldError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiAssessment {
    result: AssessmentResult,
    display: AssessmentSummary,
    incomplete_offers: Vec<usize>,
}

async fn post_assessment(
    State(state): State<AppState>,
    Query(q): Query<LangQuery>,
    Json(form): Json<AssessmentForm>,
) -> Response {
    let Some(api) = &state.api else {
        return error(StatusCode::SERVICE_UNAVAILABLE, "rates service not configured");
    };

    let locale = state.locale(q.lang.as_deref());
    let language = locale.contract_language();
    let mut wizard = Wizard::new(state.banks.as_ref().clone(), locale);
    *wizard.input_mut() = form.into_input();

    match wizard.submit(api.as_ref()).await {
        Phase::Result => {
            let Some(result) = wizard.result() else {
                return error(StatusCode::INTERNAL_SERVER_ERROR, "missing result");
            };
            Json(ApiAssessment {
                display: summarize(result, language),
                result: result.clone(),
                incomplete_offers: wizard.incomplete_offers().to_vec(),
            })
            .into_response()
        }
        Phase::ValidationFailed => {
            let errors = wizard
                .validation_errors()
                .map(|v| {
                    v.errors
                        .iter()
                        .map(|e| ApiFieldError {
                            field: e.field,
                            problem: e.problem,
                            message: e.message(language),
                        })
                        .collect()
                })
                .unwrap_or_default();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiValidationErrors { errors }),
            )
                .into_response()
        }
        Phase::RequestFailed => error(
            StatusCode::BAD_GATEWAY,
            wizard.request_error().unwrap_or("assessment unavailable"),
        ),
        phase => {
            tracing::error!(?phase, "assessment ended in unexpected phase");
            error(StatusCode::INTERNAL_SERVER_ERROR, "unexpected state")
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &radar_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
