use crate::client::{RatesApi, ServiceError};
use crate::config::Settings;
use crate::domain::contract::{AssessmentRequest, AssessmentResponse};
use crate::domain::rates::ComparisonResponse;
use crate::domain::term::MortgageTerm;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use uuid::Uuid;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const COMPARISON_PATH: &str = "/api/rates/comparison";
const ASSESSMENT_PATH: &str = "/api/smartrate/test";

#[derive(Debug, Clone)]
pub struct HttpRatesApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRatesApi {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_rates_api_base_url()?.to_string();
        let timeout_secs = settings
            .rates_api_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build rates api http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let res = request
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .map_err(|e| ServiceError::new(endpoint, "transport", e.to_string()))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            ServiceError::new(endpoint, "transport", format!("failed to read body: {e}"))
        })?;

        tracing::debug!(
            endpoint,
            %request_id,
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rates service responded"
        );

        if !status.is_success() {
            return Err(ServiceError::new(endpoint, "http", format!("HTTP {status}"))
                .with_body(text)
                .into());
        }

        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ServiceError::new(endpoint, "decode", e.to_string())
                .with_body(text)
                .into()),
        }
    }
}

#[async_trait::async_trait]
impl RatesApi for HttpRatesApi {
    fn service_name(&self) -> &'static str {
        "rates_http_json"
    }

    async fn fetch_comparison(&self, term: MortgageTerm) -> Result<ComparisonResponse> {
        let code = term.comparison_code().ok_or_else(|| {
            ServiceError::new("comparison", "request", format!("no comparison table for {term}"))
        })?;
        let request = self
            .http
            .get(self.url(COMPARISON_PATH))
            .query(&[("term", code)]);

        let parsed: ComparisonResponse = self.send("comparison", request).await?;
        parsed
            .validate()
            .map_err(|e| ServiceError::new("comparison", "validate", e.to_string()))?;

        tracing::info!(%term, rows = parsed.rows.len(), "fetched rate comparison");
        Ok(parsed)
    }

    async fn submit_assessment(&self, request: &AssessmentRequest) -> Result<AssessmentResponse> {
        let http_request = self.http.post(self.url(ASSESSMENT_PATH)).json(request);
        let parsed: AssessmentResponse = self.send("assessment", http_request).await?;

        tracing::info!(
            bank_id = request.bank_id,
            language = request.language.code(),
            status = %parsed.status,
            "assessment returned"
        );
        Ok(parsed)
    }
}
