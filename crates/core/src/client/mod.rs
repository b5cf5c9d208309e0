pub mod error;
pub mod http;

use crate::domain::contract::{AssessmentRequest, AssessmentResponse};
use crate::domain::rates::ComparisonResponse;
use crate::domain::term::MortgageTerm;
use anyhow::Result;

pub use error::ServiceError;
pub use http::HttpRatesApi;

/// The external rates and scoring service.
#[async_trait::async_trait]
pub trait RatesApi: Send + Sync {
    fn service_name(&self) -> &'static str;

    async fn fetch_comparison(&self, term: MortgageTerm) -> Result<ComparisonResponse>;

    async fn submit_assessment(&self, request: &AssessmentRequest) -> Result<AssessmentResponse>;
}
