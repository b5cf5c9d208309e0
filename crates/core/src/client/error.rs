use std::fmt;

/// Failure talking to one of the service endpoints.
///
/// `stage` is one of `transport`, `http`, `decode` or `validate`.
#[derive(Debug, Clone)]
pub struct ServiceError {
    pub endpoint: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_body: Option<String>,
}

impl ServiceError {
    pub fn new(endpoint: &'static str, stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            endpoint,
            stage,
            detail: detail.into(),
            raw_body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rates service error (endpoint={}, stage={}): {}",
            self.endpoint, self.stage, self.detail
        )
    }
}

impl std::error::Error for ServiceError {}
