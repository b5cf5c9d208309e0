pub mod client;
pub mod comparison;
pub mod domain;
pub mod format;
pub mod present;
pub mod status;
pub mod time;
pub mod wizard;

pub mod config {
    use anyhow::Context;

    use crate::domain::locale::Locale;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub rates_api_base_url: Option<String>,
        pub rates_api_timeout_secs: Option<u64>,
        pub sentry_dsn: Option<String>,
        pub default_locale: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                rates_api_base_url: std::env::var("RATES_API_BASE_URL").ok(),
                rates_api_timeout_secs: std::env::var("RATES_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                default_locale: std::env::var("DEFAULT_LOCALE").ok(),
            })
        }

        pub fn require_rates_api_base_url(&self) -> anyhow::Result<&str> {
            self.rates_api_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .context("RATES_API_BASE_URL is required")
        }

        pub fn locale(&self) -> Locale {
            self.default_locale
                .as_deref()
                .map(Locale::parse)
                .unwrap_or_default()
        }
    }
}
