use serde::{Deserialize, Serialize};
use std::fmt;

/// Display locale as the client knows it (`sv`, `sv-SE`, `en_GB`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    language: String,
    region: Option<String>,
}

impl Locale {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        let mut parts = tag.split(['-', '_']);
        let language = parts
            .next()
            .map(|s| s.to_ascii_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "sv".to_string());
        let region = parts
            .next()
            .map(|s| s.to_ascii_uppercase())
            .filter(|s| !s.is_empty());
        Self { language, region }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn contract_language(&self) -> Language {
        Language::from(self)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::parse("sv-SE")
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{}", self.language, region),
            None => f.write_str(&self.language),
        }
    }
}

/// The two languages the external contracts understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "SV")]
    Sv,
    #[serde(rename = "EN")]
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Sv => "SV",
            Language::En => "EN",
        }
    }
}

impl From<&Locale> for Language {
    fn from(locale: &Locale) -> Self {
        // The scoring service falls back to Swedish for anything it does not know.
        if locale.language == "en" {
            Language::En
        } else {
            Language::Sv
        }
    }
}
