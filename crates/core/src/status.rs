use crate::domain::locale::Language;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Severity band returned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    ExceptionallyFavorable,
    Favorable,
    SlightlyElevated,
    Elevated,
    HighlyElevated,
    Informational,
    #[default]
    Unrecognized,
}

impl Status {
    pub const ALL: [Status; 7] = [
        Status::ExceptionallyFavorable,
        Status::Favorable,
        Status::SlightlyElevated,
        Status::Elevated,
        Status::HighlyElevated,
        Status::Informational,
        Status::Unrecognized,
    ];

    /// Never fails: anything outside the known codes is `Unrecognized`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "GREAT_GREEN" => Status::ExceptionallyFavorable,
            "GREEN" => Status::Favorable,
            "YELLOW" => Status::SlightlyElevated,
            "ORANGE" => Status::Elevated,
            "RED" => Status::HighlyElevated,
            "INFO" => Status::Informational,
            _ => Status::Unrecognized,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Status::ExceptionallyFavorable => "GREAT_GREEN",
            Status::Favorable => "GREEN",
            Status::SlightlyElevated => "YELLOW",
            Status::Elevated => "ORANGE",
            Status::HighlyElevated => "RED",
            Status::Informational => "INFO",
            Status::Unrecognized => "UNKNOWN",
        }
    }

    fn index(self) -> usize {
        match self {
            Status::ExceptionallyFavorable => 0,
            Status::Favorable => 1,
            Status::SlightlyElevated => 2,
            Status::Elevated => 3,
            Status::HighlyElevated => 4,
            Status::Informational => 5,
            Status::Unrecognized => 6,
        }
    }

    /// Label for this band in the vocabulary of the flow that produced it.
    pub fn label(self, flow: Flow) -> &'static StatusLabel {
        &flow.labels()[self.index()]
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = Option::<String>::deserialize(deserializer)?;
        Ok(code.as_deref().map(Status::from_code).unwrap_or(Status::Unrecognized))
    }
}

/// Which wizard branch produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    SelfRate,
    Offer,
}

impl Flow {
    fn labels(self) -> &'static [StatusLabel; 7] {
        match self {
            Flow::SelfRate => &SELF_RATE_LABELS,
            Flow::Offer => &OFFER_LABELS,
        }
    }
}

/// Colour family a band is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Neutral,
    Caution,
    Warning,
    Negative,
    Info,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    pub sv: &'static str,
    pub en: &'static str,
    pub tone: Tone,
}

impl StatusLabel {
    pub fn text(&self, language: Language) -> &'static str {
        match language {
            Language::Sv => self.sv,
            Language::En => self.en,
        }
    }
}

// Indexed by `Status::index`.
static SELF_RATE_LABELS: [StatusLabel; 7] = [
    StatusLabel {
        sv: "Mycket bra ränta",
        en: "Excellent rate",
        tone: Tone::Positive,
    },
    StatusLabel {
        sv: "Bra ränta",
        en: "Good rate",
        tone: Tone::Positive,
    },
    StatusLabel {
        sv: "Något högre än snittet",
        en: "Slightly above average",
        tone: Tone::Caution,
    },
    StatusLabel {
        sv: "Högre än snittet",
        en: "Above average",
        tone: Tone::Warning,
    },
    StatusLabel {
        sv: "Betydligt högre än snittet",
        en: "Well above average",
        tone: Tone::Negative,
    },
    StatusLabel {
        sv: "Bra att veta",
        en: "Good to know",
        tone: Tone::Info,
    },
    StatusLabel {
        sv: "Kunde inte bedömas",
        en: "Could not be assessed",
        tone: Tone::Muted,
    },
];

static OFFER_LABELS: [StatusLabel; 7] = [
    StatusLabel {
        sv: "Mycket bra erbjudande",
        en: "Excellent offer",
        tone: Tone::Positive,
    },
    StatusLabel {
        sv: "Bra erbjudande",
        en: "Good offer",
        tone: Tone::Positive,
    },
    StatusLabel {
        sv: "Något över marknaden",
        en: "Slightly above the market",
        tone: Tone::Caution,
    },
    StatusLabel {
        sv: "Över marknaden",
        en: "Above the market",
        tone: Tone::Warning,
    },
    StatusLabel {
        sv: "Klart över marknaden",
        en: "Well above the market",
        tone: Tone::Negative,
    },
    StatusLabel {
        sv: "Bra att veta",
        en: "Good to know",
        tone: Tone::Neutral,
    },
    StatusLabel {
        sv: "Erbjudandet kunde inte bedömas",
        en: "Offer could not be assessed",
        tone: Tone::Muted,
    },
];
