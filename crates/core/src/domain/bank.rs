use serde::Serialize;

/// One supported bank: internal key, scoring-service id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bank {
    pub key: String,
    pub id: i64,
    pub display_name: String,
}

/// Resolves internal bank keys to the identifiers the scoring contract needs.
#[derive(Debug, Clone)]
pub struct BankDirectory {
    banks: Vec<Bank>,
}

const DEFAULT_BANKS: [(&str, i64, &str); 12] = [
    ("swedbank", 1, "Swedbank"),
    ("nordea", 2, "Nordea"),
    ("handelsbanken", 3, "Handelsbanken"),
    ("seb", 4, "SEB"),
    ("sbab", 5, "SBAB"),
    ("icabanken", 6, "ICA Banken"),
    ("lansforsakringarbank", 7, "Länsförsäkringar Bank"),
    ("danskebank", 8, "Danske Bank"),
    ("skandiabanken", 9, "Skandiabanken"),
    ("landshypotekbank", 10, "Landshypotek Bank"),
    ("alandsbanken", 11, "Ålandsbanken"),
    ("ikanobank", 12, "Ikano Bank"),
];

impl Default for BankDirectory {
    fn default() -> Self {
        Self::new(
            DEFAULT_BANKS
                .iter()
                .map(|(key, id, name)| Bank {
                    key: (*key).to_string(),
                    id: *id,
                    display_name: (*name).to_string(),
                })
                .collect(),
        )
    }
}

impl BankDirectory {
    pub fn new(banks: Vec<Bank>) -> Self {
        Self { banks }
    }

    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Case-insensitive lookup by internal key.
    pub fn resolve(&self, key: &str) -> Option<&Bank> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.banks.iter().find(|b| b.key.eq_ignore_ascii_case(key))
    }

    pub fn by_display_name(&self, name: &str) -> Option<&Bank> {
        let name = name.trim().to_lowercase();
        self.banks
            .iter()
            .find(|b| b.display_name.to_lowercase() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_keys_case_insensitively() {
        let dir = BankDirectory::default();
        let bank = dir.resolve(" LansforsakringarBank ").unwrap();
        assert_eq!(bank.display_name, "Länsförsäkringar Bank");
        assert_eq!(bank.id, 7);
    }

    #[test]
    fn unknown_or_blank_keys_resolve_to_nothing() {
        let dir = BankDirectory::default();
        assert!(dir.resolve("").is_none());
        assert!(dir.resolve("bank-of-nowhere").is_none());
    }

    #[test]
    fn display_name_maps_back_to_key() {
        let dir = BankDirectory::default();
        assert_eq!(dir.by_display_name("Ålandsbanken").unwrap().key, "alandsbanken");
        assert_eq!(dir.by_display_name(" ica banken ").unwrap().id, 6);
    }
}
