use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Canonical key for a raw entity value: NFC, trimmed, inner whitespace
/// collapsed to one space, lowercased.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    let composed: String = raw.nfc().collect();
    composed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Lowercases tokens and strips every character that is neither a word
/// character nor whitespace.
#[derive(Debug, Clone)]
pub struct TokenCleaner {
    punctuation: Regex,
}

impl TokenCleaner {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            punctuation: Regex::new(r"[^\w\s]")?,
        })
    }

    #[must_use]
    pub fn clean(&self, token: &str) -> String {
        let lowered: String = token.nfc().collect::<String>().to_lowercase();
        self.punctuation.replace_all(&lowered, "").into_owned()
    }
}
