//! Per-request pipeline configuration.
//!
//! A `PipelineConfig` is built for each request and passed by reference into
//! the stage calls, so two concurrent requests can never see each other's
//! dictionary or separators.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Normalization domain hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    #[default]
    Other,
    Sport,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Other => f.write_str("other"),
            Domain::Sport => f.write_str("sport"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "other" | "default" => Ok(Domain::Other),
            "sport" => Ok(Domain::Sport),
            other => Err(format!("unknown domain '{}' (expected: other, sport)", other)),
        }
    }
}

/// Pronunciation variant requested for transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    Standard,
    Northern,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Standard => f.write_str("standard"),
            Dialect::Northern => f.write_str("northern"),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Dialect::Standard),
            "northern" => Ok(Dialect::Northern),
            other => Err(format!(
                "unknown dialect '{}' (expected: standard, northern)",
                other
            )),
        }
    }
}

/// Word → phonemic rendering overrides.
pub type PronunciationDict = HashMap<String, String>;

/// Settings that parameterize the Normalize and Preprocess stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    domain: Domain,
    custom_dictionary: PronunciationDict,
    syllabification_symbol: String,
    word_separator: String,
    stress_labels: bool,
    dialect: Dialect,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    /// Stored verbatim; an empty map means "no overrides".
    pub fn set_custom_dictionary(&mut self, dictionary: PronunciationDict) {
        self.custom_dictionary = dictionary;
    }

    pub fn set_syllabification_symbol(&mut self, symbol: impl Into<String>) {
        self.syllabification_symbol = symbol.into();
    }

    pub fn set_word_separator(&mut self, separator: impl Into<String>) {
        self.word_separator = separator.into();
    }

    pub fn set_stress_labels(&mut self, enabled: bool) {
        self.stress_labels = enabled;
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.set_domain(domain);
        self
    }

    pub fn with_custom_dictionary(mut self, dictionary: PronunciationDict) -> Self {
        self.set_custom_dictionary(dictionary);
        self
    }

    pub fn with_word_separator(mut self, separator: impl Into<String>) -> Self {
        self.set_word_separator(separator);
        self
    }

    pub fn with_syllabification_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.set_syllabification_symbol(symbol);
        self
    }

    pub fn with_stress_labels(mut self, enabled: bool) -> Self {
        self.set_stress_labels(enabled);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.set_dialect(dialect);
        self
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn custom_dictionary(&self) -> &PronunciationDict {
        &self.custom_dictionary
    }

    pub fn syllabification_symbol(&self) -> &str {
        &self.syllabification_symbol
    }

    pub fn word_separator(&self) -> &str {
        &self.word_separator
    }

    pub fn stress_labels(&self) -> bool {
        self.stress_labels
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}
