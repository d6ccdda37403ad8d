//! JSON message protocol between clients and the daemon.
//!
//! Token entries embed their whole lineage: a transcribed token carries its
//! normalized token, which carries its clean token, which carries the
//! original input span.

use crate::error::{ErrorKind, FrontendError};
use crate::pipeline::{Dialect, Domain, PronunciationDict};
use crate::token::{
    CleanToken, NormalizedToken, OriginalToken, StageElement, StageOutput, TagKind, TagToken,
    Token, TranscribedToken,
};
use serde::{Deserialize, Serialize};

/// Requests sent by clients to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Clean raw text
    Clean {
        content: String,
        #[serde(default)]
        parse_html: bool,
    },
    /// Clean and normalize text
    Normalize {
        content: String,
        #[serde(default)]
        domain: Option<Domain>,
        #[serde(default)]
        parse_html: bool,
        #[serde(default)]
        no_tag_tokens_in_content: bool,
    },
    /// Clean, normalize and transcribe text
    Preprocess {
        content: String,
        #[serde(default)]
        domain: Option<Domain>,
        #[serde(default)]
        parse_html: bool,
        #[serde(default)]
        pronunciation_dict: PronunciationDict,
        /// Syllabification symbol, stored verbatim
        #[serde(default)]
        syllabified: Option<String>,
        #[serde(default)]
        word_separator: Option<String>,
        #[serde(default)]
        stress_labels: Option<bool>,
        #[serde(default)]
        dialect: Option<Dialect>,
        #[serde(default)]
        no_tag_tokens_in_content: bool,
    },
    /// Static normalization and phoneme defaults
    GetDefaultParameters,
    /// Protocol version
    GetVersion,
    /// Any request type this daemon does not know
    #[serde(other)]
    Unsupported,
}

impl Request {
    /// Serialize request to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize request from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Failure classes reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Malformed or empty request input
    InvalidArgument,
    /// The linguistic engine failed or returned an inconsistent result
    EngineFailure,
    /// Unsupported configuration combination
    FailedPrecondition,
    /// Request type not implemented by this daemon
    NotImplemented,
    /// Anything else
    Internal,
}

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Input => Status::InvalidArgument,
            ErrorKind::Engine => Status::EngineFailure,
            ErrorKind::Configuration => Status::FailedPrecondition,
            ErrorKind::Internal => Status::Internal,
        }
    }
}

/// The original input span of a clean token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalTokenMessage {
    pub name: String,
    pub index: usize,
    pub span_from: usize,
    pub span_to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanTokenMessage {
    pub name: String,
    pub index: usize,
    pub original_token: OriginalTokenMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTokenMessage {
    pub name: String,
    pub index: usize,
    pub variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default)]
    pub spell_corrected: bool,
    pub clean_token: CleanTokenMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscribedTokenMessage {
    pub name: String,
    pub index: usize,
    pub variants: Vec<String>,
    pub normalized_token: NormalizedTokenMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTokenMessage {
    pub name: String,
    pub index: usize,
    pub kind: TagKind,
}

/// One element of a token list: `{"tag": ...}` or `{"token": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEntry<T> {
    Tag(TagTokenMessage),
    Token(T),
}

impl From<&OriginalToken> for OriginalTokenMessage {
    fn from(token: &OriginalToken) -> Self {
        let span = token.span();
        Self {
            name: token.name().to_string(),
            index: span.source_index,
            span_from: span.start,
            span_to: span.end,
        }
    }
}

impl From<&CleanToken> for CleanTokenMessage {
    fn from(token: &CleanToken) -> Self {
        Self {
            name: token.name().to_string(),
            index: token.index(),
            original_token: token.original().into(),
        }
    }
}

impl From<&NormalizedToken> for NormalizedTokenMessage {
    fn from(token: &NormalizedToken) -> Self {
        Self {
            name: token.name().to_string(),
            index: token.index(),
            variants: token.variants().to_vec(),
            pos: token.pos().map(str::to_string),
            spell_corrected: token.spell_corrected(),
            clean_token: token.clean_token().into(),
        }
    }
}

impl From<&TranscribedToken> for TranscribedTokenMessage {
    fn from(token: &TranscribedToken) -> Self {
        Self {
            name: token.name().to_string(),
            index: token.index(),
            variants: token.variants().to_vec(),
            normalized_token: token.normalized_token().into(),
        }
    }
}

impl From<&TagToken> for TagTokenMessage {
    fn from(tag: &TagToken) -> Self {
        Self {
            name: tag.name().to_string(),
            index: tag.index(),
            kind: tag.kind(),
        }
    }
}

/// Convert a stage output into its wire token list, preserving order.
pub fn token_entries<T, M>(output: &StageOutput<T>) -> Vec<TokenEntry<M>>
where
    T: Token,
    M: for<'a> From<&'a T>,
{
    output
        .iter()
        .map(|element| match element {
            StageElement::Token(token) => TokenEntry::Token(M::from(&**token)),
            StageElement::Tag(tag) => TokenEntry::Tag(tag.into()),
        })
        .collect()
}

/// `get_default_parameters` normalization section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub domain: Domain,
}

/// `get_default_parameters` phoneme section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonemeDescription {
    pub alphabet: String,
    pub dialect: Dialect,
    /// Syllabification symbol; empty when syllables are not marked
    pub syllabified: String,
    pub stress_labels: bool,
    pub word_separator: String,
}

/// Responses sent by the daemon to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Clean stage result
    Clean {
        tokens: Vec<TokenEntry<CleanTokenMessage>>,
        processed_content: String,
    },
    /// Normalize stage result, one processed string per sentence
    Normalize {
        tokens: Vec<TokenEntry<NormalizedTokenMessage>>,
        processed_content: Vec<String>,
    },
    /// Preprocess stage result, one processed string per sentence
    Preprocess {
        tokens: Vec<TokenEntry<TranscribedTokenMessage>>,
        processed_content: Vec<String>,
    },
    /// Static defaults
    DefaultParameters {
        normalization: NormalizationParams,
        phonemes: PhonemeDescription,
    },
    /// Protocol version
    Version { version: u32 },
    /// Error occurred
    Error { status: Status, message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Error response for a failed request, classified by error kind.
    pub fn from_error(error: &FrontendError) -> Self {
        Response::Error {
            status: error.kind().into(),
            message: error.to_string(),
        }
    }

    pub fn not_implemented() -> Self {
        Response::Error {
            status: Status::NotImplemented,
            message: "request type not implemented".to_string(),
        }
    }
}
