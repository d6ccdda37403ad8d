//! tts-frontend - text preprocessing for speech synthesis
//!
//! Cleans, normalizes and phonemically transcribes text while keeping a
//! provenance chain from every output token back to the input span it came from.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod daemon;
pub mod defaults;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod pipeline;
pub mod token;

// Engine seam
pub use engine::{BasicEngine, LinguisticEngine, MockEngine};

// Pipeline
pub use pipeline::{
    Dialect, Domain, EmptyInputPolicy, Pipeline, PipelineConfig, PipelineOptions,
    PronunciationDict, reconstruct, reconstruct_text,
};

// Token model
pub use token::{
    CleanToken, NormalizedToken, OriginalToken, Span, Stage, StageElement, StageOutput, TagToken,
    Token, TranscribedToken, lineage,
};

// Error handling
pub use error::{ErrorKind, FrontendError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
