//! Staged text pipeline: Clean → Normalize → Transcribe.
//!
//! The orchestrator drives a [`crate::engine::LinguisticEngine`] stage by
//! stage and wraps its results in the token model. The reconstructor turns
//! any stage's output back into sentence strings.

pub mod config;
pub mod orchestrator;
pub mod reconstruct;

pub use config::{Dialect, Domain, PipelineConfig, PronunciationDict};
pub use orchestrator::{EmptyInputPolicy, Pipeline, PipelineOptions};
pub use reconstruct::{reconstruct, reconstruct_text};
