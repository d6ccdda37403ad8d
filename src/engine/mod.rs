//! Linguistic engine boundary.
//!
//! The pipeline never cleans, normalizes or transcribes text itself; it hands
//! the work to a [`LinguisticEngine`] and wraps whatever comes back in the
//! token model. Implementations must be deterministic for the pipeline's
//! idempotence guarantees to hold.

pub mod basic;
pub mod mock;

pub use basic::BasicEngine;
pub use mock::MockEngine;

use crate::error::Result;
use crate::pipeline::config::{Dialect, Domain, PipelineConfig};
use std::sync::Arc;

/// One unit reported by the engine's cleaning function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanUnit {
    /// Cleaned text, or the tag name for structural units.
    pub text: String,
    /// Byte offsets into the raw input. Ignored for structural units.
    pub offset_start: usize,
    pub offset_end: usize,
    pub is_structural: bool,
}

impl CleanUnit {
    pub fn token(text: impl Into<String>, offset_start: usize, offset_end: usize) -> Self {
        Self {
            text: text.into(),
            offset_start,
            offset_end,
            is_structural: false,
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            offset_start: 0,
            offset_end: 0,
            is_structural: true,
        }
    }
}

/// Input element handed to `normalize` and `transcribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineToken {
    /// Stage index of the element in the previous stage's output.
    pub index: usize,
    pub text: String,
    pub is_structural: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUnit {
    pub text: String,
    pub variants: Vec<String>,
    pub pos: Option<String>,
    pub spell_corrected: bool,
    /// Index of the input token this unit derives from. Required for content.
    pub source: Option<usize>,
    pub is_structural: bool,
}

impl NormalizedUnit {
    pub fn token(text: impl Into<String>, source: usize) -> Self {
        let text = text.into();
        Self {
            variants: vec![text.clone()],
            text,
            pos: None,
            spell_corrected: false,
            source: Some(source),
            is_structural: false,
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            variants: Vec::new(),
            pos: None,
            spell_corrected: false,
            source: None,
            is_structural: true,
        }
    }

    pub fn with_variants(mut self, variants: Vec<String>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribedUnit {
    pub text: String,
    pub variants: Vec<String>,
    pub source: Option<usize>,
    pub is_structural: bool,
}

impl TranscribedUnit {
    pub fn token(text: impl Into<String>, source: usize) -> Self {
        let text = text.into();
        Self {
            variants: vec![text.clone()],
            text,
            source: Some(source),
            is_structural: false,
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            text: name.into(),
            variants: Vec::new(),
            source: None,
            is_structural: true,
        }
    }
}

/// The opaque linguistic collaborator behind all three stages.
pub trait LinguisticEngine: Send + Sync {
    /// Split and clean raw input. Offsets refer to `text` as given.
    fn clean(&self, text: &str, parse_html: bool) -> Result<Vec<CleanUnit>>;

    /// Normalize clean tokens (numbers, abbreviations, symbols).
    fn normalize(
        &self,
        tokens: &[EngineToken],
        domain: Domain,
        parse_html: bool,
        split_sentences: bool,
    ) -> Result<Vec<NormalizedUnit>>;

    /// Convert normalized tokens to phonemic renderings.
    fn transcribe(
        &self,
        tokens: &[EngineToken],
        config: &PipelineConfig,
    ) -> Result<Vec<TranscribedUnit>>;

    fn supports_dialect(&self, dialect: Dialect) -> bool {
        dialect == Dialect::Standard
    }

    /// Name for logging.
    fn name(&self) -> &str;
}

impl<T: LinguisticEngine + ?Sized> LinguisticEngine for Arc<T> {
    fn clean(&self, text: &str, parse_html: bool) -> Result<Vec<CleanUnit>> {
        (**self).clean(text, parse_html)
    }

    fn normalize(
        &self,
        tokens: &[EngineToken],
        domain: Domain,
        parse_html: bool,
        split_sentences: bool,
    ) -> Result<Vec<NormalizedUnit>> {
        (**self).normalize(tokens, domain, parse_html, split_sentences)
    }

    fn transcribe(
        &self,
        tokens: &[EngineToken],
        config: &PipelineConfig,
    ) -> Result<Vec<TranscribedUnit>> {
        (**self).transcribe(tokens, config)
    }

    fn supports_dialect(&self, dialect: Dialect) -> bool {
        (**self).supports_dialect(dialect)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_constructors() {
        let unit = CleanUnit::token("eftir", 3, 8);
        assert!(!unit.is_structural);
        assert_eq!((unit.offset_start, unit.offset_end), (3, 8));

        let tag = NormalizedUnit::tag("<sentence>");
        assert!(tag.is_structural);
        assert_eq!(tag.source, None);

        let norm = NormalizedUnit::token("kílómetrar", 2).with_pos("n");
        assert_eq!(norm.variants, vec!["kílómetrar".to_string()]);
        assert_eq!(norm.pos.as_deref(), Some("n"));
    }

    #[test]
    fn test_engine_trait_is_object_safe() {
        let engine: Arc<dyn LinguisticEngine> = Arc::new(BasicEngine::new());
        assert_eq!(engine.name(), "basic");
        assert!(engine.supports_dialect(Dialect::Standard));
    }
}
