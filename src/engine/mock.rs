use super::{CleanUnit, EngineToken, LinguisticEngine, NormalizedUnit, TranscribedUnit};
use crate::error::{FrontendError, Result};
use crate::pipeline::config::{Dialect, Domain, PipelineConfig};
use crate::token::Stage;
use std::sync::Mutex;

/// Scripted engine for testing.
///
/// Unscripted stages pass text through unchanged: `clean` splits on
/// whitespace, `normalize` and `transcribe` map every input 1:1.
#[derive(Debug, Default)]
pub struct MockEngine {
    clean_units: Option<Vec<CleanUnit>>,
    normalized_units: Option<Vec<NormalizedUnit>>,
    transcribed_units: Option<Vec<TranscribedUnit>>,
    failing_stage: Option<Stage>,
    dialects: Vec<Dialect>,
    last_domain: Mutex<Option<Domain>>,
    last_config: Mutex<Option<PipelineConfig>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            dialects: vec![Dialect::Standard],
            ..Default::default()
        }
    }

    /// Return these units from `clean` regardless of input.
    pub fn with_clean_units(mut self, units: Vec<CleanUnit>) -> Self {
        self.clean_units = Some(units);
        self
    }

    pub fn with_normalized_units(mut self, units: Vec<NormalizedUnit>) -> Self {
        self.normalized_units = Some(units);
        self
    }

    pub fn with_transcribed_units(mut self, units: Vec<TranscribedUnit>) -> Self {
        self.transcribed_units = Some(units);
        self
    }

    /// Fail with `FrontendError::Engine` when `stage` is invoked.
    pub fn with_failure(mut self, stage: Stage) -> Self {
        self.failing_stage = Some(stage);
        self
    }

    pub fn with_dialects(mut self, dialects: Vec<Dialect>) -> Self {
        self.dialects = dialects;
        self
    }

    /// Domain passed to the most recent `normalize` call.
    pub fn last_domain(&self) -> Option<Domain> {
        self.last_domain.lock().ok().and_then(|guard| *guard)
    }

    /// Configuration passed to the most recent `transcribe` call.
    pub fn last_config(&self) -> Option<PipelineConfig> {
        self.last_config
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }

    fn check_failure(&self, stage: Stage) -> Result<()> {
        if self.failing_stage == Some(stage) {
            return Err(FrontendError::Engine {
                stage,
                message: "mock engine failure".to_string(),
            });
        }
        Ok(())
    }
}

impl LinguisticEngine for MockEngine {
    fn clean(&self, text: &str, _parse_html: bool) -> Result<Vec<CleanUnit>> {
        self.check_failure(Stage::Clean)?;
        if let Some(units) = &self.clean_units {
            return Ok(units.clone());
        }

        let mut units = Vec::new();
        let mut offset = 0;
        for word in text.split_whitespace() {
            // split_whitespace yields subslices in order, so find from the last end
            let start = offset + text[offset..].find(word).unwrap_or(0);
            let end = start + word.len();
            units.push(CleanUnit::token(word, start, end));
            offset = end;
        }
        Ok(units)
    }

    fn normalize(
        &self,
        tokens: &[EngineToken],
        domain: Domain,
        _parse_html: bool,
        _split_sentences: bool,
    ) -> Result<Vec<NormalizedUnit>> {
        self.check_failure(Stage::Normalize)?;
        if let Ok(mut guard) = self.last_domain.lock() {
            *guard = Some(domain);
        }
        if let Some(units) = &self.normalized_units {
            return Ok(units.clone());
        }

        Ok(tokens
            .iter()
            .map(|token| {
                if token.is_structural {
                    NormalizedUnit::tag(token.text.clone())
                } else {
                    NormalizedUnit::token(token.text.clone(), token.index)
                }
            })
            .collect())
    }

    fn transcribe(
        &self,
        tokens: &[EngineToken],
        config: &PipelineConfig,
    ) -> Result<Vec<TranscribedUnit>> {
        self.check_failure(Stage::Transcribe)?;
        if let Ok(mut guard) = self.last_config.lock() {
            *guard = Some(config.clone());
        }
        if let Some(units) = &self.transcribed_units {
            return Ok(units.clone());
        }

        Ok(tokens
            .iter()
            .map(|token| {
                if token.is_structural {
                    TranscribedUnit::tag(token.text.clone())
                } else {
                    TranscribedUnit::token(token.text.clone(), token.index)
                }
            })
            .collect())
    }

    fn supports_dialect(&self, dialect: Dialect) -> bool {
        self.dialects.contains(&dialect)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
