//! Pipeline orchestration: Clean → Normalize → Transcribe.
//!
//! Each stage hands its input to the [`LinguisticEngine`], checks that what
//! comes back is structurally sound, and wraps it in the token model with
//! parent links to the previous stage. A stage either returns a complete
//! [`StageOutput`] or an error; partial output is never exposed.

use crate::engine::{EngineToken, LinguisticEngine};
use crate::error::{ErrorKind, FrontendError, Result};
use crate::pipeline::config::{Domain, PipelineConfig};
use crate::token::{
    CleanToken, NormalizedPayload, NormalizedToken, OriginalToken, Span, Stage, StageElement,
    StageOutput, TagToken, Token, TranscribedToken,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What to do with empty or whitespace-only input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyInputPolicy {
    /// Fail with `FrontendError::EmptyInput`.
    #[default]
    Reject,
    /// Return an empty stage output without calling the engine.
    Allow,
}

/// Service-level pipeline options (not per request).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub empty_input: EmptyInputPolicy,
    /// Ask the engine to mark sentence boundaries during normalization.
    pub split_sentences: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            empty_input: EmptyInputPolicy::Reject,
            split_sentences: true,
        }
    }
}

/// Stage orchestrator over a shared linguistic engine.
///
/// `Pipeline` holds no per-request state; every call receives its inputs and
/// configuration explicitly, so one instance can serve concurrent requests.
#[derive(Clone)]
pub struct Pipeline {
    engine: Arc<dyn LinguisticEngine>,
    options: PipelineOptions,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("engine", &self.engine.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Pipeline {
    pub fn new(engine: Arc<dyn LinguisticEngine>) -> Self {
        Self::with_options(engine, PipelineOptions::default())
    }

    pub fn with_options(engine: Arc<dyn LinguisticEngine>, options: PipelineOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Clean raw input. The domain hint does not apply to this stage.
    pub fn clean(&self, text: &str, parse_html: bool) -> Result<StageOutput<CleanToken>> {
        if !self.accept_input(text, Stage::Clean)? {
            return Ok(StageOutput::default());
        }

        let units = self
            .engine
            .clean(text, parse_html)
            .map_err(|e| engine_failure(Stage::Clean, e))?;

        let mut elements = Vec::with_capacity(units.len());
        let mut source_index = 0;
        for (index, unit) in units.into_iter().enumerate() {
            if unit.is_structural {
                elements.push(StageElement::Tag(TagToken::new(unit.text, index)));
                continue;
            }

            let (start, end) = (unit.offset_start, unit.offset_end);
            if end < start {
                return Err(FrontendError::inconsistent(
                    Stage::Clean,
                    format!("unit {} ends at {} before it starts at {}", index, end, start),
                ));
            }
            let span = Span::new(start, end, source_index);
            let original = span.slice(text).ok_or_else(|| {
                FrontendError::inconsistent(
                    Stage::Clean,
                    format!(
                        "unit {} span {}..{} is outside the input ({} bytes) or splits a character",
                        index,
                        start,
                        end,
                        text.len()
                    ),
                )
            })?;

            let token = CleanToken::new(unit.text, index, OriginalToken::new(original, span));
            elements.push(StageElement::Token(Arc::new(token)));
            source_index += 1;
        }

        tracing::debug!(elements = elements.len(), "clean stage complete");
        Ok(StageOutput::new(elements))
    }

    /// Clean and normalize raw input.
    pub fn normalize(
        &self,
        text: &str,
        domain: Domain,
        parse_html: bool,
    ) -> Result<StageOutput<NormalizedToken>> {
        if !self.accept_input(text, Stage::Normalize)? {
            return Ok(StageOutput::default());
        }
        let clean = self.clean(text, parse_html)?;
        self.normalize_clean(&clean, domain, parse_html)
    }

    /// Normalize an existing Clean stage output.
    pub fn normalize_clean(
        &self,
        clean: &StageOutput<CleanToken>,
        domain: Domain,
        parse_html: bool,
    ) -> Result<StageOutput<NormalizedToken>> {
        let inputs = engine_inputs(clean);
        let units = self
            .engine
            .normalize(&inputs, domain, parse_html, self.options.split_sentences)
            .map_err(|e| engine_failure(Stage::Normalize, e))?;

        let mut elements = Vec::with_capacity(units.len());
        for (index, unit) in units.into_iter().enumerate() {
            if unit.is_structural {
                elements.push(StageElement::Tag(TagToken::new(unit.text, index)));
                continue;
            }
            let parent = resolve_parent(clean, unit.source, Stage::Normalize, index)?;
            let payload = NormalizedPayload {
                variants: unit.variants,
                pos: unit.pos,
                spell_corrected: unit.spell_corrected,
            };
            let token = NormalizedToken::new(unit.text, index, parent, payload);
            elements.push(StageElement::Token(Arc::new(token)));
        }

        tracing::debug!(%domain, elements = elements.len(), "normalize stage complete");
        Ok(StageOutput::new(elements))
    }

    /// Run all three stages on raw input with the given configuration.
    pub fn preprocess(
        &self,
        text: &str,
        config: &PipelineConfig,
        parse_html: bool,
    ) -> Result<StageOutput<TranscribedToken>> {
        self.check_config(config)?;
        if !self.accept_input(text, Stage::Transcribe)? {
            return Ok(StageOutput::default());
        }
        let clean = self.clean(text, parse_html)?;
        let normalized = self.normalize_clean(&clean, config.domain(), parse_html)?;
        self.transcribe_normalized(&normalized, config)
    }

    /// Transcribe an existing Normalize stage output.
    ///
    /// Custom dictionary entries replace the engine's rendering for tokens
    /// whose normalized form matches an entry exactly.
    pub fn transcribe_normalized(
        &self,
        normalized: &StageOutput<NormalizedToken>,
        config: &PipelineConfig,
    ) -> Result<StageOutput<TranscribedToken>> {
        self.check_config(config)?;
        let inputs = engine_inputs(normalized);
        let units = self
            .engine
            .transcribe(&inputs, config)
            .map_err(|e| engine_failure(Stage::Transcribe, e))?;

        let mut elements = Vec::with_capacity(units.len());
        for (index, unit) in units.into_iter().enumerate() {
            if unit.is_structural {
                elements.push(StageElement::Tag(TagToken::new(unit.text, index)));
                continue;
            }
            let parent = resolve_parent(normalized, unit.source, Stage::Transcribe, index)?;
            let token = match config.custom_dictionary().get(parent.name()) {
                Some(entry) => TranscribedToken::new(entry.clone(), index, parent, vec![entry.clone()]),
                None => TranscribedToken::new(unit.text, index, parent, unit.variants),
            };
            elements.push(StageElement::Token(Arc::new(token)));
        }

        tracing::debug!(
            elements = elements.len(),
            dictionary_entries = config.custom_dictionary().len(),
            "transcribe stage complete"
        );
        Ok(StageOutput::new(elements))
    }

    /// `Ok(false)` when the input is empty and the policy allows it.
    fn accept_input(&self, text: &str, stage: Stage) -> Result<bool> {
        if !text.trim().is_empty() {
            return Ok(true);
        }
        match self.options.empty_input {
            EmptyInputPolicy::Reject => Err(FrontendError::EmptyInput { stage }),
            EmptyInputPolicy::Allow => Ok(false),
        }
    }

    fn check_config(&self, config: &PipelineConfig) -> Result<()> {
        if self.engine.supports_dialect(config.dialect()) {
            Ok(())
        } else {
            Err(FrontendError::UnsupportedDialect {
                dialect: config.dialect().to_string(),
            })
        }
    }
}

/// Flatten a stage output into the engine's input form.
fn engine_inputs<T: Token>(output: &StageOutput<T>) -> Vec<EngineToken> {
    output
        .iter()
        .enumerate()
        .map(|(index, element)| EngineToken {
            index,
            text: element.name().to_string(),
            is_structural: element.is_tag(),
        })
        .collect()
}

fn resolve_parent<P: Token>(
    previous: &StageOutput<P>,
    source: Option<usize>,
    stage: Stage,
    index: usize,
) -> Result<Arc<P>> {
    let source = source.ok_or_else(|| {
        FrontendError::inconsistent(stage, format!("unit {} has no source token", index))
    })?;
    match previous.get(source) {
        Some(StageElement::Token(parent)) => Ok(Arc::clone(parent)),
        Some(StageElement::Tag(tag)) => Err(FrontendError::inconsistent(
            stage,
            format!("unit {} derives from tag '{}' at {}", index, tag.name(), source),
        )),
        None => Err(FrontendError::inconsistent(
            stage,
            format!(
                "unit {} derives from {} but the previous stage has {} elements",
                index,
                source,
                previous.len()
            ),
        )),
    }
}

/// Keep engine and configuration errors as they are; anything else the
/// engine raises becomes a stage failure.
fn engine_failure(stage: Stage, error: FrontendError) -> FrontendError {
    match error.kind() {
        ErrorKind::Engine | ErrorKind::Configuration => error,
        ErrorKind::Input | ErrorKind::Internal => FrontendError::Engine {
            stage,
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BasicEngine, CleanUnit, MockEngine, NormalizedUnit, TranscribedUnit};
    use crate::pipeline::config::Dialect;
    use crate::token::{SENTENCE_MARKER, TagKind, lineage};
    use std::collections::HashMap;

    fn basic_pipeline() -> Pipeline {
        Pipeline::new(Arc::new(BasicEngine::new()))
    }

    fn mock_pipeline(engine: MockEngine) -> Pipeline {
        Pipeline::new(Arc::new(engine))
    }

    #[test]
    fn test_clean_builds_root_tokens_with_spans() {
        let text = "Það voru 55 km eftir.";
        let output = basic_pipeline().clean(text, false).unwrap();

        for (position, element) in output.iter().enumerate() {
            assert_eq!(element.index(), position);
        }
        for token in output.tokens() {
            assert!(token.parent().is_none());
            let span = token.span();
            assert_eq!(&text[span.start..span.end], token.original().name());
        }
        let source_indices: Vec<usize> = output.tokens().map(|t| t.span().source_index).collect();
        assert_eq!(source_indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_clean_maps_structural_units_to_tags() {
        let engine = MockEngine::new().with_clean_units(vec![
            CleanUnit::token("a", 0, 1),
            CleanUnit::tag("<pau>"),
            CleanUnit::token("b", 2, 3),
        ]);
        let output = mock_pipeline(engine).clean("a b", false).unwrap();
        assert_eq!(output.len(), 3);
        assert_eq!(output.get(1).and_then(|e| e.tag_kind()), Some(TagKind::Pause));
        // tags do not consume source indices
        let last = output.get(2).and_then(|e| e.as_token()).unwrap();
        assert_eq!(last.span().source_index, 1);
    }

    #[test]
    fn test_clean_rejects_reversed_offsets() {
        let engine = MockEngine::new().with_clean_units(vec![CleanUnit::token("x", 3, 1)]);
        let result = mock_pipeline(engine).clean("abcd", false);
        match result {
            Err(FrontendError::EngineInconsistent { stage, message }) => {
                assert_eq!(stage, Stage::Clean);
                assert!(message.contains("before it starts"), "got: {}", message);
            }
            other => panic!("Expected EngineInconsistent, got: {:?}", other),
        }
    }

    #[test]
    fn test_clean_rejects_out_of_bounds_offsets() {
        let engine = MockEngine::new().with_clean_units(vec![CleanUnit::token("x", 0, 40)]);
        let result = mock_pipeline(engine).clean("abcd", false);
        assert!(matches!(
            result,
            Err(FrontendError::EngineInconsistent { .. })
        ));
    }

    #[test]
    fn test_clean_rejects_offsets_inside_a_character() {
        let engine = MockEngine::new().with_clean_units(vec![CleanUnit::token("x", 0, 4)]);
        let result = mock_pipeline(engine).clean("það", false);
        assert!(matches!(
            result,
            Err(FrontendError::EngineInconsistent { .. })
        ));
    }

    #[test]
    fn test_empty_input_rejected_by_default() {
        let pipeline = basic_pipeline();
        assert!(matches!(
            pipeline.clean("", false),
            Err(FrontendError::EmptyInput {
                stage: Stage::Clean
            })
        ));
        assert!(matches!(
            pipeline.normalize("   ", Domain::Other, false),
            Err(FrontendError::EmptyInput {
                stage: Stage::Normalize
            })
        ));
        assert!(matches!(
            pipeline.preprocess("\n", &PipelineConfig::default(), false),
            Err(FrontendError::EmptyInput {
                stage: Stage::Transcribe
            })
        ));
    }

    #[test]
    fn test_empty_input_allowed_returns_empty_output() {
        let pipeline = Pipeline::with_options(
            Arc::new(MockEngine::new().with_failure(Stage::Clean)),
            PipelineOptions {
                empty_input: EmptyInputPolicy::Allow,
                ..Default::default()
            },
        );
        // The engine is never called for empty input.
        assert!(pipeline.clean("", false).unwrap().is_empty());
        assert!(
            pipeline
                .normalize(" ", Domain::Sport, false)
                .unwrap()
                .is_empty()
        );
        assert!(
            pipeline
                .preprocess("", &PipelineConfig::default(), false)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_normalize_links_parents() {
        let text = "Það voru 55 km eftir. Sagði þjálfari.";
        let output = basic_pipeline()
            .normalize(text, Domain::Sport, false)
            .unwrap();

        for token in output.tokens() {
            let chain = lineage(&**token);
            assert_eq!(chain.len(), Stage::Normalize.depth());
            let root = chain[chain.len() - 1];
            let span = root.span();
            assert!(text.get(span.start..span.end).is_some());
        }

        let numeral = output
            .tokens()
            .find(|t| t.name() == "fimmtíu og fimm")
            .unwrap();
        assert_eq!(numeral.clean_token().name(), "55");
        assert_eq!(numeral.clean_token().original().name(), "55");

        let boundaries = output
            .iter()
            .filter(|e| e.tag_kind() == Some(TagKind::SentenceBoundary))
            .count();
        assert_eq!(boundaries, 2);
    }

    #[test]
    fn test_normalize_passes_domain_to_engine() {
        let engine = Arc::new(MockEngine::new());
        let pipeline = Pipeline::new(engine.clone());
        pipeline.normalize("hæ", Domain::Sport, false).unwrap();
        assert_eq!(engine.last_domain(), Some(Domain::Sport));
    }

    #[test]
    fn test_normalize_multiple_variants_stay_on_one_token() {
        let engine = MockEngine::new().with_normalized_units(vec![
            NormalizedUnit::token("kílómetrar", 0)
                .with_variants(vec!["kílómetrar".into(), "kílómetra".into()]),
        ]);
        let output = mock_pipeline(engine).normalize("km", Domain::Other, false).unwrap();
        assert_eq!(output.len(), 1);
        let token = output.tokens().next().unwrap();
        assert_eq!(token.variants().len(), 2);
    }

    #[test]
    fn test_normalize_unit_without_source_is_inconsistent() {
        let mut unit = NormalizedUnit::token("x", 0);
        unit.source = None;
        let engine = MockEngine::new().with_normalized_units(vec![unit]);
        let result = mock_pipeline(engine).normalize("x", Domain::Other, false);
        assert!(matches!(
            result,
            Err(FrontendError::EngineInconsistent {
                stage: Stage::Normalize,
                ..
            })
        ));
    }

    #[test]
    fn test_normalize_unit_pointing_at_tag_is_inconsistent() {
        let engine = MockEngine::new()
            .with_clean_units(vec![CleanUnit::tag(SENTENCE_MARKER)])
            .with_normalized_units(vec![NormalizedUnit::token("x", 0)]);
        let result = mock_pipeline(engine).normalize("x", Domain::Other, false);
        assert!(matches!(
            result,
            Err(FrontendError::EngineInconsistent { .. })
        ));
    }

    #[test]
    fn test_normalize_unit_out_of_range_is_inconsistent() {
        let engine = MockEngine::new().with_normalized_units(vec![NormalizedUnit::token("x", 7)]);
        let result = mock_pipeline(engine).normalize("x", Domain::Other, false);
        assert!(matches!(
            result,
            Err(FrontendError::EngineInconsistent { .. })
        ));
    }

    #[test]
    fn test_engine_failure_propagates() {
        let engine = MockEngine::new().with_failure(Stage::Transcribe);
        let result = mock_pipeline(engine).preprocess("hæ", &PipelineConfig::default(), false);
        assert!(matches!(
            result,
            Err(FrontendError::Engine {
                stage: Stage::Transcribe,
                ..
            })
        ));
    }

    #[test]
    fn test_preprocess_chain_length_three() {
        let text = "það voru 55 km eftir, sögðu allir nema 1";
        let output = basic_pipeline()
            .preprocess(text, &PipelineConfig::default().with_domain(Domain::Sport), false)
            .unwrap();
        assert!(output.tokens().count() > 0);
        for token in output.tokens() {
            let chain = lineage(&**token);
            assert_eq!(chain.len(), 3);
            assert!(chain[2].parent().is_none());
            let span = chain[2].span();
            let original = token.normalized_token().clean_token().original();
            assert_eq!(span.slice(text), Some(original.name()));
        }
    }

    #[test]
    fn test_preprocess_custom_dictionary_overrides_engine() {
        let config = PipelineConfig::default().with_custom_dictionary(HashMap::from([
            ("eftir".to_string(), "E p t I r".to_string()),
            ("sögðu".to_string(), "s 9 k D Y".to_string()),
        ]));
        // The mock ignores the dictionary; the pipeline still applies it.
        let engine = MockEngine::new().with_transcribed_units(vec![
            TranscribedUnit::token("x x x", 0),
            TranscribedUnit::token("y y y", 1),
        ]);
        let output = mock_pipeline(engine)
            .preprocess("eftir hann", &config, false)
            .unwrap();
        let tokens: Vec<_> = output.tokens().collect();
        assert_eq!(tokens[0].name(), "E p t I r");
        assert_eq!(tokens[0].variants(), ["E p t I r".to_string()]);
        assert_eq!(tokens[1].name(), "y y y");
    }

    #[test]
    fn test_preprocess_passes_config_to_engine() {
        let engine = Arc::new(MockEngine::new());
        let pipeline = Pipeline::new(engine.clone());
        let config = PipelineConfig::default()
            .with_word_separator("|")
            .with_stress_labels(true)
            .with_syllabification_symbol(".");
        pipeline.preprocess("hæ", &config, false).unwrap();
        assert_eq!(engine.last_config(), Some(config));
    }

    #[test]
    fn test_preprocess_unsupported_dialect_is_configuration_error() {
        let config = PipelineConfig::default().with_dialect(Dialect::Northern);
        let result = basic_pipeline().preprocess("hæ", &config, false);
        match result {
            Err(e) => assert_eq!(e.kind(), ErrorKind::Configuration),
            Ok(_) => panic!("Expected configuration error"),
        }
    }

    #[test]
    fn test_stages_are_deterministic() {
        let pipeline = basic_pipeline();
        let config = PipelineConfig::default().with_domain(Domain::Sport);
        let text = "Það voru 55 km eftir. Sagði þjálfari.";
        let first = pipeline.preprocess(text, &config, false).unwrap();
        let second = pipeline.preprocess(text, &config, false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_engine_failure_mapping_keeps_kinds() {
        let inconsistent = FrontendError::inconsistent(Stage::Clean, "x");
        assert!(matches!(
            engine_failure(Stage::Clean, inconsistent),
            FrontendError::EngineInconsistent { .. }
        ));
        let io = FrontendError::Io(std::io::Error::other("pipe"));
        assert!(matches!(
            engine_failure(Stage::Normalize, io),
            FrontendError::Engine {
                stage: Stage::Normalize,
                ..
            }
        ));
    }
}
