//! Request handler implementation for the daemon.

use crate::daemon::DaemonState;
use crate::defaults;
use crate::dictionary;
use crate::error::{FrontendError, Result};
use crate::ipc::protocol::{Request, Response, token_entries};
use crate::ipc::server::RequestHandler;
use crate::pipeline::{
    Dialect, Domain, PipelineConfig, PronunciationDict, reconstruct, reconstruct_text,
};
use std::sync::Arc;

/// Per-request phoneme overrides carried by a `preprocess` request.
#[derive(Debug, Clone, Default)]
pub struct PreprocessOverrides {
    pub domain: Option<Domain>,
    pub pronunciation_dict: PronunciationDict,
    pub syllabified: Option<String>,
    pub word_separator: Option<String>,
    pub stress_labels: Option<bool>,
    pub dialect: Option<Dialect>,
}

/// Request handler for daemon IPC requests.
pub struct FrontendHandler {
    state: Arc<DaemonState>,
}

impl FrontendHandler {
    pub fn new(state: DaemonState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Build the configuration for one preprocess request.
    ///
    /// Request values win over config file defaults; request dictionary
    /// entries win over dictionary file entries.
    pub fn preprocess_config(&self, overrides: PreprocessOverrides) -> PipelineConfig {
        let mut config = self.state.config.default_pipeline_config();
        if let Some(domain) = overrides.domain {
            config.set_domain(domain);
        }
        if let Some(symbol) = overrides.syllabified {
            config.set_syllabification_symbol(symbol);
        }
        if let Some(separator) = overrides.word_separator {
            config.set_word_separator(separator);
        }
        if let Some(stress_labels) = overrides.stress_labels {
            config.set_stress_labels(stress_labels);
        }
        if let Some(dialect) = overrides.dialect {
            config.set_dialect(dialect);
        }
        config.set_custom_dictionary(dictionary::merge(
            &self.state.dictionary,
            overrides.pronunciation_dict,
        ));
        config
    }

    /// Run pipeline work on the blocking pool.
    async fn run_blocking<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DaemonState) -> Result<T> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || work(&state))
            .await
            .map_err(|e| FrontendError::Other(format!("pipeline task failed: {}", e)))?
    }

    async fn clean(&self, content: String, parse_html: bool) -> Result<Response> {
        self.run_blocking(move |state| {
            let output = state.pipeline.clean(&content, parse_html)?;
            Ok(Response::Clean {
                processed_content: reconstruct_text(&output, "", true),
                tokens: token_entries(&output),
            })
        })
        .await
    }

    async fn normalize(
        &self,
        content: String,
        domain: Option<Domain>,
        parse_html: bool,
        no_tag_tokens_in_content: bool,
    ) -> Result<Response> {
        let domain = domain.unwrap_or(self.state.config.normalization.domain);
        self.run_blocking(move |state| {
            let output = state.pipeline.normalize(&content, domain, parse_html)?;
            Ok(Response::Normalize {
                processed_content: reconstruct(&output, "", no_tag_tokens_in_content),
                tokens: token_entries(&output),
            })
        })
        .await
    }

    async fn preprocess(
        &self,
        content: String,
        parse_html: bool,
        no_tag_tokens_in_content: bool,
        overrides: PreprocessOverrides,
    ) -> Result<Response> {
        let config = self.preprocess_config(overrides);
        self.run_blocking(move |state| {
            let output = state.pipeline.preprocess(&content, &config, parse_html)?;
            Ok(Response::Preprocess {
                processed_content: reconstruct(
                    &output,
                    config.word_separator(),
                    no_tag_tokens_in_content,
                ),
                tokens: token_entries(&output),
            })
        })
        .await
    }

    fn default_parameters(&self) -> Response {
        Response::DefaultParameters {
            normalization: self.state.normalization_params(),
            phonemes: self.state.phoneme_description(),
        }
    }
}

#[async_trait::async_trait]
impl RequestHandler for FrontendHandler {
    async fn handle(&self, request: Request) -> Response {
        let result = match request {
            Request::Clean {
                content,
                parse_html,
            } => self.clean(content, parse_html).await,
            Request::Normalize {
                content,
                domain,
                parse_html,
                no_tag_tokens_in_content,
            } => {
                self.normalize(content, domain, parse_html, no_tag_tokens_in_content)
                    .await
            }
            Request::Preprocess {
                content,
                domain,
                parse_html,
                pronunciation_dict,
                syllabified,
                word_separator,
                stress_labels,
                dialect,
                no_tag_tokens_in_content,
            } => {
                let overrides = PreprocessOverrides {
                    domain,
                    pronunciation_dict,
                    syllabified,
                    word_separator,
                    stress_labels,
                    dialect,
                };
                self.preprocess(content, parse_html, no_tag_tokens_in_content, overrides)
                    .await
            }
            Request::GetDefaultParameters => Ok(self.default_parameters()),
            Request::GetVersion => Ok(Response::Version {
                version: defaults::ABI_VERSION,
            }),
            Request::Unsupported => {
                tracing::debug!("unsupported request type");
                return Response::not_implemented();
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, kind = ?e.kind(), "request failed");
            Response::from_error(&e)
        })
    }
}
