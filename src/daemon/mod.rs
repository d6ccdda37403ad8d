//! Daemon mode - owns the pipeline and serves requests over IPC.

pub mod handler;

use crate::config::Config;
use crate::defaults;
use crate::dictionary;
use crate::engine::{BasicEngine, LinguisticEngine};
use crate::error::{FrontendError, Result};
use crate::ipc::protocol::{NormalizationParams, PhonemeDescription};
use crate::ipc::server::IpcServer;
use crate::pipeline::{Pipeline, PronunciationDict};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Long-lived daemon state shared by all requests.
///
/// Nothing in here changes after startup; per-request settings live in the
/// `PipelineConfig` each handler call builds for itself.
#[derive(Debug)]
pub struct DaemonState {
    pub config: Config,
    pub pipeline: Pipeline,
    /// Entries from `[dictionary] path`, layered under request dictionaries.
    pub dictionary: PronunciationDict,
}

impl DaemonState {
    /// Build daemon state, loading the configured pronunciation dictionary.
    pub fn new(config: Config, engine: Arc<dyn LinguisticEngine>) -> Result<Self> {
        let dictionary = match &config.dictionary.path {
            Some(path) => dictionary::load(path)?,
            None => PronunciationDict::new(),
        };
        let pipeline = Pipeline::with_options(engine, config.pipeline_options());
        Ok(Self {
            config,
            pipeline,
            dictionary,
        })
    }

    pub fn normalization_params(&self) -> NormalizationParams {
        NormalizationParams {
            domain: self.config.normalization.domain,
        }
    }

    pub fn phoneme_description(&self) -> PhonemeDescription {
        let phonemes = &self.config.phonemes;
        PhonemeDescription {
            alphabet: phonemes.alphabet.clone(),
            dialect: phonemes.dialect,
            syllabified: phonemes.syllabified.clone(),
            stress_labels: phonemes.stress_labels,
            word_separator: phonemes.word_separator.clone(),
        }
    }
}

/// Run the daemon: build the pipeline, start the IPC server, wait for shutdown.
///
/// # Returns
/// Ok(()) on graceful shutdown, error otherwise
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>) -> Result<()> {
    let engine: Arc<dyn LinguisticEngine> = Arc::new(BasicEngine::new());
    tracing::info!(
        engine = engine.name(),
        abi_version = defaults::ABI_VERSION,
        "starting daemon"
    );

    let socket_path = socket_path
        .or_else(|| config.server.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path);
    let max_workers = config.server.max_workers;
    let read_timeout = Duration::from_millis(config.server.read_timeout_ms);

    let state = DaemonState::new(config, engine)?;
    if !state.dictionary.is_empty() {
        tracing::info!(entries = state.dictionary.len(), "pronunciation dictionary loaded");
    }

    let server = Arc::new(
        IpcServer::new(socket_path, max_workers)?.with_read_timeout(read_timeout),
    );
    let handler = handler::FrontendHandler::new(state);

    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    tracing::info!("daemon ready");

    // Wait for SIGTERM or SIGINT
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                tracing::error!(error = %e, "error setting up signal handler");
            }
            tracing::info!("received SIGTERM, shutting down");
        }
    }

    server.stop().await?;

    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "server stopped with error"),
        Err(e) => tracing::error!(error = %e, "daemon server task failed"),
    }

    tracing::info!("daemon stopped");
    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        FrontendError::Other(format!("Failed to register SIGTERM handler: {}", e))
    })?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}
