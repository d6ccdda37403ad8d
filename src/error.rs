//! Error types for tts-frontend.

use crate::token::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    // Configuration file errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Request input errors
    #[error("Empty input for {stage} stage")]
    EmptyInput { stage: Stage },

    #[error("Invalid input: {message}")]
    Input { message: String },

    #[error("Pronunciation dictionary line {line}: {message}")]
    DictionaryParse { line: usize, message: String },

    #[error("Failed to read pronunciation dictionary {path}: {source}")]
    DictionaryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Linguistic engine errors
    #[error("Linguistic engine failed during {stage}: {message}")]
    Engine { stage: Stage, message: String },

    #[error("Linguistic engine returned inconsistent {stage} output: {message}")]
    EngineInconsistent { stage: Stage, message: String },

    // Unsupported pipeline configuration
    #[error("Unsupported dialect: {dialect}")]
    UnsupportedDialect { dialect: String },

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification used when reporting failures to service callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or empty request input.
    Input,
    /// The linguistic engine failed or returned an inconsistent structure.
    Engine,
    /// The requested configuration combination is not supported.
    Configuration,
    /// Anything else (I/O, IPC, local configuration files).
    Internal,
}

impl FrontendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontendError::EmptyInput { .. }
            | FrontendError::Input { .. }
            | FrontendError::DictionaryParse { .. } => ErrorKind::Input,
            FrontendError::Engine { .. } | FrontendError::EngineInconsistent { .. } => {
                ErrorKind::Engine
            }
            FrontendError::UnsupportedDialect { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Internal,
        }
    }

    /// Shorthand for an engine consistency violation.
    pub(crate) fn inconsistent(stage: Stage, message: impl Into<String>) -> Self {
        FrontendError::EngineInconsistent {
            stage,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrontendError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_invalid_value_display() {
        let error = FrontendError::ConfigInvalidValue {
            key: "server.max_workers".to_string(),
            message: "must be at least 1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for server.max_workers: must be at least 1"
        );
    }

    #[test]
    fn test_empty_input_display() {
        let error = FrontendError::EmptyInput {
            stage: Stage::Normalize,
        };
        assert_eq!(error.to_string(), "Empty input for normalize stage");
    }

    #[test]
    fn test_engine_display() {
        let error = FrontendError::Engine {
            stage: Stage::Transcribe,
            message: "model missing".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Linguistic engine failed during transcribe: model missing"
        );
    }

    #[test]
    fn test_engine_inconsistent_display() {
        let error = FrontendError::inconsistent(Stage::Clean, "offset 9 > 4");
        assert_eq!(
            error.to_string(),
            "Linguistic engine returned inconsistent clean output: offset 9 > 4"
        );
    }

    #[test]
    fn test_dictionary_parse_display() {
        let error = FrontendError::DictionaryParse {
            line: 3,
            message: "missing transcription".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Pronunciation dictionary line 3: missing transcription"
        );
    }

    #[test]
    fn test_unsupported_dialect_display() {
        let error = FrontendError::UnsupportedDialect {
            dialect: "northern".to_string(),
        };
        assert_eq!(error.to_string(), "Unsupported dialect: northern");
    }

    #[test]
    fn test_ipc_connection_display() {
        let error = FrontendError::IpcConnection {
            message: "timeout".to_string(),
        };
        assert_eq!(error.to_string(), "IPC connection failed: timeout");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            FrontendError::Input {
                message: "x".into()
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            FrontendError::EmptyInput {
                stage: Stage::Clean
            }
            .kind(),
            ErrorKind::Input
        );
        assert_eq!(
            FrontendError::inconsistent(Stage::Clean, "bad").kind(),
            ErrorKind::Engine
        );
        assert_eq!(
            FrontendError::Engine {
                stage: Stage::Normalize,
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Engine
        );
        assert_eq!(
            FrontendError::UnsupportedDialect {
                dialect: "x".into()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            FrontendError::Other("x".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: FrontendError = io_error.into();
        assert!(error.to_string().contains("file not found"));
        assert_eq!(error.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<FrontendError>();
        assert_sync::<FrontendError>();
    }
}
