//! Default configuration constants for tts-frontend.
//!
//! Shared by the config file layer, the daemon and the CLI so the values
//! reported by `get_default_parameters` always match what a request without
//! overrides actually gets.

/// Protocol version reported by `get_version`.
///
/// Bumped only when the request/response message layout changes.
pub const ABI_VERSION: u32 = 1;

/// Maximum number of requests processed concurrently by the daemon.
pub const MAX_WORKERS: usize = 10;

/// How long a connected client may take to send its request line.
pub const REQUEST_READ_TIMEOUT_MS: u64 = 5000;

/// Socket file name under `$XDG_RUNTIME_DIR`.
pub const SOCKET_NAME: &str = "tts-frontend.sock";

/// Phonetic alphabet produced by the reference engine.
pub const ALPHABET: &str = "x-sampa";

/// Word separator used when a request does not set one.
pub const WORD_SEPARATOR: &str = "";

/// Syllabification symbol used when a request does not set one; empty
/// disables syllable marking.
pub const SYLLABIFICATION_SYMBOL: &str = "";

/// Whether sentence boundaries are marked during normalization.
pub const SPLIT_SENTENCES: bool = true;

/// Application directory name under the XDG config dir.
pub const APP_DIR: &str = "tts-frontend";

/// Environment variable consulted for the log filter before `RUST_LOG`.
pub const LOG_ENV: &str = "TTS_FRONTEND_LOG";
