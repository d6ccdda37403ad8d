//! Command-line interface for tts-frontend
//!
//! Provides argument parsing using clap derive macros.

use crate::pipeline::{Dialect, Domain};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Text-to-speech front-end: clean, normalize and transcribe text
#[derive(Parser, Debug)]
#[command(
    name = "tts-frontend",
    version,
    about = "Text-to-speech front-end: clean, normalize and transcribe text"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print the raw JSON response instead of processed text
    #[arg(long, global = true)]
    pub json: bool,
}

/// Where a request is executed.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TargetArgs {
    /// Path to Unix socket (default: $XDG_RUNTIME_DIR/tts-frontend.sock)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Run the pipeline in-process instead of asking the daemon
    #[arg(long, conflicts_with = "socket")]
    pub local: bool,
}

/// Text to process.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct InputArgs {
    /// Input text (read from stdin when omitted)
    pub text: Option<String>,

    /// Treat the input as HTML
    #[arg(long)]
    pub html: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground process for systemd)
    Serve {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/tts-frontend.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Clean text
    Clean {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Clean and normalize text
    Normalize {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        target: TargetArgs,

        /// Normalization domain (other, sport)
        #[arg(long, value_name = "DOMAIN")]
        domain: Option<Domain>,

        /// Leave pause tags out of the processed text
        #[arg(long)]
        no_tags: bool,
    },

    /// Clean, normalize and transcribe text
    Preprocess {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        target: TargetArgs,

        /// Normalization domain (other, sport)
        #[arg(long, value_name = "DOMAIN")]
        domain: Option<Domain>,

        /// Pronunciation dictionary file (word<TAB>phonemes)
        #[arg(long, value_name = "PATH")]
        dict: Option<PathBuf>,

        /// Mark syllable boundaries with this symbol (e.g. ".", "-")
        #[arg(long, value_name = "SYM")]
        syllabified: Option<String>,

        /// Separator written after every transcribed word
        #[arg(long, value_name = "SEP")]
        word_separator: Option<String>,

        /// Add stress labels
        #[arg(long)]
        stress: bool,

        /// Pronunciation dialect (standard, northern)
        #[arg(long, value_name = "DIALECT")]
        dialect: Option<Dialect>,

        /// Leave pause tags out of the processed text
        #[arg(long)]
        no_tags: bool,
    },

    /// Show client version and protocol version
    Version {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show default normalization and phoneme parameters
    Defaults {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
