use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tts_frontend::cli::{Cli, Commands, ConfigAction, InputArgs, TargetArgs};
use tts_frontend::config::Config;
use tts_frontend::daemon::handler::FrontendHandler;
use tts_frontend::daemon::{DaemonState, run_daemon};
use tts_frontend::defaults;
use tts_frontend::dictionary;
use tts_frontend::engine::BasicEngine;
use tts_frontend::ipc::client::send_request;
use tts_frontend::ipc::protocol::{Request, Response};
use tts_frontend::ipc::server::{IpcServer, RequestHandler};
use tts_frontend::pipeline::PronunciationDict;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Commands::Serve { socket } => {
            let config = load_config(cli.config.as_deref())?;
            run_daemon(config, socket).await?;
        }
        Commands::Clean { input, target } => {
            let request = Request::Clean {
                content: read_input(&input)?,
                parse_html: input.html,
            };
            run_request(cli.config.as_deref(), &target, request, cli.json).await?;
        }
        Commands::Normalize {
            input,
            target,
            domain,
            no_tags,
        } => {
            let request = Request::Normalize {
                content: read_input(&input)?,
                domain,
                parse_html: input.html,
                no_tag_tokens_in_content: no_tags,
            };
            run_request(cli.config.as_deref(), &target, request, cli.json).await?;
        }
        Commands::Preprocess {
            input,
            target,
            domain,
            dict,
            syllabified,
            word_separator,
            stress,
            dialect,
            no_tags,
        } => {
            let pronunciation_dict = match dict {
                Some(path) => dictionary::load(&path)?,
                None => PronunciationDict::new(),
            };
            let request = Request::Preprocess {
                content: read_input(&input)?,
                domain,
                parse_html: input.html,
                pronunciation_dict,
                syllabified,
                word_separator,
                stress_labels: stress.then_some(true),
                dialect,
                no_tag_tokens_in_content: no_tags,
            };
            run_request(cli.config.as_deref(), &target, request, cli.json).await?;
        }
        Commands::Version { target } => {
            println!("{} {}", "Client:".dimmed(), tts_frontend::version_string());
            println!("{}    {}", "ABI:".dimmed(), defaults::ABI_VERSION);
            let response = dispatch(cli.config.as_deref(), &target, Request::GetVersion).await?;
            if let Response::Version { version } = &response {
                print!("{} {}", "Daemon:".dimmed(), version);
                if *version != defaults::ABI_VERSION {
                    print!(" {}", "(ABI mismatch!)".yellow());
                }
                println!();
            } else {
                print_response(&response, cli.json)?;
            }
        }
        Commands::Defaults { target } => {
            run_request(
                cli.config.as_deref(),
                &target,
                Request::GetDefaultParameters,
                cli.json,
            )
            .await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "tts-frontend",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// Filter priority: TTS_FRONTEND_LOG, then RUST_LOG, then the CLI flags.
fn init_logging(quiet: bool, verbose: u8) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = std::env::var(defaults::LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| format!("tts_frontend={}", default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .with_env_filter(filter)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/tts-frontend/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path()?)?,
    };
    Ok(config.with_env_overrides()?)
}

/// Take the text argument, or read all of stdin when it was omitted.
fn read_input(input: &InputArgs) -> Result<String> {
    if let Some(text) = &input.text {
        return Ok(text.clone());
    }
    if std::io::stdin().is_terminal() {
        anyhow::bail!("No input text given (pass it as an argument or pipe it on stdin)");
    }
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Send a request to the daemon, or run it in-process with `--local`.
async fn dispatch(
    config_path: Option<&Path>,
    target: &TargetArgs,
    request: Request,
) -> Result<Response> {
    let config = load_config(config_path)?;
    if target.local {
        let state = DaemonState::new(config, Arc::new(BasicEngine::new()))?;
        return Ok(FrontendHandler::new(state).handle(request).await);
    }

    let socket_path: PathBuf = target
        .socket
        .clone()
        .or(config.server.socket)
        .unwrap_or_else(IpcServer::default_socket_path);
    match send_request(&socket_path, &request).await {
        Ok(response) => Ok(response),
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            eprintln!("Is the daemon running? Start it with: tts-frontend serve");
            eprintln!("Or run the pipeline in-process with --local");
            std::process::exit(1);
        }
    }
}

async fn run_request(
    config_path: Option<&Path>,
    target: &TargetArgs,
    request: Request,
    json: bool,
) -> Result<()> {
    let response = dispatch(config_path, target, request).await?;
    print_response(&response, json)
}

/// Print a response; error responses exit with status 1.
fn print_response(response: &Response, json: bool) -> Result<()> {
    if let Response::Error { status, message } = response {
        eprintln!("{} {} ({:?})", "Error:".red(), message, status);
        std::process::exit(1);
    }
    if json {
        println!("{}", response.to_json()?);
        return Ok(());
    }

    match response {
        Response::Clean {
            processed_content, ..
        } => println!("{}", processed_content),
        Response::Normalize {
            processed_content, ..
        }
        | Response::Preprocess {
            processed_content, ..
        } => {
            for sentence in processed_content {
                println!("{}", sentence);
            }
        }
        Response::DefaultParameters {
            normalization,
            phonemes,
        } => {
            println!("{}", "Normalization:".bold());
            println!("  {}         {}", "Domain:".dimmed(), normalization.domain);
            println!("{}", "Phonemes:".bold());
            println!("  {}       {}", "Alphabet:".dimmed(), phonemes.alphabet);
            println!("  {}        {}", "Dialect:".dimmed(), phonemes.dialect);
            println!("  {}    {:?}", "Syllabified:".dimmed(), phonemes.syllabified);
            println!("  {}  {}", "Stress labels:".dimmed(), phonemes.stress_labels);
            println!(
                "  {} {:?}",
                "Word separator:".dimmed(),
                phonemes.word_separator
            );
        }
        Response::Version { version } => println!("{}", version),
        Response::Error { .. } => {}
    }
    Ok(())
}

/// Handle configuration commands.
fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = match custom_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            let marker = if path.exists() {
                "(exists)".green().to_string()
            } else {
                "(not found, using defaults)".dimmed().to_string()
            };
            println!("{} {}", path.display(), marker);
        }
    }
    Ok(())
}
