//! Terminal front end for talking to Friday over stdin.

mod commands;
mod console;

use anyhow::Context;
use clap::Parser;
use commands::{HELP, SlashCommand, parse_slash_command};
use console::{ConsoleSpeech, ConsoleTranscript, LocalUserContext, load_source};
use friday_rs::config::{FridayConfig, LayeredConfigOptions};
use friday_rs::core::{ConversationSession, FridayCoreError, SupersedingSpeech};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the `friday` binary.
#[derive(Parser)]
#[command(name = "friday", version)]
struct Cli {
    /// Optional path to a friday.json5 applied over the discovered layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Key under which long-term memory is stored
    #[arg(long, default_value = "local")]
    user: String,
    /// Display name used in the system prompt
    #[arg(long)]
    name: Option<String>,
    /// Completion model override
    #[arg(long)]
    model: Option<String>,
    /// Text file to attach as a study source (repeatable)
    #[arg(long = "source")]
    sources: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    friday_rs::init_logging();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.completion.model = model;
    }
    let sources = cli
        .sources
        .iter()
        .map(|path| load_source(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    info!(
        "starting friday (user={}, model={}, sources={})",
        cli.user,
        config.completion.model,
        sources.len()
    );

    let session = ConversationSession::builder(config, cli.user)
        .speech(Arc::new(SupersedingSpeech::new(Arc::new(ConsoleSpeech))))
        .transcript(Arc::new(ConsoleTranscript))
        .context(Arc::new(LocalUserContext::new(cli.name, sources)))
        .build()
        .context("failed to start session")?;
    if !session.has_api_key() {
        eprintln!("no API key configured; set GROQ_API_KEY or use /key <value>");
    }
    eprintln!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_slash_command(&line) {
            Ok(Some(SlashCommand::Quit)) => break,
            Ok(Some(command)) => run_command(&session, command).await,
            Ok(None) => {
                session.process_input(&line).await;
            }
            Err(message) => eprintln!("{message}"),
        }
    }
    info!("friday session ended (session_id={})", session.id());
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<FridayConfig> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = path {
        options = options.with_runtime_path(path);
    }
    let layered = FridayConfig::load_layered_with_options(options).context("failed to load config")?;
    for layer in &layered.layers {
        info!(
            "config layer applied (source={:?}, path={})",
            layer.source,
            layer.path.display()
        );
    }
    Ok(layered.config)
}

async fn run_command(session: &ConversationSession, command: SlashCommand) {
    match command {
        SlashCommand::Reset => {
            session.reset();
            eprintln!("conversation reset");
        }
        SlashCommand::Memory => println!("{}", session.memory_summary().await),
        SlashCommand::Topic(topic) => {
            session.record_topic(&topic).await;
            eprintln!("noted topic: {topic}");
        }
        SlashCommand::Test => match session.test_connection().await {
            Ok(_) => {}
            Err(FridayCoreError::MissingCredential) => {
                eprintln!("set your API key first (/key <value>)")
            }
            Err(err) => warn!("connection test failed (error={})", err),
        },
        SlashCommand::Key(key) => {
            session.set_api_key(key);
            eprintln!("API key set for this run");
        }
        SlashCommand::ClearKey => {
            session.clear_api_key();
            eprintln!("API key cleared");
        }
        SlashCommand::Help => eprintln!("{HELP}"),
        SlashCommand::Quit => {}
    }
}
