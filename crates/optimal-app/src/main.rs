//! OptimalAI application binary - composition root.
//!
//! 1. Load `.env`, configuration from TOML, and environment overrides
//! 2. `serve`: open SQLite and start the axum REST API server
//! 3. `chat`: interactive line client against the configured message API
//! 4. `demo`: replay the built-in conversation locally

mod cli;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use optimal_api::routes;
use optimal_api::state::AppState;
use optimal_chat::orchestrator::ChatOrchestrator;
use optimal_chat::replayer::{ConversationScript, MockConversation, ReplayTiming};
use optimal_chat::transport::{HttpTransport, MessageTransport, MockTransport};
use optimal_chat::ChatEntry;
use optimal_core::config::{ClientRoute, OptimalConfig};
use optimal_storage::Database;

use cli::{CliArgs, Command};

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

fn print_entries(entries: &[ChatEntry]) {
    for entry in entries {
        println!("{}", render::render(&entry.message));
    }
}

async fn serve(
    mut config: OptimalConfig,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.general.port = port;
    }
    if let Some(dir) = data_dir {
        config.general.data_dir = dir.to_string_lossy().to_string();
    }

    let data_dir = resolve_data_dir(&config.general.data_dir);
    let db_path = config.sqlite_path(&data_dir);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    if config.demo.enabled {
        tracing::info!("Message endpoint served by the demo agent");
    }

    let state = AppState::new(config.clone(), db);
    routes::start_server(&config, state).await?;
    Ok(())
}

async fn chat(
    mut config: OptimalConfig,
    name: String,
    agent_id: Option<String>,
    messages_route: bool,
    init_chain: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if agent_id.is_some() {
        config.client.agent_id = agent_id;
    }
    if messages_route {
        config.client.route = ClientRoute::Messages;
    }

    let transport = HttpTransport::from_config(&config)?;
    tracing::info!(endpoint = transport.endpoint(), sender = %name, "Chat client ready");

    let mut chat = ChatOrchestrator::new(transport, name.clone());
    if let Some(chain) = init_chain {
        match chat.initialize(&name, &chain).await {
            Ok(entries) => print_entries(entries),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    run_repl(&mut chat).await
}

/// Read lines from stdin until EOF, sending each as a user turn.
async fn run_repl<T: MessageTransport>(
    chat: &mut ChatOrchestrator<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match chat.submit(&line).await {
            // The user's own line is already on screen.
            Ok(entries) => print_entries(entries.get(1..).unwrap_or_default()),
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}

async fn demo(config: &OptimalConfig, instant: bool) -> Result<(), Box<dyn std::error::Error>> {
    let timing = if instant {
        ReplayTiming::instant()
    } else {
        ReplayTiming::from_config(&config.demo)
    };
    let script = ConversationScript::demo();
    let user_turns: Vec<String> = script
        .turns()
        .iter()
        .filter_map(|turn| match turn {
            optimal_chat::ScriptTurn::User(text) => Some(text.clone()),
            _ => None,
        })
        .collect();

    let conversation = Arc::new(MockConversation::new(script, timing));
    let mut chat = ChatOrchestrator::new(MockTransport::new(conversation.clone()), "demo-user");

    // Opening message, then each scripted user turn in order.
    let mut prompts = vec!["Hi".to_string()];
    prompts.extend(user_turns);
    for prompt in prompts {
        let entries = chat.submit(&prompt).await?;
        print_entries(entries);
        if conversation.is_exhausted().await {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to load .env: {}", e);
        }
    }

    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = OptimalConfig::load_or_default(&config_file);
    config.apply_env_overrides();

    // Tracing.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting OptimalAI v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    match args.command {
        Command::Serve { port, data_dir } => serve(config, port, data_dir).await,
        Command::Chat {
            name,
            agent_id,
            messages_route,
            init_chain,
        } => chat(config, name, agent_id, messages_route, init_chain).await,
        Command::Demo { instant } => demo(&config, instant).await,
    }
}
