use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use emis_chat::tui::{self, EventHandler, Tui};
use emis_chat::{handler, logging, ui};
use emis_chat::{App, ChatBackend, ChatWidget, Config, HttpChatClient, Role, SendRejected};

#[derive(Parser)]
#[command(name = "emis-chat")]
#[command(about = "Chat widget for the DTE EMIS helpdesk")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Chat endpoint URL (overrides config and EMIS_CHAT_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show the plain preset list instead of asking for a role
    #[arg(long, global = true)]
    no_role_gate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Ask {
        /// Your question
        message: String,
    },
    /// List preset questions
    Presets {
        /// student, teacher, parent or general (all roles if omitted)
        role: Option<String>,
    },
    /// Show the config file location and effective settings
    Config {
        /// Write the default config if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::default_log_path().and_then(|path| logging::init(&path)) {
        eprintln!("warning: logging disabled: {e}");
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: ignoring unreadable config: {e}");
        Config::default()
    });
    config.apply_env();
    config.override_endpoint(cli.endpoint.clone());
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = secs;
    }
    if cli.no_role_gate {
        config.role_gate = false;
    }

    match cli.command {
        None => run_widget(config).await,
        Some(Commands::Ask { message }) => ask(&config, &message).await,
        Some(Commands::Presets { role }) => list_presets(&config, role.as_deref()),
        Some(Commands::Config { init }) => show_config(&config, init),
    }
}

async fn run_widget(config: Config) -> Result<()> {
    let backend: Arc<dyn ChatBackend> =
        Arc::new(HttpChatClient::new(&config.endpoint, config.request_timeout())?);
    info!(endpoint = %config.endpoint, role_gate = config.role_gate, "starting chat widget");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, backend, events.sender());

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn ask(config: &Config, message: &str) -> Result<()> {
    let client = HttpChatClient::new(&config.endpoint, config.request_timeout())?;
    let mut widget = ChatWidget::from_config(config);

    match widget.send_and_wait(message, &client).await {
        Ok(()) => {}
        Err(SendRejected::Empty) => bail!("message is empty"),
        Err(rejected) => bail!(rejected),
    }

    if let Some(reply) = widget.conversation().last() {
        println!("{}", reply.text());
    }
    Ok(())
}

fn list_presets(config: &Config, role: Option<&str>) -> Result<()> {
    let roles = match role {
        Some(name) => match Role::from_str(name) {
            Some(role) => vec![role],
            None => bail!("unknown role '{}': expected student, teacher, parent or general", name),
        },
        None => Role::all(),
    };

    for role in roles {
        println!("{}", role.display_name());
        let questions = config.presets.for_role(role);
        if questions.is_empty() {
            println!("  (no preset questions)");
        }
        for question in questions {
            println!("  • {}", question);
        }
    }
    Ok(())
}

fn show_config(config: &Config, init: bool) -> Result<()> {
    let path = Config::get_config_path()?;

    if init {
        if path.exists() {
            warn!(path = %path.display(), "config already exists, leaving it alone");
            println!("Config already exists: {}", path.display());
        } else {
            Config::default().save()?;
            info!(path = %path.display(), "wrote default config");
            println!("Wrote default config: {}", path.display());
        }
    } else {
        println!("Config file: {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
