use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use portfolio_core::{ChatConfig, ChatMessage, Config, ContentRecord, ConversationController, ExchangeOutcome};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "portfolio", version)]
#[command(about = "Terminal portfolio with an AI chat assistant")]
struct Cli {
    /// Config file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "PORTFOLIO_CONFIG")]
    config: Option<PathBuf>,

    /// Chat scene to use instead of the config's default
    #[arg(long, global = true)]
    scene: Option<String>,

    /// Alternate portfolio content JSON
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Log file for the interactive UI
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant one question and print the reply
    Ask {
        question: String,
        /// JSON transcript to replay before the question
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print the portfolio content as JSON
    Content,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Content) => {
            let content = load_content(cli.content.as_deref())?;
            println!("{}", content.context_json());
            Ok(())
        }
        Some(Commands::Ask { question, history }) => {
            init_logging(cli.verbose, None)?;
            let (_, controller) = build_controller(&cli)?;
            ask(controller, question, history.as_deref()).await
        }
        None => {
            let log_file = cli.log_file.clone().or_else(default_log_path);
            init_logging(cli.verbose, log_file.as_deref())?;
            let (content, controller) = build_controller(&cli)?;
            run_tui(content, controller).await
        }
    }
}

fn init_logging(verbosity: u8, log_file: Option<&Path>) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        // The UI owns stderr, so interactive runs log to a file.
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;

            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("portfolio-chat").join("portfolio.log"))
}

fn load_content(path: Option<&Path>) -> Result<Arc<ContentRecord>> {
    let content = match path {
        Some(path) => ContentRecord::load_from_json(path)?,
        None => ContentRecord::builtin().clone(),
    };
    Ok(Arc::new(content))
}

fn build_controller(cli: &Cli) -> Result<(Arc<ContentRecord>, ConversationController)> {
    let config = Config::load(cli.config.as_deref())?;
    let scene = cli.scene.clone().unwrap_or_else(|| config.scene_name().to_string());
    let chat_config = ChatConfig::from_config(&config)?;

    if chat_config.scene(&scene).is_none() {
        tracing::warn!(
            scene = %scene,
            available = ?chat_config.scene_names(),
            "selected chat scene is not configured"
        );
    }

    let content = load_content(cli.content.as_deref())?;
    let controller = ConversationController::new(Arc::new(chat_config), content.clone(), scene);
    Ok((content, controller))
}

async fn ask(controller: ConversationController, question: &str, history: Option<&Path>) -> Result<()> {
    let controller = match history {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading history {}", path.display()))?;
            let messages: Vec<ChatMessage> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing history {}", path.display()))?;
            controller.with_history(messages)
        }
        None => controller,
    };

    match controller.send(question).await? {
        ExchangeOutcome::Ignored => bail!("question is empty"),
        _ => {
            if let Some(reply) = controller.messages().last() {
                println!("{}", reply.text());
            }
            Ok(())
        }
    }
}

async fn run_tui(content: Arc<ContentRecord>, controller: ConversationController) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(content, controller);
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
