//! `showrunner` binary.
//!
//! Without a subcommand the TUI launches; `run` drives a headless
//! pipeline with the original backend's colored per-agent console
//! protocol, and `init`/`history`/`export` manage the project directory
//! and saved runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::{Color, Colorize};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use uuid::Uuid;

use sr_core::agents::{backend_from_config, AgentRoster, GenerationBackend, MockBackend};
use sr_core::config::{load_config, AppConfig};
use sr_core::engine::{RetryPolicy, StageRunner};
use sr_core::export::{render_csv, render_document};
use sr_core::history::{HistoryStore, JsonHistoryStore, NoopHistoryStore};
use sr_core::init::{generate_structure, InitOptions};
use sr_core::state::Orchestrator;
use sr_protocol::Event;

#[derive(Parser)]
#[command(
    name = "showrunner",
    version,
    about = "Agent pipeline that turns a topic into a timed A/V script"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline headless for one topic.
    Run {
        /// Topic to generate a script for.
        #[arg(long)]
        topic: String,
        /// Pause for operator approval between stages.
        #[arg(long)]
        step: bool,
        /// Use the scripted offline backend instead of the API.
        #[arg(long)]
        mock: bool,
    },
    /// Scaffold `.showrunner/` in the current directory.
    Init {
        /// Overwrite an existing `.showrunner/` directory.
        #[arg(long)]
        force: bool,
        /// Only write config.toml; keep the built-in agents.
        #[arg(long)]
        minimal: bool,
    },
    /// Inspect saved runs.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
    /// Export a saved run.
    Export {
        /// History item id.
        id: Uuid,
        #[arg(long, value_enum, default_value_t = ExportFormat::Doc)]
        format: ExportFormat,
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List saved runs, newest first.
    List,
    /// Delete one saved run.
    Delete { id: Uuid },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Markdown A/V table document.
    Doc,
    /// CSV with quoted fields.
    Csv,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        None => sr_tui::run_app()
            .await
            .map_err(|e| color_eyre::eyre::eyre!(e)),
        Some(Command::Init { force, minimal }) => {
            let options = InitOptions {
                target_dir: std::env::current_dir()?,
                force,
                minimal,
            };
            generate_structure(&options)?;
            println!("Initialized .showrunner/");
            Ok(())
        }
        Some(Command::Run { topic, step, mock }) => run_headless(topic, step, mock).await,
        Some(Command::History { command }) => history_command(command).await,
        Some(Command::Export { id, format, out }) => export_command(id, format, out).await,
    }
}

async fn run_headless(topic: String, step: bool, mock: bool) -> color_eyre::Result<()> {
    let config = load_config(Path::new("."))?;
    let model_id = config.global.generation.default_model.clone();

    let backend: Arc<dyn GenerationBackend> = if mock {
        Arc::new(MockBackend::scripted())
    } else {
        backend_from_config(&config.global.generation)
    };
    let roster = AgentRoster::builtin(model_id.clone())?.with_overrides(config.agents)?;
    let retry = RetryPolicy::new(
        config.global.retry.max_retries,
        Duration::from_millis(config.global.retry.base_delay_ms),
    );
    let runner = StageRunner::new(backend, roster, retry, config.global.timing);

    let history: Arc<dyn HistoryStore> = match &config.global.history.dir {
        Some(dir) => Arc::new(JsonHistoryStore::new(dir)),
        None => Arc::new(NoopHistoryStore),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let orchestrator = Orchestrator::new(Arc::new(runner), history, model_id, events_tx);
    orchestrator.set_step_mode(step).await;
    orchestrator.start(topic).await;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    while let Some(event) = events_rx.recv().await {
        match event {
            Event::RunLog { line, .. } => print_log(&line),
            Event::ApprovalRequested { stage, .. } => {
                approval_prompt(&orchestrator, &mut stdin, &stage.to_string()).await?;
            }
            Event::RunCompleted { history, .. } => {
                if let Some(item) = history {
                    println!("  saved to history: {}", item.id.to_string().bold());
                }
                return Ok(());
            }
            Event::RunFailed { error, .. } => {
                eprintln!("  {}", error.red());
                std::process::exit(1);
            }
            _ => {}
        }
    }
    Ok(())
}

/// Interactive step-mode gate: approve, approve with an edit, or cancel.
async fn approval_prompt(
    orchestrator: &Orchestrator,
    stdin: &mut Lines<BufReader<Stdin>>,
    stage: &str,
) -> color_eyre::Result<()> {
    println!(
        "  {}",
        format!("[{stage}] finished. (a)pprove / (e)dit / (c)ancel:").bold()
    );
    loop {
        let Some(line) = stdin.next_line().await? else {
            // Input closed; stop the run cleanly.
            orchestrator.cancel().await;
            return Ok(());
        };
        match line.trim().chars().next() {
            Some('a') | None => {
                orchestrator.approve(None).await;
                return Ok(());
            }
            Some('e') => {
                println!("  replacement text (single line):");
                let edited = stdin.next_line().await?.unwrap_or_default();
                orchestrator.approve(Some(edited)).await;
                return Ok(());
            }
            Some('c') => {
                orchestrator.cancel().await;
                return Ok(());
            }
            _ => println!("  please answer a, e or c:"),
        }
    }
}

async fn history_command(command: HistoryCommand) -> color_eyre::Result<()> {
    let store = configured_store(&load_config(Path::new("."))?)?;
    match command {
        HistoryCommand::List => {
            let items = store.list().await?;
            if items.is_empty() {
                println!("No saved runs.");
            }
            for item in items {
                println!(
                    "{}  {}  {:>3} blocks  {}",
                    item.id,
                    item.created_at.format("%Y-%m-%d %H:%M"),
                    item.blocks.len(),
                    item.topic
                );
            }
        }
        HistoryCommand::Delete { id } => {
            if store.delete(id).await? {
                println!("Deleted {id}");
            } else {
                eprintln!("No saved run with id {id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

async fn export_command(
    id: Uuid,
    format: ExportFormat,
    out: Option<PathBuf>,
) -> color_eyre::Result<()> {
    let store = configured_store(&load_config(Path::new("."))?)?;
    let Some(item) = store.list().await?.into_iter().find(|item| item.id == id) else {
        eprintln!("No saved run with id {id}");
        std::process::exit(1);
    };

    let rendered = match format {
        ExportFormat::Doc => render_document(&item),
        ExportFormat::Csv => render_csv(&item.blocks),
    };

    match out {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn configured_store(config: &AppConfig) -> color_eyre::Result<JsonHistoryStore> {
    match &config.global.history.dir {
        Some(dir) => Ok(JsonHistoryStore::new(dir)),
        None => {
            eprintln!("History is not configured; set [history] dir in .showrunner/config.toml");
            std::process::exit(1);
        }
    }
}

/// Colored, timestamped per-agent console line.
fn print_log(line: &str) {
    let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
    println!("  {}  {}", timestamp.dimmed(), line.color(agent_color(line)));
}

fn agent_color(line: &str) -> Color {
    const COLORS: [(&str, Color); 6] = [
        ("[scout]", Color::Cyan),
        ("[decode]", Color::Green),
        ("[research]", Color::Blue),
        ("[architect]", Color::Magenta),
        ("[narrate]", Color::Yellow),
        ("[orchestrator]", Color::White),
    ];
    COLORS
        .iter()
        .find(|(tag, _)| line.starts_with(tag))
        .map(|(_, color)| *color)
        .unwrap_or(Color::White)
}
