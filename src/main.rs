#![forbid(unsafe_code)]

//! `screening-client`: command-line front end for the screening backend.
//!
//! Loads configuration, starts a [`SessionOrchestrator`], and renders the
//! session state of one operation as plain text on stdout. Logs go to
//! stderr.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use screening_client::models::{Decision, PipelineStage, StageProgress, STAGES};
use screening_client::orchestrator::{ResultStore, SessionState};
use screening_client::{AppError, ClientConfig, Result, SessionOrchestrator};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "screening-client", about = "Drive and observe candidate screening runs", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the backend base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a screening and follow its progress to completion.
    Screen,
    /// Show results already stored by the backend.
    Results,
    /// Probe backend liveness once.
    Health,
    /// Record a human decision for one candidate.
    Decide {
        /// Candidate identifier, as shown in the ranking.
        candidate_id: String,
        /// One of approve, hold, reject.
        decision: Decision,
        /// Optional reviewer notes.
        #[arg(long)]
        notes: Option<String>,
    },
    /// List candidates with a completed approval.
    Approved,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match args.config {
        Some(ref path) => ClientConfig::load_from_path(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(base_url) = args.base_url {
        config.set_base_url(base_url)?;
    }
    info!(base_url = %config.base_url, "configuration loaded");

    let orchestrator = SessionOrchestrator::connect(Arc::new(config))?;

    let outcome = match args.command {
        Command::Screen => screen(&orchestrator).await,
        Command::Results => {
            let snap = orchestrator.wait_ready().await;
            print_ranking(&snap.store);
            Ok(())
        }
        Command::Health => {
            let state = orchestrator.check_health().await;
            println!("{state:?}");
            Ok(())
        }
        Command::Decide {
            candidate_id,
            decision,
            notes,
        } => {
            orchestrator.wait_ready().await;
            decide(&orchestrator, &candidate_id, decision, notes).await
        }
        Command::Approved => {
            let snap = orchestrator.wait_ready().await;
            let approved = snap.store.approved();
            if approved.is_empty() {
                println!("no approved candidates");
            }
            for entry in approved {
                println!("#{} {} {}", entry.rank, entry.candidate_id, entry.name);
            }
            Ok(())
        }
    };

    orchestrator.shutdown().await;
    outcome
}

/// Start a run and print each stage as it becomes active.
async fn screen(orchestrator: &SessionOrchestrator) -> Result<()> {
    orchestrator.wait_ready().await;
    let mut rx = orchestrator.subscribe();
    let run = orchestrator.start();
    let generation = run.generation();
    let mut finished = std::pin::pin!(run.finished());
    let mut last_stage = None;

    loop {
        let stage = {
            let snap = rx.borrow_and_update();
            (snap.generation == generation).then(|| snap.machine.stage_index())
        };
        if stage.is_some() && stage != last_stage {
            if let Some(stage) = stage.and_then(PipelineStage::get) {
                print_stage(stage);
            }
            last_stage = stage;
        }

        tokio::select! {
            () = &mut finished => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    let snap = orchestrator.snapshot();
    match snap.machine.state() {
        SessionState::Completed => {
            print_progress(snap.machine.stage_index());
            print_ranking(&snap.store);
            Ok(())
        }
        SessionState::Errored => Err(snap
            .machine
            .error()
            .cloned()
            .unwrap_or_else(|| AppError::Pipeline("screening failed".into()))),
        state => {
            println!("screening ended in state {state:?}");
            Ok(())
        }
    }
}

async fn decide(
    orchestrator: &SessionOrchestrator,
    candidate_id: &str,
    decision: Decision,
    notes: Option<String>,
) -> Result<()> {
    let ack = orchestrator
        .submit_decision(candidate_id, decision, notes)
        .await?;
    if let Some(message) = ack.message {
        println!("{message}");
    }
    let record = serde_json::to_string_pretty(&ack.hr_decision)
        .map_err(|err| AppError::Io(format!("failed to render decision: {err}")))?;
    println!("{record}");
    Ok(())
}

fn print_stage(stage: &PipelineStage) {
    println!(
        "[{}/{}] {}: {}",
        stage.index,
        STAGES.len() - 1,
        stage.label,
        stage.description
    );
}

fn print_progress(current: u8) {
    for stage in &STAGES {
        let mark = match stage.progress(current) {
            StageProgress::Completed => "x",
            StageProgress::Active => ">",
            StageProgress::Pending => " ",
        };
        println!("[{mark}] {}", stage.label);
    }
}

fn print_ranking(store: &ResultStore) {
    let Some(results) = store.results().filter(|results| !results.is_empty()) else {
        println!("no results");
        return;
    };
    for entry in &results.ranking {
        let decision = store
            .evaluation(&entry.candidate_id)
            .and_then(|bundle| bundle.hr_decision.as_ref())
            .and_then(|hr| hr.decision)
            .map_or_else(|| "PENDING".to_owned(), |d| d.to_string());
        let marker = if store.selected_id() == Some(entry.candidate_id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker}#{:<3} {:<8} {:<24} {:>6.1}  {decision}",
            entry.rank, entry.candidate_id, entry.name, entry.score
        );
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
