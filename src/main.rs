use clap::Parser;
use fundflow::application::running::RunningSet;
use fundflow::application::scheduler::Scheduler;
use fundflow::config::SchedulerConfig;
use fundflow::interfaces::csv::state_writer::StateWriter;
use fundflow::interfaces::fixture::WorldFixture;
use fundflow::logging;
use fundflow::subsystem::{Context, register_all};
use miette::{IntoDiagnostic, Result};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with the initial contents of every store
    fixture: PathBuf,

    /// Scheduler configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subsystems to start, overriding the configuration (comma separated)
    #[arg(long, value_delimiter = ',')]
    subsystems: Vec<String>,

    /// Stop after this many milliseconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SchedulerConfig::load(path).into_diagnostic()?,
        None => SchedulerConfig::default(),
    };
    if !cli.subsystems.is_empty() {
        config.subsystems = cli.subsystems;
    }

    let world = WorldFixture::load(&cli.fixture)
        .into_diagnostic()?
        .into_world()
        .await;
    let running = match config.running_concurrency {
        Some(capacity) => RunningSet::with_concurrency(capacity),
        None => RunningSet::new(),
    };
    let ctx = Context {
        services: world.services(),
        config: Arc::new(config.clone()),
        running: Arc::new(running),
    };

    let mut scheduler = Scheduler::new(CancellationToken::new());
    register_all(&mut scheduler, ctx);
    let failed = scheduler.initialize(&config);
    if !failed.is_empty() {
        tracing::warn!(?failed, "some subsystems did not start");
    }
    tracing::info!(enabled = ?scheduler.enabled(), "scheduler started");

    match cli.run_for_ms {
        Some(ms) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => {
            tokio::signal::ctrl_c().await.into_diagnostic()?;
        }
    }

    tracing::info!("shutting down");
    scheduler.finalize().await;

    let stdout = io::stdout();
    let mut writer = StateWriter::new(stdout.lock());
    writer
        .write_deposit_accounts(&world.deposit_accounts.all().await)
        .into_diagnostic()?;
    writer.write_txs(&world.txs.all().await).into_diagnostic()?;
    writer.flush().into_diagnostic()?;

    Ok(())
}
