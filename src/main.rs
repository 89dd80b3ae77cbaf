use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use sanctuary_sync::model::User;
use sanctuary_sync::{
    AppConfig, EnrichmentRun, FileGateway, HttpEnrichmentGateway, MutationOutcome, Session,
    SessionBuilder, ShiftState, SkipReason,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sanctuary-sync")]
#[command(about = "Inspect and drive the sanctuary data store from the command line")]
struct Cli {
    /// Configuration file (TOML); defaults apply when it does not exist
    #[arg(short, long, default_value = "sanctuary.toml")]
    config: PathBuf,

    /// Override `storage.data_dir`
    #[arg(short, long, env = "SANCTUARY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collection counts, connectivity and shift state
    Status {
        #[arg(long)]
        user: Option<String>,
    },
    /// Run one species enrichment pass now
    Enrich,
    ClockIn {
        #[arg(long)]
        user: String,
    },
    ClockOut {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let session = open_session(&config).await?;

    let result = match cli.command {
        Command::Status { user } => status(&session, user.as_deref()),
        Command::Enrich => enrich(&session).await,
        Command::ClockIn { user } => {
            select_user(&session, &user)?;
            report_shift("clock in", session.clock_in().await, &session)
        }
        Command::ClockOut { user } => {
            select_user(&session, &user)?;
            report_shift("clock out", session.clock_out().await, &session)
        }
    };

    session.logout();
    result
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = if cli.config.exists() {
        AppConfig::load(&cli.config)
            .with_context(|| format!("Failed to load config '{}'", cli.config.display()))?
    } else {
        AppConfig::default()
    };
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir.clone());
    }
    Ok(config)
}

async fn open_session(config: &AppConfig) -> Result<Session> {
    let gateway = Arc::new(FileGateway::new(config.storage.data_dir.clone()));
    // enrichment only runs when asked for explicitly
    let mut builder = SessionBuilder::new(gateway).config(config.clone().with_enrichment(false));

    if let Some(endpoint) = &config.enrichment.endpoint {
        let mut lookup = HttpEnrichmentGateway::new(endpoint.clone(), config.enrichment.request_timeout())
            .context("Failed to build enrichment client")?;
        if let Some(api_key) = &config.enrichment.api_key {
            lookup = lookup.api_key(api_key.clone());
        }
        builder = builder.enrichment(Arc::new(lookup));
    }

    Ok(builder.start().await?)
}

fn select_user(session: &Session, id: &str) -> Result<User> {
    let user = session
        .store()
        .find::<User>(id)
        .ok_or_else(|| anyhow!("Unknown user '{}'", id))?;
    session.set_current_user(Some(user.clone()));
    Ok(user)
}

fn status(session: &Session, user: Option<&str>) -> Result<()> {
    for (kind, count) in session.store().counts() {
        println!("{:<18} {}", kind, count);
    }
    println!("offline: {}", session.is_offline());

    if let Some(id) = user {
        let user = select_user(session, id)?;
        match session.shift_state() {
            ShiftState::NoShift => println!("{}: not clocked in", user.name),
            ShiftState::Active(shift) => println!("{}: clocked in since {}", user.name, shift.start_time),
        }
    }
    Ok(())
}

async fn enrich(session: &Session) -> Result<()> {
    let run = session
        .run_enrichment()
        .await
        .ok_or_else(|| anyhow!("No enrichment endpoint configured (enrichment.endpoint)"))?;

    match run {
        EnrichmentRun::Skipped(SkipReason::CoolingDown { last_run }) => {
            println!("Skipped: last run at {}", last_run);
        }
        EnrichmentRun::Skipped(reason) => println!("Skipped: {:?}", reason),
        EnrichmentRun::Completed(report) => {
            println!(
                "Enriched {} animal(s) in {} batch(es), {} failed",
                report.patched, report.batches, report.failed_batches
            );
            if let Some(MutationOutcome::LocalOnly(err)) = report.merge {
                println!("Warning: changes were not saved ({})", err);
            }
        }
    }
    Ok(())
}

fn report_shift(op: &str, outcome: Option<MutationOutcome>, session: &Session) -> Result<()> {
    match outcome {
        None => println!("Nothing to do for {}", op),
        Some(MutationOutcome::Committed) => match session.shift_state() {
            ShiftState::Active(shift) => println!("Clocked in at {}", shift.start_time),
            ShiftState::NoShift => println!("Clocked out"),
        },
        Some(outcome) => {
            let reason = outcome
                .error()
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(anyhow!("Failed to {}: {}", op, reason));
        }
    }
    Ok(())
}
