use clap::{Parser, Subcommand};
use clubsync::{commands, config, AppConfig, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clubsync", version)]
#[command(about = "Whitelist sync and rotating backups for a club game server")]
struct Cli {
    /// Configuration file (falls back to $CLUBSYNC_CONFIG, then clubsync.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Synchronise the server whitelist now.
    SyncWhitelist {
        /// JSON array of {"username", "id"} records exported by the membership store.
        #[arg(long)]
        records: PathBuf,
    },
    /// Print the whitelist currently on the server.
    ShowWhitelist,
    /// Back up the configured server folders into a new snapshot.
    Backup {
        /// Keep outdated snapshots instead of pruning them first.
        #[arg(long)]
        no_clean: bool,
    },
    /// List a directory through the active engine.
    Ls { path: String },
    /// Print a text file through the active engine.
    Cat { path: String },
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    #[cfg(feature = "logs-json")]
    let installed = builder.json().try_init();
    #[cfg(not(feature = "logs-json"))]
    let installed = builder.try_init();

    if let Err(e) = installed {
        eprintln!("clubsync: logging unavailable: {}", e);
    }
}

async fn dispatch(cli: Cli) -> AppResult<()> {
    let config = AppConfig::load(&config::config_path(cli.config))?;
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::SyncWhitelist { records } => {
            commands::sync_whitelist(&config, &records, &mut stdout).await
        }
        Command::ShowWhitelist => commands::show_whitelist(&config, &mut stdout).await,
        Command::Backup { no_clean } => commands::backup(&config, !no_clean, &mut stdout).await,
        Command::Ls { path } => commands::ls(&config, &path, &mut stdout).await,
        Command::Cat { path } => commands::cat(&config, &path, &mut stdout).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    // Err only means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("clubsync: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
