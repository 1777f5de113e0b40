//! # MOV Integrity Checker - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr, così
//!   stdout resta pulito per l'output JSON)
//! - Caricamento della configurazione e override da CLI
//! - Gestione di Ctrl-C: la scansione si ferma prima del file successivo
//! - Exit code in base al risultato
//!
//! ## Exit code:
//! - `0`: nessun problema (o `--no-fail`)
//! - `1`: almeno un file ha issue, oppure errore generale
//! - `130`: scansione interrotta dall'utente
//!
//! ## Esempio di utilizzo:
//! ```bash
//! mov-checker /path/to/footage --ext mov --ext mp4 --skip-verified --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use mov_integrity_checker::{platform::PlatformCommands, Config, IntegrityScanner, JsonMessage};

#[derive(Parser)]
#[command(name = "mov-checker")]
#[command(about = "Check the structural integrity of QuickTime/MP4 files")]
struct Args {
    /// File or directory to check
    path: PathBuf,

    /// Do not probe total duration with ffprobe
    #[arg(long)]
    no_duration: bool,

    /// Seconds before a duration probe is abandoned (1-600)
    #[arg(long)]
    probe_timeout: Option<u64>,

    /// Explicit path to the ffprobe binary
    #[arg(long)]
    ffprobe: Option<PathBuf>,

    /// File extension to check (repeatable, default: mov, mp4, m4v, m4a)
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Output results as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Skip files verified clean in a previous run and unchanged since
    #[arg(long)]
    skip_verified: bool,

    /// Exit with status 0 even when files have issues
    #[arg(long)]
    no_fail: bool,

    /// JSON configuration file (CLI flags override its values)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("Running on {}", PlatformCommands::system_info());

    if !args.path.exists() {
        let message = format!("Path does not exist: {}", args.path.display());
        if args.json {
            JsonMessage::error(message.clone(), None).emit();
        }
        return Err(anyhow::anyhow!(message));
    }

    let config = build_config(&args).await?;
    let fail_on_issues = config.fail_on_issues;

    let mut scanner = IntegrityScanner::new(&args.path, config).await?;

    let cancel = scanner.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current file");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let summary = scanner.run().await?;

    if summary.cancelled {
        return Ok(ExitCode::from(130));
    }
    if fail_on_issues && summary.has_issues() {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

async fn build_config(args: &Args) -> Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    if args.no_duration {
        config.probe_duration = false;
    }
    if let Some(timeout) = args.probe_timeout {
        config.probe_timeout_secs = timeout;
    }
    if let Some(ref ffprobe) = args.ffprobe {
        config.ffprobe_path = Some(ffprobe.clone());
    }
    if !args.extensions.is_empty() {
        config.extensions = Config::normalize_extensions(&args.extensions);
    }
    if args.json {
        config.json_output = true;
    }
    if args.skip_verified {
        config.skip_verified = true;
    }
    if args.no_fail {
        config.fail_on_issues = false;
    }

    Ok(config)
}
