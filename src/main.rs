//! CLI entry point for guestbook-notifier
//!
//! `listen` consumes backend events as JSON lines on stdin; the other
//! subcommands report a single error, show how a message would be
//! classified, or manage the configuration file.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use guestbook_notifier::{
    classify, default_config, get_config_path, load_config_from_path, logging,
    run_event_loop, save_config_to_path, AppConfig, ErrorNotifier, ErrorSource, Severity,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;

// Version constants from build script
const VERSION: &str = env!("CARGO_PKG_VERSION");
const COMMIT_HASH: &str = env!("GIT_COMMIT_HASH");
const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

/// Upper bound on waiting for sink delivery and delayed cues before exit
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Get detailed version information
fn print_version() {
    println!("guestbook-notifier {}", VERSION);
    println!("commit: {}", COMMIT_HASH);
    println!("built: {}", BUILD_TIMESTAMP);
}

/// Command-line arguments for guestbook-notifier
#[derive(Parser, Debug)]
#[command(
    name = "guestbook-notifier",
    about = "Error classification and rate-limited notifications for guestbook kiosks",
    version = VERSION,
    long_about = "Classifies kiosk device errors, rate-limits repeated notifications and
surfaces them as sound cues and a status banner.

Event format for 'listen' (one JSON object per line on stdin):
  {\"event\": \"hid-error\", \"payload\": \"Scanner disconnected\"}
  {\"event\": \"hid-data\", \"payload\": \"0012345678\"}
  {\"event\": \"app-error\", \"payload\": {\"source\": \"network\", \"message\": \"...\", \"severity\": \"high\"}}
  {\"event\": \"reset\"}
"
)]
struct Cli {
    /// Configuration file (default: ~/.guestbook-notifier.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Read backend events from stdin until EOF
    Listen,

    /// Report a single application error
    Report(ReportArgs),

    /// Show the source and severity a raw message classifies as
    Classify {
        /// Raw error text
        message: String,
    },

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the report command
#[derive(Parser, Debug)]
struct ReportArgs {
    /// Error source (barcode, magstripe, keypad, network, system, config)
    #[arg(long, default_value = "system")]
    source: ErrorSource,

    /// Error severity (low, medium, high, critical)
    #[arg(long, default_value = "medium")]
    severity: Severity,

    /// Error message
    message: String,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default configuration file to the --config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

fn resolve_config_path(config: Option<&str>) -> anyhow::Result<PathBuf> {
    match config {
        Some(path) => {
            let expanded = shellexpand::full(path)
                .with_context(|| format!("Failed to expand path: {}", path))?;
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => Ok(get_config_path()),
    }
}

fn main() -> anyhow::Result<()> {
    // Check for --version or -V flag before parsing
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        print_version();
        return Ok(());
    }

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Config(ConfigCommand::Init { force }) => init_config(&config_path, force),
        Commands::Config(ConfigCommand::Show) => {
            let config = load_config_from_path(&config_path)?;
            println!("Config file: {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Classify { message } => {
            let (source, severity) = classify(&message);
            println!(
                "{}",
                serde_json::json!({ "source": source, "severity": severity })
            );
            Ok(())
        }
        Commands::Listen => {
            let config = load_config_from_path(&config_path)?;
            logging::init_logging(&config);
            run_runtime(listen_command(config))
        }
        Commands::Report(report_args) => {
            let config = load_config_from_path(&config_path)?;
            logging::init_logging(&config);
            run_runtime(report_command(config, report_args))
        }
    }
}

fn run_runtime<F>(future: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = anyhow::Result<()>>,
{
    let runtime = tokio::runtime::Runtime::new().context("Failed to start Tokio runtime")?;
    runtime.block_on(future)
}

/// Handle the listen command - dispatch stdin events until EOF
async fn listen_command(config: AppConfig) -> anyhow::Result<()> {
    let notifier = Arc::new(ErrorNotifier::from_config(&config)?);
    tracing::info!("Listening for backend events on stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    run_event_loop(stdin, Arc::clone(&notifier)).await?;

    notifier.flush(FLUSH_TIMEOUT).await;
    Ok(())
}

/// Handle the report command - surface one application error
async fn report_command(config: AppConfig, args: ReportArgs) -> anyhow::Result<()> {
    let notifier = ErrorNotifier::from_config(&config)?;
    let decision = notifier.handle_application_error(args.source, &args.message, args.severity);
    println!("{:?}", decision);

    notifier.flush(FLUSH_TIMEOUT).await;
    Ok(())
}

/// Handle the config init command - write defaults
fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    save_config_to_path(&default_config(), path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_args() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_defaults() {
        let cli = Cli::try_parse_from(["guestbook-notifier", "report", "Printer jammed"]).unwrap();
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.source, ErrorSource::System);
                assert_eq!(args.severity, Severity::Medium);
                assert_eq!(args.message, "Printer jammed");
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_report_with_options() {
        let cli = Cli::try_parse_from([
            "guestbook-notifier",
            "report",
            "--source",
            "magtek",
            "--severity",
            "critical",
            "Reader on fire",
            "--config",
            "/tmp/kiosk.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some("/tmp/kiosk.json".to_string()));
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.source, ErrorSource::Magstripe);
                assert_eq!(args.severity, Severity::Critical);
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_report_rejects_unknown_source() {
        let result =
            Cli::try_parse_from(["guestbook-notifier", "report", "--source", "printer", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_init_takes_global_config_path() {
        let cli = Cli::try_parse_from([
            "guestbook-notifier",
            "config",
            "init",
            "--force",
            "--config",
            "/tmp/kiosk.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some("/tmp/kiosk.json".to_string()));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand::Init { force: true })
        ));

        let result =
            Cli::try_parse_from(["guestbook-notifier", "config", "init", "--path", "/tmp/x.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_init_writes_to_given_path() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("kiosk.json");
        let path = resolve_config_path(target.to_str()).unwrap();
        assert_eq!(path, target);

        init_config(&path, false).unwrap();
        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.max_before_silent, 3);
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notifier.json");

        init_config(&path, false).unwrap();
        assert!(init_config(&path, false).is_err());
        assert!(init_config(&path, true).is_ok());
    }
}
