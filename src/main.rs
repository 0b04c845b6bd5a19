use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxsync::core::log::{LogFormat, init_logging};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxsync::AppCommand {
    fn from(cmd: Commands) -> fxsync::AppCommand {
        match cmd {
            Commands::Serve { in_memory } => fxsync::AppCommand::Serve { in_memory },
            Commands::Sync { days } => fxsync::AppCommand::Sync { days },
            Commands::Show { base, date } => fxsync::AppCommand::Show { base, date },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the rates API and synchronize rates on a schedule
    Serve {
        /// Keep rates and request logs in memory only
        #[arg(long)]
        in_memory: bool,
    },
    /// Synchronize rates once and exit
    Sync {
        /// Days before today to refresh (defaults to `days_look_back`)
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Display stored rates for a base currency
    Show {
        /// Base currency, e.g. usd
        #[arg(short, long)]
        base: String,
        /// Day to display as YYYY-MM-DD (defaults to today, UTC)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);

    let result = match cli.command {
        Some(Commands::Setup) => fxsync::cli::setup::setup(),
        Some(cmd) => fxsync::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!("Application failed: {e:#}");
    }
    result
}
