use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xcc::cli::setup::setup;
use xcc::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for xcc::AppCommand {
    fn from(cmd: Commands) -> xcc::AppCommand {
        match cmd {
            Commands::Currencies => xcc::AppCommand::Currencies,
            Commands::Convert { amount, from, to } => xcc::AppCommand::Convert { amount, from, to },
            Commands::Cache => xcc::AppCommand::Cache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List available currencies
    Currencies,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Currency to convert from, e.g. USD
        from: String,
        /// Currency to convert to, e.g. EUR
        to: String,
    },
    /// Show offline cache statistics
    Cache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(cli.config_path.as_deref()),
        Some(cmd) => xcc::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
