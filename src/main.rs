use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use swiftconvert::core::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        amount: Option<f64>,
        /// Source currency code
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Display all exchange rates for a base currency
    Rates {
        /// Base currency code
        base: Option<String>,
    },
    /// Manage favorite currency pairs
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// List known currencies
    Currencies,
    /// Start an interactive converter session
    Session,
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// List favorite pairs with their current rate
    List,
    /// Add a currency pair to favorites
    Add { from: String, to: String },
    /// Remove a currency pair from favorites
    Remove { from: String, to: String },
}

impl From<FavoritesAction> for swiftconvert::FavoritesCommand {
    fn from(action: FavoritesAction) -> swiftconvert::FavoritesCommand {
        match action {
            FavoritesAction::List => swiftconvert::FavoritesCommand::List,
            FavoritesAction::Add { from, to } => swiftconvert::FavoritesCommand::Add { from, to },
            FavoritesAction::Remove { from, to } => {
                swiftconvert::FavoritesCommand::Remove { from, to }
            }
        }
    }
}

impl From<Commands> for swiftconvert::AppCommand {
    fn from(cmd: Commands) -> swiftconvert::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                swiftconvert::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates { base } => swiftconvert::AppCommand::Rates { base },
            Commands::Favorites { action } => swiftconvert::AppCommand::Favorites(action.into()),
            Commands::Currencies => swiftconvert::AppCommand::Currencies,
            Commands::Session => swiftconvert::AppCommand::Session,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => {
            swiftconvert::cli::setup::setup(cli.config_path.as_deref()).map(|_| ())
        }
        Some(cmd) => swiftconvert::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
