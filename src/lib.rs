pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{Converter, ConverterState, FavoritesStore, RateClient};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesCommand {
    List,
    Add { from: String, to: String },
    Remove { from: String, to: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: Option<f64>,
        from: Option<String>,
        to: Option<String>,
    },
    Rates {
        base: Option<String>,
    },
    Favorites(FavoritesCommand),
    Currencies,
    Session,
}

/// Builds the initial converter state from configured defaults and overrides.
pub fn initial_state(
    config: &AppConfig,
    amount: Option<f64>,
    from: Option<&str>,
    to: Option<&str>,
) -> ConverterState {
    ConverterState {
        amount: amount.unwrap_or(config.defaults.amount),
        from_currency: from.unwrap_or(&config.defaults.from).to_string(),
        to_currency: to.unwrap_or(&config.defaults.to).to_string(),
        ..ConverterState::default()
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("SwiftConvert starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?.with_env_overrides(),
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let client: Arc<dyn RateClient> = Arc::new(providers::ExchangeRateApiClient::new(
        &config.provider.base_url,
        config.provider.api_key.as_deref(),
    ));

    match command {
        AppCommand::Currencies => {
            cli::currencies::run(&config);
            Ok(())
        }
        AppCommand::Rates { base } => {
            let base = base.as_deref().unwrap_or(&config.defaults.from);
            cli::rates::run(client.as_ref(), &config, base).await
        }
        AppCommand::Convert { amount, from, to } => {
            let store = open_store(&config)?;
            let initial = initial_state(&config, amount, from.as_deref(), to.as_deref());
            let converter = Converter::mount_with(client, store, initial)?;
            cli::convert::run(converter).await
        }
        AppCommand::Favorites(cmd) => {
            let store = open_store(&config)?;
            cli::favorites::run(cmd, client, store).await
        }
        AppCommand::Session => {
            let store = open_store(&config)?;
            let mut converter =
                Converter::mount_with(client, store, initial_state(&config, None, None, None))?;
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = std::io::stdout();
            cli::session::run(&mut converter, &config, input, &mut output).await
        }
    }
}

fn open_store(config: &AppConfig) -> Result<Arc<dyn FavoritesStore>> {
    let data_path = config.default_data_path()?;
    debug!("Using data path {}", data_path.display());
    Ok(store::open_favorites_store(&data_path))
}
