use super::ui;
use crate::FavoritesCommand;
use crate::core::{
    Converter, ConverterState, ExchangeRateSnapshot, FavoritePair, FavoritesStore, RateClient,
};
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A favorite pair with the outcome of looking up its current rate.
pub struct FavoriteRate {
    pub pair: FavoritePair,
    pub rate: Result<f64, String>,
}

/// Fetches current rates for every favorite, one request per distinct base.
pub async fn fetch_favorite_rates(
    favorites: &[FavoritePair],
    client: &dyn RateClient,
) -> Vec<FavoriteRate> {
    let bases: BTreeSet<&str> = favorites.iter().map(|p| p.from.as_str()).collect();

    let pb = ui::new_progress_bar(bases.len() as u64);
    pb.set_message("Fetching rates...");

    let rate_futures = bases.into_iter().map(|base| {
        let pb_clone = pb.clone();
        async move {
            let res = client.fetch_rates(base).await;
            pb_clone.inc(1);
            (base, res.map_err(|e| e.to_string()))
        }
    });
    let snapshots: HashMap<&str, Result<ExchangeRateSnapshot, String>> =
        join_all(rate_futures).await.into_iter().collect();
    pb.finish_and_clear();

    favorites
        .iter()
        .map(|pair| {
            let rate = match snapshots.get(pair.from.as_str()) {
                Some(Ok(snapshot)) => Ok(snapshot.rate_for(&pair.to)),
                Some(Err(e)) => Err(e.clone()),
                None => Err(format!("No rates fetched for {}", pair.from)),
            };
            FavoriteRate {
                pair: pair.clone(),
                rate,
            }
        })
        .collect()
}

pub fn display_as_table(rates: &[FavoriteRate]) -> String {
    if rates.is_empty() {
        return "No favorite currency pairs yet.".to_string();
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Exchange Rate"),
    ]);

    let mut errors = Vec::new();
    for favorite in rates {
        let rate_cell = match &favorite.rate {
            Ok(rate) => ui::number_cell(&format!("{rate:.2}")),
            Err(e) => {
                errors.push(format!("{}: {}", favorite.pair, e));
                ui::na_cell(true)
            }
        };
        table.add_row(vec![Cell::new(favorite.pair.to_string()), rate_cell]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Favorites", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    for error in errors {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&error, ui::StyleType::Error)
        ));
    }
    output
}

/// Mounts a converter on `pair` and applies `action` to it.
fn update_favorite(
    client: Arc<dyn RateClient>,
    store: Arc<dyn FavoritesStore>,
    pair: FavoritePair,
    action: fn(&mut Converter) -> Result<()>,
) -> Result<String> {
    let initial = ConverterState {
        from_currency: pair.from,
        to_currency: pair.to,
        ..ConverterState::default()
    };
    let mut converter = Converter::mount_with(client, store, initial)?;
    action(&mut converter)?;

    let notifications: Vec<String> = converter
        .drain_notifications()
        .iter()
        .map(ui::format_notification)
        .collect();
    Ok(notifications.join("\n\n"))
}

pub async fn run(
    command: FavoritesCommand,
    client: Arc<dyn RateClient>,
    store: Arc<dyn FavoritesStore>,
) -> Result<()> {
    match command {
        FavoritesCommand::List => {
            let favorites = store.load()?;
            let rates = fetch_favorite_rates(&favorites, client.as_ref()).await;
            println!("{}", display_as_table(&rates));
        }
        FavoritesCommand::Add { from, to } => {
            let output = update_favorite(
                client,
                store,
                FavoritePair::new(&from, &to),
                Converter::add_favorite,
            )?;
            println!("{output}");
        }
        FavoritesCommand::Remove { from, to } => {
            let output = update_favorite(
                client,
                store,
                FavoritePair::new(&from, &to),
                Converter::remove_favorite,
            )?;
            println!("{output}");
        }
    }
    Ok(())
}

/// Plain listing of pairs, used by the interactive session.
pub fn display_pairs(pairs: &[FavoritePair]) -> String {
    if pairs.is_empty() {
        return "No favorite currency pairs yet.".to_string();
    }
    pairs
        .iter()
        .map(|p| format!("  {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}
