use super::ui;
use crate::core::config::AppConfig;
use crate::core::{ExchangeRateSnapshot, RateClient};
use anyhow::Result;
use comfy_table::Cell;

impl ExchangeRateSnapshot {
    pub fn display_as_table(&self, config: &AppConfig) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Name"),
            ui::header_cell(&format!("Rate (per 1 {})", self.base)),
        ]);

        for (code, rate) in &self.rates {
            table.add_row(vec![
                Cell::new(code),
                Cell::new(config.currency_label(code).unwrap_or("")),
                ui::number_cell(&format!("{rate:.4}")),
            ]);
        }

        let updated = self.updated_at.map_or("unknown".to_string(), |ts| {
            ts.format("%Y-%m-%d %H:%M UTC").to_string()
        });

        let mut output = format!(
            "Exchange rates for {}\n\n",
            ui::style_text(&self.base, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(&format!("Last updated: {updated}"), ui::StyleType::Subtle)
        ));
        output
    }
}

pub async fn run(client: &dyn RateClient, config: &AppConfig, base: &str) -> Result<()> {
    let pb = ui::new_spinner(&format!("Fetching rates for {base}..."));
    let result = client.fetch_rates(base).await;
    pb.finish_and_clear();

    let snapshot = result?;
    println!("{}", snapshot.display_as_table(config));
    Ok(())
}
