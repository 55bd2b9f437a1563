use super::ui;
use crate::core::{Converter, ConverterView};
use anyhow::{Result, bail};
use comfy_table::Cell;

impl ConverterView {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Amount"),
            ui::header_cell("From"),
            ui::header_cell("To"),
            ui::header_cell("Exchange Rate"),
            ui::header_cell("Converted Amount"),
        ]);

        let rate_cell = if self.error.is_some() {
            ui::number_cell(&self.rate).fg(comfy_table::Color::Red)
        } else {
            ui::number_cell(&self.rate)
        };

        table.add_row(vec![
            ui::number_cell(&self.amount.to_string()),
            Cell::new(&self.from_currency),
            Cell::new(&self.to_currency),
            rate_cell,
            ui::number_cell(&self.converted),
        ]);

        let star = if self.is_favorite { " ★" } else { "" };
        let mut output = format!(
            "{}{}\n",
            ui::style_text(
                &format!("{}-{}", self.from_currency, self.to_currency),
                ui::StyleType::Title
            ),
            star
        );
        output.push_str(&table.to_string());

        if let Some(reason) = &self.error {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(&format!("Error: {reason}"), ui::StyleType::Error)
            ));
        }

        output
    }
}

/// Renders the current view followed by any queued notifications.
pub fn render(converter: &mut Converter) -> String {
    let mut output = converter.view().display_as_table();
    for notification in converter.drain_notifications() {
        output.push_str("\n\n");
        output.push_str(&ui::format_notification(&notification));
    }
    output
}

pub async fn run(mut converter: Converter) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    converter.refresh().await;
    pb.finish_and_clear();

    println!("{}", render(&mut converter));

    if let Some(reason) = converter.view().error {
        bail!(reason);
    }
    Ok(())
}
