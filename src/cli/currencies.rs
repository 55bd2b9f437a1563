use super::ui;
use crate::core::config::AppConfig;
use comfy_table::Cell;

pub fn display_as_table(config: &AppConfig) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Name")]);

    for currency in &config.currencies {
        table.add_row(vec![Cell::new(&currency.code), Cell::new(&currency.label)]);
    }
    table.to_string()
}

pub fn run(config: &AppConfig) {
    println!("{}", display_as_table(config));
}
