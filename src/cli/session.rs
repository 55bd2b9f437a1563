//! Interactive converter session driven by line commands.

use super::{convert, favorites, ui};
use crate::core::config::AppConfig;
use crate::core::{Converter, FavoritePair};
use anyhow::{Result, anyhow};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Amount(f64),
    From(String),
    To(String),
    Swap,
    Favorite,
    Use(FavoritePair),
    Refresh,
    Favorites,
    Show,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts.next();

        let cmd = match (command.as_str(), arg) {
            ("amount", Some(value)) => {
                let amount = value
                    .parse::<f64>()
                    .map_err(|_| anyhow!("Invalid amount: {}", value))?;
                SessionCommand::Amount(amount)
            }
            ("from", Some(code)) => SessionCommand::From(code.to_string()),
            ("to", Some(code)) => SessionCommand::To(code.to_string()),
            ("use", Some(pair)) => SessionCommand::Use(pair.parse()?),
            ("swap", None) => SessionCommand::Swap,
            ("fav", None) => SessionCommand::Favorite,
            ("refresh", None) => SessionCommand::Refresh,
            ("favorites", None) => SessionCommand::Favorites,
            ("show", None) => SessionCommand::Show,
            ("help", None) => SessionCommand::Help,
            ("quit" | "exit", None) => SessionCommand::Quit,
            _ => return Err(anyhow!("Unknown command: {}. Type 'help' for usage.", s.trim())),
        };

        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments: {}", s.trim()));
        }
        Ok(cmd)
    }
}

fn help_text(config: &AppConfig) -> String {
    let currencies = config
        .currencies
        .iter()
        .map(|c| format!("{} - {}", c.code, c.label))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{}
  amount <N>      set the amount to convert
  from <CODE>     set the source currency
  to <CODE>       set the target currency
  swap            swap source and target
  fav             add or remove the current pair from favorites
  use <FROM-TO>   switch to a currency pair
  refresh         fetch the current rate again
  favorites       list favorite pairs
  show            show the converter
  quit            leave the session

{} {}",
        ui::style_text("Commands", ui::StyleType::Title),
        ui::style_text("Currencies:", ui::StyleType::Label),
        currencies
    )
}

/// Runs `command`, returning `false` when the session should end.
pub async fn execute<W: Write>(
    converter: &mut Converter,
    config: &AppConfig,
    command: SessionCommand,
    output: &mut W,
) -> Result<bool> {
    debug!(?command, "Session command");

    let request = match command {
        SessionCommand::Quit => return Ok(false),
        SessionCommand::Help => {
            writeln!(output, "{}", help_text(config))?;
            return Ok(true);
        }
        SessionCommand::Favorites => {
            writeln!(
                output,
                "{}",
                favorites::display_pairs(&converter.state().favorites)
            )?;
            return Ok(true);
        }
        SessionCommand::Favorite => {
            if let Err(e) = converter.toggle_favorite() {
                writeln!(
                    output,
                    "{}",
                    ui::style_text(&format!("{e:#}"), ui::StyleType::Error)
                )?;
            }
            None
        }
        SessionCommand::Amount(amount) => {
            converter.set_amount(amount);
            None
        }
        SessionCommand::From(code) => converter.set_from_currency(&code),
        SessionCommand::To(code) => converter.set_to_currency(&code),
        SessionCommand::Swap => converter.swap_currencies(),
        SessionCommand::Use(pair) => converter.select_favorite(&pair),
        SessionCommand::Refresh => Some(converter.request_rate()),
        SessionCommand::Show => None,
    };

    if let Some(request) = request {
        converter.fetch(request).await;
    }
    writeln!(output, "{}", convert::render(converter))?;
    Ok(true)
}

pub async fn run<R, W>(
    converter: &mut Converter,
    config: &AppConfig,
    input: R,
    output: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        output,
        "{}",
        ui::style_text(
            "SwiftConvert: type 'help' for commands, 'quit' to leave.",
            ui::StyleType::Subtle
        )
    )?;

    converter.refresh().await;
    writeln!(output, "{}", convert::render(converter))?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<SessionCommand>() {
            Ok(command) => {
                if !execute(converter, config, command, output).await? {
                    break;
                }
            }
            Err(e) => writeln!(
                output,
                "{}",
                ui::style_text(&e.to_string(), ui::StyleType::Error)
            )?,
        }
    }
    Ok(())
}
