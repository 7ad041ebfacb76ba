use super::ui;
use crate::core::{CurrencyBoxRates, PageData};
use comfy_table::Cell;

pub const UNAVAILABLE_MESSAGE: &str = "Exchange rates are currently unavailable.";

impl CurrencyBoxRates {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Amount"),
            ui::header_cell("Rate"),
        ]);

        for conversion in &self.conversions {
            let amount = if conversion.is_available() {
                format!("{}{}", conversion.symbol, conversion.amount)
            } else {
                conversion.amount.clone()
            };
            table.add_row(vec![
                Cell::new(&conversion.currency),
                ui::amount_cell(&amount, conversion.is_available()),
                Cell::new(&conversion.label),
            ]);
        }

        let title = format!(
            "{}{} {}",
            self.base.symbol, self.base.amount, self.base.currency
        );
        let mut output = format!("{}\n\n", ui::style_text(&title, ui::StyleType::Title));
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&self.updated_at, ui::StyleType::Subtle)
        ));
        output
    }
}

/// Renders the page payload, falling back to a message when rates are null.
pub fn render(page: &PageData, json: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(page)?);
    }

    Ok(match &page.rates {
        Some(rates) => rates.display_as_table(),
        None => ui::style_text(UNAVAILABLE_MESSAGE, ui::StyleType::Error),
    })
}
