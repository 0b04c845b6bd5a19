use super::ui;
use crate::core::config::AppConfig;
use crate::core::{Currency, CurrencyRate};
use crate::repository::CurrencyRepository;
use crate::store::Stores;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use comfy_table::Cell;

/// Prints the stored rates for `base` on `date` (today when omitted).
pub async fn run(config: &AppConfig, base: &str, date: Option<NaiveDate>) -> Result<()> {
    let stores = Stores::open(config)?;
    let repository = CurrencyRepository::new(stores.rates);
    let base = Currency::new(base);
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let rates = repository.get_many(&base, date).await?;
    println!("{}", render_rates(&base, date, &rates));
    Ok(())
}

pub fn render_rates(base: &Currency, date: NaiveDate, rates: &[CurrencyRate]) -> String {
    let mut output = format!(
        "Rates for {} on {}\n\n",
        ui::style_text(&base.as_str().to_uppercase(), ui::StyleType::Title),
        date
    );

    if rates.is_empty() {
        output.push_str(&ui::style_text(
            "No rates stored. Run `fxsync sync` first.",
            ui::StyleType::Subtle,
        ));
        return output;
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Rate")]);
    for rate in rates {
        table.add_row(vec![
            Cell::new(rate.currency.as_str().to_uppercase()),
            ui::rate_cell(rate.rate),
        ]);
    }
    output.push_str(&table.to_string());
    output
}
