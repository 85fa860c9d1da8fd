use super::ui;
use crate::core::commodity::Price;
use crate::core::config::AppConfig;
use anyhow::Result;
use comfy_table::Cell;

pub fn run(config: &AppConfig, name: &str) -> Result<()> {
    let stores = super::open_stores(config)?;
    let history = stores.prices.history(name)?;

    if history.is_empty() {
        println!("No stored prices for {name}. Run `folio sync` first.");
        return Ok(());
    }
    println!("{}", render_history(name, &history));
    Ok(())
}

fn render_history(name: &str, history: &[Price]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Date"), ui::header_cell("Price")]);
    for price in history {
        table.add_row(vec![
            Cell::new(price.date.format("%Y-%m-%d").to_string()),
            ui::money_cell(price.value),
        ]);
    }

    // History is date ascending, so the latest quote is the last row.
    let latest = &history[history.len() - 1];
    format!(
        "{}\n\n{table}\n\n{} entries, latest {} on {}",
        ui::style_text(name, ui::StyleType::Title),
        history.len(),
        ui::style_text(&format!("{:.2}", latest.value), ui::StyleType::TotalValue),
        latest.date.format("%Y-%m-%d"),
    )
}
