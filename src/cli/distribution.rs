use super::ui;
use crate::core::config::AppConfig;
use crate::core::distribution::{compute_asset_distribution, AccountDistribution};
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn run(config: &AppConfig) -> Result<()> {
    let stores = super::open_stores(config)?;
    let as_of = Utc::now().date_naive();

    let (postings, index) = super::load_annotated_postings(
        &stores,
        &["Assets:%", "Income:CapitalGains:%"],
        &config.currency,
        as_of,
    )?;

    let distribution = compute_asset_distribution(&postings, &index, &config.currency, as_of);
    if distribution.is_empty() {
        println!("No asset postings found. Run `folio import` first.");
        return Ok(());
    }
    println!("{}", render_distribution(&distribution, &config.currency));
    Ok(())
}

pub(crate) fn render_distribution(
    distribution: &[AccountDistribution],
    currency: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell(&format!("Market Value ({currency})")),
        ui::header_cell("Share (%)"),
    ]);

    for entry in distribution {
        table.add_row(vec![
            Cell::new(&entry.category),
            ui::money_cell(entry.amount),
            ui::number_cell(format!("{:.2}%", entry.percentage.round_dp(2))),
        ]);
    }

    let total: Decimal = distribution.iter().map(|d| d.amount).sum();
    format!(
        "{table}\n\n{} {}",
        ui::style_text(&format!("Total ({currency}):"), ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", total.round_dp(2)), ui::StyleType::TotalValue),
    )
}
