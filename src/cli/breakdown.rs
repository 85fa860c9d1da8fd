use super::ui;
use crate::core::breakdown::{compute_breakdowns, AccountBreakdown};
use crate::core::config::AppConfig;
use anyhow::Result;
use chrono::Utc;
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub fn run(config: &AppConfig, pattern: &str, rollup: bool) -> Result<()> {
    let stores = super::open_stores(config)?;
    let as_of = Utc::now().date_naive();

    // Capital-gains postings ride along so gains attribute to their source
    // asset account even when the pattern would not match them.
    let (postings, index) = super::load_annotated_postings(
        &stores,
        &[pattern, "Income:CapitalGains:%"],
        &config.currency,
        as_of,
    )?;

    let breakdowns = compute_breakdowns(&postings, &index, pattern, rollup, &config.currency, as_of);
    if breakdowns.is_empty() {
        println!("No postings match {pattern}. Run `folio import` first.");
        return Ok(());
    }
    println!("{}", render_breakdowns(&breakdowns, &config.currency));
    Ok(())
}

pub(crate) fn render_breakdowns(
    breakdowns: &HashMap<String, AccountBreakdown>,
    currency: &str,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Account"),
        ui::header_cell(&format!("Investment ({currency})")),
        ui::header_cell(&format!("Withdrawal ({currency})")),
        ui::header_cell(&format!("Market Value ({currency})")),
        ui::header_cell(&format!("Gain ({currency})")),
        ui::header_cell("Abs Return (%)"),
        ui::header_cell("XIRR (%)"),
        ui::header_cell("Units"),
    ]);

    let mut groups: Vec<&AccountBreakdown> = breakdowns.values().collect();
    groups.sort_by(|a, b| a.group.cmp(&b.group));

    for b in groups {
        let units = if b.balance_units.is_zero() {
            Cell::new("")
        } else {
            ui::number_cell(format!("{}", b.balance_units.round_dp(4).normalize()))
        };
        table.add_row(vec![
            Cell::new(&b.group),
            ui::money_cell(b.investment_amount),
            ui::money_cell(b.withdrawal_amount),
            ui::money_cell(b.market_amount),
            ui::money_cell(b.gain_amount),
            ui::percent_cell(b.absolute_return * Decimal::ONE_HUNDRED),
            ui::percent_cell(b.xirr),
            units,
        ]);
    }

    table.to_string()
}
