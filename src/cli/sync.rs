use super::ui;
use crate::core::config::AppConfig;
use crate::core::sync::{sync_commodity_prices, SyncStats};
use crate::providers::ProviderRegistry;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run(config: &AppConfig) -> Result<()> {
    let stores = super::open_stores(config)?;
    let registry = ProviderRegistry::from_config(&config.providers);

    let stats = sync_commodity_prices(&config.commodities, &registry, &stores.prices).await?;
    println!("{}", render_stats(&stats));
    Ok(())
}

fn render_stats(stats: &SyncStats) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Commodity"),
        ui::header_cell("Prices"),
    ]);

    let mut fetched = stats.fetched.clone();
    fetched.sort();
    for (name, count) in &fetched {
        table.add_row(vec![
            Cell::new(name),
            ui::number_cell(count.to_string()),
        ]);
    }

    format!(
        "{table}\n\n{} {}",
        ui::style_text("Rows stored:", ui::StyleType::TotalLabel),
        ui::style_text(&stats.rows_inserted.to_string(), ui::StyleType::TotalValue),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_table_lists_each_commodity() {
        let stats = SyncStats {
            fetched: vec![("UTI Nifty".to_string(), 120), ("GOLD".to_string(), 0)],
            rows_inserted: 120,
        };

        let rendered = render_stats(&stats);
        assert!(rendered.contains("UTI Nifty"));
        assert!(rendered.contains("GOLD"));
        assert!(rendered.contains("120"));
    }
}
