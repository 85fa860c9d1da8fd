use super::{breakdown, distribution, ui, Stores};
use crate::core::breakdown::{compute_breakdowns, AccountBreakdown};
use crate::core::config::AppConfig;
use crate::core::distribution::{compute_asset_distribution, AccountDistribution};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// Renders the full portfolio picture: per-account breakdowns, the asset
/// distribution and the checking balance, computed concurrently.
pub async fn run(config: &AppConfig) -> Result<()> {
    let stores = super::open_stores(config)?;
    let as_of = Utc::now().date_naive();
    let currency = config.currency.clone();

    let breakdowns = spawn_section("asset breakdowns", {
        let stores = stores.clone();
        let currency = currency.clone();
        move || asset_breakdowns(&stores, &currency, as_of)
    });
    let dist = spawn_section("asset distribution", {
        let stores = stores.clone();
        let currency = currency.clone();
        move || asset_distribution(&stores, &currency, as_of)
    });
    let checking = spawn_section("checking balance", {
        let stores = stores.clone();
        let currency = currency.clone();
        move || checking_balance(&stores, &currency, as_of)
    });

    let breakdowns = breakdowns.await.context("Overview section panicked")??;
    let dist = dist.await.context("Overview section panicked")??;
    let checking = checking.await.context("Overview section panicked")??;

    if breakdowns.is_empty() {
        println!("No asset postings found. Run `folio import` first.");
        return Ok(());
    }

    println!("{}", ui::style_text("Accounts", ui::StyleType::Title));
    println!("{}\n", breakdown::render_breakdowns(&breakdowns, &currency));
    println!("{}", ui::style_text("Distribution", ui::StyleType::Title));
    println!(
        "{}\n",
        distribution::render_distribution(&dist, &currency)
    );
    println!(
        "{} {}",
        ui::style_text(&format!("Checking balance ({currency}):"), ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2}", checking.round_dp(2)), ui::StyleType::TotalValue),
    );
    Ok(())
}

fn spawn_section<T, F>(name: &'static str, section: F) -> tokio::task::JoinHandle<Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        debug!(section = name, "Computing overview section");
        let start = Instant::now();
        let result = section();
        info!(
            section = name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Overview section finished"
        );
        result
    })
}

fn asset_breakdowns(
    stores: &Stores,
    currency: &str,
    as_of: NaiveDate,
) -> Result<HashMap<String, AccountBreakdown>> {
    let (postings, index) = super::load_annotated_postings(
        stores,
        &["Assets:%", "Income:CapitalGains:%"],
        currency,
        as_of,
    )?;
    Ok(compute_breakdowns(
        &postings, &index, "Assets:%", true, currency, as_of,
    ))
}

fn asset_distribution(
    stores: &Stores,
    currency: &str,
    as_of: NaiveDate,
) -> Result<Vec<AccountDistribution>> {
    let (postings, index) = super::load_annotated_postings(
        stores,
        &["Assets:%", "Income:CapitalGains:%"],
        currency,
        as_of,
    )?;
    Ok(compute_asset_distribution(&postings, &index, currency, as_of))
}

/// Face-value balance across checking accounts.
fn checking_balance(stores: &Stores, currency: &str, as_of: NaiveDate) -> Result<Decimal> {
    let (postings, _) =
        super::load_annotated_postings(stores, &["Assets:Checking:%"], currency, as_of)?;
    Ok(postings.iter().map(|p| p.amount).sum())
}
