//! Concurrent price synchronization: one fetch task per commodity, a join
//! barrier, then a single atomic replace against the price store.

use anyhow::{Context, Result};
use futures::future::join_all;
use rand::seq::SliceRandom;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::commodity::{Commodity, FetchResult};
use crate::providers::ProviderRegistry;
use crate::store::PriceStore;

/// Outcome of one sync cycle. A commodity with zero fetched rows either
/// has no provider data or degraded on a fetch failure; its stored history
/// is empty until the next successful cycle.
#[derive(Debug)]
pub struct SyncStats {
    /// (commodity name, fetched row count) per attempted commodity.
    pub fetched: Vec<(String, usize)>,
    pub rows_inserted: usize,
}

/// Refreshes the stored price history for `commodities`.
///
/// Fetch failures are logged and degrade that commodity to an empty price
/// set; only a store transaction failure is fatal for the cycle.
pub async fn sync_commodity_prices(
    commodities: &[Commodity],
    registry: &ProviderRegistry,
    store: &PriceStore,
) -> Result<SyncStats> {
    // Shuffled so providers never see a fixed request order across cycles.
    let mut shuffled = commodities.to_vec();
    shuffled.shuffle(&mut rand::thread_rng());

    info!("Fetching price history for {} commodities", shuffled.len());
    let fetch_start = Instant::now();

    let mut tasks: Vec<JoinHandle<FetchResult>> = Vec::with_capacity(shuffled.len());
    for commodity in shuffled {
        let provider = registry.get(&commodity.price.provider);
        tasks.push(tokio::spawn(async move {
            let prices = match provider {
                Some(provider) => {
                    match provider.fetch(&commodity.price.code, &commodity.name).await {
                        Ok(prices) => prices,
                        Err(err) => {
                            error!(commodity = %commodity.name, error = %err, "Price fetch failed");
                            Vec::new()
                        }
                    }
                }
                None => {
                    error!(
                        commodity = %commodity.name,
                        provider = %commodity.price.provider,
                        "Unknown price provider"
                    );
                    Vec::new()
                }
            };
            FetchResult {
                kind: commodity.kind,
                name: commodity.name,
                code: commodity.price.code,
                prices,
            }
        }));
    }

    // Barrier: every task hands its result over before the store is touched.
    let mut results = Vec::with_capacity(tasks.len());
    for joined in join_all(tasks).await {
        results.push(joined.context("Fetch task panicked")?);
    }
    info!(
        commodities = results.len(),
        elapsed_ms = fetch_start.elapsed().as_millis() as u64,
        "Fetched all commodity price histories"
    );

    let fetched: Vec<(String, usize)> = results
        .iter()
        .map(|r| (r.name.clone(), r.prices.len()))
        .collect();

    let mut rows_inserted = 0;
    if !results.is_empty() {
        let replace_start = Instant::now();
        let store = store.clone();
        rows_inserted = tokio::task::spawn_blocking(move || store.replace_all(&results))
            .await
            .context("Replace task panicked")??;
        info!(
            rows = rows_inserted,
            elapsed_ms = replace_start.elapsed().as_millis() as u64,
            "Replaced stored price history"
        );
    }

    Ok(SyncStats {
        fetched,
        rows_inserted,
    })
}
