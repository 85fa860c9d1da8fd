//! One `run` per subcommand, plus the shared table helpers.

pub mod breakdown;
pub mod distribution;
pub mod import;
pub mod overview;
pub mod prices;
pub mod setup;
pub mod sync;
pub mod ui;

use anyhow::Result;
use chrono::NaiveDate;

use crate::core::config::AppConfig;
use crate::core::ledger::{Posting, TransactionIndex};
use crate::core::pricing::populate_market_price;
use crate::store::{self, PostingStore, PriceStore};

/// Stores over the configured database.
#[derive(Clone)]
pub(crate) struct Stores {
    pub prices: PriceStore,
    pub postings: PostingStore,
}

pub(crate) fn open_stores(config: &AppConfig) -> Result<Stores> {
    let pool = store::open(config.database_path()?)?;
    Ok(Stores {
        prices: PriceStore::new(pool.clone()),
        postings: PostingStore::new(pool),
    })
}

/// Loads the postings matching `patterns`, annotated with market prices,
/// plus the sibling-leg index over the full posting set.
pub(crate) fn load_annotated_postings(
    stores: &Stores,
    patterns: &[&str],
    currency: &str,
    as_of: NaiveDate,
) -> Result<(Vec<Posting>, TransactionIndex)> {
    let index = TransactionIndex::build(&stores.postings.all()?);
    let mut postings = stores.postings.filtered(patterns)?;
    populate_market_price(&mut postings, &stores.prices, currency, as_of)?;
    Ok((postings, index))
}
