//! Mark-to-market annotation: fills each posting's market amount from the
//! stored price history before the computation engines run.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::core::ledger::Posting;
use crate::store::PriceStore;

/// Annotates `postings` with their current market value.
///
/// Postings in the base `currency` are cash and valued at face amount.
/// Everything else is marked to the latest stored price on or before
/// `as_of`, falling back to the posting's own amount when no price row
/// exists for its commodity.
pub fn populate_market_price(
    postings: &mut [Posting],
    store: &PriceStore,
    currency: &str,
    as_of: NaiveDate,
) -> Result<()> {
    let mut latest: HashMap<String, Option<Decimal>> = HashMap::new();

    for posting in postings.iter_mut() {
        if posting.commodity == currency {
            posting.market_amount = Some(posting.amount);
            continue;
        }

        let value = match latest.get(&posting.commodity) {
            Some(value) => *value,
            None => {
                let value = store
                    .latest_on_or_before(&posting.commodity, as_of)?
                    .map(|price| price.value);
                latest.insert(posting.commodity.clone(), value);
                value
            }
        };

        posting.market_amount = match value {
            Some(value) => Some(posting.quantity * value),
            None => Some(posting.amount),
        };
    }
    Ok(())
}
