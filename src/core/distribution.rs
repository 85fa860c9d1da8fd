//! Normalized market-value distribution of first-level account groups.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::core::breakdown::{compute_breakdowns, AccountBreakdown};
use crate::core::ledger::{Posting, TransactionIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountDistribution {
    pub category: String,
    pub amount: Decimal,
    pub percentage: Decimal,
}

/// Asset distribution one level below `Assets`: rolled-up breakdowns over
/// the asset postings, reduced to first-level groups.
pub fn compute_asset_distribution(
    postings: &[Posting],
    index: &TransactionIndex,
    currency: &str,
    as_of: NaiveDate,
) -> Vec<AccountDistribution> {
    let breakdowns = compute_breakdowns(postings, index, "Assets:%", true, currency, as_of);
    distribution_from_breakdowns(&breakdowns, "Assets")
}

/// Selects the groups exactly one hierarchy level below `root` and computes
/// each one's share of their total market value.
///
/// Sorted by amount descending; ties break on category name ascending so the
/// order is stable even though the breakdown map has none. When the total is
/// zero every percentage is zero.
pub fn distribution_from_breakdowns(
    breakdowns: &HashMap<String, AccountBreakdown>,
    root: &str,
) -> Vec<AccountDistribution> {
    let prefix = format!("{root}:");
    let first_level: Vec<(&str, &AccountBreakdown)> = breakdowns
        .iter()
        .filter_map(|(group, breakdown)| {
            let category = group.strip_prefix(&prefix)?;
            (!category.is_empty() && !category.contains(':')).then_some((category, breakdown))
        })
        .collect();

    let total_amount: Decimal = first_level
        .iter()
        .map(|(_, breakdown)| breakdown.market_amount)
        .sum();

    let mut distribution: Vec<AccountDistribution> = first_level
        .into_iter()
        .map(|(category, breakdown)| {
            let percentage = if total_amount.is_zero() {
                Decimal::ZERO
            } else {
                breakdown.market_amount / total_amount * Decimal::ONE_HUNDRED
            };
            AccountDistribution {
                category: category.to_string(),
                amount: breakdown.market_amount,
                percentage,
            }
        })
        .collect();

    distribution.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    distribution
}
