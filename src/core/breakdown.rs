//! Per-account-group financial metrics over an annotated posting sequence.
//!
//! Pure and reentrant: every invocation only reads its inputs and allocates
//! its own output, so independent requests can run concurrently without
//! synchronization. All division-by-zero cases are guarded to zero; this
//! engine has no error path.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_finprim::rate::xirr;
use std::collections::HashMap;
use tracing::debug;

use crate::core::account;
use crate::core::ledger::{Posting, TransactionIndex};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountBreakdown {
    pub group: String,
    pub investment_amount: Decimal,
    pub withdrawal_amount: Decimal,
    pub market_amount: Decimal,
    pub balance_units: Decimal,
    /// Rate of return over the group's dated cash flows, as a percentage
    /// rounded to 4 places. Zero when the solver cannot converge.
    pub xirr: Decimal,
    pub gain_amount: Decimal,
    pub absolute_return: Decimal,
}

/// Computes per-group metrics for every account group discovered in
/// `postings` whose account matches `pattern` (SQL LIKE dialect).
///
/// Every matched posting's account is a leaf group; with `rollup`, every
/// proper ancestor prefix is synthesized as a non-leaf group. Capital-gains
/// postings never form groups of their own: they attribute to the source
/// asset account when filtering postings per group.
///
/// `index` must be built over the full posting set so sibling-leg
/// classification sees legs outside `pattern`; `as_of` dates the final
/// market-value cash flow of the rate-of-return calculation.
pub fn compute_breakdowns(
    postings: &[Posting],
    index: &TransactionIndex,
    pattern: &str,
    rollup: bool,
    currency: &str,
    as_of: NaiveDate,
) -> HashMap<String, AccountBreakdown> {
    let scoped: Vec<&Posting> = postings
        .iter()
        .filter(|p| {
            account::like_matches(pattern, &p.account) || account::is_capital_gains(&p.account)
        })
        .collect();

    // Group discovery pass: group name to leaf flag. Kept separate from the
    // aggregation pass so that stays a pure reduction over a fixed list.
    let mut groups: HashMap<String, bool> = HashMap::new();
    for p in &scoped {
        if account::is_capital_gains(&p.account) {
            continue;
        }
        if rollup {
            for parent in account::parents(&p.account) {
                groups.entry(parent).or_insert(false);
            }
        }
        groups.insert(p.account.clone(), true);
    }

    let mut result = HashMap::with_capacity(groups.len());
    for (group, leaf) in groups {
        let ps: Vec<&Posting> = scoped
            .iter()
            .filter(|p| account::is_same_or_parent(&account::group_account(&p.account), &group))
            .copied()
            .collect();
        let breakdown = compute_breakdown(&ps, index, leaf, &group, currency, as_of);
        result.insert(group, breakdown);
    }
    result
}

fn compute_breakdown(
    ps: &[&Posting],
    index: &TransactionIndex,
    leaf: bool,
    group: &str,
    currency: &str,
    as_of: NaiveDate,
) -> AccountBreakdown {
    let mut investment_amount = Decimal::ZERO;
    let mut withdrawal_amount = Decimal::ZERO;
    for p in ps {
        if account::is_capital_gains(&p.account)
            || account::is_checking(&p.account)
            || index.is_interest(p)
            || index.is_stock_split(p)
        {
            continue;
        }
        if p.amount < Decimal::ZERO {
            withdrawal_amount += -p.amount;
        } else {
            investment_amount += p.amount;
        }
    }

    let without_gains: Vec<&Posting> = ps
        .iter()
        .filter(|p| !account::is_capital_gains(&p.account))
        .copied()
        .collect();
    let market_amount: Decimal = without_gains.iter().map(|p| p.market_value()).sum();

    let mut balance_units = Decimal::ZERO;
    if leaf {
        balance_units = ps
            .iter()
            .filter(|p| p.commodity != currency)
            .map(|p| p.quantity)
            .sum();
    }

    let xirr = compute_xirr(&without_gains, market_amount, group, as_of);

    let net_investment = investment_amount - withdrawal_amount;
    let gain_amount = market_amount - net_investment;
    let absolute_return = if investment_amount.is_zero() {
        Decimal::ZERO
    } else {
        gain_amount / investment_amount
    };

    AccountBreakdown {
        group: group.to_string(),
        investment_amount,
        withdrawal_amount,
        market_amount,
        balance_units,
        xirr,
        gain_amount,
        absolute_return,
    }
}

/// Cash flows for the solver: one negated flow per posting (purchases out,
/// withdrawals back in) plus the current market value as a final inflow.
fn compute_xirr(ps: &[&Posting], market_amount: Decimal, group: &str, as_of: NaiveDate) -> Decimal {
    if ps.is_empty() {
        return Decimal::ZERO;
    }

    let mut flows: Vec<(Decimal, i32)> = ps
        .iter()
        .map(|p| (-p.amount, days_since_epoch(p.date)))
        .collect();
    flows.push((market_amount, days_since_epoch(as_of)));
    flows.sort_by_key(|(_, days)| *days);

    // 1e-5 convergence tolerance.
    match xirr(&flows, None, Some(Decimal::new(1, 5))) {
        Ok(rate) => (rate * Decimal::ONE_HUNDRED).round_dp(4),
        Err(err) => {
            debug!(group, ?err, "XIRR solver did not converge");
            Decimal::ZERO
        }
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
        - NaiveDate::from_ymd_opt(1970, 1, 1)
            .expect("valid epoch date")
            .num_days_from_ce()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Leg {
        txn: &'static str,
        account: &'static str,
        commodity: &'static str,
        quantity: Decimal,
        amount: Decimal,
        market: Option<Decimal>,
    }

    fn build(legs: Vec<Leg>) -> (Vec<Posting>, TransactionIndex) {
        let postings: Vec<Posting> = legs
            .into_iter()
            .map(|leg| Posting {
                transaction_id: leg.txn.to_string(),
                date: date(2023, 1, 5),
                account: leg.account.to_string(),
                commodity: leg.commodity.to_string(),
                quantity: leg.quantity,
                amount: leg.amount,
                market_amount: leg.market,
            })
            .collect();
        let index = TransactionIndex::build(&postings);
        (postings, index)
    }

    fn buy(
        txn: &'static str,
        account: &'static str,
        commodity: &'static str,
        amount: Decimal,
        market: Decimal,
    ) -> Leg {
        Leg {
            txn,
            account,
            commodity,
            quantity: amount,
            amount,
            market: Some(market),
        }
    }

    #[test]
    fn single_buy_leaf_metrics() {
        let (postings, index) = build(vec![buy(
            "t1",
            "Assets:Equity:NIFTY50",
            "NIFTY50",
            dec!(1000),
            dec!(1200),
        )]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            false,
            "INR",
            date(2024, 1, 5),
        );

        let b = &breakdowns["Assets:Equity:NIFTY50"];
        assert_eq!(b.investment_amount, dec!(1000));
        assert_eq!(b.withdrawal_amount, dec!(0));
        assert_eq!(b.market_amount, dec!(1200));
        assert_eq!(b.gain_amount, dec!(200));
        assert_eq!(b.absolute_return, dec!(0.2));
        assert_eq!(b.balance_units, dec!(1000));
        // 1000 grew to 1200 over one year.
        assert!(b.xirr > dec!(19) && b.xirr < dec!(21), "xirr = {}", b.xirr);
    }

    #[test]
    fn rollup_synthesizes_ancestors_and_sums_disjoint_siblings() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Equity:NIFTY50", "NIFTY50", dec!(1000), dec!(1100)),
            buy("t2", "Assets:Equity:GOLD", "GOLD", dec!(500), dec!(600)),
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            true,
            "INR",
            date(2024, 1, 5),
        );

        assert_eq!(breakdowns.len(), 4);
        let ancestor = &breakdowns["Assets:Equity"];
        assert_eq!(
            ancestor.investment_amount,
            breakdowns["Assets:Equity:NIFTY50"].investment_amount
                + breakdowns["Assets:Equity:GOLD"].investment_amount
        );
        assert_eq!(ancestor.market_amount, dec!(1700));
        // Units only accumulate on leaf groups.
        assert_eq!(ancestor.balance_units, dec!(0));
        assert_eq!(breakdowns["Assets"].investment_amount, dec!(1500));
    }

    #[test]
    fn withdrawal_side_mirrors_investment_exclusions() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Equity:NIFTY50", "NIFTY50", dec!(1000), dec!(700)),
            Leg {
                txn: "t2",
                account: "Assets:Equity:NIFTY50",
                commodity: "NIFTY50",
                quantity: dec!(-400),
                amount: dec!(-400),
                market: Some(dec!(-280)),
            },
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            false,
            "INR",
            date(2024, 1, 5),
        );

        let b = &breakdowns["Assets:Equity:NIFTY50"];
        assert_eq!(b.investment_amount, dec!(1000));
        assert_eq!(b.withdrawal_amount, dec!(400));
        assert_eq!(b.market_amount, dec!(420));
        // gain = market - (investment - withdrawal)
        assert_eq!(b.gain_amount, dec!(420) - (dec!(1000) - dec!(400)));
    }

    #[test]
    fn capital_gains_redirect_to_source_and_stay_out_of_sums() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Equity:NIFTY50", "NIFTY50", dec!(1000), dec!(1200)),
            Leg {
                txn: "t2",
                account: "Income:CapitalGains:Equity:NIFTY50",
                commodity: "INR",
                quantity: dec!(-150),
                amount: dec!(-150),
                market: Some(dec!(-150)),
            },
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            true,
            "INR",
            date(2024, 1, 5),
        );

        // No group is formed for the income account.
        assert!(!breakdowns.keys().any(|g| g.starts_with("Income")));

        // The gains posting attributes to its source asset account but is
        // excluded from every metric sum.
        let b = &breakdowns["Assets:Equity:NIFTY50"];
        assert_eq!(b.investment_amount, dec!(1000));
        assert_eq!(b.withdrawal_amount, dec!(0));
        assert_eq!(b.market_amount, dec!(1200));
    }

    #[test]
    fn interest_and_stock_splits_are_not_investments() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Debt:FD", "INR", dec!(1000), dec!(1000)),
            // Interest credit: sibling leg under Income:Interest.
            buy("t2", "Assets:Debt:FD", "INR", dec!(80), dec!(80)),
            Leg {
                txn: "t2",
                account: "Income:Interest:FD",
                commodity: "INR",
                quantity: dec!(-80),
                amount: dec!(-80),
                market: Some(dec!(-80)),
            },
            // Stock split: single-leg transaction, no cash moved.
            Leg {
                txn: "t3",
                account: "Assets:Debt:FD",
                commodity: "FD",
                quantity: dec!(100),
                amount: dec!(0),
                market: Some(dec!(0)),
            },
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:Debt:%",
            false,
            "INR",
            date(2024, 1, 5),
        );

        let b = &breakdowns["Assets:Debt:FD"];
        assert_eq!(b.investment_amount, dec!(1000));
        assert_eq!(b.withdrawal_amount, dec!(0));
        // Interest still counts toward market value.
        assert_eq!(b.market_amount, dec!(1080));
    }

    #[test]
    fn checking_postings_are_neither_investment_nor_withdrawal() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Checking", "INR", dec!(5000), dec!(5000)),
            Leg {
                txn: "t2",
                account: "Assets:Checking",
                commodity: "INR",
                quantity: dec!(-2000),
                amount: dec!(-2000),
                market: Some(dec!(-2000)),
            },
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:Checking:%",
            false,
            "INR",
            date(2024, 1, 5),
        );
        let b = &breakdowns["Assets:Checking"];
        assert_eq!(b.investment_amount, dec!(0));
        assert_eq!(b.withdrawal_amount, dec!(0));
        assert_eq!(b.market_amount, dec!(3000));
        // Cash commodity contributes no balance units.
        assert_eq!(b.balance_units, dec!(0));
    }

    #[test]
    fn zero_investment_guards_absolute_return_to_zero() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Debt:FD", "INR", dec!(500), dec!(500)),
            Leg {
                txn: "t1",
                account: "Income:Interest:FD",
                commodity: "INR",
                quantity: dec!(-500),
                amount: dec!(-500),
                market: Some(dec!(-500)),
            },
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            false,
            "INR",
            date(2024, 1, 5),
        );

        // The only posting is interest, so nothing was invested; the return
        // must still be a defined zero, never an error.
        let b = &breakdowns["Assets:Debt:FD"];
        assert_eq!(b.investment_amount, dec!(0));
        assert_eq!(b.market_amount, dec!(500));
        assert_eq!(b.absolute_return, dec!(0));
    }

    #[test]
    fn pattern_scopes_group_discovery() {
        let (postings, index) = build(vec![
            buy("t1", "Assets:Equity:NIFTY50", "NIFTY50", dec!(1000), dec!(1200)),
            buy("t2", "Expenses:Rent", "INR", dec!(200), dec!(200)),
        ]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            true,
            "INR",
            date(2024, 1, 5),
        );
        assert!(breakdowns.contains_key("Assets:Equity:NIFTY50"));
        assert!(!breakdowns.keys().any(|g| g.starts_with("Expenses")));
    }

    #[test]
    fn empty_posting_set_yields_no_groups() {
        let (postings, index) = build(vec![]);
        let breakdowns = compute_breakdowns(
            &postings,
            &index,
            "Assets:%",
            true,
            "INR",
            date(2024, 1, 5),
        );
        assert!(breakdowns.is_empty());
    }
}
