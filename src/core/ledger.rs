//! Ledger postings and transaction context.
//!
//! Journal parsing is delegated to the external accounting tool; folio only
//! consumes the posting set it exports as CSV (`transaction_id, date,
//! account, commodity, quantity, amount`).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::core::account;

/// One dated debit/credit leg of a ledger transaction. Read-only to the
/// computation engines; `market_amount` is filled by the pricing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub account: String,
    pub commodity: String,
    pub quantity: Decimal,
    pub amount: Decimal,
    pub market_amount: Option<Decimal>,
}

impl Posting {
    /// Mark-to-market value, falling back to the posting amount when the
    /// pricing pass has not annotated it.
    pub fn market_value(&self) -> Decimal {
        self.market_amount.unwrap_or(self.amount)
    }
}

/// Sibling-leg context for posting classification, built once from the full
/// posting set so the breakdown engine stays a pure reduction.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    legs: HashMap<String, Vec<String>>,
}

impl TransactionIndex {
    pub fn build<'a>(postings: impl IntoIterator<Item = &'a Posting>) -> Self {
        let mut legs: HashMap<String, Vec<String>> = HashMap::new();
        for p in postings {
            legs.entry(p.transaction_id.clone())
                .or_default()
                .push(p.account.clone());
        }
        TransactionIndex { legs }
    }

    /// A posting is interest income when a sibling leg of its transaction
    /// is an interest account.
    pub fn is_interest(&self, posting: &Posting) -> bool {
        self.legs
            .get(&posting.transaction_id)
            .is_some_and(|accounts| accounts.iter().any(|a| account::is_interest(a)))
    }

    /// A stock split is recorded as a transaction with a single leg: units
    /// change, no cash moves.
    pub fn is_stock_split(&self, posting: &Posting) -> bool {
        self.legs
            .get(&posting.transaction_id)
            .is_some_and(|accounts| accounts.len() == 1)
    }
}

#[derive(Debug, Deserialize)]
struct PostingRecord {
    transaction_id: String,
    date: NaiveDate,
    account: String,
    commodity: String,
    quantity: Decimal,
    amount: Decimal,
}

/// Loads the posting set exported by the external accounting tool.
pub fn load_postings_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Posting>> {
    let mut reader = csv::Reader::from_path(path.as_ref())
        .with_context(|| format!("Failed to open postings file: {}", path.as_ref().display()))?;

    let mut postings = Vec::new();
    for record in reader.deserialize() {
        let record: PostingRecord = record.with_context(|| {
            format!(
                "Failed to parse posting record in {}",
                path.as_ref().display()
            )
        })?;
        postings.push(Posting {
            transaction_id: record.transaction_id,
            date: record.date,
            account: record.account,
            commodity: record.commodity,
            quantity: record.quantity,
            amount: record.amount,
            market_amount: None,
        });
    }
    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn posting(txn: &str, account: &str, amount: Decimal) -> Posting {
        Posting {
            transaction_id: txn.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            account: account.to_string(),
            commodity: "INR".to_string(),
            quantity: amount,
            amount,
            market_amount: None,
        }
    }

    #[test]
    fn interest_needs_an_interest_sibling_leg() {
        let postings = vec![
            posting("t1", "Assets:Debt:FD", dec!(500)),
            posting("t1", "Income:Interest:FD", dec!(-500)),
            posting("t2", "Assets:Debt:FD", dec!(1000)),
            posting("t2", "Assets:Checking", dec!(-1000)),
        ];
        let index = TransactionIndex::build(&postings);

        assert!(index.is_interest(&postings[0]));
        assert!(!index.is_interest(&postings[2]));
    }

    #[test]
    fn stock_split_is_a_single_leg_transaction() {
        let postings = vec![
            posting("t1", "Assets:Equity:NIFTY50", dec!(0)),
            posting("t2", "Assets:Equity:NIFTY50", dec!(1000)),
            posting("t2", "Assets:Checking", dec!(-1000)),
        ];
        let index = TransactionIndex::build(&postings);

        assert!(index.is_stock_split(&postings[0]));
        assert!(!index.is_stock_split(&postings[1]));
    }

    #[test]
    fn postings_csv_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transaction_id,date,account,commodity,quantity,amount").unwrap();
        writeln!(file, "t1,2024-01-05,Assets:Equity:NIFTY50,NIFTY50,10,21500.00").unwrap();
        writeln!(file, "t1,2024-01-05,Assets:Checking,INR,-21500.00,-21500.00").unwrap();

        let postings = load_postings_csv(file.path()).unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].account, "Assets:Equity:NIFTY50");
        assert_eq!(postings[0].quantity, dec!(10));
        assert_eq!(postings[0].amount, dec!(21500.00));
        assert_eq!(postings[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(postings[1].amount, dec!(-21500.00));
        assert!(postings[1].market_amount.is_none());
    }

    #[test]
    fn malformed_posting_row_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transaction_id,date,account,commodity,quantity,amount").unwrap();
        writeln!(file, "t1,not-a-date,Assets:Checking,INR,1,1").unwrap();

        assert!(load_postings_csv(file.path()).is_err());
    }
}
