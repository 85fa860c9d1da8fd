//! Posting persistence. The whole posting set is replaced on every import,
//! mirroring the price store's single-transaction discipline.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::ledger::Posting;
use crate::store::schema::postings;
use crate::store::DbPool;

const INSERT_BATCH_SIZE: usize = 5000;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Queryable)]
struct PostingRow {
    #[allow(dead_code)]
    id: i32,
    transaction_id: String,
    date: String,
    account: String,
    commodity: String,
    quantity: String,
    amount: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = postings)]
struct NewPostingRow {
    transaction_id: String,
    date: String,
    account: String,
    commodity: String,
    quantity: String,
    amount: String,
}

impl TryFrom<PostingRow> for Posting {
    type Error = anyhow::Error;

    fn try_from(row: PostingRow) -> Result<Self> {
        Ok(Posting {
            transaction_id: row.transaction_id,
            date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
                .with_context(|| format!("Invalid stored posting date: {}", row.date))?,
            account: row.account,
            commodity: row.commodity,
            quantity: Decimal::from_str(&row.quantity)
                .with_context(|| format!("Invalid stored quantity: {}", row.quantity))?,
            amount: Decimal::from_str(&row.amount)
                .with_context(|| format!("Invalid stored amount: {}", row.amount))?,
            market_amount: None,
        })
    }
}

impl From<&Posting> for NewPostingRow {
    fn from(p: &Posting) -> Self {
        NewPostingRow {
            transaction_id: p.transaction_id.clone(),
            date: p.date.format(DATE_FORMAT).to_string(),
            account: p.account.clone(),
            commodity: p.commodity.clone(),
            quantity: p.quantity.to_string(),
            amount: p.amount.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct PostingStore {
    pool: DbPool,
}

impl PostingStore {
    pub fn new(pool: DbPool) -> Self {
        PostingStore { pool }
    }

    /// Replaces the whole posting set in one transaction.
    pub fn replace_all(&self, postings: &[Posting]) -> Result<usize> {
        let mut conn = self.pool.get().context("Failed to get connection")?;
        conn.immediate_transaction::<usize, anyhow::Error, _>(|conn| {
            diesel::delete(postings::table)
                .execute(conn)
                .context("Failed to delete prior postings")?;

            let rows: Vec<NewPostingRow> = postings.iter().map(NewPostingRow::from).collect();
            for chunk in rows.chunks(INSERT_BATCH_SIZE) {
                diesel::insert_into(postings::table)
                    .values(chunk)
                    .execute(conn)
                    .context("Failed to insert postings")?;
            }
            Ok(rows.len())
        })
    }

    /// All postings, ordered by date.
    pub fn all(&self) -> Result<Vec<Posting>> {
        let mut conn = self.pool.get().context("Failed to get connection")?;
        let rows: Vec<PostingRow> = postings::table
            .order((postings::date.asc(), postings::id.asc()))
            .load(&mut conn)
            .context("Failed to load postings")?;
        rows.into_iter().map(Posting::try_from).collect()
    }

    /// Date-ordered postings whose account matches ANY of the SQL LIKE
    /// `patterns`.
    pub fn filtered(&self, patterns: &[&str]) -> Result<Vec<Posting>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().context("Failed to get connection")?;
        let mut matcher: Box<dyn BoxableExpression<postings::table, Sqlite, SqlType = Bool>> =
            Box::new(postings::account.like(patterns[0].to_string()));
        for pattern in &patterns[1..] {
            matcher = Box::new(matcher.or(postings::account.like(pattern.to_string())));
        }

        let rows: Vec<PostingRow> = postings::table
            .filter(matcher)
            .order((postings::date.asc(), postings::id.asc()))
            .load(&mut conn)
            .context("Failed to load postings")?;
        rows.into_iter().map(Posting::try_from).collect()
    }
}
