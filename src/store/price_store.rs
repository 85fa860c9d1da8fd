//! Durable price history. The full set for a (type, name, code) triple is
//! replaced in one transaction on every sync cycle.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::core::commodity::{CommodityKind, FetchResult, Price};
use crate::store::schema::prices;
use crate::store::DbPool;

/// Rows per insert statement. Bounds per-statement bind count, invisible to
/// readers since the whole replace runs in one transaction.
const INSERT_BATCH_SIZE: usize = 5000;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Queryable)]
struct PriceRow {
    #[allow(dead_code)]
    id: i32,
    commodity_type: String,
    commodity_id: String,
    commodity_name: String,
    date: String,
    value: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = prices)]
struct NewPriceRow {
    commodity_type: String,
    commodity_id: String,
    commodity_name: String,
    date: String,
    value: String,
}

impl TryFrom<PriceRow> for Price {
    type Error = anyhow::Error;

    fn try_from(row: PriceRow) -> Result<Self> {
        Ok(Price {
            kind: CommodityKind::from_str(&row.commodity_type)?,
            code: row.commodity_id,
            name: row.commodity_name,
            date: NaiveDate::parse_from_str(&row.date, DATE_FORMAT)
                .with_context(|| format!("Invalid stored price date: {}", row.date))?,
            value: Decimal::from_str(&row.value)
                .with_context(|| format!("Invalid stored price value: {}", row.value))?,
        })
    }
}

#[derive(Clone)]
pub struct PriceStore {
    pool: DbPool,
}

impl PriceStore {
    pub fn new(pool: DbPool) -> Self {
        PriceStore { pool }
    }

    /// Atomically replaces the stored history for every commodity named in
    /// `results`: one batched delete matching the (type, name, code) triples,
    /// then chunked bulk inserts, all in a single transaction. Any failure
    /// rolls back the deletes and leaves the prior data authoritative.
    /// Returns the number of rows inserted.
    pub fn replace_all(&self, results: &[FetchResult]) -> Result<usize> {
        if results.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get().context("Failed to get connection")?;
        conn.immediate_transaction::<usize, anyhow::Error, _>(|conn| {
            let mut matcher: Box<dyn BoxableExpression<prices::table, Sqlite, SqlType = Bool>> =
                Box::new(triple_matches(&results[0]));
            for result in &results[1..] {
                matcher = Box::new(matcher.or(triple_matches(result)));
            }
            diesel::delete(prices::table.filter(matcher))
                .execute(conn)
                .context("Failed to delete prior prices")?;

            let rows: Vec<NewPriceRow> = results
                .iter()
                .flat_map(|result| {
                    result.prices.iter().map(|point| NewPriceRow {
                        commodity_type: result.kind.to_string(),
                        commodity_id: result.code.clone(),
                        commodity_name: result.name.clone(),
                        date: point.date.format(DATE_FORMAT).to_string(),
                        value: point.value.to_string(),
                    })
                })
                .collect();

            for chunk in rows.chunks(INSERT_BATCH_SIZE) {
                diesel::insert_into(prices::table)
                    .values(chunk)
                    .execute(conn)
                    .context("Failed to insert prices")?;
            }

            Ok(rows.len())
        })
    }

    /// Stored history for one commodity, ordered by date ascending.
    /// Duplicate dates are possible and returned as stored.
    pub fn history(&self, commodity_name: &str) -> Result<Vec<Price>> {
        let mut conn = self.pool.get().context("Failed to get connection")?;
        let rows: Vec<PriceRow> = prices::table
            .filter(prices::commodity_name.eq(commodity_name))
            .order((prices::date.asc(), prices::id.asc()))
            .load(&mut conn)
            .context("Failed to load price history")?;
        rows.into_iter().map(Price::try_from).collect()
    }

    /// Latest stored price for `commodity_name` dated on or before `as_of`.
    pub fn latest_on_or_before(
        &self,
        commodity_name: &str,
        as_of: NaiveDate,
    ) -> Result<Option<Price>> {
        let mut conn = self.pool.get().context("Failed to get connection")?;
        let row: Option<PriceRow> = prices::table
            .filter(prices::commodity_name.eq(commodity_name))
            .filter(prices::date.le(as_of.format(DATE_FORMAT).to_string()))
            .order((prices::date.desc(), prices::id.desc()))
            .first(&mut conn)
            .optional()
            .context("Failed to query latest price")?;
        row.map(Price::try_from).transpose()
    }
}

fn triple_matches(
    result: &FetchResult,
) -> impl BoxableExpression<prices::table, Sqlite, SqlType = Bool>
+ diesel::expression::ValidGrouping<(), IsAggregate = diesel::expression::is_aggregate::No>
+ use<> {
    prices::commodity_type
        .eq(result.kind.to_string())
        .and(prices::commodity_name.eq(result.name.clone()))
        .and(prices::commodity_id.eq(result.code.clone()))
}
