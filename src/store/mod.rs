//! SQLite persistence: connection pool, embedded migrations and the
//! price/posting stores.

use anyhow::{Context, Result};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::fs;
use std::path::Path;
use tracing::debug;

pub mod posting_store;
pub mod price_store;

pub use posting_store::PostingStore;
pub use price_store::PriceStore;

pub(crate) mod schema {
    diesel::table! {
        prices (id) {
            id -> Integer,
            commodity_type -> Text,
            commodity_id -> Text,
            commodity_name -> Text,
            date -> Text,
            value -> Text,
        }
    }

    diesel::table! {
        postings (id) {
            id -> Integer,
            transaction_id -> Text,
            date -> Text,
            account -> Text,
            commodity -> Text,
            quantity -> Text,
            amount -> Text,
        }
    }
}

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Opens (creating if needed) the database at `db_path`, runs pending
/// migrations and returns a connection pool.
pub fn open<P: AsRef<Path>>(db_path: P) -> Result<DbPool> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    let db_url = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;

    // WAL must be set outside the pool; it persists in the database file.
    {
        let mut conn = SqliteConnection::establish(db_url)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        conn.batch_execute("PRAGMA journal_mode = WAL;")
            .context("Failed to enable WAL journal mode")?;
    }

    let manager = ConnectionManager::<SqliteConnection>::new(db_url);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .connection_timeout(std::time::Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .context("Failed to create connection pool")?;

    let mut conn = pool.get().context("Failed to get connection from pool")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Database migration failed: {e}"))?;
    for version in &applied {
        debug!(%version, "Applied migration");
    }

    Ok(pool)
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 30000;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(diesel::r2d2::Error::QueryError)?;
        Ok(())
    }
}
