//! Core business logic: domain types, the sync pipeline and the
//! computation engines.

pub mod account;
pub mod breakdown;
pub mod commodity;
pub mod config;
pub mod distribution;
pub mod ledger;
pub mod log;
pub mod pricing;
pub mod sync;

// Re-export main types for cleaner imports
pub use breakdown::AccountBreakdown;
pub use commodity::{Commodity, FetchResult, Price, PricePoint, PriceProvider};
pub use distribution::AccountDistribution;
pub use ledger::{Posting, TransactionIndex};
