//! Commodity pricing abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Kind of tradable commodity being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommodityKind {
    MutualFund,
    Stock,
    #[default]
    Unknown,
}

impl Display for CommodityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CommodityKind::MutualFund => "mutualfund",
                CommodityKind::Stock => "stock",
                CommodityKind::Unknown => "unknown",
            }
        )
    }
}

impl FromStr for CommodityKind {
    type Err = anyhow::Error;

    // Unrecognized kinds map to Unknown so stored rows always load.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mutualfund" => Ok(CommodityKind::MutualFund),
            "stock" => Ok(CommodityKind::Stock),
            _ => Ok(CommodityKind::Unknown),
        }
    }
}

/// A tradable commodity from the configuration. Identity is (kind, name);
/// `price` names the provider and the identifier it understands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commodity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CommodityKind,
    pub price: PriceSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSource {
    pub provider: String,
    pub code: String,
}

/// One dated price observation as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// One stored price row. The full set for a (kind, name, code) triple is
/// always deleted and replaced together; rows are never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub kind: CommodityKind,
    pub code: String,
    pub name: String,
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Unit of work produced by one fetch task. A failed fetch still yields a
/// result, carrying an empty price sequence.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub kind: CommodityKind,
    pub name: String,
    pub code: String,
    pub prices: Vec<PricePoint>,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches the full available price history for `code`, ordered by
    /// date ascending. `name` is the configured display name, used for
    /// diagnostics only.
    async fn fetch(&self, code: &str, name: &str) -> Result<Vec<PricePoint>>;
}
