//! Pool Resolver
//!
//! Finds the canonical pool record in the Curve listing for a chain.
//!
//! RESOLUTION ORDER:
//! 1. Exact address (case-insensitive)
//! 2. Name substring, either direction (case-insensitive)
//!
//! Address goes first: an address string can accidentally substring-match
//! a pool name, a name can never equal an address. Name matching is first
//! in listing order wins - overlapping names are not ranked.

use serde::Serialize;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::providers::{
    same_address, Chain, CurveCoin, CurvePoolEntry, RawBalance, Scope, Source, DEFAULT_DECIMALS,
};

/// Asset class used when the listing has none
pub const DEFAULT_ASSET_TYPE: &str = "other";

// ============================================
// CANONICAL POOL
// ============================================

/// One token composing a pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstituentAsset {
    pub symbol: String,
    #[serde(skip)]
    pub raw_balance: RawBalance,
    pub decimals: u8,
    pub usd_price: f64,
}

impl ConstituentAsset {
    /// raw balance / 10^decimals
    pub fn readable_balance(&self) -> f64 {
        self.raw_balance.readable(self.decimals)
    }

    /// readable balance * unit price
    pub fn usd_value(&self) -> f64 {
        self.readable_balance() * self.usd_price
    }
}

impl From<&CurveCoin> for ConstituentAsset {
    fn from(coin: &CurveCoin) -> Self {
        Self {
            symbol: coin.symbol.clone().unwrap_or_else(|| "Unknown".to_string()),
            raw_balance: coin.pool_balance.unwrap_or_default(),
            decimals: coin.decimals.unwrap_or(DEFAULT_DECIMALS),
            usd_price: coin.usd_price.unwrap_or(0.0),
        }
    }
}

/// Reward token already listed on the pool record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedReward {
    pub symbol: String,
    pub apy: f64,
}

/// The resolved pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPool {
    pub chain: Chain,
    /// As listed; compare with `matches_address`
    pub address: String,
    pub name: String,
    pub lp_token_address: Option<String>,
    /// Curve asset class: usd, eth, btc, crypto, ...
    pub asset_type: String,
    pub coins: Vec<ConstituentAsset>,
    pub listed_rewards: Vec<ListedReward>,
}

impl CanonicalPool {
    pub fn from_entry(chain: &Chain, entry: &CurvePoolEntry) -> Self {
        Self {
            chain: chain.clone(),
            address: entry.address.clone().unwrap_or_default(),
            name: entry.name.clone().unwrap_or_else(|| "Unknown".to_string()),
            lp_token_address: entry.lp_token_address.clone(),
            asset_type: entry
                .asset_type_name
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_else(|| DEFAULT_ASSET_TYPE.to_string()),
            coins: entry.coins.iter().map(ConstituentAsset::from).collect(),
            listed_rewards: entry
                .gauge_rewards
                .iter()
                .map(|r| ListedReward {
                    symbol: r.symbol.clone().unwrap_or_else(|| "Unknown".to_string()),
                    apy: r.apy.unwrap_or(0.0),
                })
                .collect(),
        }
    }

    pub fn address_lower(&self) -> String {
        self.address.to_lowercase()
    }

    pub fn matches_address(&self, other: &str) -> bool {
        same_address(&self.address, other)
    }

    /// LP token address when it differs from the pool address
    pub fn distinct_lp_token(&self) -> Option<&str> {
        self.lp_token_address
            .as_deref()
            .filter(|lp| !self.matches_address(lp))
    }
}

// ============================================
// LISTING SCANS
// ============================================

/// First entry whose address equals `address`, ignoring case
pub fn find_by_address<'a>(
    entries: &'a [CurvePoolEntry],
    address: &str,
) -> Option<&'a CurvePoolEntry> {
    entries
        .iter()
        .find(|entry| entry.address.as_deref().is_some_and(|a| same_address(a, address)))
}

/// First entry whose name contains the query or is contained in it
pub fn find_by_name<'a>(
    entries: &'a [CurvePoolEntry],
    fragment: &str,
) -> Option<&'a CurvePoolEntry> {
    let query = fragment.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    entries.iter().find(|entry| {
        entry
            .name
            .as_deref()
            .map(str::to_lowercase)
            .is_some_and(|name| name.contains(&query) || query.contains(&name))
    })
}

// ============================================
// RESOLVER
// ============================================

pub struct PoolResolver<'a> {
    cache: &'a ResponseCache,
}

impl<'a> PoolResolver<'a> {
    pub fn new(cache: &'a ResponseCache) -> Self {
        Self { cache }
    }

    pub async fn resolve_by_address(&self, chain: &Chain, address: &str) -> Option<CanonicalPool> {
        let listing = self.cache.get(&Scope::new(chain, Source::CurvePools)).await;
        find_by_address(listing.pools(), address)
            .map(|entry| CanonicalPool::from_entry(chain, entry))
    }

    pub async fn resolve_by_name(&self, chain: &Chain, fragment: &str) -> Option<CanonicalPool> {
        let listing = self.cache.get(&Scope::new(chain, Source::CurvePools)).await;
        find_by_name(listing.pools(), fragment)
            .map(|entry| CanonicalPool::from_entry(chain, entry))
    }

    /// Address first, name only when the address lookup finds nothing
    pub async fn resolve(&self, chain: &Chain, identifier: &str) -> Option<CanonicalPool> {
        if let Some(pool) = self.resolve_by_address(chain, identifier).await {
            debug!("Resolved '{}' by address on {}", identifier, chain);
            return Some(pool);
        }

        let pool = self.resolve_by_name(chain, identifier).await?;
        debug!("Resolved '{}' by name -> {} ({})", identifier, pool.name, pool.address);
        Some(pool)
    }
}
