//! Aggregation Pipeline
//!
//! request -> resolve pool -> every enabled extractor (concurrently) ->
//! merged `AggregatedRecord`.
//!
//! A request that doesn't resolve is logged and dropped; the rest of the
//! batch carries on. Output order is input order.

use eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::metrics::{
    BaseApyExtractor, CompositionExtractor, MetricExtractor, OtherReward, PartialMetrics,
    RewardExtractor, RewardQuote, SecondaryMetrics, StakeDaoExtractor, TvlExtractor,
    YearnExtractor,
};
use crate::providers::{Chain, ProviderClient};
use crate::resolver::{CanonicalPool, PoolResolver};

/// Tracked when no pools are requested: (chain, identifier)
pub const DEFAULT_POOLS: &[(&str, &str)] = &[
    ("ethereum", "3pool"),
    ("ethereum", "steth"),
    ("ethereum", "frxeth"),
];

// ============================================
// REQUESTS
// ============================================

/// Which aggregators to consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecondaryFlags {
    pub yearn: bool,
    pub stakedao: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoolRequest {
    pub chain: Chain,
    /// Address or name fragment
    pub identifier: String,
    pub flags: SecondaryFlags,
}

impl PoolRequest {
    pub fn new(chain: Chain, identifier: impl Into<String>, flags: SecondaryFlags) -> Self {
        Self {
            chain,
            identifier: identifier.into().trim().to_string(),
            flags,
        }
    }

    pub fn defaults(flags: SecondaryFlags) -> Vec<PoolRequest> {
        DEFAULT_POOLS
            .iter()
            .map(|(chain, pool)| PoolRequest::new(Chain::new(chain), *pool, flags))
            .collect()
    }
}

/// One element of a batch file
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEntry {
    #[serde(default)]
    pub chain: Option<String>,
    pub pool: String,
    #[serde(default)]
    pub yearn: Option<bool>,
    #[serde(default)]
    pub stakedao: Option<bool>,
}

impl BatchEntry {
    /// Absent or blank chain / absent flags take the run-level values
    pub fn into_request(self, default_chain: &Chain, defaults: SecondaryFlags) -> PoolRequest {
        let chain = self
            .chain
            .filter(|c| !c.trim().is_empty())
            .map(Chain::new)
            .unwrap_or_else(|| default_chain.clone());
        let flags = SecondaryFlags {
            yearn: self.yearn.unwrap_or(defaults.yearn),
            stakedao: self.stakedao.unwrap_or(defaults.stakedao),
        };
        PoolRequest::new(chain, self.pool, flags)
    }
}

pub fn parse_batch(
    json: &str,
    default_chain: &Chain,
    defaults: SecondaryFlags,
) -> Result<Vec<PoolRequest>> {
    let entries: Vec<BatchEntry> =
        serde_json::from_str(json).wrap_err("Invalid batch request list")?;
    Ok(entries
        .into_iter()
        .map(|entry| entry.into_request(default_chain, defaults))
        .collect())
}

/// Read a JSON batch file. The only input error that aborts a run.
pub fn load_batch_file<P: AsRef<Path>>(
    path: P,
    default_chain: &Chain,
    defaults: SecondaryFlags,
) -> Result<Vec<PoolRequest>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read pool list {}", path.display()))?;
    parse_batch(&content, default_chain, defaults)
        .wrap_err_with(|| format!("Failed to parse pool list {}", path.display()))
}

// ============================================
// AGGREGATED RECORD
// ============================================

/// Everything known about one pool after reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRecord {
    pub name: String,
    pub chain: Chain,
    pub address: String,
    pub asset_type: String,
    pub tvl: f64,
    pub base_apy: f64,
    pub crv_apy: RewardQuote,
    pub other_rewards: Vec<OtherReward>,
    pub coins: Vec<String>,
    pub coin_ratios: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearn: Option<SecondaryMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stakedao: Option<SecondaryMetrics>,
}

impl AggregatedRecord {
    pub fn assemble(pool: CanonicalPool, metrics: PartialMetrics) -> Self {
        Self {
            coins: pool.coins.iter().map(|c| c.symbol.clone()).collect(),
            name: pool.name,
            chain: pool.chain,
            address: pool.address,
            asset_type: pool.asset_type,
            tvl: metrics.tvl.unwrap_or(0.0),
            base_apy: metrics.base_apy.unwrap_or(0.0),
            crv_apy: metrics.crv_apy,
            other_rewards: metrics.other_rewards,
            coin_ratios: metrics.coin_ratios,
            yearn: metrics.yearn,
            stakedao: metrics.stakedao,
        }
    }
}

// ============================================
// PIPELINE
// ============================================

async fn when_enabled<F>(enabled: bool, work: F) -> PartialMetrics
where
    F: Future<Output = PartialMetrics>,
{
    if enabled {
        work.await
    } else {
        PartialMetrics::default()
    }
}

/// One run: owns the response cache for its whole lifetime
pub struct Pipeline {
    cache: ResponseCache,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(client: Arc<dyn ProviderClient>, concurrency: usize) -> Self {
        Self {
            cache: ResponseCache::new(client),
            concurrency: concurrency.max(1),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// `None` when the identifier matches no pool by address or name
    pub async fn resolve_one(&self, request: &PoolRequest) -> Option<AggregatedRecord> {
        let resolver = PoolResolver::new(&self.cache);
        let Some(pool) = resolver.resolve(&request.chain, &request.identifier).await else {
            warn!("Pool '{}' not found on {}", request.identifier, request.chain);
            return None;
        };

        let cache = &self.cache;
        let (base_apy, tvl, rewards, composition) =
            (BaseApyExtractor, TvlExtractor, RewardExtractor, CompositionExtractor);
        let (yearn, stakedao) = (YearnExtractor, StakeDaoExtractor);

        let (base, tvl, rewards, composition, yearn, stakedao) = futures::join!(
            base_apy.collect(cache, &pool),
            tvl.collect(cache, &pool),
            rewards.collect(cache, &pool),
            composition.collect(cache, &pool),
            when_enabled(request.flags.yearn, yearn.collect(cache, &pool)),
            when_enabled(request.flags.stakedao, stakedao.collect(cache, &pool)),
        );

        // merge order fixes reward order: pool/gauge first, aggregators after
        let metrics = base
            .merge(tvl)
            .merge(rewards)
            .merge(composition)
            .merge(yearn)
            .merge(stakedao);

        debug!("Aggregated {} ({}) on {}", pool.name, pool.address, pool.chain);
        Some(AggregatedRecord::assemble(pool, metrics))
    }

    /// Every request, in input order, unresolved ones omitted
    pub async fn resolve_many(&self, requests: &[PoolRequest]) -> Vec<AggregatedRecord> {
        stream::iter(requests.iter().map(|request| self.resolve_one(request)))
            .buffered(self.concurrency)
            .filter_map(futures::future::ready)
            .collect()
            .await
    }
}
