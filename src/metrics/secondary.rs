//! Yield aggregator metrics (Yearn, StakeDAO)
//!
//! Vault selection:
//! 1. Vaults whose deposit token IS the pool address
//! 2. Only if none: vaults whose deposit token is the pool's LP token
//! 3. Among the eligible, the greatest TVL wins (listings are not deduplicated)

use async_trait::async_trait;

use super::{normalize_percent, MetricExtractor, PartialMetrics, SecondaryMetrics};
use crate::cache::ResponseCache;
use crate::providers::{same_address, Scope, Source, StakeDaoStrategy, YearnVault};
use crate::resolver::CanonicalPool;

/// What vault selection needs from an aggregator record
pub trait VaultRecord {
    fn deposit_token(&self) -> Option<&str>;
    fn reported_tvl(&self) -> f64;
}

impl VaultRecord for YearnVault {
    fn deposit_token(&self) -> Option<&str> {
        self.token_address()
    }

    fn reported_tvl(&self) -> f64 {
        self.tvl_usd()
    }
}

impl VaultRecord for StakeDaoStrategy {
    fn deposit_token(&self) -> Option<&str> {
        self.token_address()
    }

    fn reported_tvl(&self) -> f64 {
        self.tvl_usd()
    }
}

fn largest_for<'a, V: VaultRecord>(vaults: &'a [V], token: &str) -> Option<&'a V> {
    vaults
        .iter()
        .filter(|v| v.deposit_token().is_some_and(|t| same_address(t, token)))
        .fold(None, |best: Option<&V>, v| match best {
            Some(b) if b.reported_tvl() >= v.reported_tvl() => Some(b),
            _ => Some(v),
        })
}

/// Authoritative vault for `pool`; first listed wins a TVL tie
pub fn select_vault<'a, V: VaultRecord>(vaults: &'a [V], pool: &CanonicalPool) -> Option<&'a V> {
    largest_for(vaults, &pool.address)
        .or_else(|| pool.distinct_lp_token().and_then(|lp| largest_for(vaults, lp)))
}

/// Current aggregate, projected when current is absent or zero, as percent
pub fn secondary_yield(current: Option<f64>, projected: Option<f64>) -> Option<f64> {
    current
        .filter(|v| *v != 0.0)
        .or(projected)
        .or(current)
        .map(normalize_percent)
}

/// "Performance: 10.00%, Management: 2.00%" over the positive components
pub fn fee_summary<S: AsRef<str>>(components: impl IntoIterator<Item = (S, f64)>) -> Option<String> {
    let parts: Vec<String> = components
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(name, v)| format!("{}: {:.2}%", name.as_ref(), normalize_percent(v)))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

// ============================================
// YEARN
// ============================================

pub struct YearnExtractor;

#[async_trait]
impl MetricExtractor for YearnExtractor {
    type Record = YearnVault;

    fn name(&self) -> &'static str {
        "yearn"
    }

    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<YearnVault> {
        let listing = cache.get(&Scope::new(&pool.chain, Source::YearnVaults)).await;
        select_vault(listing.yearn_vaults(), pool).cloned()
    }

    fn extract(&self, record: Option<&YearnVault>, _pool: &CanonicalPool) -> PartialMetrics {
        let metrics = record
            .map(|vault| SecondaryMetrics {
                vault: vault.address.clone(),
                apy: secondary_yield(vault.current_apr(), vault.projected_apr()),
                tvl: Some(vault.tvl_usd()),
                boost: vault.boost(),
                fees: fee_summary(vault.fee_components()),
            })
            .unwrap_or_default();

        PartialMetrics {
            yearn: Some(metrics),
            ..PartialMetrics::default()
        }
    }
}

// ============================================
// STAKEDAO
// ============================================

pub struct StakeDaoExtractor;

#[async_trait]
impl MetricExtractor for StakeDaoExtractor {
    type Record = StakeDaoStrategy;

    fn name(&self) -> &'static str {
        "stakedao"
    }

    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<StakeDaoStrategy> {
        let listing = cache.get(&Scope::new(&pool.chain, Source::StakeDaoStrategies)).await;
        select_vault(listing.stakedao_strategies(), pool).cloned()
    }

    fn extract(&self, record: Option<&StakeDaoStrategy>, _pool: &CanonicalPool) -> PartialMetrics {
        let metrics = record
            .map(|strategy| SecondaryMetrics {
                vault: strategy.identifier().map(str::to_string),
                apy: secondary_yield(strategy.current_apr(), strategy.projected_apr()),
                tvl: Some(strategy.tvl_usd()),
                boost: strategy.boost(),
                fees: fee_summary(strategy.fees.iter().map(|(name, v)| (name.as_str(), *v))),
            })
            .unwrap_or_default();

        PartialMetrics {
            stakedao: Some(metrics),
            ..PartialMetrics::default()
        }
    }
}
