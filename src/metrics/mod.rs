//! Metric Extractors
//!
//! One extractor per provider listing. Each one locates its record for a
//! resolved pool, then turns it into a `PartialMetrics` slice:
//!
//! - **BaseApyExtractor**: daily base APY, weekly when daily is uninformative
//! - **TvlExtractor**: volume endpoint TVL, constituent sum when that is zero
//! - **RewardExtractor**: gauge CRV quote + side-chain and listed rewards
//! - **CompositionExtractor**: per-coin value ratios
//! - **YearnExtractor / StakeDaoExtractor**: optional secondary metrics
//!
//! Missing fields degrade to zero or `None`, never to an error.

mod base_apy;
mod composition;
mod rewards;
mod secondary;
mod tvl;

pub use base_apy::{base_apy_from, BaseApyExtractor};
pub use composition::{coin_ratios, CompositionExtractor};
pub use rewards::{crv_quote, RewardExtractor, SIDE_CHAIN_REWARDS_LABEL};
pub use secondary::{
    fee_summary, secondary_yield, select_vault, StakeDaoExtractor, VaultRecord, YearnExtractor,
};
pub use tvl::{tvl_from_constituents, TvlExtractor};

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::cache::ResponseCache;
use crate::resolver::CanonicalPool;

// ============================================
// REWARD QUOTES
// ============================================

/// Primary (CRV) incentive quote, in percent
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum RewardQuote {
    #[default]
    None,
    Scalar(f64),
    Range { min: f64, max: f64 },
}

impl RewardQuote {
    /// `[a, b, ..]` -> Range(a, b), `[a]` -> Range(a, a), `[]` -> None
    ///
    /// Null entries read as zero.
    pub fn from_values(values: &[Option<f64>]) -> Self {
        match values {
            [] => RewardQuote::None,
            [only] => {
                let v = only.unwrap_or(0.0);
                RewardQuote::Range { min: v, max: v }
            }
            [min, max, ..] => RewardQuote::Range {
                min: min.unwrap_or(0.0),
                max: max.unwrap_or(0.0),
            },
        }
    }

    /// (min, max); a scalar is its own range, `None` is zero
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            RewardQuote::None => (0.0, 0.0),
            RewardQuote::Scalar(v) => (v, v),
            RewardQuote::Range { min, max } => (min, max),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, RewardQuote::None)
    }
}

impl fmt::Display for RewardQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RewardQuote::Range { min, max } if min != max => write!(f, "{:.2} - {:.2}", min, max),
            RewardQuote::Range { min, .. } => write!(f, "{:.2}", min),
            RewardQuote::Scalar(v) if v > 0.0 => write!(f, "{:.2}", v),
            _ => write!(f, "0.00"),
        }
    }
}

/// Non-CRV reward stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherReward {
    pub token: String,
    pub apy: f64,
}

impl fmt::Display for OtherReward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}%", self.token, self.apy)
    }
}

// ============================================
// SECONDARY METRICS
// ============================================

/// Aggregator block attached to a record
///
/// All fields `None` when the aggregator was queried but has no vault for
/// the pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SecondaryMetrics {
    pub vault: Option<String>,
    /// Percent
    pub apy: Option<f64>,
    pub tvl: Option<f64>,
    pub boost: Option<f64>,
    pub fees: Option<String>,
}

impl SecondaryMetrics {
    pub fn is_matched(&self) -> bool {
        self.vault.is_some() || self.apy.is_some() || self.tvl.is_some()
    }
}

/// Fraction below 1 -> percent; 1 and above already percent
pub fn normalize_percent(value: f64) -> f64 {
    if value < 1.0 {
        value * 100.0
    } else {
        value
    }
}

// ============================================
// PARTIAL METRICS
// ============================================

/// The slice of an aggregated record one extractor produces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartialMetrics {
    pub base_apy: Option<f64>,
    pub tvl: Option<f64>,
    pub crv_apy: RewardQuote,
    pub other_rewards: Vec<OtherReward>,
    pub coin_ratios: Vec<String>,
    pub yearn: Option<SecondaryMetrics>,
    pub stakedao: Option<SecondaryMetrics>,
}

impl PartialMetrics {
    /// Combine two slices. Scalars keep the first present value, rewards
    /// and ratios append in call order.
    pub fn merge(mut self, other: PartialMetrics) -> Self {
        self.base_apy = self.base_apy.or(other.base_apy);
        self.tvl = self.tvl.or(other.tvl);
        if self.crv_apy.is_none() {
            self.crv_apy = other.crv_apy;
        }
        self.other_rewards.extend(other.other_rewards);
        self.coin_ratios.extend(other.coin_ratios);
        self.yearn = self.yearn.or(other.yearn);
        self.stakedao = self.stakedao.or(other.stakedao);
        self
    }
}

// ============================================
// EXTRACTOR SEAM
// ============================================

#[async_trait]
pub trait MetricExtractor: Send + Sync {
    /// Provider record this extractor reads
    type Record: Send + Sync;

    fn name(&self) -> &'static str;

    /// Find the provider record for `pool`, through the cache
    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<Self::Record>;

    /// Normalize a located record (or its absence)
    fn extract(&self, record: Option<&Self::Record>, pool: &CanonicalPool) -> PartialMetrics;

    async fn collect(&self, cache: &ResponseCache, pool: &CanonicalPool) -> PartialMetrics {
        let record = self.locate(cache, pool).await;
        if record.is_none() {
            tracing::debug!("{}: no record for {}", self.name(), pool.address);
        }
        self.extract(record.as_ref(), pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_from_values() {
        assert_eq!(RewardQuote::from_values(&[]), RewardQuote::None);
        assert_eq!(
            RewardQuote::from_values(&[Some(1.5)]),
            RewardQuote::Range { min: 1.5, max: 1.5 }
        );
        assert_eq!(
            RewardQuote::from_values(&[None, Some(2.0), Some(9.0)]),
            RewardQuote::Range { min: 0.0, max: 2.0 }
        );
    }

    #[test]
    fn test_degenerate_range_matches_single_value() {
        let pair = RewardQuote::from_values(&[Some(3.2), Some(3.2)]);
        let single = RewardQuote::from_values(&[Some(3.2)]);
        assert_eq!(pair, single);
        assert_eq!(pair.to_string(), single.to_string());
        assert_eq!(single.to_string(), "3.20");
    }

    #[test]
    fn test_quote_display() {
        assert_eq!(RewardQuote::Range { min: 1.0, max: 2.5 }.to_string(), "1.00 - 2.50");
        assert_eq!(RewardQuote::Scalar(4.0).to_string(), "4.00");
        assert_eq!(RewardQuote::Scalar(0.0).to_string(), "0.00");
        assert_eq!(RewardQuote::None.to_string(), "0.00");
        assert_eq!(RewardQuote::None.bounds(), (0.0, 0.0));
    }

    #[test]
    fn test_normalize_percent() {
        assert!((normalize_percent(0.08) - 8.0).abs() < 1e-9);
        assert_eq!(format!("{:.2}", normalize_percent(0.08)), "8.00");
        assert_eq!(normalize_percent(8.0), 8.0);
        assert_eq!(normalize_percent(1.0), 1.0);
    }

    #[test]
    fn test_merge_keeps_first_and_appends() {
        let first = PartialMetrics {
            base_apy: Some(1.0),
            other_rewards: vec![OtherReward { token: "A".into(), apy: 1.0 }],
            ..PartialMetrics::default()
        };
        let second = PartialMetrics {
            base_apy: Some(2.0),
            tvl: Some(10.0),
            other_rewards: vec![OtherReward { token: "B".into(), apy: 2.0 }],
            ..PartialMetrics::default()
        };

        let merged = first.merge(second);
        assert_eq!(merged.base_apy, Some(1.0));
        assert_eq!(merged.tvl, Some(10.0));
        let tokens: Vec<_> = merged.other_rewards.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, ["A", "B"]);
    }

    #[test]
    fn test_other_reward_display() {
        let reward = OtherReward { token: "Side Chain Rewards".into(), apy: 2.0 };
        assert_eq!(reward.to_string(), "Side Chain Rewards: 2.00%");
    }
}
