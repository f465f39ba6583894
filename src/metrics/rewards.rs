//! Gauge rewards
//!
//! The gauge listing is global; a gauge belongs to a pool through its
//! `swap` address. CRV APY comes from `gaugeFutureCrvApy` when it carries
//! values, otherwise `gaugeCrvApy`.

use async_trait::async_trait;

use super::{MetricExtractor, OtherReward, PartialMetrics, RewardQuote};
use crate::cache::ResponseCache;
use crate::providers::{ApyField, Chain, CurveGauge, Scope};
use crate::resolver::CanonicalPool;

pub const SIDE_CHAIN_REWARDS_LABEL: &str = "Side Chain Rewards";

fn has_values(field: &ApyField) -> bool {
    !matches!(field, ApyField::List(values) if values.is_empty())
}

/// CRV quote of a gauge, projected over current
pub fn crv_quote(gauge: &CurveGauge) -> RewardQuote {
    let field = gauge
        .gauge_future_crv_apy
        .as_ref()
        .filter(|f| has_values(f))
        .or(gauge.gauge_crv_apy.as_ref());

    match field {
        Some(ApyField::List(values)) => RewardQuote::from_values(values),
        Some(ApyField::Scalar(v)) => RewardQuote::Scalar(*v),
        None => RewardQuote::None,
    }
}

fn gauge_serves(gauge: &CurveGauge, pool: &CanonicalPool) -> bool {
    let swap_matches = gauge.swap.as_deref().is_some_and(|s| pool.matches_address(s));
    let chain_matches = gauge
        .blockchain_id
        .as_deref()
        .map_or(true, |id| Chain::new(id) == pool.chain);
    swap_matches && chain_matches
}

pub struct RewardExtractor;

#[async_trait]
impl MetricExtractor for RewardExtractor {
    type Record = CurveGauge;

    fn name(&self) -> &'static str {
        "rewards"
    }

    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<CurveGauge> {
        let gauges = cache.get(&Scope::gauges()).await;
        gauges.gauges().iter().find(|g| gauge_serves(g, pool)).cloned()
    }

    /// Listed pool rewards first (positive only), then the gauge's side-chain stream
    fn extract(&self, record: Option<&CurveGauge>, pool: &CanonicalPool) -> PartialMetrics {
        let mut other_rewards: Vec<OtherReward> = pool
            .listed_rewards
            .iter()
            .filter(|r| r.apy > 0.0)
            .map(|r| OtherReward {
                token: r.symbol.clone(),
                apy: r.apy,
            })
            .collect();

        if let Some(side_chain) = record.and_then(|g| g.side_chain_rewards_apy) {
            if side_chain > 0.0 {
                // fraction on the wire
                other_rewards.push(OtherReward {
                    token: SIDE_CHAIN_REWARDS_LABEL.to_string(),
                    apy: side_chain * 100.0,
                });
            }
        }

        PartialMetrics {
            crv_apy: record.map(crv_quote).unwrap_or_default(),
            other_rewards,
            ..PartialMetrics::default()
        }
    }
}
