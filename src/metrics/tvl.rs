//! Total value locked

use async_trait::async_trait;

use super::{MetricExtractor, PartialMetrics};
use crate::cache::ResponseCache;
use crate::providers::{Scope, Source, VolumeEntry};
use crate::resolver::{CanonicalPool, ConstituentAsset};

/// Sum of readable balance * price over every coin, unrounded
pub fn tvl_from_constituents(coins: &[ConstituentAsset]) -> f64 {
    coins.iter().map(ConstituentAsset::usd_value).sum()
}

pub struct TvlExtractor;

#[async_trait]
impl MetricExtractor for TvlExtractor {
    type Record = VolumeEntry;

    fn name(&self) -> &'static str {
        "tvl"
    }

    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<VolumeEntry> {
        let volumes = cache.get(&Scope::new(&pool.chain, Source::CurveVolumes)).await;
        volumes.volume(&pool.address_lower()).cloned()
    }

    /// Volume endpoint first; the constituent sum only when it reports exactly 0
    fn extract(&self, record: Option<&VolumeEntry>, pool: &CanonicalPool) -> PartialMetrics {
        let reported = record.and_then(|v| v.usd_total).unwrap_or(0.0);
        let tvl = if reported == 0.0 {
            tvl_from_constituents(&pool.coins)
        } else {
            reported
        };

        PartialMetrics {
            tvl: Some(tvl),
            ..PartialMetrics::default()
        }
    }
}
