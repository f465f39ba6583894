//! Pool composition: share of value per coin

use async_trait::async_trait;

use super::{MetricExtractor, PartialMetrics};
use crate::cache::ResponseCache;
use crate::resolver::{CanonicalPool, ConstituentAsset};

/// "SYM: 50.0%" per coin, in pool order; every ratio "0.0%" when the pool holds no value
pub fn coin_ratios(coins: &[ConstituentAsset]) -> Vec<String> {
    let values: Vec<f64> = coins.iter().map(ConstituentAsset::usd_value).collect();
    let total: f64 = values.iter().sum();

    coins
        .iter()
        .zip(values)
        .map(|(coin, value)| {
            if total > 0.0 {
                format!("{}: {:.1}%", coin.symbol, value / total * 100.0)
            } else {
                format!("{}: 0.0%", coin.symbol)
            }
        })
        .collect()
}

/// Works off the pool record alone, no provider lookup
pub struct CompositionExtractor;

#[async_trait]
impl MetricExtractor for CompositionExtractor {
    type Record = ();

    fn name(&self) -> &'static str {
        "composition"
    }

    async fn locate(&self, _cache: &ResponseCache, _pool: &CanonicalPool) -> Option<()> {
        Some(())
    }

    fn extract(&self, _record: Option<&()>, pool: &CanonicalPool) -> PartialMetrics {
        PartialMetrics {
            coin_ratios: coin_ratios(&pool.coins),
            ..PartialMetrics::default()
        }
    }
}
