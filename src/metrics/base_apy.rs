//! Base (trading fee) APY

use async_trait::async_trait;

use super::{MetricExtractor, PartialMetrics};
use crate::cache::ResponseCache;
use crate::providers::{BaseApyEntry, Scope, Source};
use crate::resolver::CanonicalPool;

/// Daily APY when positive, otherwise weekly. Never averaged.
pub fn base_apy_from(entry: &BaseApyEntry) -> f64 {
    match entry.latest_daily_apy_pcent {
        Some(daily) if daily > 0.0 => daily,
        _ => entry.latest_weekly_apy_pcent.unwrap_or(0.0),
    }
}

pub struct BaseApyExtractor;

#[async_trait]
impl MetricExtractor for BaseApyExtractor {
    type Record = BaseApyEntry;

    fn name(&self) -> &'static str {
        "base-apy"
    }

    async fn locate(&self, cache: &ResponseCache, pool: &CanonicalPool) -> Option<BaseApyEntry> {
        let listing = cache.get(&Scope::new(&pool.chain, Source::CurveBaseApys)).await;
        listing
            .base_apys()
            .iter()
            .find(|entry| entry.address.as_deref().is_some_and(|a| pool.matches_address(a)))
            .cloned()
    }

    fn extract(&self, record: Option<&BaseApyEntry>, _pool: &CanonicalPool) -> PartialMetrics {
        PartialMetrics {
            base_apy: Some(record.map(base_apy_from).unwrap_or(0.0)),
            ..PartialMetrics::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(daily: Option<f64>, weekly: Option<f64>) -> BaseApyEntry {
        BaseApyEntry {
            address: Some("0xabc".to_string()),
            latest_daily_apy_pcent: daily,
            latest_weekly_apy_pcent: weekly,
        }
    }

    #[test]
    fn test_daily_preferred_when_positive() {
        assert_eq!(base_apy_from(&entry(Some(1.2), Some(3.4))), 1.2);
    }

    #[test]
    fn test_weekly_fallback() {
        assert_eq!(base_apy_from(&entry(Some(0.0), Some(3.4))), 3.4);
        assert_eq!(base_apy_from(&entry(None, Some(3.4))), 3.4);
        assert_eq!(base_apy_from(&entry(None, None)), 0.0);
    }
}
