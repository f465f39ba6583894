//! Yearn (yDaemon) vault records
//!
//! API: https://ydaemon.yearn.fi/{chainId}/vaults/all
//!
//! APRs and fees are fractions (0.08 = 8%).

use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;

use super::de;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnToken {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnTvl {
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub tvl: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnComposite {
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub boost: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnForwardApr {
    #[serde(rename = "netAPR", default, deserialize_with = "de::lenient_f64")]
    pub net_apr: Option<f64>,
    #[serde(default)]
    pub composite: Option<YearnComposite>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnFees {
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub performance: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub management: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnApr {
    /// Realised (current aggregate) net APR
    #[serde(rename = "netAPR", default, deserialize_with = "de::lenient_f64")]
    pub net_apr: Option<f64>,
    /// Projected net APR
    #[serde(rename = "forwardAPR", default)]
    pub forward_apr: Option<YearnForwardApr>,
    #[serde(default)]
    pub fees: Option<YearnFees>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YearnVault {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default)]
    pub token: Option<YearnToken>,
    #[serde(default)]
    pub tvl: Option<YearnTvl>,
    #[serde(default)]
    pub apr: Option<YearnApr>,
}

impl YearnVault {
    /// Address of the deposit token (the Curve LP / pool)
    pub fn token_address(&self) -> Option<&str> {
        self.token.as_ref()?.address.as_deref()
    }

    pub fn tvl_usd(&self) -> f64 {
        self.tvl.as_ref().and_then(|t| t.tvl).unwrap_or(0.0)
    }

    pub fn current_apr(&self) -> Option<f64> {
        self.apr.as_ref()?.net_apr
    }

    pub fn projected_apr(&self) -> Option<f64> {
        self.apr.as_ref()?.forward_apr.as_ref()?.net_apr
    }

    pub fn boost(&self) -> Option<f64> {
        self.apr
            .as_ref()?
            .forward_apr
            .as_ref()?
            .composite
            .as_ref()?
            .boost
    }

    /// Named fee components in display order
    pub fn fee_components(&self) -> Vec<(&'static str, f64)> {
        let Some(fees) = self.apr.as_ref().and_then(|a| a.fees.as_ref()) else {
            return Vec::new();
        };
        [("Performance", fees.performance), ("Management", fees.management)]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }
}

pub fn decode_vaults(body: Value) -> Result<Vec<YearnVault>> {
    match body {
        Value::Array(items) => Ok(de::decode_entries(items)),
        _ => Err(eyre!("vault listing is not an array")),
    }
}
