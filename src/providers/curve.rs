//! Curve API wire records
//!
//! API: https://api.curve.finance/v1
//!
//! - `getPools/all/{chain}`   -> data.poolData[]
//! - `getBaseApys/{chain}`    -> data.baseApys[]
//! - `getVolumes/{chain}`     -> data{address -> usdTotal}
//! - `getAllGauges`           -> data{gaugeName -> gauge}
//!
//! Every record is decoded leniently: unreadable numbers become `None`,
//! undecodable list entries are dropped.

use alloy_primitives::utils::format_units;
use alloy_primitives::U256;
use eyre::{eyre, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use super::de;

/// Decimals assumed when a coin doesn't report them
pub const DEFAULT_DECIMALS: u8 = 18;

// ============================================
// RAW BALANCES
// ============================================

/// Pool balance before decimal scaling
///
/// Curve sends integer strings ("1000000"); some listings send plain
/// JSON numbers, occasionally already fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawBalance {
    /// Exact integer amount in the token's smallest unit
    Integer(U256),
    /// Anything that doesn't fit an integer
    Decimal(f64),
}

impl RawBalance {
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    U256::from_str(s).ok().map(RawBalance::Integer)
                } else {
                    de::value_as_f64(value).map(RawBalance::Decimal)
                }
            }
            Value::Number(n) => match n.as_u64() {
                Some(v) => Some(RawBalance::Integer(U256::from(v))),
                None => n.as_f64().filter(|v| v.is_finite()).map(RawBalance::Decimal),
            },
            _ => None,
        }
    }

    /// Human readable amount: raw / 10^decimals
    ///
    /// Integer balances go through `format_units`, so the only rounding is
    /// the final decimal-string -> f64 parse.
    pub fn readable(&self, decimals: u8) -> f64 {
        match self {
            RawBalance::Integer(raw) => format_units(*raw, decimals)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .unwrap_or_else(|| u256_to_f64(*raw) / 10f64.powi(decimals as i32)),
            RawBalance::Decimal(raw) => raw / 10f64.powi(decimals as i32),
        }
    }
}

impl Default for RawBalance {
    fn default() -> Self {
        RawBalance::Integer(U256::ZERO)
    }
}

fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

fn lenient_balance<'de, D>(deserializer: D) -> std::result::Result<Option<RawBalance>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(RawBalance::parse))
}

// ============================================
// POOL LISTING
// ============================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveCoin {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_balance")]
    pub pool_balance: Option<RawBalance>,
    #[serde(default, deserialize_with = "de::lenient_u8")]
    pub decimals: Option<u8>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub usd_price: Option<f64>,
}

/// Extra reward token streamed through the pool's gauge
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveGaugeReward {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub apy: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvePoolEntry {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub lp_token_address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub asset_type_name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub coins: Vec<CurveCoin>,
    #[serde(default, deserialize_with = "de::lenient_vec")]
    pub gauge_rewards: Vec<CurveGaugeReward>,
}

// ============================================
// BASE APYS / VOLUMES
// ============================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseApyEntry {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub latest_daily_apy_pcent: Option<f64>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub latest_weekly_apy_pcent: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeEntry {
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub usd_total: Option<f64>,
}

// ============================================
// GAUGES
// ============================================

/// CRV APY as reported by a gauge: `[min, max]`, `[value]` or a bare number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApyField {
    List(Vec<Option<f64>>),
    Scalar(f64),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveGauge {
    /// Key of the gauge in the `getAllGauges` map
    #[serde(skip)]
    pub name: String,
    /// Address of the swap pool the gauge rewards
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub swap: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub blockchain_id: Option<String>,
    #[serde(default)]
    pub gauge_crv_apy: Option<ApyField>,
    #[serde(default)]
    pub gauge_future_crv_apy: Option<ApyField>,
    /// Fraction, not percent
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub side_chain_rewards_apy: Option<f64>,
}

// ============================================
// RESPONSE DECODING
// ============================================

fn data(body: &mut Value) -> Result<&mut Value> {
    match body.get_mut("data") {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(eyre!("response has no `data` field")),
    }
}

fn take_array(body: &mut Value, field: &str) -> Result<Vec<Value>> {
    match data(body)?.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(eyre!("response has no `data.{}` list", field)),
    }
}

pub fn decode_pools(mut body: Value) -> Result<Vec<CurvePoolEntry>> {
    Ok(de::decode_entries(take_array(&mut body, "poolData")?))
}

pub fn decode_base_apys(mut body: Value) -> Result<Vec<BaseApyEntry>> {
    Ok(de::decode_entries(take_array(&mut body, "baseApys")?))
}

/// Volume entries keyed by lower-cased pool address
pub fn decode_volumes(mut body: Value) -> Result<HashMap<String, VolumeEntry>> {
    match data(&mut body)?.take() {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(address, entry)| {
                serde_json::from_value::<VolumeEntry>(entry)
                    .ok()
                    .map(|v| (address.to_lowercase(), v))
            })
            .collect()),
        _ => Err(eyre!("`data` is not an address map")),
    }
}

/// Gauges in map-key order
pub fn decode_gauges(mut body: Value) -> Result<Vec<CurveGauge>> {
    match data(&mut body)?.take() {
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(name, entry)| {
                serde_json::from_value::<CurveGauge>(entry)
                    .ok()
                    .map(|gauge| CurveGauge { name, ..gauge })
            })
            .collect()),
        _ => Err(eyre!("`data` is not a gauge map")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_balance_parsing() {
        assert_eq!(
            RawBalance::parse(&json!("1000000")),
            Some(RawBalance::Integer(U256::from(1_000_000u64)))
        );
        assert_eq!(
            RawBalance::parse(&json!(42)),
            Some(RawBalance::Integer(U256::from(42u64)))
        );
        assert_eq!(RawBalance::parse(&json!("1.5")), Some(RawBalance::Decimal(1.5)));
        assert_eq!(RawBalance::parse(&json!(null)), None);
        assert_eq!(RawBalance::parse(&json!("abc")), None);
    }

    #[test]
    fn test_readable_balance() {
        let usdc = RawBalance::Integer(U256::from(1_000_000u64));
        assert_eq!(usdc.readable(6), 1.0);

        let dai = RawBalance::parse(&json!("2000000000000000000")).unwrap();
        assert_eq!(dai.readable(18), 2.0);

        // Beyond u64 - stays exact through format_units
        let big = RawBalance::parse(&json!("123456789000000000000000000")).unwrap();
        assert_eq!(big.readable(18), 123_456_789.0);

        assert_eq!(RawBalance::Decimal(2.5e18).readable(18), 2.5);
        assert_eq!(usdc.readable(0), 1_000_000.0);
    }

    #[test]
    fn test_decode_pools() {
        let body = json!({
            "success": true,
            "data": {
                "poolData": [
                    {
                        "address": "0xbEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7",
                        "name": "Curve.fi DAI/USDC/USDT",
                        "lpTokenAddress": "0x6c3F90f043a72FA612cbac8115EE7e52BDe6E490",
                        "assetTypeName": "usd",
                        "coins": [
                            {"symbol": "DAI", "poolBalance": "1000000000000000000", "decimals": "18", "usdPrice": 1.0},
                            {"symbol": "USDC", "poolBalance": "1000000", "decimals": 6, "usdPrice": null},
                            "garbage"
                        ],
                        "gaugeRewards": []
                    },
                    42
                ]
            }
        });

        let pools = decode_pools(body).unwrap();
        assert_eq!(pools.len(), 1);
        let pool = &pools[0];
        assert_eq!(pool.asset_type_name.as_deref(), Some("usd"));
        assert_eq!(pool.coins.len(), 2);
        assert_eq!(pool.coins[0].decimals, Some(18));
        assert_eq!(pool.coins[1].usd_price, None);
    }

    #[test]
    fn test_decode_requires_data() {
        assert!(decode_pools(json!({"success": false})).is_err());
        assert!(decode_base_apys(json!({"data": {}})).is_err());
        assert!(decode_volumes(json!({"data": null})).is_err());
    }

    #[test]
    fn test_decode_volumes_lowercases_keys() {
        let body = json!({"data": {"0xABC": {"usdTotal": "1500.5"}, "0xdef": {}}});
        let volumes = decode_volumes(body).unwrap();
        assert_eq!(volumes["0xabc"].usd_total, Some(1500.5));
        assert_eq!(volumes["0xdef"].usd_total, None);
    }

    #[test]
    fn test_decode_gauges() {
        let body = json!({"data": {
            "ethereum-3pool": {
                "swap": "0xbEbc44782C7dB0a1A60Cb6fe97d0b483032FF1C7",
                "blockchainId": "ethereum",
                "gaugeCrvApy": [0.5, 1.25],
                "gaugeFutureCrvApy": [null, 2.0]
            },
            "arbitrum-2pool": {"swap": "0x7f90", "gaugeCrvApy": 3.0, "sideChainRewardsApy": 0.02}
        }});

        let gauges = decode_gauges(body).unwrap();
        assert_eq!(gauges.len(), 2);
        let three = gauges.iter().find(|g| g.name == "ethereum-3pool").unwrap();
        assert_eq!(three.gauge_crv_apy, Some(ApyField::List(vec![Some(0.5), Some(1.25)])));
        assert_eq!(three.gauge_future_crv_apy, Some(ApyField::List(vec![None, Some(2.0)])));
        let two = gauges.iter().find(|g| g.name == "arbitrum-2pool").unwrap();
        assert_eq!(two.gauge_crv_apy, Some(ApyField::Scalar(3.0)));
        assert_eq!(two.side_chain_rewards_apy, Some(0.02));
    }
}
