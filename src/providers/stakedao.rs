//! StakeDAO Curve strategy records
//!
//! API: https://api.stakedao.org/api/strategies/curve/{chainId}.json
//!
//! APRs are already percentages; the listing may also come wrapped as
//! `{"deployed": [...]}` depending on the API revision.

use eyre::{eyre, Result};
use serde::Deserialize;
use serde_json::Value;

use super::de;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeDaoToken {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeDaoAprTotal {
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeDaoApr {
    #[serde(default)]
    pub current: Option<StakeDaoAprTotal>,
    #[serde(default)]
    pub projected: Option<StakeDaoAprTotal>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub boost: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeDaoStrategy {
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de::lenient_string")]
    pub vault: Option<String>,
    #[serde(default)]
    pub lp_token: Option<StakeDaoToken>,
    #[serde(default, deserialize_with = "de::lenient_f64")]
    pub tvl: Option<f64>,
    #[serde(default)]
    pub apr: Option<StakeDaoApr>,
    #[serde(default, deserialize_with = "de::named_numbers")]
    pub fees: Vec<(String, f64)>,
}

impl StakeDaoStrategy {
    pub fn token_address(&self) -> Option<&str> {
        self.lp_token.as_ref()?.address.as_deref()
    }

    pub fn tvl_usd(&self) -> f64 {
        self.tvl.unwrap_or(0.0)
    }

    pub fn current_apr(&self) -> Option<f64> {
        self.apr.as_ref()?.current.as_ref()?.total
    }

    pub fn projected_apr(&self) -> Option<f64> {
        self.apr.as_ref()?.projected.as_ref()?.total
    }

    pub fn boost(&self) -> Option<f64> {
        self.apr.as_ref()?.boost
    }

    /// Vault address, falling back to the strategy key
    pub fn identifier(&self) -> Option<&str> {
        self.vault.as_deref().or(self.key.as_deref())
    }
}

pub fn decode_strategies(body: Value) -> Result<Vec<StakeDaoStrategy>> {
    match body {
        Value::Array(items) => Ok(de::decode_entries(items)),
        Value::Object(mut map) => match map.remove("deployed") {
            Some(Value::Array(items)) => Ok(de::decode_entries(items)),
            _ => Err(eyre!("strategy listing has no `deployed` list")),
        },
        _ => Err(eyre!("strategy listing is not an array")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_strategy() {
        let body = json!([{
            "key": "sdcrv-3pool",
            "name": "3pool",
            "vault": "0xb9205784b05fbe5b5298792a24c2cb844b7dc467",
            "lpToken": {"address": "0x6c3F90f043a72FA612cbac8115EE7e52BDe6E490"},
            "tvl": "250000",
            "apr": {"current": {"total": 6.4}, "projected": {"total": 7.1}, "boost": 2.1},
            "fees": {"veSdtFeeProxy": 10, "perfFee": 0, "claimerFee": 0.5}
        }]);

        let strategies = decode_strategies(body).unwrap();
        let s = &strategies[0];
        assert_eq!(s.token_address(), Some("0x6c3F90f043a72FA612cbac8115EE7e52BDe6E490"));
        assert_eq!(s.tvl_usd(), 250000.0);
        assert_eq!(s.current_apr(), Some(6.4));
        assert_eq!(s.projected_apr(), Some(7.1));
        assert_eq!(s.boost(), Some(2.1));
        assert_eq!(s.identifier(), Some("0xb9205784b05fbe5b5298792a24c2cb844b7dc467"));
        assert_eq!(s.fees.len(), 3);
    }

    #[test]
    fn test_wrapped_listing() {
        let body = json!({"deployed": [{"key": "a"}, {"key": "b"}]});
        let strategies = decode_strategies(body).unwrap();
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[1].identifier(), Some("b"));
    }

    #[test]
    fn test_bad_listing() {
        assert!(decode_strategies(json!("maintenance")).is_err());
        assert!(decode_strategies(json!({"other": []})).is_err());
    }
}
