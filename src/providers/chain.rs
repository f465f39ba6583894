//! Chain naming
//!
//! Curve keys its endpoints by chain NAME (`ethereum`, `arbitrum`, ...),
//! the aggregators key theirs by EVM chain ID. `Chain` holds the
//! lower-cased name and knows the ID for every network we can map.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Known chains: (Curve name, EVM chain id)
pub const KNOWN_CHAINS: &[(&str, u64)] = &[
    ("ethereum", 1),
    ("optimism", 10),
    ("bsc", 56),
    ("xdai", 100),
    ("polygon", 137),
    ("fantom", 250),
    ("fraxtal", 252),
    ("kava", 2222),
    ("moonbeam", 1284),
    ("base", 8453),
    ("arbitrum", 42161),
    ("celo", 42220),
    ("avalanche", 43114),
];

/// Chain used when a request doesn't name one
pub const DEFAULT_CHAIN: &str = "ethereum";

/// Lower-cased chain name as used by the Curve API
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Chain(String);

impl Chain {
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim().to_lowercase();
        // Curve calls Gnosis "xdai"
        let name = match name.as_str() {
            "gnosis" => "xdai".to_string(),
            "mainnet" | "eth" => "ethereum".to_string(),
            _ => name,
        };
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EVM chain id, `None` for chains the aggregators can't be queried on
    pub fn chain_id(&self) -> Option<u64> {
        KNOWN_CHAINS
            .iter()
            .find(|(name, _)| *name == self.0)
            .map(|(_, id)| *id)
    }

    /// "ethereum" -> "Ethereum"
    pub fn title(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl Default for Chain {
    fn default() -> Self {
        Chain::new(DEFAULT_CHAIN)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Chain {
    fn from(value: String) -> Self {
        Chain::new(value)
    }
}

impl From<&str> for Chain {
    fn from(value: &str) -> Self {
        Chain::new(value)
    }
}

impl From<Chain> for String {
    fn from(value: Chain) -> Self {
        value.0
    }
}
