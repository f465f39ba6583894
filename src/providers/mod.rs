//! Providers: Data Ingest
//!
//! One client surface over three independently operated APIs:
//!
//! - **Curve**: pool listings, base APYs, volumes, gauges (primary)
//! - **Yearn**: vaults wrapping Curve LP tokens (optional)
//! - **StakeDAO**: Curve strategies (optional)
//!
//! Clients NEVER fail past this boundary: transport and decode errors are
//! logged and come back as `RawResponse::Empty`.

mod chain;
mod client;
pub mod curve;
pub mod de;
pub mod stakedao;
pub mod yearn;

pub use chain::{Chain, DEFAULT_CHAIN, KNOWN_CHAINS};
pub use client::HttpProviderClient;
pub use curve::{
    ApyField, BaseApyEntry, CurveCoin, CurveGauge, CurveGaugeReward, CurvePoolEntry, RawBalance,
    VolumeEntry, DEFAULT_DECIMALS,
};
pub use stakedao::StakeDaoStrategy;
pub use yearn::YearnVault;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

// ============================================
// SCOPES
// ============================================

/// One fetchable listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    CurvePools,
    CurveBaseApys,
    CurveVolumes,
    /// Not chain-scoped: one listing covers every chain
    CurveGauges,
    YearnVaults,
    StakeDaoStrategies,
}

impl Source {
    pub const ALL: [Source; 6] = [
        Source::CurvePools,
        Source::CurveBaseApys,
        Source::CurveVolumes,
        Source::CurveGauges,
        Source::YearnVaults,
        Source::StakeDaoStrategies,
    ];

    pub fn is_chain_scoped(&self) -> bool {
        !matches!(self, Source::CurveGauges)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::CurvePools => write!(f, "Curve pools"),
            Source::CurveBaseApys => write!(f, "Curve base APYs"),
            Source::CurveVolumes => write!(f, "Curve volumes"),
            Source::CurveGauges => write!(f, "Curve gauges"),
            Source::YearnVaults => write!(f, "Yearn vaults"),
            Source::StakeDaoStrategies => write!(f, "StakeDAO strategies"),
        }
    }
}

/// Cache key: (chain, source). Fetched at most once per run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope {
    pub chain: Option<Chain>,
    pub source: Source,
}

impl Scope {
    /// Scope for `source` on `chain` (chain dropped for global sources)
    pub fn new(chain: &Chain, source: Source) -> Self {
        Self {
            chain: source.is_chain_scoped().then(|| chain.clone()),
            source,
        }
    }

    pub fn gauges() -> Self {
        Self {
            chain: None,
            source: Source::CurveGauges,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chain {
            Some(chain) => write!(f, "{} {}", chain, self.source),
            None => write!(f, "{}", self.source),
        }
    }
}

// ============================================
// RAW RESPONSES
// ============================================

/// Decoded provider payload, one variant per listing shape
#[derive(Debug, Clone, Default)]
pub enum RawResponse {
    /// Queried and got nothing usable (includes every failure)
    #[default]
    Empty,
    Pools(Vec<CurvePoolEntry>),
    BaseApys(Vec<BaseApyEntry>),
    /// Keyed by lower-cased pool address
    Volumes(HashMap<String, VolumeEntry>),
    Gauges(Vec<CurveGauge>),
    YearnVaults(Vec<YearnVault>),
    StakeDaoStrategies(Vec<StakeDaoStrategy>),
}

impl RawResponse {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            RawResponse::Empty => 0,
            RawResponse::Pools(v) => v.len(),
            RawResponse::BaseApys(v) => v.len(),
            RawResponse::Volumes(v) => v.len(),
            RawResponse::Gauges(v) => v.len(),
            RawResponse::YearnVaults(v) => v.len(),
            RawResponse::StakeDaoStrategies(v) => v.len(),
        }
    }

    pub fn pools(&self) -> &[CurvePoolEntry] {
        match self {
            RawResponse::Pools(v) => v,
            _ => &[],
        }
    }

    pub fn base_apys(&self) -> &[BaseApyEntry] {
        match self {
            RawResponse::BaseApys(v) => v,
            _ => &[],
        }
    }

    pub fn volume(&self, address_lower: &str) -> Option<&VolumeEntry> {
        match self {
            RawResponse::Volumes(v) => v.get(address_lower),
            _ => None,
        }
    }

    pub fn gauges(&self) -> &[CurveGauge] {
        match self {
            RawResponse::Gauges(v) => v,
            _ => &[],
        }
    }

    pub fn yearn_vaults(&self) -> &[YearnVault] {
        match self {
            RawResponse::YearnVaults(v) => v,
            _ => &[],
        }
    }

    pub fn stakedao_strategies(&self) -> &[StakeDaoStrategy] {
        match self {
            RawResponse::StakeDaoStrategies(v) => v,
            _ => &[],
        }
    }
}

// ============================================
// CLIENT SURFACE
// ============================================

/// Read-only query surface of the provider APIs
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch one listing. Always returns; failures come back `Empty`.
    async fn fetch(&self, scope: &Scope) -> RawResponse;
}

/// Case-insensitive address equality
pub fn same_address(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
}
