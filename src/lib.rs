//! Curve Tracker
//!
//! Resolves Curve pools by address or name and reconciles what the Curve
//! API, Yearn and StakeDAO report about them into one record per pool.
//!
//! ## Phases
//!
//! - **providers**: typed, lenient clients for the three APIs
//! - **cache**: one fetch per (chain, listing) per run
//! - **resolver**: identifier -> canonical pool
//! - **metrics**: per-listing extractors (base APY, TVL, rewards, ratios, aggregators)
//! - **pipeline**: resolve + extract + merge, single or batched
//! - **report**: table / JSON / CSV output

pub mod cache;
pub mod config;
pub mod metrics;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod resolver;

pub use cache::ResponseCache;
pub use config::{Config, ExportMode};
pub use pipeline::{AggregatedRecord, Pipeline, PoolRequest, SecondaryFlags};
pub use providers::{Chain, HttpProviderClient, ProviderClient};
pub use resolver::{CanonicalPool, PoolResolver};
