//! Response Cache
//!
//! Memoizes provider listings per `Scope` for the lifetime of one run:
//! at most one network call per distinct scope, empty results included.
//!
//! Built per pipeline run and dropped with it - no process-wide state.
//! Concurrent misses on the same scope may both hit the network, but the
//! FIRST stored response wins and later writers receive it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, trace};

use crate::providers::{ProviderClient, RawResponse, Scope};

pub struct ResponseCache {
    client: Arc<dyn ProviderClient>,
    entries: RwLock<HashMap<Scope, Arc<RawResponse>>>,
    network_fetches: AtomicUsize,
}

impl ResponseCache {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
            network_fetches: AtomicUsize::new(0),
        }
    }

    /// Cached listing for `scope`, fetched on first use
    ///
    /// An `Empty` response is cached like any other: it means "no data",
    /// not "try again".
    pub async fn get(&self, scope: &Scope) -> Arc<RawResponse> {
        {
            let entries = self.entries.read().await;
            if let Some(hit) = entries.get(scope) {
                trace!("Cache hit: {}", scope);
                return Arc::clone(hit);
            }
        }

        info!("Loading {} data...", scope);
        let fetched = Arc::new(self.client.fetch(scope).await);
        self.network_fetches.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write().await;
        Arc::clone(entries.entry(scope.clone()).or_insert(fetched))
    }

    /// Number of scopes held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Provider calls issued so far
    pub fn network_fetches(&self) -> usize {
        self.network_fetches.load(Ordering::Relaxed)
    }
}
