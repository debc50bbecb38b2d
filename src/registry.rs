//! [`Registry`]: the catalogue of live adapters.
//!
//! Registration is rare (happens once at startup, per adapter with a
//! present API key); selection happens on every request and must not block
//! behind a registration. A `std::sync::RwLock` over a `Vec` gives many
//! concurrent readers a consistent snapshot while still preserving
//! registration order for the registry's tie-break rule.

use std::sync::{Arc, RwLock};

use crate::adapter::AdapterContract;
use crate::model::{AdapterDescriptor, QueryCategory, SearchError};

/// One registered adapter: its snapshotted descriptor plus the live trait
/// object used to actually run a search. Order in the owning `Vec` is
/// registration order, used to break score ties.
struct Entry {
    descriptor: AdapterDescriptor,
    adapter: Arc<dyn AdapterContract>,
}

/// Owns the process-wide set of live adapters.
#[derive(Default)]
pub struct Registry {
    adapters: RwLock<Vec<Entry>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { adapters: RwLock::new(Vec::new()) }
    }

    /// Register `adapter`, snapshotting its [`AdapterDescriptor`] at this
    /// instant. Overwrites any prior entry with the same id in place
    /// (preserving its original registration-order position) — the
    /// descriptor is refreshed too, in case the adapter's reported
    /// categories changed between registrations.
    pub fn register(&self, adapter: Arc<dyn AdapterContract>) {
        let descriptor = AdapterDescriptor {
            id: adapter.id().to_string(),
            name: adapter.name().to_string(),
            supported_categories: adapter.supported_categories().clone(),
        };
        let mut adapters = self.adapters.write().expect("registry lock poisoned");
        if let Some(slot) = adapters.iter_mut().find(|entry| entry.descriptor.id == descriptor.id) {
            slot.descriptor = descriptor;
            slot.adapter = adapter;
        } else {
            adapters.push(Entry { descriptor, adapter });
        }
    }

    /// Fetch one adapter by id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn AdapterContract>, SearchError> {
        self.adapters
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|entry| entry.descriptor.id == id)
            .map(|entry| Arc::clone(&entry.adapter))
            .ok_or_else(|| SearchError::NoAdapterAvailable(format!("no adapter registered with id '{id}'")))
    }

    /// Snapshot of every registered adapter's stable metadata, in
    /// registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<AdapterDescriptor> {
        self.adapters.read().expect("registry lock poisoned").iter().map(|entry| entry.descriptor.clone()).collect()
    }

    /// Select and order the adapters that support `category`, for `query`.
    ///
    /// 1. Filter by the snapshotted descriptor's `supported_categories`,
    ///    not a fresh call into the adapter — category support is stable
    ///    metadata, fixed at registration.
    /// 2. Score each with `relevance_score(query, category)`, which *is*
    ///    called live since it is query-dependent.
    /// 3. Stable-sort descending by score; ties keep registration order
    ///    (guaranteed by a stable sort over a vec already in registration
    ///    order).
    #[must_use]
    pub fn select_for_category(
        &self,
        category: QueryCategory,
        query: &str,
    ) -> Vec<Arc<dyn AdapterContract>> {
        // Snapshot under the read lock, then score/sort outside it so a
        // slow relevance_score() call can't hold up a concurrent registration.
        let snapshot: Vec<Arc<dyn AdapterContract>> = self
            .adapters
            .read()
            .expect("registry lock poisoned")
            .iter()
            .filter(|entry| entry.descriptor.supported_categories.contains(&category))
            .map(|entry| Arc::clone(&entry.adapter))
            .collect();

        let mut scored: Vec<(f64, Arc<dyn AdapterContract>)> = snapshot
            .into_iter()
            .map(|adapter| {
                let score = adapter.relevance_score(query, category);
                (score, adapter)
            })
            .collect();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, adapter)| adapter).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.read().expect("registry lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
