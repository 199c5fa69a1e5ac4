use std::sync::{Arc, RwLock};

use crate::config::AppConfig;
use crate::services::booking::BookingWorkflow;
use crate::services::catalog::{CatalogService, CatalogSnapshot};
use crate::store::TableStore;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn TableStore>,
    pub catalog: CatalogService,
    pub bookings: BookingWorkflow,
    /// Last catalog fetched from the store; replaced wholesale, never patched.
    pub snapshot: RwLock<CatalogSnapshot>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn TableStore>, snapshot: CatalogSnapshot) -> Self {
        Self {
            catalog: CatalogService::new(Arc::clone(&store)),
            bookings: BookingWorkflow::new(Arc::clone(&store), config.workflow_settings()),
            config,
            store,
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn current_snapshot(&self) -> CatalogSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn replace_snapshot(&self, snapshot: CatalogSnapshot) {
        self.update_snapshot(|current| *current = snapshot);
    }

    /// Applies `change` under one write guard so concurrent refreshes of
    /// different parts of the catalog do not overwrite each other.
    pub fn update_snapshot(&self, change: impl FnOnce(&mut CatalogSnapshot)) {
        let mut guard = self.snapshot.write().unwrap_or_else(|poisoned| {
            tracing::warn!("catalog snapshot lock poisoned, recovering");
            poisoned.into_inner()
        });
        change(&mut guard);
    }
}
