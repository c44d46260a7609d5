//! Shared application state.
//!
//! The only state the service keeps is the settings and an in-memory registry
//! of finished batches; nothing is persisted across restarts.

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::config::Settings;
use crate::report::models::BatchSummary;

pub struct AppState {
    pub settings: Settings,
    batches: RwLock<HashMap<Uuid, BatchSummary>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            batches: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_batch(&self, summary: BatchSummary) {
        self.batches.write().insert(summary.id, summary);
    }

    pub fn get_batch(&self, id: &Uuid) -> Option<BatchSummary> {
        self.batches.read().get(id).cloned()
    }

    /// All known batches, newest first.
    pub fn all_batches(&self) -> Vec<BatchSummary> {
        let mut batches: Vec<BatchSummary> = self.batches.read().values().cloned().collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        batches
    }
}
