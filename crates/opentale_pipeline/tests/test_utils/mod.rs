//! Test utilities for OpenTale pipeline tests.
//!
//! This module provides a scripted generation service and test helpers.

pub mod mock_service;

#[allow(unused_imports)]
pub use mock_service::{MockResponse, MockService, RecordedCall};

use opentale_core::StreamEvent;
use opentale_pipeline::ContextStore;
use opentale_storage::InMemoryArtifactStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A fresh in-memory backend and a store for project "test".
#[allow(dead_code)]
pub fn memory_store() -> (Arc<InMemoryArtifactStore>, Arc<ContextStore>) {
    let backend = Arc::new(InMemoryArtifactStore::new());
    let store = Arc::new(ContextStore::new("test", backend.clone()));
    (backend, store)
}

/// Drain every event currently queued or sent until the channel closes.
#[allow(dead_code)]
pub async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// Concatenated content of the delta events.
#[allow(dead_code)]
pub fn delta_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter(|event| !event.is_heartbeat() && !event.is_done())
        .map(|event| event.content().as_str())
        .collect()
}
