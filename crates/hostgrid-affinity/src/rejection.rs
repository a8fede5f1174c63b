//! Rejection records and the sink they are delivered to.
//!
//! A rejection is a normal outcome, not an error. The chain emits exactly
//! one record per rejected host (the first failing filter's) so operators
//! can answer "why did host X not get instance Y" from the audit stream.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

use hostgrid_state::HostId;

use crate::config::FilterKind;

/// Structured explanation for a rejected host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Which filter rejected the host.
    pub filter: FilterKind,
    pub host_id: HostId,
    /// Short stable category, e.g. `co-location conflict`.
    pub reason: String,
    /// Human-readable specifics (ids, networks, hints involved).
    pub detail: String,
}

/// Side channel receiving rejection explanations.
///
/// Implementations must tolerate concurrent `record` calls: many candidate
/// hosts are evaluated in flight for the same request.
pub trait RejectionSink: Send + Sync {
    fn record(&self, rejection: &Rejection);
}

/// Sink that forwards rejections to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RejectionSink for TracingSink {
    fn record(&self, rejection: &Rejection) {
        info!(
            filter = %rejection.filter,
            host = %rejection.host_id,
            reason = %rejection.reason,
            detail = %rejection.detail,
            "host rejected"
        );
    }
}

/// Sink that buffers rejections in memory, for tests and audit batching.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Rejection>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<Rejection> {
        self.records.lock().expect("rejection sink poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("rejection sink poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RejectionSink for MemorySink {
    fn record(&self, rejection: &Rejection) {
        self.records
            .lock()
            .expect("rejection sink poisoned")
            .push(rejection.clone());
    }
}
