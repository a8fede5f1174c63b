//! hostgrid-state — snapshot types for the HostGrid placement layer.
//!
//! The placement orchestrator constructs one [`PlacementSpec`] per scheduling
//! request and one [`HostState`] per candidate host, then hands both to the
//! affinity evaluator (`hostgrid-affinity`). All types here are immutable
//! snapshots: the evaluator reads them, never mutates them, and they are
//! discarded when the scheduling attempt completes.
//!
//! All types are JSON-serializable so the orchestrator can ship snapshots
//! across its own internal boundaries unchanged.

pub mod types;

pub use types::{
    GroupPolicy, HostId, HostState, InstanceGroup, InstanceId, PlacementSpec, SchedulerHints,
};
