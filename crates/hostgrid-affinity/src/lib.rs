//! hostgrid-affinity — relational placement constraints for HostGrid.
//!
//! Given a candidate [`HostState`](hostgrid_state::HostState) and the
//! request's [`PlacementSpec`](hostgrid_state::PlacementSpec), this crate
//! decides whether the host satisfies the request's relational rules:
//! co-location (`same_host`), anti-co-location (`different_host`), network
//! proximity (`build_near_host_ip` + `cidr`), and server-group
//! affinity/anti-affinity policies. It does NOT discover hosts, check
//! resource fit, or rank passing hosts (that's the orchestrator's filtering
//! and weighing stages). It is a pure in-process library: no I/O, no
//! blocking, safe to call concurrently across candidate hosts.
//!
//! # Components
//!
//! - **`filter`** — one [`ConstraintFilter`] variant per constraint kind
//! - **`chain`** — [`FilterChain`], ordered short-circuit evaluation
//! - **`rejection`** — structured rejection records and the [`RejectionSink`]
//!   side channel for operator-facing explanations
//! - **`config`** — filter names and chain configuration
//! - **`cidr`** — IP network parsing and membership
//! - **`error`** — configuration-error taxonomy (a reject verdict is NOT an
//!   error; malformed hint input is)

pub mod chain;
pub mod cidr;
pub mod config;
pub mod error;
pub mod filter;
pub mod rejection;

pub use chain::FilterChain;
pub use cidr::IpNetwork;
pub use config::{ChainConfig, FilterKind};
pub use error::{FilterError, FilterResult};
pub use filter::{ConstraintFilter, Verdict};
pub use rejection::{MemorySink, Rejection, RejectionSink, TracingSink};
