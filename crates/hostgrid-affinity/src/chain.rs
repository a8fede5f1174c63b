//! Ordered filter chain with short-circuit evaluation.

use std::sync::Arc;

use tracing::{debug, warn};

use hostgrid_state::{HostState, PlacementSpec};

use crate::config::ChainConfig;
use crate::error::FilterResult;
use crate::filter::{ConstraintFilter, Verdict};
use crate::rejection::RejectionSink;

/// Runs a configured sequence of [`ConstraintFilter`]s over candidate hosts.
///
/// Filters are stateless and independent, so their order never changes the
/// final verdict — only which explanation a multiply-violating host surfaces
/// (the first rejecting filter's, and only that one reaches the sink).
/// Evaluation is read-only over the snapshots; one chain may serve many
/// concurrent `(host, spec)` evaluations.
pub struct FilterChain {
    filters: Vec<ConstraintFilter>,
    sink: Arc<dyn RejectionSink>,
}

impl FilterChain {
    /// Build a chain from an explicit, statically-ordered filter list.
    pub fn new(filters: Vec<ConstraintFilter>, sink: Arc<dyn RejectionSink>) -> Self {
        Self { filters, sink }
    }

    /// Build a chain from configuration (see [`ChainConfig`]).
    pub fn from_config(config: &ChainConfig, sink: Arc<dyn RejectionSink>) -> Self {
        let filters = config.filters.iter().map(|kind| kind.build()).collect();
        Self::new(filters, sink)
    }

    /// Evaluate all filters in order for one candidate host.
    ///
    /// Returns `Ok(true)` iff every filter accepts. The first rejecting
    /// filter short-circuits the chain: later filters do not run, and its
    /// explanation is the one delivered to the sink. `Err` carries a
    /// configuration problem (malformed hint); nothing reaches the sink in
    /// that case because the host was never legitimately rejected.
    pub fn passes(&self, host: &HostState, spec: &PlacementSpec) -> FilterResult<bool> {
        for filter in &self.filters {
            match filter.evaluate(host, spec)? {
                Verdict::Accept => {}
                Verdict::Reject(rejection) => {
                    debug!(
                        filter = %rejection.filter,
                        host = %host.host_id,
                        instance = %spec.instance_id,
                        "constraint rejected host"
                    );
                    self.sink.record(&rejection);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Evaluate every candidate host, returning the ids of hosts that pass.
    ///
    /// Stops at the first configuration error: a malformed hint invalidates
    /// the whole request, not just one host.
    pub fn filter_hosts<'a>(
        &self,
        hosts: impl IntoIterator<Item = &'a HostState>,
        spec: &PlacementSpec,
    ) -> FilterResult<Vec<&'a HostState>> {
        let mut passing = Vec::new();
        let mut rejected = 0usize;
        for host in hosts {
            if self.passes(host, spec)? {
                passing.push(host);
            } else {
                rejected += 1;
            }
        }
        if passing.is_empty() && rejected > 0 {
            warn!(
                instance = %spec.instance_id,
                rejected,
                "no candidate host satisfies the placement constraints"
            );
        }
        Ok(passing)
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
