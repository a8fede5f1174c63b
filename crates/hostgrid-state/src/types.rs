//! Domain types for placement snapshots.
//!
//! These types describe the state the affinity evaluator reads: which
//! instances live on a candidate host, and what relational constraints the
//! request carries (scheduler hints plus server-group membership).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// Unique identifier for a host (physical or virtual node).
pub type HostId = String;

/// Unique identifier for an instance.
pub type InstanceId = String;

// ── Host snapshot ──────────────────────────────────────────────────

/// Per-host snapshot taken once per placement request.
///
/// `resident_instances` reflects the host at filter-chain invocation time;
/// one request may check many candidate hosts against snapshots taken
/// together, so the set is stable for the duration of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostState {
    pub host_id: HostId,
    /// Network address of the host, used for CIDR proximity checks.
    pub host_ip: IpAddr,
    /// Instances currently placed on this host.
    pub resident_instances: HashSet<InstanceId>,
}

impl HostState {
    pub fn new(host_id: impl Into<HostId>, host_ip: IpAddr) -> Self {
        Self {
            host_id: host_id.into(),
            host_ip,
            resident_instances: HashSet::new(),
        }
    }

    /// Add a resident instance (builder-style, for orchestrator and tests).
    pub fn with_instance(mut self, instance_id: impl Into<InstanceId>) -> Self {
        self.resident_instances.insert(instance_id.into());
        self
    }

    /// Whether the given instance is currently placed on this host.
    pub fn hosts_instance(&self, instance_id: &str) -> bool {
        self.resident_instances.contains(instance_id)
    }
}

// ── Placement request ──────────────────────────────────────────────

/// One scheduling request for one instance.
///
/// The instance may already exist elsewhere in the cluster (move and rebuild
/// operations re-run placement for a live instance).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacementSpec {
    pub instance_id: InstanceId,
    #[serde(default)]
    pub hints: SchedulerHints,
    /// Present only when the instance belongs to a server group.
    #[serde(default)]
    pub instance_group: Option<InstanceGroup>,
}

impl PlacementSpec {
    pub fn new(instance_id: impl Into<InstanceId>) -> Self {
        Self {
            instance_id: instance_id.into(),
            hints: SchedulerHints::default(),
            instance_group: None,
        }
    }

    pub fn with_hints(mut self, hints: SchedulerHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_group(mut self, group: InstanceGroup) -> Self {
        self.instance_group = Some(group);
        self
    }
}

/// Typed view of the orchestrator-validated scheduler hint map.
///
/// Unrecognized hint keys are dropped on deserialization rather than
/// rejected — the hint schema is owned by the orchestrator and may grow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SchedulerHints {
    /// Instances this request must NOT share a host with.
    #[serde(default)]
    pub different_host: Vec<InstanceId>,
    /// Instances this request must share a host with (any one suffices).
    #[serde(default)]
    pub same_host: Vec<InstanceId>,
    /// Network mask suffix for CIDR proximity, e.g. `/24`.
    #[serde(default)]
    pub cidr: Option<String>,
    /// Base IP for CIDR proximity; absent means the constraint is off.
    #[serde(default)]
    pub build_near_host_ip: Option<String>,
}

impl SchedulerHints {
    pub fn is_empty(&self) -> bool {
        self.different_host.is_empty()
            && self.same_host.is_empty()
            && self.cidr.is_none()
            && self.build_near_host_ip.is_none()
    }
}

/// Compact `key=value` rendering used in rejection diagnostics.
impl fmt::Display for SchedulerHints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.different_host.is_empty() {
            parts.push(format!("different_host={}", self.different_host.join(",")));
        }
        if !self.same_host.is_empty() {
            parts.push(format!("same_host={}", self.same_host.join(",")));
        }
        if let Some(cidr) = &self.cidr {
            parts.push(format!("cidr={cidr}"));
        }
        if let Some(ip) = &self.build_near_host_ip {
            parts.push(format!("build_near_host_ip={ip}"));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

// ── Server groups ──────────────────────────────────────────────────

/// Placement policy attached to a server group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPolicy {
    /// Members must land on a host already used by the group.
    Affinity,
    /// Members must land on hosts not used by the group.
    AntiAffinity,
}

impl fmt::Display for GroupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Affinity => f.write_str("affinity"),
            Self::AntiAffinity => f.write_str("anti-affinity"),
        }
    }
}

/// Server-group membership as seen by one placement request.
///
/// `member_hosts` is empty until at least one group member has been placed;
/// ordering is whatever the membership service reports and is not
/// significant to the evaluator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceGroup {
    pub policies: HashSet<GroupPolicy>,
    /// Hosts already occupied by members of this group.
    pub member_hosts: Vec<HostId>,
}

impl InstanceGroup {
    pub fn new(policy: GroupPolicy) -> Self {
        Self {
            policies: HashSet::from([policy]),
            member_hosts: Vec::new(),
        }
    }

    pub fn with_member_host(mut self, host_id: impl Into<HostId>) -> Self {
        self.member_hosts.push(host_id.into());
        self
    }

    pub fn has_policy(&self, policy: GroupPolicy) -> bool {
        self.policies.contains(&policy)
    }
}
