//! Constraint evaluators, one variant per placement rule.
//!
//! Every filter is a pure function of the `(HostState, PlacementSpec)`
//! snapshot pair: no shared state, no I/O, identical inputs always produce
//! the identical verdict and explanation. An unconfigured constraint (hint
//! or policy absent) accepts unconditionally.

use tracing::debug;

use hostgrid_state::{GroupPolicy, HostState, InstanceId, PlacementSpec};

use crate::cidr::IpNetwork;
use crate::config::FilterKind;
use crate::error::FilterResult;
use crate::rejection::Rejection;

/// Default network mask when the `cidr` hint is absent.
const DEFAULT_CIDR: &str = "/24";

/// Outcome of one filter against one host.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// One relational placement constraint.
///
/// Group affinity and anti-affinity share the membership lookup and differ
/// only in predicate polarity plus the anti-affinity move carve-out, so both
/// are the `Group` variant parameterized by [`GroupPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintFilter {
    /// Keep the instance off hosts running any `different_host` hint target.
    DifferentHost,
    /// Keep the instance with at least one `same_host` hint target.
    SameHost,
    /// Keep the instance inside the `build_near_host_ip`/`cidr` network.
    CidrAffinity,
    /// Server-group placement policy.
    Group(GroupPolicy),
}

impl ConstraintFilter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::DifferentHost => FilterKind::DifferentHost,
            Self::SameHost => FilterKind::SameHost,
            Self::CidrAffinity => FilterKind::CidrAffinity,
            Self::Group(GroupPolicy::Affinity) => FilterKind::GroupAffinity,
            Self::Group(GroupPolicy::AntiAffinity) => FilterKind::GroupAntiAffinity,
        }
    }

    /// Evaluate this constraint for one candidate host.
    ///
    /// `Err` means the hint input was malformed (a bad request, surfaced to
    /// the caller); a failed constraint is the `Ok(Verdict::Reject(_))` path.
    pub fn evaluate(&self, host: &HostState, spec: &PlacementSpec) -> FilterResult<Verdict> {
        match self {
            Self::DifferentHost => Ok(self.different_host(host, spec)),
            Self::SameHost => Ok(self.same_host(host, spec)),
            Self::CidrAffinity => self.cidr_affinity(host, spec),
            Self::Group(policy) => Ok(self.group_policy(*policy, host, spec)),
        }
    }

    fn different_host(&self, host: &HostState, spec: &PlacementSpec) -> Verdict {
        let avoid = &spec.hints.different_host;
        if avoid.is_empty() {
            return Verdict::Accept;
        }
        let overlap: Vec<&InstanceId> =
            avoid.iter().filter(|id| host.hosts_instance(id)).collect();
        if overlap.is_empty() {
            return Verdict::Accept;
        }
        self.reject(
            host,
            "co-location conflict",
            format!(
                "found in hosts: {}",
                overlap
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        )
    }

    fn same_host(&self, host: &HostState, spec: &PlacementSpec) -> Verdict {
        let required = &spec.hints.same_host;
        if required.is_empty() {
            return Verdict::Accept;
        }
        if required.iter().any(|id| host.hosts_instance(id)) {
            return Verdict::Accept;
        }
        self.reject(
            host,
            "required co-location missing",
            format!("not found in hosts: {}", required.join(",")),
        )
    }

    fn cidr_affinity(&self, host: &HostState, spec: &PlacementSpec) -> FilterResult<Verdict> {
        // A bare `cidr` hint with no base IP is inert: nothing to be near.
        let Some(base_ip) = &spec.hints.build_near_host_ip else {
            return Ok(Verdict::Accept);
        };
        let suffix = spec.hints.cidr.as_deref().unwrap_or(DEFAULT_CIDR);
        let network = IpNetwork::parse(base_ip, suffix)?;
        if network.contains(host.host_ip) {
            return Ok(Verdict::Accept);
        }
        Ok(self.reject(
            host,
            "outside affinity network",
            format!("host ip {} not in network {network}", host.host_ip),
        ))
    }

    fn group_policy(&self, policy: GroupPolicy, host: &HostState, spec: &PlacementSpec) -> Verdict {
        let Some(group) = &spec.instance_group else {
            return Verdict::Accept;
        };
        if !group.has_policy(policy) {
            return Verdict::Accept;
        }
        // Move and rebuild re-run placement for a live instance. The source
        // host must stay a valid destination, so anti-affinity exempts the
        // host the instance already occupies. Affinity needs no carve-out:
        // matching the source host is the wanted outcome there.
        if policy == GroupPolicy::AntiAffinity && host.hosts_instance(&spec.instance_id) {
            return Verdict::Accept;
        }
        if group.member_hosts.is_empty() {
            return Verdict::Accept;
        }

        let occupied = group.member_hosts.contains(&host.host_id);
        debug!(
            policy = %policy,
            host = %host.host_id,
            members = ?group.member_hosts,
            "server group membership check"
        );
        match policy {
            GroupPolicy::AntiAffinity if occupied => self.reject(
                host,
                "anti-affinity server group conflict",
                format!(
                    "host already used by the group: {}, hint={}",
                    group.member_hosts.join(", "),
                    spec.hints
                ),
            ),
            GroupPolicy::Affinity if !occupied => self.reject(
                host,
                "affinity server group mismatch",
                format!(
                    "not found in: {}, hint={}",
                    group.member_hosts.join(", "),
                    spec.hints
                ),
            ),
            _ => Verdict::Accept,
        }
    }

    fn reject(&self, host: &HostState, reason: &str, detail: String) -> Verdict {
        Verdict::Reject(Rejection {
            filter: self.kind(),
            host_id: host.host_id.clone(),
            reason: reason.to_string(),
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostgrid_state::{InstanceGroup, SchedulerHints};

    fn make_host(id: &str, ip: &str, residents: &[&str]) -> HostState {
        let mut host = HostState::new(id, ip.parse().unwrap());
        for instance in residents {
            host = host.with_instance(*instance);
        }
        host
    }

    fn hinted(hints: SchedulerHints) -> PlacementSpec {
        PlacementSpec::new("i-new").with_hints(hints)
    }

    fn ids(list: &[&str]) -> Vec<InstanceId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_filters_accept_without_hints_or_group() {
        let host = make_host("h1", "10.0.0.7", &["i-a", "i-b"]);
        let spec = PlacementSpec::new("i-new");
        for kind in FilterKind::ALL {
            let verdict = kind.build().evaluate(&host, &spec).unwrap();
            assert!(verdict.is_accept(), "{kind} should accept with no config");
        }
    }

    #[test]
    fn different_host_rejects_on_overlap() {
        let host = make_host("h1", "10.0.0.7", &["i-a", "i-b"]);
        let spec = hinted(SchedulerHints {
            different_host: ids(&["i-b", "i-c"]),
            ..Default::default()
        });
        let verdict = ConstraintFilter::DifferentHost.evaluate(&host, &spec).unwrap();
        let Verdict::Reject(rejection) = verdict else {
            panic!("expected reject");
        };
        assert_eq!(rejection.filter, FilterKind::DifferentHost);
        assert_eq!(rejection.host_id, "h1");
        // Only the overlapping id, not every hinted id.
        assert_eq!(rejection.detail, "found in hosts: i-b");
    }

    #[test]
    fn different_host_accepts_without_overlap() {
        let host = make_host("h1", "10.0.0.7", &["i-a", "i-b"]);
        let spec = hinted(SchedulerHints {
            different_host: ids(&["i-d"]),
            ..Default::default()
        });
        assert!(ConstraintFilter::DifferentHost
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn same_host_accepts_on_any_overlap() {
        let host = make_host("h1", "10.0.0.7", &["i-a", "i-b"]);
        let spec = hinted(SchedulerHints {
            same_host: ids(&["i-b", "i-c"]),
            ..Default::default()
        });
        assert!(ConstraintFilter::SameHost.evaluate(&host, &spec).unwrap().is_accept());
    }

    #[test]
    fn same_host_rejects_when_no_target_is_resident() {
        let host = make_host("h1", "10.0.0.7", &["i-a", "i-b"]);
        let spec = hinted(SchedulerHints {
            same_host: ids(&["i-d"]),
            ..Default::default()
        });
        let Verdict::Reject(rejection) =
            ConstraintFilter::SameHost.evaluate(&host, &spec).unwrap()
        else {
            panic!("expected reject");
        };
        assert_eq!(rejection.detail, "not found in hosts: i-d");
    }

    #[test]
    fn cidr_accepts_host_inside_network() {
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = hinted(SchedulerHints {
            build_near_host_ip: Some("10.0.0.1".into()),
            cidr: Some("/24".into()),
            ..Default::default()
        });
        assert!(ConstraintFilter::CidrAffinity
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn cidr_rejects_host_outside_network() {
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = hinted(SchedulerHints {
            build_near_host_ip: Some("10.1.0.1".into()),
            cidr: Some("/24".into()),
            ..Default::default()
        });
        let Verdict::Reject(rejection) =
            ConstraintFilter::CidrAffinity.evaluate(&host, &spec).unwrap()
        else {
            panic!("expected reject");
        };
        assert_eq!(rejection.detail, "host ip 10.0.0.7 not in network 10.1.0.0/24");
    }

    #[test]
    fn cidr_defaults_to_slash_24() {
        let host = make_host("h1", "10.0.0.200", &[]);
        let spec = hinted(SchedulerHints {
            build_near_host_ip: Some("10.0.0.1".into()),
            ..Default::default()
        });
        assert!(ConstraintFilter::CidrAffinity
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn cidr_without_base_ip_accepts() {
        // Original behavior: a bare mask constrains nothing.
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = hinted(SchedulerHints {
            cidr: Some("/16".into()),
            ..Default::default()
        });
        assert!(ConstraintFilter::CidrAffinity
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn malformed_hint_ip_is_a_configuration_error() {
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = hinted(SchedulerHints {
            build_near_host_ip: Some("not-an-ip".into()),
            ..Default::default()
        });
        assert!(ConstraintFilter::CidrAffinity.evaluate(&host, &spec).is_err());
    }

    #[test]
    fn anti_affinity_rejects_occupied_host() {
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = PlacementSpec::new("i-y")
            .with_group(InstanceGroup::new(GroupPolicy::AntiAffinity).with_member_host("h1"));
        let Verdict::Reject(rejection) = ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &spec)
            .unwrap()
        else {
            panic!("expected reject");
        };
        assert_eq!(rejection.filter, FilterKind::GroupAntiAffinity);
        assert!(rejection.detail.contains("h1"));
    }

    #[test]
    fn anti_affinity_exempts_the_move_source_host() {
        // Instance i-x lives on h1; re-placing i-x must not reject h1 even
        // though h1 is in the group's member hosts.
        let host = make_host("h1", "10.0.0.7", &["i-x"]);
        let spec = PlacementSpec::new("i-x")
            .with_group(InstanceGroup::new(GroupPolicy::AntiAffinity).with_member_host("h1"));
        assert!(ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());

        // A different instance of the same group still gets rejected there.
        let other = PlacementSpec::new("i-y")
            .with_group(InstanceGroup::new(GroupPolicy::AntiAffinity).with_member_host("h1"));
        assert!(!ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &other)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn anti_affinity_accepts_unoccupied_host() {
        let host = make_host("h3", "10.0.0.9", &[]);
        let spec = PlacementSpec::new("i-y").with_group(
            InstanceGroup::new(GroupPolicy::AntiAffinity)
                .with_member_host("h1")
                .with_member_host("h2"),
        );
        assert!(ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn affinity_requires_membership() {
        let group = InstanceGroup::new(GroupPolicy::Affinity)
            .with_member_host("h1")
            .with_member_host("h2");
        let spec = PlacementSpec::new("i-y").with_group(group);
        let filter = ConstraintFilter::Group(GroupPolicy::Affinity);

        let member = make_host("h1", "10.0.0.7", &[]);
        assert!(filter.evaluate(&member, &spec).unwrap().is_accept());

        let outsider = make_host("h3", "10.0.0.9", &[]);
        let Verdict::Reject(rejection) = filter.evaluate(&outsider, &spec).unwrap() else {
            panic!("expected reject");
        };
        assert_eq!(rejection.filter, FilterKind::GroupAffinity);
        assert!(rejection.detail.contains("h1, h2"));
    }

    #[test]
    fn group_filters_accept_while_no_member_is_placed() {
        let spec =
            PlacementSpec::new("i-y").with_group(InstanceGroup::new(GroupPolicy::Affinity));
        let host = make_host("h9", "10.0.0.9", &[]);
        assert!(ConstraintFilter::Group(GroupPolicy::Affinity)
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn group_filter_ignores_unrequested_policy() {
        let spec = PlacementSpec::new("i-y")
            .with_group(InstanceGroup::new(GroupPolicy::Affinity).with_member_host("h1"));
        // Anti-affinity not requested: the occupied host is fine.
        let host = make_host("h1", "10.0.0.7", &[]);
        assert!(ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &spec)
            .unwrap()
            .is_accept());
    }

    #[test]
    fn group_rejection_detail_includes_hints() {
        let host = make_host("h1", "10.0.0.7", &[]);
        let spec = PlacementSpec::new("i-y")
            .with_hints(SchedulerHints {
                same_host: ids(&["i-a"]),
                ..Default::default()
            })
            .with_group(InstanceGroup::new(GroupPolicy::AntiAffinity).with_member_host("h1"));
        let Verdict::Reject(rejection) = ConstraintFilter::Group(GroupPolicy::AntiAffinity)
            .evaluate(&host, &spec)
            .unwrap()
        else {
            panic!("expected reject");
        };
        assert!(rejection.detail.contains("hint={same_host=i-a}"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let host = make_host("h1", "10.0.0.7", &["i-b"]);
        let spec = hinted(SchedulerHints {
            different_host: ids(&["i-b"]),
            ..Default::default()
        });
        let first = ConstraintFilter::DifferentHost.evaluate(&host, &spec).unwrap();
        let second = ConstraintFilter::DifferentHost.evaluate(&host, &spec).unwrap();
        assert_eq!(first, second);
    }
}
