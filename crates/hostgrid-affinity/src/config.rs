//! Filter names and chain configuration.
//!
//! The orchestrator configures the chain as an ordered list of filter names.
//! There is no plugin discovery: names map statically to the variants in
//! [`crate::filter::ConstraintFilter`], and unknown names are configuration
//! errors at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hostgrid_state::GroupPolicy;

use crate::error::FilterError;
use crate::filter::ConstraintFilter;

/// Identifier of a constraint filter, as used in configuration and in
/// rejection records. Wire names are kebab-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    DifferentHost,
    SameHost,
    CidrAffinity,
    GroupAffinity,
    GroupAntiAffinity,
}

impl FilterKind {
    /// All recognized filters, in the default chain order.
    pub const ALL: [Self; 5] = [
        Self::DifferentHost,
        Self::SameHost,
        Self::CidrAffinity,
        Self::GroupAffinity,
        Self::GroupAntiAffinity,
    ];

    /// Wire name, e.g. `group-anti-affinity`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DifferentHost => "different-host",
            Self::SameHost => "same-host",
            Self::CidrAffinity => "cidr-affinity",
            Self::GroupAffinity => "group-affinity",
            Self::GroupAntiAffinity => "group-anti-affinity",
        }
    }

    /// Instantiate the evaluator for this filter kind.
    pub fn build(self) -> ConstraintFilter {
        match self {
            Self::DifferentHost => ConstraintFilter::DifferentHost,
            Self::SameHost => ConstraintFilter::SameHost,
            Self::CidrAffinity => ConstraintFilter::CidrAffinity,
            Self::GroupAffinity => ConstraintFilter::Group(GroupPolicy::Affinity),
            Self::GroupAntiAffinity => ConstraintFilter::Group(GroupPolicy::AntiAffinity),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}

/// Ordered filter sequence for a [`crate::FilterChain`].
///
/// Order never changes the final verdict (filters are independent) but does
/// decide which rejection explanation a multiply-violating host surfaces:
/// first rejection wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_filters")]
    pub filters: Vec<FilterKind>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { filters: default_filters() }
    }
}

fn default_filters() -> Vec<FilterKind> {
    FilterKind::ALL.to_vec()
}
