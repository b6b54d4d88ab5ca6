//! Version axis for function lookups
//!
//! A function locator is evaluated once per supported Kubernetes minor. The
//! axis holds one value per minor, represented by its latest patch release.

use semver::Version;
use std::collections::BTreeMap;
use std::fmt;

use super::versioning::DEFAULT_KUBERNETES_VERSIONING;

/// Axis label for results that do not depend on the Kubernetes version
pub const UNVERSIONED: &str = "*";

/// One supported minor line and its latest patch release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisValue {
    /// `"<major>.<minor>"`, used as the version map key
    pub label: String,
    pub version: Version,
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version)
    }
}

/// Ordered, deduplicated set of axis values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionAxis {
    values: Vec<AxisValue>,
}

impl VersionAxis {
    /// Axis built from the platform's supported Kubernetes releases
    pub fn supported() -> Self {
        Self::from_versions(DEFAULT_KUBERNETES_VERSIONING.versions)
    }

    /// Keep the latest patch of every minor line, ordered by minor
    pub fn from_versions(versions: &[Version]) -> Self {
        let mut latest: BTreeMap<(u64, u64), &Version> = BTreeMap::new();

        for version in versions {
            let entry = latest.entry((version.major, version.minor)).or_insert(version);
            if *entry < version {
                *entry = version;
            }
        }

        let values = latest
            .into_iter()
            .map(|((major, minor), version)| AxisValue {
                label: format!("{}.{}", major, minor),
                version: version.clone(),
            })
            .collect();

        Self { values }
    }

    pub fn values(&self) -> &[AxisValue] {
        &self.values
    }

    pub fn labels(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
