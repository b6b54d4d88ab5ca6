//! Kubernetes versions supported by the platform
//!
//! This is the single place the supported release list lives. Cluster
//! defaulting and the version reporter both read it; do not keep a copy.

use semver::Version;

/// Default and supported Kubernetes releases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubernetesVersioning {
    /// Version new clusters get when none is requested
    pub default: Version,

    /// Every supported patch release, grouped by minor
    pub versions: &'static [Version],
}

pub static DEFAULT_KUBERNETES_VERSIONING: KubernetesVersioning = KubernetesVersioning {
    default: Version::new(1, 25, 6),
    // NB: We keep all patch releases that we supported, even if there's
    // an auto-upgrade rule in place, so clusters still running them
    // keep reconciling.
    versions: &[
        // Kubernetes 1.24
        Version::new(1, 24, 3),
        Version::new(1, 24, 6),
        Version::new(1, 24, 8),
        Version::new(1, 24, 9),
        Version::new(1, 24, 10),
        // Kubernetes 1.25
        Version::new(1, 25, 2),
        Version::new(1, 25, 4),
        Version::new(1, 25, 5),
        Version::new(1, 25, 6),
        // Kubernetes 1.26
        Version::new(1, 26, 1),
    ],
};
