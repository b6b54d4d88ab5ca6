//! Platform support policy consumed by the reporter

pub mod axis;
pub mod versioning;

pub use axis::{AxisValue, UNVERSIONED, VersionAxis};
pub use versioning::{DEFAULT_KUBERNETES_VERSIONING, KubernetesVersioning};
