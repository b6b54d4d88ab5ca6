//! Version functions evaluated per Kubernetes minor

use anyhow::Result;
use std::collections::BTreeMap;

use super::{ResolutionError, VersionMap};
use crate::platform::{AxisValue, VersionAxis};

/// Computes a component version for one Kubernetes release
pub type VersionFunction = Box<dyn Fn(&AxisValue) -> Result<String>>;

/// Closed set of version functions available to function locators
#[derive(Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, VersionFunction>,
}

impl FunctionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the platform's version functions
    pub fn builtin() -> Self {
        Self::new()
            .register("CRIToolsRelease", cri_tools_release)
            .register("EtcdImageTag", etcd_image_tag)
    }

    pub fn register<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&AxisValue) -> Result<String> + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<&VersionFunction> {
        self.functions.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

/// Evaluate `name` for every axis value, in axis order
///
/// The first failing invocation aborts the whole lookup.
pub fn invoke(
    registry: &FunctionRegistry,
    name: &str,
    axis: &VersionAxis,
) -> Result<VersionMap, ResolutionError> {
    let function = registry
        .get(name)
        .ok_or_else(|| ResolutionError::UnknownFunction {
            function: name.to_string(),
            known: registry.names().join(", "),
        })?;

    let mut versions = VersionMap::new();
    for value in axis.values() {
        let version = function(value).map_err(|err| ResolutionError::Invocation {
            function: name.to_string(),
            axis: value.to_string(),
            message: format!("{:#}", err),
        })?;

        tracing::trace!(function = name, axis = %value, "{}", version);
        versions.insert(value.label.clone(), version);
    }

    Ok(versions)
}

/// cri-tools release mirrored for nodes of the given Kubernetes minor
fn cri_tools_release(axis: &AxisValue) -> Result<String> {
    let release = match axis.label.as_str() {
        "1.32" => "v1.32.0",
        "1.31" => "v1.31.1",
        "1.30" => "v1.30.1",
        "1.29" => "v1.29.0",
        "1.28" => "v1.28.0",
        "1.27" => "v1.27.1",
        "1.26" => "v1.26.1",
        "1.25" => "v1.25.0",
        "1.24" => "v1.24.2",
        _ => "v1.32.0",
    };

    Ok(release.to_string())
}

const ETCD_IMAGE_TAG_V33: &str = "v3.3.18";
const ETCD_IMAGE_TAG_V34: &str = "v3.4.3";

/// etcd image tag used for user cluster control planes
fn etcd_image_tag(axis: &AxisValue) -> Result<String> {
    let tag = if axis.version.minor < 17 {
        ETCD_IMAGE_TAG_V33
    } else {
        ETCD_IMAGE_TAG_V34
    };

    Ok(tag.to_string())
}
