//! Resolver dispatch
//!
//! Routes an occurrence to the backend matching its locator and returns the
//! resolved version map. Every backend failure is reported as a
//! [`ResolutionError`] scoped to that one occurrence.

pub mod chart;
pub mod constant;
pub mod document;
pub mod function;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{Locator, Occurrence};
use crate::platform::{UNVERSIONED, VersionAxis};

pub use constant::{ConstantReader, GoSourceReader};
pub use function::{FunctionRegistry, VersionFunction};

/// Axis label to version string
pub type VersionMap = BTreeMap<String, String>;

/// Failure to resolve a single occurrence
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("{what} not found in {location}")]
    NotFound { what: String, location: String },

    #[error("unknown function '{function}' (registered: {known})")]
    UnknownFunction { function: String, known: String },

    #[error("function '{function}' failed for Kubernetes {axis}: {message}")]
    Invocation {
        function: String,
        axis: String,
        message: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("value at '{value_path}' in {} is not a scalar", .path.display())]
    NotAScalar { path: PathBuf, value_path: String },

    #[error("constant {constant} in {package} has no constant string or literal value: {expression}")]
    UnsupportedConstant {
        package: String,
        constant: String,
        expression: String,
    },

    #[error("cannot locate Go package {package}: {reason}")]
    Package { package: String, reason: String },
}

/// Dispatches occurrences to their backends
pub struct Resolver {
    root: PathBuf,
    constants: Box<dyn ConstantReader>,
    functions: FunctionRegistry,
    axis: VersionAxis,
}

impl Resolver {
    pub fn new(
        root: impl Into<PathBuf>,
        constants: Box<dyn ConstantReader>,
        functions: FunctionRegistry,
        axis: VersionAxis,
    ) -> Self {
        Self {
            root: root.into(),
            constants,
            functions,
            axis,
        }
    }

    /// Resolver reading Go sources under `root`, with the built-in functions
    /// and the platform's supported Kubernetes versions
    pub fn for_repository(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self::new(
            root.clone(),
            Box::new(GoSourceReader::new(root)),
            FunctionRegistry::builtin(),
            VersionAxis::supported(),
        )
    }

    pub fn axis(&self) -> &VersionAxis {
        &self.axis
    }

    /// Resolve one occurrence
    pub fn resolve(&mut self, occurrence: &Occurrence) -> Result<VersionMap, ResolutionError> {
        tracing::debug!(locator = %occurrence.locator, "resolving");

        match &occurrence.locator {
            Locator::GoConstant(c) => {
                let value = self.constants.read(&c.package, &c.constant)?;
                Ok(unversioned(value))
            }
            Locator::GoFunction(f) => function::invoke(&self.functions, &f.function, &self.axis),
            Locator::HelmChart(c) => {
                let directory = anchor(&self.root, &c.directory);
                let value = if c.value_path.is_empty() {
                    chart::app_version(&directory)?
                } else {
                    chart::default_value(&directory, &c.value_path)?
                };
                Ok(unversioned(value))
            }
            Locator::YamlFile(f) => {
                let value = document::read_value(&anchor(&self.root, &f.file), &f.value_path)?;
                Ok(unversioned(value))
            }
        }
    }
}

/// Version map holding a single, version-independent value
pub fn unversioned(value: String) -> VersionMap {
    VersionMap::from([(UNVERSIONED.to_string(), value)])
}

/// Resolve `path` against the repository root unless it is absolute
pub(crate) fn anchor(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
