//! Inventory document parsing and validation
//!
//! The inventory lists every product whose version is tracked and, for each
//! product, the places (occurrences) where that version is declared. Parsing
//! is strict: unknown fields are rejected at every level and an occurrence
//! must name exactly one locator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::resolve::VersionMap;

/// Errors raised while loading or validating an inventory document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read inventory {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inventory {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("product #{index} has no name")]
    MissingName { index: usize },

    #[error("product '{product}' has no source URL")]
    MissingSource { product: String },

    #[error(
        "product '{product}', occurrence {occurrence}: no locator set (expected one of goConstant, goFunction, helmChart, yamlFile)"
    )]
    NoLocator { product: String, occurrence: usize },

    #[error("product '{product}', occurrence {occurrence}: multiple locators set ({kinds})")]
    MultipleLocators {
        product: String,
        occurrence: usize,
        kinds: String,
    },
}

/// Reads a top-level constant from a Go package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantLocator {
    pub package: String,
    pub constant: String,
}

/// Invokes a registered version function once per supported Kubernetes minor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionLocator {
    pub function: String,
}

/// Reads a Helm chart's appVersion, or a path from its default values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ChartLocator {
    pub directory: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_path: String,
}

/// Reads a value path from an arbitrary YAML or JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct FileLocator {
    pub file: String,
    pub value_path: String,
}

/// Where a version value can be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Locator {
    GoConstant(ConstantLocator),
    GoFunction(FunctionLocator),
    HelmChart(ChartLocator),
    YamlFile(FileLocator),
}

/// Why a set of locator fields did not form a single locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    Missing,
    Ambiguous(Vec<&'static str>),
}

impl Locator {
    /// Build a locator from the optional schema fields, requiring exactly one
    pub fn from_parts(
        go_constant: Option<ConstantLocator>,
        go_function: Option<FunctionLocator>,
        helm_chart: Option<ChartLocator>,
        yaml_file: Option<FileLocator>,
    ) -> Result<Self, LocatorError> {
        let mut set = Vec::new();
        if go_constant.is_some() {
            set.push("goConstant");
        }
        if go_function.is_some() {
            set.push("goFunction");
        }
        if helm_chart.is_some() {
            set.push("helmChart");
        }
        if yaml_file.is_some() {
            set.push("yamlFile");
        }

        if set.len() > 1 {
            return Err(LocatorError::Ambiguous(set));
        }

        go_constant
            .map(Locator::GoConstant)
            .or_else(|| go_function.map(Locator::GoFunction))
            .or_else(|| helm_chart.map(Locator::HelmChart))
            .or_else(|| yaml_file.map(Locator::YamlFile))
            .ok_or(LocatorError::Missing)
    }

    /// Short label of the locator kind, used as the "Type" column
    pub fn kind(&self) -> &'static str {
        match self {
            Locator::GoConstant(_) => "Go Constant",
            Locator::GoFunction(_) => "Go Function",
            Locator::HelmChart(_) => "Helm Chart",
            Locator::YamlFile(_) => "YAML File",
        }
    }

    /// Human readable location, used as the "Location" column
    pub fn description(&self) -> String {
        match self {
            Locator::GoConstant(c) => format!("{}.{}", c.package, c.constant),
            Locator::GoFunction(f) => format!("{}()", f.function),
            Locator::HelmChart(c) if c.value_path.is_empty() => c.directory.clone(),
            Locator::HelmChart(c) => format!("{} ({})", c.directory, c.value_path),
            Locator::YamlFile(f) => format!("{} ({})", f.file, f.value_path),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.description())
    }
}

/// One place where a product's version is declared or derivable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    #[serde(flatten)]
    pub locator: Locator,

    /// Filled in by resolution; stays `None` when resolution failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<VersionMap>,
}

impl Occurrence {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            versions: None,
        }
    }
}

/// A tracked third-party component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub name: String,
    pub source: String,
    pub occurrences: Vec<Occurrence>,
}

/// The whole inventory, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    pub products: Vec<Product>,
}

// Wire shapes. Locator fields stay optional here so that a missing or
// ambiguous locator can be reported with the product and occurrence index.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProduct {
    #[serde(default)]
    name: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    occurrences: Vec<RawOccurrence>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawOccurrence {
    go_constant: Option<ConstantLocator>,
    go_function: Option<FunctionLocator>,
    helm_chart: Option<ChartLocator>,
    yaml_file: Option<FileLocator>,
}

impl Config {
    /// Load and validate an inventory file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&contents, &path.display().to_string())
    }

    /// Parse and validate inventory contents; `origin` names the document in errors
    pub fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;

        let config = Self::validate(raw)?;
        tracing::debug!(products = config.products.len(), "loaded inventory from {}", origin);

        Ok(config)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut products = Vec::with_capacity(raw.products.len());

        for (index, product) in raw.products.into_iter().enumerate() {
            if product.name.trim().is_empty() {
                return Err(ConfigError::MissingName { index });
            }
            if product.source.trim().is_empty() {
                return Err(ConfigError::MissingSource {
                    product: product.name,
                });
            }

            let mut occurrences = Vec::with_capacity(product.occurrences.len());
            for (occurrence, raw) in product.occurrences.into_iter().enumerate() {
                let locator = Locator::from_parts(
                    raw.go_constant,
                    raw.go_function,
                    raw.helm_chart,
                    raw.yaml_file,
                )
                .map_err(|err| match err {
                    LocatorError::Missing => ConfigError::NoLocator {
                        product: product.name.clone(),
                        occurrence,
                    },
                    LocatorError::Ambiguous(kinds) => ConfigError::MultipleLocators {
                        product: product.name.clone(),
                        occurrence,
                        kinds: kinds.join(", "),
                    },
                })?;

                occurrences.push(Occurrence::new(locator));
            }

            products.push(Product {
                name: product.name,
                source: product.source,
                occurrences,
            });
        }

        Ok(Self { products })
    }

    /// Total number of occurrences across all products
    pub fn occurrence_count(&self) -> usize {
        self.products.iter().map(|p| p.occurrences.len()).sum()
    }
}
