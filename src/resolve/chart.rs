//! Helm chart version lookups

use std::path::Path;

use super::ResolutionError;
use super::document::{self, Document};

const CHART_METADATA: &str = "Chart.yaml";
const CHART_VALUES: &str = "values.yaml";

/// The `appVersion` declared in the chart's metadata
pub fn app_version(directory: &Path) -> Result<String, ResolutionError> {
    let path = directory.join(CHART_METADATA);
    let metadata = Document::load(&path)?;

    match metadata.value("appVersion") {
        Ok(version) if !version.is_empty() => Ok(version),
        Ok(_) | Err(ResolutionError::NotFound { .. } | ResolutionError::NotAScalar { .. }) => {
            Err(ResolutionError::NotFound {
                what: "appVersion".to_string(),
                location: path.display().to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

/// The value at `value_path` in the chart's default values
pub fn default_value(directory: &Path, value_path: &str) -> Result<String, ResolutionError> {
    document::read_value(&directory.join(CHART_VALUES), value_path)
}
