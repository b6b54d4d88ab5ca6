//! Structured (JSON) rendering of the version matrix

use crate::config::Config;

/// Pretty-printed JSON array of products with their resolved versions
pub fn render(config: &Config) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&config.products)
}
