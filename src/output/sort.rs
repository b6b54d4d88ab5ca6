//! Deterministic ordering of a resolved inventory

use crate::config::Config;

/// Sort products by name (case-insensitive) and occurrences by type, then location
pub fn sort_config(config: &mut Config) {
    config.products.sort_by_cached_key(|p| p.name.to_lowercase());

    for product in &mut config.products {
        product
            .occurrences
            .sort_by_cached_key(|o| (o.locator.kind(), o.locator.description()));
    }
}
