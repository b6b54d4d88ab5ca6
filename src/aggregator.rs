//! Inventory-wide resolution
//!
//! Walks every product and occurrence in document order. A failing
//! occurrence is logged and left unresolved; the run carries on and is
//! reported as degraded.

use crate::config::Config;
use crate::resolve::Resolver;

/// Outcome of one resolution run
#[derive(Debug)]
pub struct Report {
    pub config: Config,
    /// Number of occurrences that failed to resolve
    pub failed: usize,
}

impl Report {
    /// True when every occurrence resolved
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Drives the resolver over a whole inventory
pub struct Aggregator {
    resolver: Resolver,
}

impl Aggregator {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    /// Resolve every occurrence, filling in its versions
    pub fn run(&mut self, mut config: Config) -> Report {
        let mut failed = 0;

        crate::log_info!(
            "Resolving {} occurrence(s) across {} product(s), Kubernetes axis: {}",
            config.occurrence_count(),
            config.products.len(),
            self.resolver.axis().labels().join(", ")
        );

        for product in &mut config.products {
            for (index, occurrence) in product.occurrences.iter_mut().enumerate() {
                match self.resolver.resolve(occurrence) {
                    Ok(versions) => {
                        tracing::debug!(
                            product = %product.name,
                            occurrence = index,
                            ?versions,
                            "resolved"
                        );
                        occurrence.versions = Some(versions);
                    }
                    Err(err) => {
                        crate::log_error!(
                            "{}: occurrence {} ({}): {}",
                            product.name,
                            index,
                            occurrence.locator,
                            err
                        );
                        occurrence.versions = None;
                        failed += 1;
                    }
                }
            }
        }

        Report { config, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FunctionLocator, Locator, Occurrence, Product};
    use crate::platform::VersionAxis;
    use crate::resolve::{FunctionRegistry, GoSourceReader};
    use semver::Version;

    fn function(name: &str) -> Occurrence {
        Occurrence::new(Locator::GoFunction(FunctionLocator {
            function: name.to_string(),
        }))
    }

    fn aggregator() -> Aggregator {
        let registry = FunctionRegistry::new().register("Tag", |v| Ok(format!("v{}", v.label)));
        let axis = VersionAxis::from_versions(&[Version::new(1, 30, 1), Version::new(1, 31, 1)]);
        Aggregator::new(Resolver::new(
            ".",
            Box::new(GoSourceReader::new(".")),
            registry,
            axis,
        ))
    }

    #[test]
    fn test_all_resolved() {
        let config = Config {
            products: vec![Product {
                name: "cri-tools".to_string(),
                source: "https://github.com/kubernetes-sigs/cri-tools".to_string(),
                occurrences: vec![function("Tag")],
            }],
        };

        let report = aggregator().run(config);
        assert!(report.is_success());

        let versions = report.config.products[0].occurrences[0].versions.as_ref().unwrap();
        assert_eq!(versions["1.31"], "v1.31");
    }

    #[test]
    fn test_failures_do_not_stop_the_run() {
        let config = Config {
            products: vec![
                Product {
                    name: "broken".to_string(),
                    source: "https://example.com".to_string(),
                    occurrences: vec![function("doesNotExist"), function("Tag")],
                },
                Product {
                    name: "later".to_string(),
                    source: "https://example.com".to_string(),
                    occurrences: vec![function("Tag")],
                },
            ],
        };

        let report = aggregator().run(config);
        assert!(!report.is_success());
        assert_eq!(report.failed, 1);

        let broken = &report.config.products[0];
        assert!(broken.occurrences[0].versions.is_none());
        assert!(broken.occurrences[1].versions.is_some());
        assert!(report.config.products[1].occurrences[0].versions.is_some());
    }

    #[test]
    fn test_empty_inventory() {
        let report = aggregator().run(Config::default());
        assert!(report.is_success());
        assert!(report.config.products.is_empty());
    }
}
