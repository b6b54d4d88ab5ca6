//! Table rendering of the version matrix

use colored::Colorize;
use std::collections::BTreeSet;

use crate::config::Config;
use crate::platform::UNVERSIONED;

/// Cell value for occurrences that failed to resolve
pub const UNRESOLVED: &str = "?";

const FIXED_HEADERS: [&str; 3] = ["Product", "Type", "Location"];

/// Plain text table with optional merging of repeated leading cells
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    merge_columns: usize,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            merge_columns: 0,
        }
    }

    /// Blank the first `n` cells of a row when they repeat the row above
    pub fn merge_columns(mut self, n: usize) -> Self {
        self.merge_columns = n;
        self
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    #[cfg(test)]
    fn headers(&self) -> &[String] {
        &self.headers
    }

    #[cfg(test)]
    fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows as displayed, with merged cells blanked
    fn display_rows(&self) -> Vec<Vec<String>> {
        let mut previous: Option<&Vec<String>> = None;

        self.rows
            .iter()
            .map(|row| {
                let mut shown = row.clone();
                if let Some(prev) = previous {
                    for col in 0..self.merge_columns.min(row.len()) {
                        if prev.len() <= col || row[..=col] != prev[..=col] {
                            break;
                        }
                        shown[col].clear();
                    }
                }
                previous = Some(row);
                shown
            })
            .collect()
    }

    pub fn render(&self, color: bool) -> String {
        let rows = self.display_rows();
        let columns = self.headers.len();

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (col, cell) in row.iter().enumerate().take(columns) {
                widths[col] = widths[col].max(cell.chars().count());
            }
        }

        let mut out = String::new();

        let header = self.format_line(&self.headers, &widths, |cell| {
            if color {
                cell.bold().to_string()
            } else {
                cell.to_string()
            }
        });
        out.push_str(&header);
        out.push('\n');

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&self.format_line(&rule, &widths, str::to_string));
        out.push('\n');

        for row in &rows {
            let line = self.format_line(row, &widths, |cell| {
                if color && cell.trim() == UNRESOLVED {
                    cell.red().to_string()
                } else {
                    cell.to_string()
                }
            });
            out.push_str(&line);
            out.push('\n');
        }

        out
    }

    fn format_line<F>(&self, cells: &[String], widths: &[usize], style: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let last = widths.len().saturating_sub(1);
        let line: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let cell = cells.get(col).map(String::as_str).unwrap_or("");
                if col == last {
                    style(cell)
                } else {
                    style(&format!("{:<width$}", cell, width = width))
                }
            })
            .collect();

        line.join("  ").trim_end().to_string()
    }
}

/// Union of the axis labels of all resolved occurrences, ascending
pub fn axis_columns(config: &Config) -> Vec<String> {
    let labels: BTreeSet<&str> = config
        .products
        .iter()
        .flat_map(|p| &p.occurrences)
        .filter_map(|o| o.versions.as_ref())
        .flat_map(|versions| versions.keys().map(String::as_str))
        .collect();

    labels.iter().map(|l| l.to_string()).collect()
}

/// Build the version matrix table for a sorted inventory
///
/// When no occurrence is Kubernetes-dependent the axis collapses to a single
/// `Version` column. The same happens when nothing resolved at all, so failed
/// rows still have a cell to show `?` in.
pub fn build(config: &Config) -> Table {
    let labels = axis_columns(config);
    let collapsed = labels.is_empty() || labels == [UNVERSIONED];

    let mut headers: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
    if collapsed {
        headers.push("Version".to_string());
    } else {
        headers.extend(labels.iter().cloned());
    }

    let cell_labels: Vec<&str> = if collapsed {
        vec![UNVERSIONED]
    } else {
        labels.iter().map(String::as_str).collect()
    };

    let mut table = Table::new(headers).merge_columns(2);
    for product in &config.products {
        for occurrence in &product.occurrences {
            let mut row = vec![
                product.name.clone(),
                occurrence.locator.kind().to_string(),
                occurrence.locator.description(),
            ];

            row.extend(cell_labels.iter().map(|label| match &occurrence.versions {
                Some(versions) => versions.get(*label).cloned().unwrap_or_default(),
                None => UNRESOLVED.to_string(),
            }));

            table.add_row(row);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartLocator, FunctionLocator, Locator, Occurrence, Product};
    use crate::resolve::{VersionMap, unversioned};

    fn resolved(locator: Locator, versions: Option<VersionMap>) -> Occurrence {
        Occurrence { locator, versions }
    }

    fn chart(directory: &str) -> Locator {
        Locator::HelmChart(ChartLocator {
            directory: directory.to_string(),
            value_path: String::new(),
        })
    }

    fn function(name: &str) -> Locator {
        Locator::GoFunction(FunctionLocator {
            function: name.to_string(),
        })
    }

    fn per_minor(pairs: &[(&str, &str)]) -> Option<VersionMap> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn config(occurrences: Vec<Occurrence>) -> Config {
        Config {
            products: vec![Product {
                name: "etcd".to_string(),
                source: "https://github.com/etcd-io/etcd".to_string(),
                occurrences,
            }],
        }
    }

    #[test]
    fn test_unversioned_collapses_to_version_column() {
        let config = config(vec![resolved(chart("charts/etcd"), Some(unversioned("3.5.17".into())))]);
        let table = build(&config);

        assert_eq!(table.headers(), ["Product", "Type", "Location", "Version"]);
        assert_eq!(table.rows()[0][3], "3.5.17");
    }

    #[test]
    fn test_axis_columns_are_sorted_union() {
        let config = config(vec![
            resolved(function("B"), per_minor(&[("1.31", "b31")])),
            resolved(function("A"), per_minor(&[("1.30", "a30"), ("1.31", "a31")])),
            resolved(chart("charts/etcd"), Some(unversioned("3.5.17".into()))),
        ]);
        let table = build(&config);

        assert_eq!(table.headers(), ["Product", "Type", "Location", "*", "1.30", "1.31"]);
        // an axis that does not apply stays empty
        assert_eq!(table.rows()[0][3..], ["", "", "b31"]);
        assert_eq!(table.rows()[2][3..], ["3.5.17", "", ""]);
    }

    #[test]
    fn test_failed_occurrence_shows_question_marks() {
        let config = config(vec![
            resolved(function("A"), per_minor(&[("1.30", "a30"), ("1.31", "a31")])),
            resolved(function("doesNotExist"), None),
        ]);
        let table = build(&config);

        assert_eq!(table.headers().len(), 5);
        assert_eq!(table.rows()[1][3..], ["?", "?"]);
    }

    #[test]
    fn test_failed_only_run_keeps_version_column() {
        let table = build(&config(vec![resolved(function("doesNotExist"), None)]));
        assert_eq!(table.headers(), ["Product", "Type", "Location", "Version"]);
        assert_eq!(table.rows()[0][3], "?");
    }

    #[test]
    fn test_render_merges_repeated_cells() {
        let config = config(vec![
            resolved(function("A"), per_minor(&[("1.30", "a30")])),
            resolved(function("B"), per_minor(&[("1.30", "b30")])),
            resolved(chart("charts/etcd"), None),
        ]);
        let rendered = build(&config).render(false);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("Product"));
        assert!(lines[1].starts_with("-------"));
        assert!(lines[2].starts_with("etcd "));
        assert!(lines[2].contains("Go Function  A()"));
        assert!(lines[3].starts_with("      "));
        assert!(lines[3].contains("B()"));
        assert!(!lines[3].contains("Go Function"));
        assert!(lines[4].trim_start().starts_with("Helm Chart"));
        assert!(lines[4].ends_with('?'));
    }

    #[test]
    fn test_render_pads_columns() {
        let mut table = Table::new(vec!["A".to_string(), "B".to_string()]);
        table.add_row(vec!["long cell".to_string(), "x".to_string()]);

        let expected = format!("{:<9}  B\n---------  -\nlong cell  x\n", "A");
        assert_eq!(table.render(false), expected);
    }
}
