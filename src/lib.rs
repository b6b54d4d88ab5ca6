//! version-matrix - reports where vendored component versions live
//!
//! An inventory document lists products and the places their versions are
//! declared: Go constants, version functions evaluated per supported
//! Kubernetes minor, Helm charts and arbitrary YAML/JSON files. Every entry is
//! resolved, and the resulting matrix is printed as a table or as JSON.

pub mod aggregator;
pub mod commands;
pub mod config;
pub mod output;
pub mod platform;
pub mod resolve;
pub mod utils;
