//! Command implementations for version-matrix CLI

pub mod report;
