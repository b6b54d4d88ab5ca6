//! Inventory and tool settings

pub mod inventory;
pub mod settings;

pub use inventory::{
    ChartLocator, Config, ConfigError, ConstantLocator, FileLocator, FunctionLocator, Locator,
    Occurrence, Product,
};
pub use settings::Settings;
