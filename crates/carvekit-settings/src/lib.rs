//! CarveKit Settings Crate
//!
//! Handles carving configuration, validation, and persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{CarveConfig, DepthSettings, MachineSettings, PassSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
