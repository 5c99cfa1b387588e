//! # CarveKit
//!
//! A Rust-based relief carving toolpath generator: converts greyscale
//! images into depth-carving G-code, mapping pixel brightness to cutting
//! depth.
//!
//! ## Architecture
//!
//! CarveKit is organized as a workspace with multiple crates:
//!
//! 1. **carvekit-core** - Tool geometry, G-code field formatting, shared types
//! 2. **carvekit-settings** - Configuration structure, validation, persistence
//! 3. **carvekit-camtools** - Depth mapping, tool compensation, toolpath generation
//! 4. **carvekit** - Main binary that integrates all crates
//!
//! ## Features
//!
//! - **Tool Compensation**: morphological depth-map adjustment for ball
//!   and flat tools so neighbors under the footprint are never over-cut
//! - **Multi-Pass Carving**: successive depth bands with decimation,
//!   stock to leave, and a finishing pass
//! - **Compact Output**: last-value compression keeps the emitted
//!   command stream minimal without changing the represented path

pub use carvekit_camtools::{
    CamToolError, CamToolResult, CarvePass, DepthConverter, GcodeWriter, PassSchedule,
    ReliefCarver, RowTraversal, ScanDirection, ToolCompensator,
};
pub use carvekit_core::tools::{CarveTool, ToolShape};
pub use carvekit_settings::{
    CarveConfig, ConfigError, DepthSettings, MachineSettings, PassSettings, SettingsError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr (the G-code stream may go to stdout)
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
