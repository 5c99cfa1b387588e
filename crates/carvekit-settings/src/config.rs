//! Carving configuration for CarveKit.
//!
//! Provides the configuration structure consumed by the relief carver,
//! with validation applied before any processing starts.
//!
//! Configuration is organized into logical sections:
//! - Tool geometry (shape, radius)
//! - Depth mapping (white/black depths, blur)
//! - Pass planning (pass depth, decimation, stock to leave)
//! - Machine parameters (raster scale, safe height, feed rates)

pub use carvekit_core::tools::{CarveTool, ToolShape};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Depth mapping settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DepthSettings {
    /// Z of a white (255) pixel in mm
    pub white_depth_mm: f64,
    /// Z of a black (0) pixel in mm
    pub black_depth_mm: f64,
    /// Gaussian blur radius in pixels applied after tool compensation
    /// (0 disables blurring)
    pub blur_radius_px: f64,
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self {
            white_depth_mm: 0.0,
            black_depth_mm: -4.0,
            blur_radius_px: 0.0,
        }
    }
}

/// Pass planning settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PassSettings {
    /// Maximum depth removed per pass in mm
    pub max_pass_depth_mm: f64,
    /// Material left uncut on non-final passes in mm
    pub stock_to_leave_mm: f64,
    /// Row-skip factor for intermediate passes (1 cuts every row)
    pub decimation: u32,
    /// Row-skip factor for the final pass
    pub final_decimation: u32,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            max_pass_depth_mm: 2.0,
            stock_to_leave_mm: 0.0,
            decimation: 4,
            final_decimation: 1,
        }
    }
}

/// Machine parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MachineSettings {
    /// Physical size of one pixel in mm (raster scale)
    pub pixel_size_mm: f64,
    /// Height for rapid travel between rows in mm
    pub safe_height_mm: f64,
    /// Cutting feed rate in mm/min
    pub feed_rate: u32,
    /// Plunge feed rate in mm/min
    pub plunge_rate: u32,
    /// Spindle speed in RPM
    pub spindle_speed: u32,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            pixel_size_mm: 0.25,
            safe_height_mm: 1.0,
            feed_rate: 2000,
            plunge_rate: 500,
            spindle_speed: 10000,
        }
    }
}

/// Complete carving configuration.
///
/// Immutable once processing begins; `validate` must pass before the
/// configuration is handed to the carver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CarveConfig {
    /// Tool geometry
    #[serde(default)]
    pub tool: CarveTool,
    /// Depth mapping
    #[serde(default)]
    pub depth: DepthSettings,
    /// Pass planning
    #[serde(default)]
    pub passes: PassSettings,
    /// Machine parameters
    #[serde(default)]
    pub machine: MachineSettings,
}

impl CarveConfig {
    /// The deepest depth the program will cut, in mm.
    pub fn depth_min(&self) -> f64 {
        self.depth.white_depth_mm.min(self.depth.black_depth_mm)
    }

    /// Depth change per intensity level: `(white - black) / 255`.
    pub fn depth_per_level(&self) -> f64 {
        (self.depth.white_depth_mm - self.depth.black_depth_mm) / 255.0
    }

    /// Validate the configuration. Every error here is fatal before any
    /// processing starts.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.machine.pixel_size_mm <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "machine.pixel_size_mm".to_string(),
                value: self.machine.pixel_size_mm.to_string(),
            });
        }
        if self.tool.radius_mm < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "tool.radius_mm".to_string(),
                value: self.tool.radius_mm.to_string(),
            });
        }
        if self.depth.white_depth_mm == self.depth.black_depth_mm {
            return Err(ConfigError::InvalidValue {
                key: "depth".to_string(),
                reason: "white_depth_mm and black_depth_mm must differ".to_string(),
            });
        }
        if self.depth.blur_radius_px < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "depth.blur_radius_px".to_string(),
                value: self.depth.blur_radius_px.to_string(),
            });
        }
        if self.passes.max_pass_depth_mm <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "passes.max_pass_depth_mm".to_string(),
                value: self.passes.max_pass_depth_mm.to_string(),
            });
        }
        if self.passes.stock_to_leave_mm < 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "passes.stock_to_leave_mm".to_string(),
                value: self.passes.stock_to_leave_mm.to_string(),
            });
        }
        if self.passes.decimation < 1 {
            return Err(ConfigError::ValueOutOfRange {
                key: "passes.decimation".to_string(),
                value: self.passes.decimation.to_string(),
            });
        }
        if self.passes.final_decimation < 1 {
            return Err(ConfigError::ValueOutOfRange {
                key: "passes.final_decimation".to_string(),
                value: self.passes.final_decimation.to_string(),
            });
        }
        if self.machine.feed_rate == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "machine.feed_rate".to_string(),
                value: "0".to_string(),
            });
        }
        if self.machine.plunge_rate == 0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "machine.plunge_rate".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CarveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.depth_min(), -4.0);
        assert!((config.depth_per_level() - 4.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_depths_rejected() {
        let mut config = CarveConfig::default();
        config.depth.white_depth_mm = -1.0;
        config.depth.black_depth_mm = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_zero_decimation_rejected() {
        let mut config = CarveConfig::default();
        config.passes.decimation = 0;
        assert!(config.validate().is_err());

        let mut config = CarveConfig::default();
        config.passes.final_decimation = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_tool_radius_rejected() {
        let mut config = CarveConfig::default();
        config.tool.radius_mm = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tool_radius_allowed() {
        let mut config = CarveConfig::default();
        config.tool.radius_mm = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_pass_depth_rejected() {
        let mut config = CarveConfig::default();
        config.passes.max_pass_depth_mm = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_feed_rates_rejected() {
        let mut config = CarveConfig::default();
        config.machine.feed_rate = 0;
        assert!(config.validate().is_err());

        let mut config = CarveConfig::default();
        config.machine.plunge_rate = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_depths_valid() {
        // Raised (positive) relief: black higher than white
        let mut config = CarveConfig::default();
        config.depth.white_depth_mm = -4.0;
        config.depth.black_depth_mm = 0.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.depth_min(), -4.0);
        assert!(config.depth_per_level() < 0.0);
    }
}
