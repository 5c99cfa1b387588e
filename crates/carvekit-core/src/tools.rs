//! Carving tool definitions.
//!
//! This module provides:
//! - Tool tip shapes for depth carving
//! - Tool geometry (cutting radius, surface profile)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tool tip shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolShape {
    /// Ball nose end mill (spherical tip)
    Ball,
    /// Flat end mill
    Flat,
}

impl Default for ToolShape {
    fn default() -> Self {
        Self::Ball
    }
}

impl fmt::Display for ToolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ball => write!(f, "Ball Nose"),
            Self::Flat => write!(f, "Flat End Mill"),
        }
    }
}

impl FromStr for ToolShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ball" => Ok(Self::Ball),
            "flat" => Ok(Self::Flat),
            _ => Err(format!("Unknown tool shape: {}", s)),
        }
    }
}

/// A carving tool: tip shape plus cutting radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarveTool {
    /// Tool tip shape
    #[serde(default)]
    pub shape: ToolShape,
    /// Cutting radius in millimeters
    pub radius_mm: f64,
}

impl Default for CarveTool {
    fn default() -> Self {
        Self {
            shape: ToolShape::Ball,
            radius_mm: 1.25,
        }
    }
}

impl CarveTool {
    pub fn new(shape: ToolShape, radius_mm: f64) -> Self {
        Self { shape, radius_mm }
    }

    /// Tool radius in whole pixels at the given raster scale.
    pub fn radius_px(&self, pixel_size_mm: f64) -> u32 {
        (self.radius_mm / pixel_size_mm).floor() as u32
    }

    /// Height of the tool surface above its lowest point at a given
    /// squared distance (mm²) from the tool axis.
    ///
    /// A flat tool cuts a constant depth across its face. A ball tool
    /// surface rises away from the axis following the sphere, so it cuts
    /// less aggressively toward the edge. The radicand is clamped at zero
    /// so floating-point error at the rim never produces a negative root.
    pub fn profile_drop(&self, sq_dist_mm: f64) -> f64 {
        match self.shape {
            ToolShape::Flat => 0.0,
            ToolShape::Ball => {
                let radicand = (self.radius_mm * self.radius_mm - sq_dist_mm).max(0.0);
                self.radius_mm - radicand.sqrt()
            }
        }
    }
}

impl fmt::Display for CarveTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} r{:.2}mm", self.shape, self.radius_mm)
    }
}
