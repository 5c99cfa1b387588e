//! Tool radius compensation.
//!
//! Adjusts the depth map so that a physical tool of nonzero radius,
//! plunged to a pixel's nominal depth, never carves a neighboring pixel
//! under its footprint deeper than that neighbor's own depth. This is a
//! morphological dilation/erosion over a disc-shaped structuring element
//! whose weights follow the tool's surface profile, computed by
//! brute-force offset search.

use carvekit_core::tools::CarveTool;
use image::GrayImage;

/// Full-precision compensated depth raster.
///
/// Values are intensities and may leave the [0,255] range while the
/// accumulation runs; clamping happens only on export.
#[derive(Debug, Clone)]
pub struct CompensatedRaster {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl CompensatedRaster {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y * self.width + x) as usize]
    }

    /// Export as a greyscale image, clamping intensities to [0, 255].
    pub fn to_gray(&self) -> GrayImage {
        let pixels: Vec<u8> = self
            .data
            .iter()
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        GrayImage::from_raw(self.width, self.height, pixels)
            .expect("buffer length matches dimensions")
    }
}

/// Applies tool radius compensation to a greyscale raster.
pub struct ToolCompensator {
    tool: CarveTool,
    pixel_size_mm: f64,
    delta_per_level: f64,
}

impl ToolCompensator {
    /// * `tool` - Tool geometry
    /// * `pixel_size_mm` - Physical size of one pixel
    /// * `delta_per_level` - Depth change per intensity level, signed
    pub fn new(tool: CarveTool, pixel_size_mm: f64, delta_per_level: f64) -> Self {
        Self {
            tool,
            pixel_size_mm,
            delta_per_level,
        }
    }

    /// The safer of two intensities for this cutting direction: the one
    /// implying less material removed. Its identity element is
    /// `sentinel`.
    fn safer(&self, a: f32, b: f32) -> f32 {
        if self.delta_per_level > 0.0 {
            a.max(b)
        } else {
            a.min(b)
        }
    }

    /// The intensity that loses to every other under `safer`.
    fn sentinel(&self) -> f32 {
        if self.delta_per_level > 0.0 {
            0.0
        } else {
            255.0
        }
    }

    /// Compensate the raster for the tool footprint.
    ///
    /// For every kernel offset inside the tool disc, the source image is
    /// shifted by that offset, biased by the intensity equivalent of the
    /// tool surface height at that offset, and folded into an accumulator
    /// with the cut-direction extremum. Each output pixel ends up holding
    /// the safest intensity implied by any neighbor the tool could touch.
    pub fn compensate(&self, image: &GrayImage) -> CompensatedRaster {
        let width = image.width();
        let height = image.height();

        // Zero radius cannot satisfy the strict in-disc test, so it is
        // the identity transform.
        if self.tool.radius_mm == 0.0 {
            let data = image.pixels().map(|p| p.0[0] as f32).collect();
            return CompensatedRaster {
                width,
                height,
                data,
            };
        }

        let px_tool = self.tool.radius_px(self.pixel_size_mm) as usize;
        let side = 2 * px_tool + 1;
        let (w, h) = (width as usize, height as usize);
        let (pw, ph) = (w + 2 * px_tool, h + 2 * px_tool);

        let mut acc = vec![self.sentinel(); pw * ph];
        let sq_radius = self.tool.radius_mm * self.tool.radius_mm;
        let src = image.as_raw();

        for oy in 0..side {
            for ox in 0..side {
                let dx = ox as f64 - px_tool as f64;
                let dy = oy as f64 - px_tool as f64;
                let sq_dist = (dx * dx + dy * dy) * self.pixel_size_mm * self.pixel_size_mm;
                if sq_dist >= sq_radius {
                    continue;
                }

                // Intensity equivalent of the tool surface height at this
                // offset; sign follows delta_per_level so the bias always
                // pulls toward "cuts less".
                let bias = (self.tool.profile_drop(sq_dist) / self.delta_per_level) as f32;

                for y in 0..h {
                    let src_base = y * w;
                    let dst_base = (y + oy) * pw + ox;
                    for x in 0..w {
                        let shifted = src[src_base + x] as f32 - bias;
                        let cell = &mut acc[dst_base + x];
                        *cell = self.safer(*cell, shifted);
                    }
                }
            }
        }

        // Crop the padding back off
        let mut data = Vec::with_capacity(w * h);
        for y in 0..h {
            let base = (y + px_tool) * pw + px_tool;
            data.extend_from_slice(&acc[base..base + w]);
        }

        CompensatedRaster {
            width,
            height,
            data,
        }
    }
}
