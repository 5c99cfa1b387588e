//! Relief carving toolpath generation.
//!
//! Converts a greyscale image into multi-pass depth-carving G-code using
//! boustrophedon (back-and-forth) raster scanning. Each pass removes at
//! most a configured depth band; the final pass switches to its own
//! decimation and cuts to the natural depth with no stock offset.

use carvekit_core::types::BoxedIterator;
use carvekit_core::units::format_coord;
use carvekit_settings::CarveConfig;
use image::{imageops, DynamicImage, GrayImage};
use std::path::Path;
use tracing::{info, warn};

use crate::depth_map::DepthConverter;
use crate::error::{CamToolError, CamToolResult};
use crate::gcode_writer::GcodeWriter;
use crate::tool_compensation::ToolCompensator;

/// Scan direction for one carved row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Columns walked from left to right
    LeftToRight,
    /// Columns walked from right to left
    RightToLeft,
}

/// One depth pass of the carving program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarvePass {
    /// Depth floor for this pass: no move cuts below it
    pub floor_mm: f64,
    /// Row-skip factor in effect
    pub decimation: u32,
    /// Material intentionally left above the target surface
    pub stock_offset_mm: f64,
    /// Whether this pass uses the finishing parameters
    pub is_final: bool,
}

/// Iterator over the depth passes needed to reach the minimum depth.
///
/// Floors decrease strictly by the maximum pass depth, clamped so the
/// sequence terminates exactly at the minimum depth. A pass whose next
/// decrement would undershoot the minimum switches to the finishing
/// decimation and drops the stock offset.
#[derive(Debug, Clone)]
pub struct PassSchedule {
    next_floor: Option<f64>,
    max_pass_depth: f64,
    depth_min: f64,
    decimation: u32,
    final_decimation: u32,
    stock_to_leave: f64,
}

impl PassSchedule {
    pub fn new(
        max_pass_depth: f64,
        depth_min: f64,
        decimation: u32,
        final_decimation: u32,
        stock_to_leave: f64,
    ) -> Self {
        Self {
            // A depth range shallower than one pass still gets one pass
            next_floor: Some((-max_pass_depth).max(depth_min)),
            max_pass_depth,
            depth_min,
            decimation,
            final_decimation,
            stock_to_leave,
        }
    }

    pub fn from_config(config: &CarveConfig) -> Self {
        Self::new(
            config.passes.max_pass_depth_mm,
            config.depth_min(),
            config.passes.decimation,
            config.passes.final_decimation,
            config.passes.stock_to_leave_mm,
        )
    }
}

impl Iterator for PassSchedule {
    type Item = CarvePass;

    fn next(&mut self) -> Option<CarvePass> {
        let floor = self.next_floor?;
        let is_final = floor - self.max_pass_depth < self.depth_min;
        self.next_floor = if floor <= self.depth_min {
            None
        } else {
            Some((floor - self.max_pass_depth).max(self.depth_min))
        };
        Some(CarvePass {
            floor_mm: floor,
            decimation: if is_final {
                self.final_decimation
            } else {
                self.decimation
            },
            stock_offset_mm: if is_final { 0.0 } else { self.stock_to_leave },
            is_final,
        })
    }
}

/// Iterator producing `(row, direction)` pairs for one pass.
///
/// Rows advance by twice the decimation: each step carves a forward row
/// and, when still in range, the row `decimation` above it backward, so
/// the tool returns without a long rapid traverse.
#[derive(Debug, Clone)]
pub struct RowTraversal {
    height: u32,
    decimation: u32,
    next_forward: u32,
    pending_back: Option<u32>,
}

impl RowTraversal {
    pub fn new(height: u32, decimation: u32) -> Self {
        Self {
            height,
            decimation,
            next_forward: 0,
            pending_back: None,
        }
    }
}

impl Iterator for RowTraversal {
    type Item = (u32, ScanDirection);

    fn next(&mut self) -> Option<(u32, ScanDirection)> {
        if let Some(row) = self.pending_back.take() {
            return Some((row, ScanDirection::RightToLeft));
        }
        if self.next_forward >= self.height {
            return None;
        }
        let forward = self.next_forward;
        let back = forward + self.decimation;
        if back < self.height {
            self.pending_back = Some(back);
        }
        self.next_forward = forward + 2 * self.decimation;
        Some((forward, ScanDirection::LeftToRight))
    }
}

/// Relief carving tool for greyscale images.
#[derive(Debug)]
pub struct ReliefCarver {
    image: GrayImage,
    config: CarveConfig,
    depth: DepthConverter,
}

impl ReliefCarver {
    /// Create a carver from an image file.
    pub fn from_file<P: AsRef<Path>>(path: P, config: CarveConfig) -> CamToolResult<Self> {
        let img = image::open(path.as_ref())
            .map_err(|e| CamToolError::LoadError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_image(img, config)
    }

    /// Create a carver from a decoded image.
    ///
    /// Validates the configuration, converts to greyscale, applies tool
    /// compensation and the optional Gaussian blur. The working raster
    /// is fixed after this point.
    pub fn from_image(img: DynamicImage, config: CarveConfig) -> CamToolResult<Self> {
        config.validate()?;
        if config.passes.final_decimation > config.passes.decimation {
            warn!(
                decimation = config.passes.decimation,
                final_decimation = config.passes.final_decimation,
                "final pass is coarser than intermediate passes"
            );
        }

        let gray = img.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(CamToolError::ImageError("image is empty".to_string()));
        }
        info!(
            width = gray.width(),
            height = gray.height(),
            stock_x_mm = gray.width() as f64 * config.machine.pixel_size_mm,
            stock_y_mm = gray.height() as f64 * config.machine.pixel_size_mm,
            "loaded image"
        );

        let compensator = ToolCompensator::new(
            config.tool,
            config.machine.pixel_size_mm,
            config.depth_per_level(),
        );
        let px_tool = config.tool.radius_px(config.machine.pixel_size_mm);
        info!(
            tool = %config.tool,
            px_radius = px_tool,
            search = 2 * px_tool + 1,
            "applying tool compensation"
        );
        let mut working = compensator.compensate(&gray).to_gray();

        if config.depth.blur_radius_px > 0.0 {
            info!(
                radius_px = config.depth.blur_radius_px,
                radius_mm = config.depth.blur_radius_px * config.machine.pixel_size_mm,
                "blurring compensated image"
            );
            working = imageops::blur(&working, config.depth.blur_radius_px as f32);
        }

        let depth = DepthConverter::new(config.depth.white_depth_mm, config.depth.black_depth_mm);
        Ok(Self {
            image: working,
            config,
            depth,
        })
    }

    /// The compensated working raster the toolpath is cut from.
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Output dimensions in millimeters.
    pub fn output_size_mm(&self) -> (f64, f64) {
        (
            self.image.width() as f64 * self.config.machine.pixel_size_mm,
            self.image.height() as f64 * self.config.machine.pixel_size_mm,
        )
    }

    /// Save the compensated (and blurred) raster for inspection.
    pub fn save_compensated<P: AsRef<Path>>(&self, path: P) -> CamToolResult<()> {
        self.image
            .save(path.as_ref())
            .map_err(|e| CamToolError::ImageError(e.to_string()))
    }

    /// Estimate carving time in seconds.
    pub fn estimate_time(&self) -> f64 {
        let (width_mm, _) = self.output_size_mm();
        let feed = self.config.machine.feed_rate as f64;
        let plunge = self.config.machine.plunge_rate as f64;
        let plunge_travel = (self.config.machine.safe_height_mm - self.config.depth_min()).abs();

        let mut seconds = 0.0;
        for pass in PassSchedule::from_config(&self.config) {
            let rows = RowTraversal::new(self.image.height(), pass.decimation).count() as f64;
            seconds += rows * (width_mm / feed) * 60.0;
            seconds += rows * (plunge_travel / plunge) * 60.0;
        }
        seconds
    }

    /// Generate the carving G-code.
    pub fn generate_gcode(&self) -> CamToolResult<String> {
        self.generate_gcode_with_progress(|_| {})
    }

    /// Generate the carving G-code, reporting progress in [0, 1].
    pub fn generate_gcode_with_progress<F>(&self, mut progress: F) -> CamToolResult<String>
    where
        F: FnMut(f32),
    {
        let mut writer = GcodeWriter::new();
        self.write_header(&mut writer);

        let total_rows: usize = PassSchedule::from_config(&self.config)
            .map(|pass| RowTraversal::new(self.image.height(), pass.decimation).count())
            .sum();
        let mut rows_done = 0usize;
        progress(0.0);

        for pass in PassSchedule::from_config(&self.config) {
            info!(
                floor_mm = pass.floor_mm,
                decimation = pass.decimation,
                is_final = pass.is_final,
                "carving pass"
            );
            writer.comment(&format!(
                "Pass at Z{} (decimation {})",
                format_coord(pass.floor_mm),
                pass.decimation
            ));
            writer.rapid(None, None, Some(self.config.machine.safe_height_mm));

            for (row, direction) in RowTraversal::new(self.image.height(), pass.decimation) {
                self.carve_row(&mut writer, &pass, row, direction);
                rows_done += 1;
                progress(rows_done as f32 / total_rows as f32);
            }
        }

        self.write_footer(&mut writer);
        progress(1.0);
        Ok(writer.finish())
    }

    fn carve_row(
        &self,
        writer: &mut GcodeWriter,
        pass: &CarvePass,
        row: u32,
        direction: ScanDirection,
    ) {
        let px = self.config.machine.pixel_size_mm;
        let width = self.image.width();
        let y_mm = row as f64 * px;

        let (start_col, columns): (u32, BoxedIterator<u32>) = match direction {
            ScanDirection::LeftToRight => (0, Box::new(1..width)),
            ScanDirection::RightToLeft => (width - 1, Box::new((0..width - 1).rev())),
        };

        writer.rapid(Some(start_col as f64 * px), Some(y_mm), None);
        writer.linear(
            start_col as f64 * px,
            y_mm,
            self.cut_depth(start_col, row, pass),
            self.config.machine.plunge_rate,
        );

        for col in columns {
            writer.linear_coalesced(
                col as f64 * px,
                y_mm,
                self.cut_depth(col, row, pass),
                self.config.machine.feed_rate,
            );
        }
        writer.flush();
        writer.rapid(None, None, Some(self.config.machine.safe_height_mm));
    }

    fn cut_depth(&self, col: u32, row: u32, pass: &CarvePass) -> f64 {
        self.depth.depth_at(&self.image, col, row, pass.floor_mm) + pass.stock_offset_mm
    }

    fn write_header(&self, writer: &mut GcodeWriter) {
        let (width_mm, height_mm) = self.output_size_mm();
        writer.comment("Relief Carving G-code");
        writer.comment(&format!(
            "Generated: {}",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        writer.comment(&format!(
            "Image size: {} x {} px",
            self.image.width(),
            self.image.height()
        ));
        writer.comment(&format!(
            "Stock size: {:.1}mm x {:.1}mm",
            width_mm, height_mm
        ));
        writer.comment(&format!("Tool: {}", self.config.tool));
        writer.comment(&format!(
            "Depth range: {:.2} to {:.2} mm",
            self.config.depth.white_depth_mm, self.config.depth.black_depth_mm
        ));
        writer.comment(&format!(
            "Max pass depth: {:.2} mm, stock to leave: {:.2} mm",
            self.config.passes.max_pass_depth_mm, self.config.passes.stock_to_leave_mm
        ));
        writer.comment(&format!(
            "Feed rate: {} mm/min, plunge rate: {} mm/min",
            self.config.machine.feed_rate, self.config.machine.plunge_rate
        ));
        writer.comment(&format!(
            "Estimated time: {:.1} minutes",
            self.estimate_time() / 60.0
        ));
        writer.comment("");

        writer.raw("G21 ; Set units to millimeters");
        writer.raw("G90 ; Absolute positioning");
        writer.raw("G17 ; XY plane selection");
        writer.raw(&format!(
            "M3 S{} ; Start spindle",
            self.config.machine.spindle_speed
        ));
    }

    fn write_footer(&self, writer: &mut GcodeWriter) {
        writer.comment("End of carving");
        writer.raw("M5 ; Stop spindle");
        writer.raw("M30 ; End program");
    }
}
