//! Stateful G-code emission with last-value compression.
//!
//! The writer remembers the last confirmed X/Y/Z/F and emits only the
//! fields that changed, keeping the command stream minimal while still
//! representing the exact requested path. Two policies are available:
//! immediate emission (one command per move) and coalescing, which holds
//! back single-field moves so runs of collinear steps collapse into one
//! line.

use carvekit_core::units::{format_coord, format_feed};

/// Last confirmed machine state plus the single-slot command buffer.
///
/// Fields start unset so the first command emits everything. At most one
/// command is ever buffered; a second buffering event replaces it after
/// the diff has been taken against confirmed state, never against the
/// dropped line.
#[derive(Debug, Default)]
pub struct MotionState {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    f: Option<u32>,
    pending: Option<String>,
}

impl MotionState {
    fn coord_changed(last: Option<f64>, requested: f64) -> bool {
        last != Some(requested)
    }
}

/// G-code writer producing a minimal command stream.
#[derive(Debug, Default)]
pub struct GcodeWriter {
    output: String,
    state: MotionState,
}

impl GcodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `;` comment line.
    pub fn comment(&mut self, text: &str) {
        if text.is_empty() {
            self.output.push_str(";\n");
            return;
        }
        self.output.push_str("; ");
        self.output.push_str(text);
        self.output.push('\n');
    }

    /// Append a raw line verbatim (preamble and footer codes).
    pub fn raw(&mut self, line: &str) {
        self.flush();
        self.output.push_str(line);
        self.output.push('\n');
    }

    /// Rapid positioning move. Flushes any buffered command, emits the
    /// provided axes unconditionally, and confirms them.
    pub fn rapid(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.flush();
        let mut line = String::from("G0");
        if let Some(x) = x {
            line.push_str(&format!(" X{}", format_coord(x)));
            self.state.x = Some(x);
        }
        if let Some(y) = y {
            line.push_str(&format!(" Y{}", format_coord(y)));
            self.state.y = Some(y);
        }
        if let Some(z) = z {
            line.push_str(&format!(" Z{}", format_coord(z)));
            self.state.z = Some(z);
        }
        self.output.push_str(&line);
        self.output.push('\n');
    }

    /// Linear cutting move, immediate policy: exactly one command per
    /// call, containing only the fields that changed since the last
    /// confirmed state.
    pub fn linear(&mut self, x: f64, y: f64, z: f64, f: u32) {
        self.flush();
        let (line, _) = self.diff_line(x, y, z, f);
        self.confirm(x, y, z, f);
        self.output.push_str(&line);
        self.output.push('\n');
    }

    /// Linear cutting move, coalescing policy.
    ///
    /// A move changing more than one field flushes the buffer and is
    /// emitted at once. A move changing one field or none replaces the
    /// buffer; only the most recent single-field delta survives, which
    /// is safe because intermediate single-axis steps lie on the line
    /// the surviving command describes.
    pub fn linear_coalesced(&mut self, x: f64, y: f64, z: f64, f: u32) {
        let (line, changes) = self.diff_line(x, y, z, f);
        self.confirm(x, y, z, f);
        if changes > 1 {
            self.flush();
            self.output.push_str(&line);
            self.output.push('\n');
        } else {
            self.state.pending = Some(line);
        }
    }

    /// Emit any buffered command.
    pub fn flush(&mut self) {
        if let Some(line) = self.state.pending.take() {
            self.output.push_str(&line);
            self.output.push('\n');
        }
    }

    /// Finish writing and take the output. Flushes first.
    pub fn finish(mut self) -> String {
        self.flush();
        self.output
    }

    /// Output produced so far, excluding any buffered command.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    fn diff_line(&self, x: f64, y: f64, z: f64, f: u32) -> (String, usize) {
        let mut line = String::from("G1");
        let mut changes = 0;
        if MotionState::coord_changed(self.state.x, x) {
            line.push_str(&format!(" X{}", format_coord(x)));
            changes += 1;
        }
        if MotionState::coord_changed(self.state.y, y) {
            line.push_str(&format!(" Y{}", format_coord(y)));
            changes += 1;
        }
        if MotionState::coord_changed(self.state.z, z) {
            line.push_str(&format!(" Z{}", format_coord(z)));
            changes += 1;
        }
        if self.state.f != Some(f) {
            line.push_str(&format!(" F{}", format_feed(f)));
            changes += 1;
        }
        (line, changes)
    }

    fn confirm(&mut self, x: f64, y: f64, z: f64, f: u32) {
        self.state.x = Some(x);
        self.state.y = Some(y);
        self.state.z = Some(z);
        self.state.f = Some(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &str) -> Vec<&str> {
        s.lines().collect()
    }

    #[test]
    fn test_first_move_emits_all_fields() {
        let mut w = GcodeWriter::new();
        w.linear(1.0, 2.0, -0.5, 1000);
        assert_eq!(w.finish(), "G1 X1.00 Y2.00 Z-0.50 F1000\n");
    }

    #[test]
    fn test_immediate_policy_changed_fields_only() {
        let mut w = GcodeWriter::new();
        w.linear(1.0, 2.0, -0.5, 1000);
        w.linear(1.5, 2.0, -0.5, 1000);
        w.linear(1.5, 2.5, -1.0, 1000);
        let out = w.finish();
        assert_eq!(
            lines(&out),
            vec![
                "G1 X1.00 Y2.00 Z-0.50 F1000",
                "G1 X1.50",
                "G1 Y2.50 Z-1.00",
            ]
        );
    }

    #[test]
    fn test_coalescing_collapses_single_axis_run() {
        let mut w = GcodeWriter::new();
        // First move changes everything: emitted at once
        w.linear_coalesced(0.0, 0.0, -1.0, 800);
        // A run of X-only steps is held back
        w.linear_coalesced(0.25, 0.0, -1.0, 800);
        w.linear_coalesced(0.50, 0.0, -1.0, 800);
        w.linear_coalesced(0.75, 0.0, -1.0, 800);
        w.flush();
        let out = w.finish();
        assert_eq!(
            lines(&out),
            vec!["G1 X0.00 Y0.00 Z-1.00 F800", "G1 X0.75"]
        );
    }

    #[test]
    fn test_coalescing_flushes_on_multi_field_change() {
        let mut w = GcodeWriter::new();
        w.linear_coalesced(0.0, 0.0, -1.0, 800);
        w.linear_coalesced(0.25, 0.0, -1.0, 800);
        // Y and Z change together: the buffered X step must come out
        // before the new line
        w.linear_coalesced(0.25, 0.25, -1.5, 800);
        let out = w.finish();
        assert_eq!(
            lines(&out),
            vec![
                "G1 X0.00 Y0.00 Z-1.00 F800",
                "G1 X0.25",
                "G1 Y0.25 Z-1.50",
            ]
        );
    }

    #[test]
    fn test_buffer_replacement_diffs_against_confirmed() {
        let mut w = GcodeWriter::new();
        w.linear_coalesced(0.0, 0.0, -1.0, 800);
        w.linear_coalesced(0.25, 0.0, -1.0, 800);
        w.linear_coalesced(0.50, 0.0, -1.0, 800);
        // Z changes versus confirmed (-1.0 -> -1.2) along with X: flush
        w.linear_coalesced(0.75, 0.0, -1.2, 800);
        let out = w.finish();
        assert_eq!(
            lines(&out),
            vec![
                "G1 X0.00 Y0.00 Z-1.00 F800",
                "G1 X0.50",
                "G1 X0.75 Z-1.20",
            ]
        );
    }

    #[test]
    fn test_rapid_flushes_and_confirms() {
        let mut w = GcodeWriter::new();
        w.linear_coalesced(0.0, 0.0, -1.0, 800);
        w.linear_coalesced(0.25, 0.0, -1.0, 800);
        w.rapid(None, None, Some(5.0));
        // Z was confirmed at 5.0 by the rapid, so the next cut re-emits
        // Z; X is unchanged versus the confirmed 0.25
        w.linear(0.25, 0.0, -1.0, 800);
        let out = w.finish();
        assert_eq!(
            lines(&out),
            vec![
                "G1 X0.00 Y0.00 Z-1.00 F800",
                "G1 X0.25",
                "G0 Z5.00",
                "G1 Z-1.00",
            ]
        );
    }

    #[test]
    fn test_no_change_move_buffers_quietly() {
        let mut w = GcodeWriter::new();
        w.linear(1.0, 1.0, -1.0, 500);
        w.linear_coalesced(1.0, 1.0, -1.0, 500);
        let out = w.finish();
        // The no-op move surfaces as a bare G1 on flush
        assert_eq!(lines(&out), vec!["G1 X1.00 Y1.00 Z-1.00 F500", "G1"]);
    }

    #[test]
    fn test_comment_and_raw() {
        let mut w = GcodeWriter::new();
        w.comment("header");
        w.raw("G21 ; Set units to millimeters");
        assert_eq!(w.finish(), "; header\nG21 ; Set units to millimeters\n");
    }
}
