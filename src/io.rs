//! Fixed-format text report of the comparison result.

use crate::compare::{BandDeviation, EnergyWindow};
use crate::error::{ConvError, Result};
use std::fs::File;
use std::io::Write;

/// Render the CONV report. The field widths match the historical format:
/// window bounds to 2 decimals, deviations to 8 decimals in 15 columns.
/// When nothing was compared the average line is the bare `NaN` token with
/// no trailing newline, so the max line continues on the same line.
pub fn render_conv(window: &EnergyWindow, dev: &BandDeviation) -> String {
    let mut s0 = String::new();
    s0.push_str(&format!(
        "# energy window [{:>5.2}:{:>5.2}]\n",
        window.emin, window.emax
    ));
    if dev.count > 0 {
        s0.push_str(&format!("average diff = {:>15.8}\n", dev.rms));
    } else {
        s0.push_str("average diff = NaN");
    }
    s0.push_str(&format!("max diff     = {:>15.8}\n", dev.max));
    s0
}

/// Write the CONV report to `output`.
pub fn write_conv(output: &str, window: &EnergyWindow, dev: &BandDeviation) -> Result<()> {
    let mut file = File::create(output).map_err(|e| ConvError::FileCreation {
        path: output.to_string(),
        source: e,
    })?;
    file.write_all(render_conv(window, dev).as_bytes())?;
    Ok(())
}
