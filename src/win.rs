//! Exclusion count from the wannier90 control file (`seedname.win`).

use crate::error::{ConvError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Number of low-lying reference bands left out of the wannierisation, read
/// from an `exclude_bands = 1-N` line. A later matching line overrides an
/// earlier one; no matching line means no exclusion.
pub fn read_nexclude(path: &str) -> Result<usize> {
    let win = File::open(path).map_err(|e| ConvError::FileOpen {
        path: path.to_string(),
        source: e,
    })?;
    let reader = BufReader::new(win);
    let mut nexclude = 0;
    for line in reader.lines() {
        let line = line?;
        if !line.contains("exclude") {
            continue;
        }
        let tail = line.split('-').nth(1).ok_or_else(|| ConvError::FileParse {
            file: path.to_string(),
            message: format!("exclude line has no '-' delimiter: '{}'", line),
        })?;
        nexclude = tail.trim().parse::<usize>().map_err(|e| ConvError::FileParse {
            file: path.to_string(),
            message: format!("failed to parse exclusion count from '{}': {}", line, e),
        })?;
    }
    Ok(nexclude)
}
