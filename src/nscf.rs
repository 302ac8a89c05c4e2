//! Parser for the verbose pw.x nscf log. The nscf calculation must be run
//! with `verbosity = 'high'`, otherwise the per-k band blocks are absent.

use crate::error::{ConvError, Result};
use ndarray::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// One fixed-column field of the pw.x log: an anchor substring marking the
/// line plus the byte range holding the value (`end = None` reads to the end
/// of the line). pw.x packs these columns without reliable separators, so
/// the offsets are part of the format contract.
#[derive(Clone, Copy)]
struct ColField {
    anchor: &'static str,
    start: usize,
    end: Option<usize>,
}

const FERMI_ENERGY: ColField = ColField {
    anchor: "Fermi energy",
    start: 26,
    end: Some(35),
};
const NUM_BANDS: ColField = ColField {
    anchor: "number of Kohn-Sham",
    start: 35,
    end: None,
};
const NUM_KPOINTS: ColField = ColField {
    anchor: "number of k points=",
    start: 25,
    end: Some(31),
};

/// Column range of the coordinate triple in a k-point table row.
const KP_COORDS: (usize, usize) = (20, 56);
/// Start column of the weight in a k-point table row.
const KP_WEIGHT: usize = 65;
/// The Cartesian table starts two lines below the k-point-count line; the
/// crystal table starts another `nk + 2` lines further down.
const KP_CART_OFFSET: usize = 2;
const KP_CRYST_GAP: usize = 4;
/// pw.x prints band energies eight per line.
const BANDS_PER_LINE: usize = 8;

impl ColField {
    fn matches(&self, line: &str) -> bool {
        line.contains(self.anchor)
    }

    fn slice<'a>(&self, line: &'a str) -> Option<&'a str> {
        if line.len() <= self.start {
            return None;
        }
        let end = self.end.map_or(line.len(), |e| e.min(line.len()));
        Some(&line[self.start..end])
    }
}

/// Reference band structure extracted from a pw.x nscf log. Energies and the
/// Fermi level are in eV, k-points both in 2pi/alat Cartesian units and in
/// crystal (fractional) coordinates.
#[derive(Debug)]
pub struct NscfOut {
    /// The Fermi energy.
    pub ef: f64,
    /// The number of Kohn-Sham states per k-point.
    pub nbnd: usize,
    /// The number of k-points.
    pub nk: usize,
    /// Cartesian k-point coordinates, a nk$\times$3 matrix.
    pub kp_cart: Array2<f64>,
    /// Crystal k-point coordinates, a nk$\times$3 matrix.
    pub kp_cryst: Array2<f64>,
    /// The weight of each k-point.
    pub wk: Array1<f64>,
    /// Reference band energies, a nk$\times$nbnd matrix, ascending per row.
    pub energy: Array2<f64>,
}

impl NscfOut {
    /// Read a verbose nscf log. Missing anchors, truncated tables or band
    /// blocks, and malformed numbers all fail the read as a whole.
    pub fn from_file(path: &str) -> Result<NscfOut> {
        let out = File::open(path).map_err(|e| ConvError::FileOpen {
            path: path.to_string(),
            source: e,
        })?;
        let reader = BufReader::new(out);
        let mut reads: Vec<String> = Vec::new();
        for line in reader.lines() {
            reads.push(line?);
        }
        Self::parse(&reads, path)
    }

    fn parse(lines: &[String], file: &str) -> Result<NscfOut> {
        let mut ef: Option<f64> = None;
        let mut nbnd: Option<usize> = None;
        // (nk, cartesian, crystal, weights)
        let mut ktables: Option<(usize, Array2<f64>, Array2<f64>, Array1<f64>)> = None;

        // repeated anchors overwrite sequentially, last occurrence wins
        for (i, line) in lines.iter().enumerate() {
            if FERMI_ENERGY.matches(line) {
                ef = Some(field_f64(&FERMI_ENERGY, line, file)?);
            }
            if NUM_BANDS.matches(line) {
                nbnd = Some(field_usize(&NUM_BANDS, line, file)?);
            }
            if NUM_KPOINTS.matches(line) {
                let nk = field_usize(&NUM_KPOINTS, line, file)?;
                let (cart, cryst, wk) = read_kpoint_tables(lines, i, nk, file)?;
                ktables = Some((nk, cart, cryst, wk));
            }
        }

        let ef = ef.ok_or_else(|| anchor_missing(file, FERMI_ENERGY.anchor))?;
        let nbnd = nbnd.ok_or_else(|| anchor_missing(file, NUM_BANDS.anchor))?;
        let (nk, kp_cart, kp_cryst, wk) =
            ktables.ok_or_else(|| anchor_missing(file, NUM_KPOINTS.anchor))?;
        let energy = read_band_energies(lines, &kp_cart, nbnd, file)?;

        Ok(NscfOut {
            ef,
            nbnd,
            nk,
            kp_cart,
            kp_cryst,
            wk,
            energy,
        })
    }
}

/// Read the Cartesian and crystal k-point tables printed below the
/// k-point-count line at `lines[at]`.
fn read_kpoint_tables(
    lines: &[String],
    at: usize,
    nk: usize,
    file: &str,
) -> Result<(Array2<f64>, Array2<f64>, Array1<f64>)> {
    let mut kp_cart = Array2::<f64>::zeros((nk, 3));
    let mut kp_cryst = Array2::<f64>::zeros((nk, 3));
    let mut wk = Array1::<f64>::zeros(nk);
    for j in 0..nk {
        let row = lines.get(at + j + KP_CART_OFFSET).ok_or_else(|| {
            parse_fail(file, format!("file ended inside the Cartesian k-point table (k-point {})", j))
        })?;
        kp_cart.row_mut(j).assign(&coord_triple(row, file)?);
        let tail = row.get(KP_WEIGHT..).ok_or_else(|| {
            parse_fail(file, format!("k-point table row too short for a weight: '{}'", row))
        })?;
        wk[[j]] = tail.trim().parse::<f64>().map_err(|e| {
            parse_fail(file, format!("failed to parse k-point weight '{}': {}", tail.trim(), e))
        })?;
        let row = lines.get(at + j + KP_CRYST_GAP + nk).ok_or_else(|| {
            parse_fail(file, format!("file ended inside the crystal k-point table (k-point {})", j))
        })?;
        kp_cryst.row_mut(j).assign(&coord_triple(row, file)?);
    }
    Ok((kp_cart, kp_cryst, wk))
}

/// Slice the coordinate columns out of a k-point table row and split the
/// three components inside the slice.
fn coord_triple(row: &str, file: &str) -> Result<Array1<f64>> {
    let (start, end) = KP_COORDS;
    if row.len() <= start {
        return Err(parse_fail(
            file,
            format!("k-point table row too short for coordinates: '{}'", row),
        ));
    }
    let slice = &row[start..end.min(row.len())];
    let vals = slice
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>().map_err(|e| {
                parse_fail(file, format!("failed to parse k coordinate '{}': {}", tok, e))
            })
        })
        .collect::<Result<Vec<f64>>>()?;
    if vals.len() != 3 {
        return Err(parse_fail(
            file,
            format!("expected 3 k coordinates, found {}: '{}'", vals.len(), slice),
        ));
    }
    Ok(Array1::from_vec(vals))
}

/// Re-locate each k-point's `bands (ev)` block by its formatted Cartesian
/// coordinates and read the `nbnd` energies below it (one header line
/// skipped). The last occurrence in the file wins, matching logs where the
/// k-point list itself precedes the band printout.
fn read_band_energies(
    lines: &[String],
    kp_cart: &Array2<f64>,
    nbnd: usize,
    file: &str,
) -> Result<Array2<f64>> {
    let nk = kp_cart.nrows();
    let nline = nbnd.div_ceil(BANDS_PER_LINE);
    let mut energy = Array2::<f64>::zeros((nk, nbnd));
    for j in 0..nk {
        let pattern = format!(
            "k ={:7.4}{:7.4}{:7.4}",
            kp_cart[[j, 0]],
            kp_cart[[j, 1]],
            kp_cart[[j, 2]]
        );
        let at = lines
            .iter()
            .rposition(|l| l.contains(&pattern))
            .ok_or_else(|| ConvError::BandBlockNotFound {
                file: file.to_string(),
                kpoint: j,
                pattern: pattern.clone(),
            })?;
        let mut vals: Vec<f64> = Vec::with_capacity(nbnd);
        for l in 0..nline {
            let row = lines.get(at + 2 + l).ok_or_else(|| {
                parse_fail(file, format!("file ended inside the band block for k-point {}", j))
            })?;
            for tok in row.split_whitespace() {
                vals.push(tok.parse::<f64>().map_err(|e| {
                    parse_fail(file, format!("failed to parse band energy '{}': {}", tok, e))
                })?);
            }
        }
        if vals.len() != nbnd {
            return Err(ConvError::BandCountMismatch {
                file: file.to_string(),
                kpoint: j,
                expected: nbnd,
                found: vals.len(),
            });
        }
        energy.row_mut(j).assign(&Array1::from_vec(vals));
    }
    Ok(energy)
}

fn field_f64(field: &ColField, line: &str, file: &str) -> Result<f64> {
    let slice = field
        .slice(line)
        .ok_or_else(|| parse_fail(file, format!("line too short for \"{}\": '{}'", field.anchor, line)))?;
    slice.trim().parse::<f64>().map_err(|e| {
        parse_fail(file, format!("failed to parse \"{}\" value '{}': {}", field.anchor, slice.trim(), e))
    })
}

fn field_usize(field: &ColField, line: &str, file: &str) -> Result<usize> {
    let slice = field
        .slice(line)
        .ok_or_else(|| parse_fail(file, format!("line too short for \"{}\": '{}'", field.anchor, line)))?;
    slice.trim().parse::<usize>().map_err(|e| {
        parse_fail(file, format!("failed to parse \"{}\" value '{}': {}", field.anchor, slice.trim(), e))
    })
}

fn parse_fail(file: &str, message: String) -> ConvError {
    ConvError::FileParse {
        file: file.to_string(),
        message,
    }
}

fn anchor_missing(file: &str, anchor: &'static str) -> ConvError {
    ConvError::AnchorNotFound {
        file: file.to_string(),
        anchor,
    }
}
