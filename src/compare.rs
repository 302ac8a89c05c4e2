//! Windowed comparison between the interpolated and the reference bands.

use crate::error::Result;
use crate::nscf::NscfOut;
use crate::wannier90::Hamiltonian;
use ndarray::prelude::*;
use rayon::prelude::*;

/// Comparison window relative to the Fermi level, in eV.
#[derive(Clone, Copy, Debug)]
pub struct EnergyWindow {
    pub emin: f64,
    pub emax: f64,
}

/// Accumulated deviation between interpolated and reference bands.
#[derive(Clone, Copy, Debug)]
pub struct BandDeviation {
    /// Root-mean-square deviation over all compared band instances. NaN when
    /// no band instance fell inside the window.
    pub rms: f64,
    /// Largest single deviation; 0 when nothing was compared.
    pub max: f64,
    /// The number of compared band instances.
    pub count: usize,
}

/// Interpolate the Hamiltonian at every reference k-point (crystal
/// coordinates) and accumulate the deviation of the bands inside `window`.
/// `nexclude` low-lying reference bands were left out of the wannierisation
/// and shift the reference band numbering.
///
/// The k-points are independent and solved in parallel; the partial results
/// are collected in k order and folded sequentially, so the outcome does not
/// depend on scheduling.
pub fn band_deviation(
    ham: &Hamiltonian,
    nscf: &NscfOut,
    nexclude: usize,
    window: &EnergyWindow,
) -> Result<BandDeviation> {
    let partials: Vec<(f64, f64, usize)> = nscf
        .kp_cryst
        .axis_iter(Axis(0))
        .into_par_iter()
        .enumerate()
        .map(|(ik, kvec)| deviation_onek(ham, nscf, nexclude, window, ik, &kvec.to_owned()))
        .collect::<Result<Vec<_>>>()?;

    let mut delta_sum = 0.0;
    let mut delta_max: f64 = 0.0;
    let mut count = 0usize;
    for (sum, max, n) in partials {
        delta_sum += sum;
        delta_max = delta_max.max(max);
        count += n;
    }
    let rms = if count > 0 {
        (delta_sum / count as f64).sqrt()
    } else {
        f64::NAN
    };
    Ok(BandDeviation {
        rms,
        max: delta_max.sqrt(),
        count,
    })
}

/// Squared-deviation sum, maximum squared deviation and instance count for a
/// single k-point. Window selection leans on the ascending eigenvalue order:
/// the bands inside the window occupy the rank range `[nek_low, nek_max)`.
fn deviation_onek(
    ham: &Hamiltonian,
    nscf: &NscfOut,
    nexclude: usize,
    window: &EnergyWindow,
    ik: usize,
    kvec: &Array1<f64>,
) -> Result<(f64, f64, usize)> {
    let ek = ham.solve_band_onek(kvec)?;
    let nek_low = ek.iter().filter(|&&e| e - nscf.ef < window.emin).count();
    let mut nek_max = ek.iter().filter(|&&e| e - nscf.ef < window.emax).count();
    // the reference file only carries nbnd bands above the excluded ones
    if nexclude + nek_max > nscf.nbnd {
        nek_max = nscf.nbnd.saturating_sub(nexclude);
    }
    if nek_max <= nek_low {
        return Ok((0.0, 0.0, 0));
    }
    let mut sum = 0.0;
    let mut max: f64 = 0.0;
    for n in nek_low..nek_max {
        // raw energies on both sides; the Fermi shift only selects the window
        let d = ek[[n]] - nscf.energy[[ik, nexclude + n]];
        let d2 = d * d;
        sum += d2;
        if d2 > max {
            max = d2;
        }
    }
    Ok((sum, max, nek_max - nek_low))
}
