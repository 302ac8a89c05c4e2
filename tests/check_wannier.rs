//! End-to-end runs of the full pipeline on fixture files: a one-orbital
//! Hamiltonian whose single flat band either matches the reference energy
//! exactly, misses it by 0.5 eV, or falls outside the comparison window.

use std::fs;
use std::path::PathBuf;

use wannier_conv::compare::{EnergyWindow, band_deviation};
use wannier_conv::io::write_conv;
use wannier_conv::nscf::NscfOut;
use wannier_conv::wannier90::Hamiltonian;
use wannier_conv::win::read_nexclude;

struct Fixture {
    dir: PathBuf,
}

impl Fixture {
    /// A scratch directory holding the three input files: a flat band at
    /// 1.5 eV, one gamma-only k-point with reference energy `eref`, Fermi
    /// level `ef`, and no excluded bands.
    fn new(name: &str, ef: f64, eref: f64) -> Fixture {
        let mut dir = std::env::temp_dir();
        dir.push(format!("wannier_conv_e2e_{}_{}", std::process::id(), name));
        fs::create_dir_all(&dir).unwrap();

        let hr = " written on 24Jan2024\n\
                   1\n\
                   1\n\
                   1\n\
                   0 0 0 1 1 1.5 0.0\n";
        fs::write(dir.join("pwscf_hr.dat"), hr).unwrap();

        let k = [0.0, 0.0, 0.0];
        let mut nscf = Vec::new();
        nscf.push(format!(
            "{:<26}{:>9} ev",
            "     the Fermi energy is",
            format!("{:.4}", ef)
        ));
        nscf.push(format!("     number of Kohn-Sham states={:>12}", 1));
        nscf.push(format!("     number of k points={:>6}", 1));
        nscf.push("                       cart. coord. in units 2pi/alat".to_string());
        nscf.push(kp_row(1, k, 1.0));
        nscf.push(String::new());
        nscf.push("                       cryst. coord.".to_string());
        nscf.push(kp_row(1, k, 1.0));
        nscf.push(String::new());
        nscf.push(format!(
            "          k ={:7.4}{:7.4}{:7.4} (    27 PWs)   bands (ev):",
            k[0], k[1], k[2]
        ));
        nscf.push(String::new());
        nscf.push(format!("{:9.4}", eref));
        fs::write(dir.join("nscf.out"), nscf.join("\n")).unwrap();

        fs::write(dir.join("pwscf.win"), "num_wann = 1\nnum_iter = 100\n").unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.join(name).to_str().unwrap().to_string()
    }

    fn run(&self, window: &EnergyWindow) -> wannier_conv::BandDeviation {
        let ham = Hamiltonian::from_hr(&self.path("pwscf_hr.dat")).unwrap();
        let nscf = NscfOut::from_file(&self.path("nscf.out")).unwrap();
        let nexclude = read_nexclude(&self.path("pwscf.win")).unwrap();
        let dev = band_deviation(&ham, &nscf, nexclude, window).unwrap();
        write_conv(&self.path("CONV"), window, &dev).unwrap();
        dev
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.dir).ok();
    }
}

fn kp_row(idx: usize, k: [f64; 3], wk: f64) -> String {
    format!(
        "        k({:5}) = ({:12.7}{:12.7}{:12.7}), wk ={:12.7}",
        idx, k[0], k[1], k[2], wk
    )
}

const WINDOW: EnergyWindow = EnergyWindow {
    emin: -100.0,
    emax: 0.0,
};

#[test]
fn matching_band_gives_zero_deviation() {
    // Fermi level above the band so it falls inside the window
    let fx = Fixture::new("match", 2.0, 1.5);
    let dev = fx.run(&WINDOW);
    assert_eq!(dev.count, 1);
    assert_eq!(dev.rms, 0.0);
    assert_eq!(dev.max, 0.0);
    let report = fs::read_to_string(fx.path("CONV")).unwrap();
    assert_eq!(
        report,
        "# energy window [-100.00: 0.00]\n\
         average diff =      0.00000000\n\
         max diff     =      0.00000000\n"
    );
}

#[test]
fn shifted_reference_gives_half_ev_deviation() {
    let fx = Fixture::new("shift", 2.0, 2.0);
    let dev = fx.run(&WINDOW);
    assert_eq!(dev.count, 1);
    assert!((dev.rms - 0.5).abs() < 1e-10);
    assert!((dev.max - 0.5).abs() < 1e-10);
    let report = fs::read_to_string(fx.path("CONV")).unwrap();
    assert_eq!(
        report,
        "# energy window [-100.00: 0.00]\n\
         average diff =      0.50000000\n\
         max diff     =      0.50000000\n"
    );
}

#[test]
fn band_above_the_window_reports_nan() {
    // band at +0.5 eV relative to the Fermi level, window tops out at 0
    let fx = Fixture::new("nan", 1.0, 1.5);
    let dev = fx.run(&WINDOW);
    assert_eq!(dev.count, 0);
    assert!(dev.rms.is_nan());
    let report = fs::read_to_string(fx.path("CONV")).unwrap();
    assert_eq!(
        report,
        "# energy window [-100.00: 0.00]\n\
         average diff = NaNmax diff     =      0.00000000\n"
    );
}

#[test]
fn excluded_bands_shift_the_reference_numbering() {
    let fx = Fixture::new("exclude", 2.0, 1.5);
    // rewrite the log with a core band in front and point exclude_bands at it
    let nscf = fs::read_to_string(fx.path("nscf.out")).unwrap();
    let nscf = nscf
        .replace(
            &format!("     number of Kohn-Sham states={:>12}", 1),
            &format!("     number of Kohn-Sham states={:>12}", 2),
        )
        .replace(
            &format!("{:9.4}", 1.5),
            &format!("{:9.4}{:9.4}", -50.0, 1.5),
        );
    fs::write(fx.path("nscf.out"), nscf).unwrap();
    fs::write(fx.path("pwscf.win"), "exclude_bands = 1-1\n").unwrap();
    let dev = fx.run(&WINDOW);
    assert_eq!(dev.count, 1);
    assert_eq!(dev.rms, 0.0);
}
