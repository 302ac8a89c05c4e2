use clap::Parser;
use colored::Colorize;

use wannier_conv::compare::{EnergyWindow, band_deviation};
use wannier_conv::io::write_conv;
use wannier_conv::nscf::NscfOut;
use wannier_conv::wannier90::Hamiltonian;
use wannier_conv::win::read_nexclude;

/// Check the convergence of a wannier90 interpolation against pw.x bands.
#[derive(Parser)]
#[command(name = "wannier_conv")]
#[command(version)]
#[command(
    about = "Compare wannier90-interpolated bands with the pw.x reference bands",
    long_about = None
)]
struct Cli {
    /// wannier90 real-space Hamiltonian (seedname_hr.dat)
    #[arg(long, default_value = "pwscf_hr.dat")]
    hr: String,

    /// pw.x nscf log, written with verbosity = 'high'
    #[arg(long, default_value = "check_wannier/nscf.out")]
    nscf: String,

    /// wannier90 control file holding exclude_bands
    #[arg(long, default_value = "pwscf.win")]
    win: String,

    /// Report file
    #[arg(long, default_value = "check_wannier/CONV")]
    output: String,

    /// Lower window bound relative to the Fermi level, in eV
    #[arg(long, default_value_t = -100.0, allow_negative_numbers = true)]
    emin: f64,

    /// Upper window bound relative to the Fermi level, in eV
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    emax: f64,
}

fn run(cli: &Cli) -> wannier_conv::Result<()> {
    let ham = Hamiltonian::from_hr(&cli.hr)?;
    let nscf = NscfOut::from_file(&cli.nscf)?;
    let nexclude = read_nexclude(&cli.win)?;
    let window = EnergyWindow {
        emin: cli.emin,
        emax: cli.emax,
    };
    let dev = band_deviation(&ham, &nscf, nexclude, &window)?;
    write_conv(&cli.output, &window, &dev)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "[ERR]".red().bold(), e);
        std::process::exit(1);
    }
}
