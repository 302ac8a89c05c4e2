//! Convergence check of a wannier90 tight-binding interpolation against the
//! band structure of the underlying pw.x calculation.
//!
//! The pipeline reads three files and writes one report:
//!
//! 1: `seedname_hr.dat` — the real-space Hamiltonian written by wannier90,
//! parsed by [`wannier90::Hamiltonian::from_hr`]
//!
//! 2: the verbose pw.x nscf log, parsed by [`nscf::NscfOut::from_file`]
//!
//! 3: `seedname.win` — only the `exclude_bands` count is read, by
//! [`win::read_nexclude`]
//!
//! For every reference k-point the Hamiltonian is Fourier-interpolated and
//! diagonalized; the bands inside an energy window around the Fermi level
//! are compared rank by rank against the reference energies, and the RMS and
//! maximum deviation land in a small fixed-format report
//! ([`compare::band_deviation`], [`io::write_conv`]).

pub mod compare;
pub mod error;
pub mod io;
pub mod nscf;
pub mod wannier90;
pub mod win;

pub use compare::{BandDeviation, EnergyWindow, band_deviation};
pub use error::{ConvError, Result};
pub use nscf::NscfOut;
pub use wannier90::Hamiltonian;
