//! src/error.rs
//! Error types for the convergence checker. Every parser and the
//! interpolation path return a `Result` built from this enum, so a failed
//! read can never leave a partially populated structure behind the caller's
//! back.

use ndarray::Array1;
use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Error, Debug)]
pub enum ConvError {
    // --- I/O and Parsing Errors ---
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Unable to open file '{path}': {source}")]
    FileOpen {
        path: String,
        source: std::io::Error,
    },

    #[error("Unable to create file '{path}': {source}")]
    FileCreation {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse data from file '{file}': {message}")]
    FileParse { file: String, message: String },

    #[error("Anchor \"{anchor}\" not found in file '{file}'")]
    AnchorNotFound {
        file: String,
        anchor: &'static str,
    },

    #[error("No band block matching \"{pattern}\" for k-point {kpoint} in file '{file}'")]
    BandBlockNotFound {
        file: String,
        kpoint: usize,
        pattern: String,
    },

    #[error(
        "Band block for k-point {kpoint} in file '{file}' holds {found} energies, expected {expected}"
    )]
    BandCountMismatch {
        file: String,
        kpoint: usize,
        expected: usize,
        found: usize,
    },

    // --- Linear Algebra and Numerical Errors ---
    #[error("Linear algebra operation failed")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("Bloch Hamiltonian at k = {kvec} is not Hermitian (residual {residual:e})")]
    NotHermitian { kvec: Array1<f64>, residual: f64 },
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, ConvError>;
