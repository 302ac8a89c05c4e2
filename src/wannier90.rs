//! Reader and Fourier interpolator for the real-space Hamiltonian written by
//! wannier90 with `write_hr = true` (`seedname_hr.dat`).

use crate::error::{ConvError, Result};
use ndarray::prelude::*;
use ndarray_linalg::*;
use num_complex::Complex;
use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// Real-space tight-binding Hamiltonian $\bra{m\bm 0}\hat H\ket{n\bm R}$.
/// All energies are eV, displacements are integer lattice coordinates.
#[derive(Debug)]
pub struct Hamiltonian {
    /// The number of Wannier orbitals.
    pub num_wann: usize,
    /// The number of real-space lattice vectors.
    pub nrpts: usize,
    /// Wigner-Seitz multiplicity of each lattice vector, normalizing the
    /// Fourier sum. Stored as f64 since it only ever divides phase factors.
    pub ndegen: Array1<f64>,
    /// Lattice displacement of each vector, a nrpts$\times$3 matrix.
    pub irvec: Array2<isize>,
    /// Hopping amplitudes, a nrpts$\times$num_wann$\times$num_wann tensor.
    ///
    /// Orbital transposition invariant: within each R block the file's first
    /// printed orbital index (the matrix row) varies fastest, so the record
    /// at block position (outer a, inner b) lands at `ham_r[[ir, b, a]]`.
    /// `ham_r[[ir, .., ..]]` is then the matrix $H_{mn}(\bm R)$ itself.
    pub ham_r: Array3<Complex<f64>>,
    /// Index of the first R = (0,0,0) vector, `None` if the file has none.
    pub ir0: Option<usize>,
}

impl Hamiltonian {
    /// Read a `seedname_hr.dat` file. The whole read either succeeds or
    /// fails with a diagnostic naming the file and the offending record.
    pub fn from_hr(path: &str) -> Result<Hamiltonian> {
        let hr = File::open(path).map_err(|e| ConvError::FileOpen {
            path: path.to_string(),
            source: e,
        })?;
        let reader = BufReader::new(hr);
        let mut reads: Vec<String> = Vec::new();
        for line in reader.lines() {
            reads.push(line?);
        }
        Self::parse(&reads, path)
    }

    fn parse(reads: &[String], file: &str) -> Result<Hamiltonian> {
        if reads.len() < 3 {
            return Err(parse_fail(
                file,
                format!("expected at least 3 header lines, found {}", reads.len()),
            ));
        }
        // line 0 is the creation-date header written by wannier90
        let num_wann = reads[1].trim().parse::<usize>().map_err(|e| {
            parse_fail(file, format!("failed to parse num_wann '{}': {}", reads[1].trim(), e))
        })?;
        let nrpts = reads[2].trim().parse::<usize>().map_err(|e| {
            parse_fail(file, format!("failed to parse nrpts '{}': {}", reads[2].trim(), e))
        })?;
        let (ndegen, degen_lines) = read_ndegen(&reads[3..], nrpts, file)?;

        let records = &reads[3 + degen_lines..];
        let need = nrpts * num_wann * num_wann;
        if records.len() < need {
            return Err(parse_fail(
                file,
                format!("expected {} hopping records, found {}", need, records.len()),
            ));
        }

        let mut irvec = Array2::<isize>::zeros((nrpts, 3));
        let mut ham_r = Array3::<Complex<f64>>::zeros((nrpts, num_wann, num_wann));
        let mut ir0: Option<usize> = None;
        for i in 0..nrpts {
            for a in 0..num_wann {
                for b in 0..num_wann {
                    let line = &records[i * num_wann * num_wann + a * num_wann + b];
                    let fields: Vec<&str> = line.split_whitespace().collect();
                    if fields.len() != 7 {
                        return Err(parse_fail(
                            file,
                            format!("expected 7 fields in hopping record, found {}: '{}'", fields.len(), line),
                        ));
                    }
                    if a == 0 && b == 0 {
                        for (r, f) in fields[0..3].iter().enumerate() {
                            irvec[[i, r]] = f.parse::<isize>().map_err(|e| {
                                parse_fail(file, format!("failed to parse R component '{}': {}", f, e))
                            })?;
                        }
                        if ir0.is_none() && irvec.row(i).iter().all(|x| *x == 0) {
                            ir0 = Some(i);
                        }
                    }
                    // orbital index fields are fixed by the nesting order;
                    // parsed only to reject malformed records
                    for f in &fields[3..5] {
                        f.parse::<usize>().map_err(|e| {
                            parse_fail(file, format!("failed to parse orbital index '{}': {}", f, e))
                        })?;
                    }
                    let re = fields[5].parse::<f64>().map_err(|e| {
                        parse_fail(file, format!("failed to parse hopping real part '{}': {}", fields[5], e))
                    })?;
                    let im = fields[6].parse::<f64>().map_err(|e| {
                        parse_fail(file, format!("failed to parse hopping imaginary part '{}': {}", fields[6], e))
                    })?;
                    ham_r[[i, b, a]] = Complex::new(re, im);
                }
            }
        }
        Ok(Hamiltonian {
            num_wann,
            nrpts,
            ndegen,
            irvec,
            ham_r,
            ir0,
        })
    }

    /// Fourier-transform the real-space Hamiltonian to the fractional
    /// k-point `kvec`:
    /// $$H_{mn}(\bm k)=\sum_{\bm R}\frac{e^{2\pi i\bm k\cdot\bm R}}{N_{\bm R}}H_{mn}(\bm R)$$
    #[allow(non_snake_case)]
    pub fn gen_ham(&self, kvec: &Array1<f64>) -> Array2<Complex<f64>> {
        let Us = (self.irvec.map(|x| *x as f64)).dot(kvec);
        let Us = Us.map(|x| Complex::<f64>::new(0.0, 2.0 * PI * *x));
        let Us = Us.mapv(Complex::exp);
        let factor = Us / self.ndegen.map(|x| Complex::<f64>::new(*x, 0.0));
        let mut hamk = Array2::<Complex<f64>>::zeros((self.num_wann, self.num_wann));
        for i in 0..self.nrpts {
            hamk = hamk + self.ham_r.slice(s![i, .., ..]).to_owned() * factor[[i]];
        }
        hamk
    }

    /// Ascending eigenvalues of the Bloch Hamiltonian at `kvec`.
    pub fn solve_band_onek(&self, kvec: &Array1<f64>) -> Result<Array1<f64>> {
        let hamk = self.gen_ham(kvec);
        check_hermitian(&hamk, kvec)?;
        let eval = hamk.eigvalsh(UPLO::Lower)?;
        Ok(eval)
    }

    /// Ascending eigenvalues and eigenvectors of the Bloch Hamiltonian at
    /// `kvec`. Row n of the returned matrix is the conjugated eigenvector
    /// of eigenvalue n.
    pub fn solve_onek(&self, kvec: &Array1<f64>) -> Result<(Array1<f64>, Array2<Complex<f64>>)> {
        let hamk = self.gen_ham(kvec);
        check_hermitian(&hamk, kvec)?;
        let (eval, evec) = hamk.eigh(UPLO::Lower)?;
        let evec = evec.reversed_axes().map(|x| x.conj());
        Ok((eval, evec))
    }
}

/// Parse `nrpts` degeneracy values packed 15 per line, starting at
/// `lines[0]`. Returns the values and the number of lines consumed; surplus
/// values on the last consumed line are ignored.
fn read_ndegen(lines: &[String], nrpts: usize, file: &str) -> Result<(Array1<f64>, usize)> {
    let mut ndegen: Vec<f64> = Vec::with_capacity(nrpts);
    let mut used = 0;
    while ndegen.len() < nrpts {
        let line = lines.get(used).ok_or_else(|| {
            parse_fail(
                file,
                format!("file ended inside the degeneracy block ({} of {} values)", ndegen.len(), nrpts),
            )
        })?;
        for tok in line.split_whitespace() {
            let w = tok.parse::<usize>().map_err(|e| {
                parse_fail(file, format!("failed to parse degeneracy '{}': {}", tok, e))
            })?;
            ndegen.push(w as f64);
        }
        used += 1;
    }
    ndegen.truncate(nrpts);
    Ok((Array1::from_vec(ndegen), used))
}

fn check_hermitian(hamk: &Array2<Complex<f64>>, kvec: &Array1<f64>) -> Result<()> {
    let dag = hamk.map(|x| x.conj());
    let dag = dag.t();
    let mut residual: f64 = 0.0;
    for (a, b) in hamk.iter().zip(dag.iter()) {
        residual += (a - b).norm();
    }
    if residual > 1e-8 {
        return Err(ConvError::NotHermitian {
            kvec: kvec.clone(),
            residual,
        });
    }
    Ok(())
}

fn parse_fail(file: &str, message: String) -> ConvError {
    ConvError::FileParse {
        file: file.to_string(),
        message,
    }
}
