// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use ndarray::Array1;
use thiserror::Error;

use crate::{
    constants::GAIN_POLY_ORDER,
    io::{read_npy_1d, write_npy_1d, ReadInputError, WriteOutputError},
    math::{polyfit, polyval, real_roots, FitError},
};

const NUM_COEFFS: usize = GAIN_POLY_ORDER + 1;

/// A quadratic mapping observed tile power to the power lost to the
/// receiver's nonlinearity. Coefficients are highest order first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainCurve {
    pub coeffs: [f64; NUM_COEFFS],
}

impl GainCurve {
    /// Fit the curve to the residuals measured at powers within
    /// `[band_start, band_stop]`.
    pub fn fit(
        powers: &[f64],
        residuals: &[f64],
        band_start: f64,
        band_stop: f64,
    ) -> Result<GainCurve, GainCurveError> {
        let (x, y): (Vec<f64>, Vec<f64>) = powers
            .iter()
            .zip(residuals)
            .filter(|&(&p, _)| band_start <= p && p <= band_stop)
            .map(|(&p, &r)| (p, r))
            .unzip();
        if x.len() < NUM_COEFFS {
            return Err(GainCurveError::TooFewPoints {
                got: x.len(),
                need: NUM_COEFFS,
                band_start,
                band_stop,
            });
        }

        let fitted = polyfit(&x, &y, GAIN_POLY_ORDER)?;
        let mut coeffs = [0.0; NUM_COEFFS];
        coeffs.copy_from_slice(&fitted);
        Ok(GainCurve { coeffs })
    }

    pub fn eval(&self, power: f64) -> f64 {
        polyval(&self.coeffs, power)
    }

    /// The power at which the receiver turns nonlinear; the largest real root
    /// of the curve.
    pub fn root(&self) -> Option<f64> {
        real_roots(&self.coeffs).last().copied()
    }

    /// Correct a tile power. Powers below the curve's root (or any power, if
    /// it has no real roots) are unchanged.
    pub fn correct(&self, power: f64) -> f64 {
        match self.root() {
            Some(root) if power >= root => power + self.eval(power),
            _ => power,
        }
    }

    pub fn read(path: &Path) -> Result<GainCurve, GainCurveError> {
        let array = read_npy_1d(path)?;
        if array.len() != NUM_COEFFS {
            return Err(GainCurveError::BadCoefficients {
                path: path.to_path_buf(),
                got: array.len(),
            });
        }
        let mut coeffs = [0.0; NUM_COEFFS];
        coeffs
            .iter_mut()
            .zip(array.iter())
            .for_each(|(c, &a)| *c = a);
        Ok(GainCurve { coeffs })
    }

    pub fn write(&self, path: &Path) -> Result<(), GainCurveError> {
        write_npy_1d(path, &Array1::from(self.coeffs.to_vec()))?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum GainCurveError {
    #[error("Only {got} gain residuals lie within [{band_start}, {band_stop}] dBm; at least {need} are needed for a fit")]
    TooFewPoints {
        got: usize,
        need: usize,
        band_start: f64,
        band_stop: f64,
    },

    #[error("Couldn't fit the gain curve: {0}")]
    Fit(#[from] FitError),

    #[error("'{}' holds {got} coefficients; a gain curve has three", .path.display())]
    BadCoefficients { path: PathBuf, got: usize },

    #[error(transparent)]
    Read(#[from] ReadInputError),

    #[error(transparent)]
    Write(#[from] WriteOutputError),
}
