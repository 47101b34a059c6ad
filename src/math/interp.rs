// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Piecewise interpolation of tabulated data.

use thiserror::Error;

/// An interpolating function through a set of knots. Evaluation outside the
/// knots is clamped to the end values.
#[derive(Debug, Clone)]
pub(crate) enum Interpolator {
    Linear {
        x: Vec<f64>,
        y: Vec<f64>,
    },

    /// A natural cubic spline; `b`, `c` and `d` are the per-segment
    /// polynomial coefficients.
    Cubic {
        x: Vec<f64>,
        y: Vec<f64>,
        b: Vec<f64>,
        c: Vec<f64>,
        d: Vec<f64>,
    },
}

impl Interpolator {
    pub(crate) fn linear(x: &[f64], y: &[f64]) -> Result<Interpolator, InterpolationError> {
        check_knots(x, y, 2)?;
        Ok(Interpolator::Linear {
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    pub(crate) fn cubic(x: &[f64], y: &[f64]) -> Result<Interpolator, InterpolationError> {
        check_knots(x, y, 4)?;

        let m = x.len();
        let k = m - 1;
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        // Tridiagonal system for the second derivatives, with natural
        // boundary conditions.
        let mut alpha = vec![0.0; k];
        for i in 1..k {
            alpha[i] = 3.0 / h[i] * (y[i + 1] - y[i]) - 3.0 / h[i - 1] * (y[i] - y[i - 1]);
        }

        let mut l = vec![1.0; m];
        let mut mu = vec![0.0; m];
        let mut z = vec![0.0; m];
        for i in 1..k {
            l[i] = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l[i];
            z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
        }

        let mut c = vec![0.0; m];
        let mut b = vec![0.0; k];
        let mut d = vec![0.0; k];
        for j in (0..k).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            b[j] = (y[j + 1] - y[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
        }

        Ok(Interpolator::Cubic {
            x: x.to_vec(),
            y: y.to_vec(),
            b,
            c,
            d,
        })
    }

    pub(crate) fn eval(&self, t: f64) -> f64 {
        let (x, y) = match self {
            Interpolator::Linear { x, y } => (x, y),
            Interpolator::Cubic { x, y, .. } => (x, y),
        };
        let last = x.len() - 1;
        if t <= x[0] {
            return y[0];
        }
        if t >= x[last] {
            return y[last];
        }
        // The segment containing t; x[seg] <= t < x[seg + 1].
        let seg = x.partition_point(|&v| v <= t) - 1;
        let dx = t - x[seg];

        match self {
            Interpolator::Linear { .. } => {
                let frac = dx / (x[seg + 1] - x[seg]);
                y[seg] + frac * (y[seg + 1] - y[seg])
            }
            Interpolator::Cubic { b, c, d, .. } => {
                y[seg] + b[seg] * dx + c[seg] * dx * dx + d[seg] * dx * dx * dx
            }
        }
    }
}

fn check_knots(x: &[f64], y: &[f64], min: usize) -> Result<(), InterpolationError> {
    if x.len() != y.len() {
        return Err(InterpolationError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < min {
        return Err(InterpolationError::TooFewKnots {
            got: x.len(),
            need: min,
        });
    }
    if x.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(InterpolationError::NotIncreasing);
    }
    Ok(())
}

#[derive(Error, Debug, PartialEq)]
pub enum InterpolationError {
    #[error("Interpolation needs as many x values as y values (got {x} and {y})")]
    LengthMismatch { x: usize, y: usize },

    #[error("Interpolation needs at least {need} knots, but only {got} were given")]
    TooFewKnots { got: usize, need: usize },

    #[error("Interpolation knots must be strictly increasing")]
    NotIncreasing,
}
