// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fitting and goodness-of-fit helpers.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use thiserror::Error;

use super::median;

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Find the additive offset `g` minimising `Σ (data - (model + g))²`. Pairs
/// where the data are NaN are ignored.
///
/// This is a Newton iteration on the sum of squared residuals. The objective
/// is quadratic, so convergence should take a single step; anything else
/// (e.g. infinities in the inputs) is reported as non-convergence.
pub(crate) fn fit_offset(data: &[f64], model: &[f64]) -> Result<f64, FitError> {
    let residuals: Vec<f64> = data
        .iter()
        .zip(model)
        .filter(|(d, m)| !d.is_nan() && !m.is_nan())
        .map(|(d, m)| d - m)
        .collect();
    if residuals.is_empty() {
        return Err(FitError::NoData);
    }

    let n = residuals.len() as f64;
    let mut offset = 0.0;
    for _ in 0..MAX_ITERATIONS {
        let gradient = -2.0 * residuals.iter().map(|r| r - offset).sum::<f64>();
        let curvature = 2.0 * n;
        let step = gradient / curvature;
        offset -= step;
        if !offset.is_finite() {
            break;
        }
        if step.abs() <= CONVERGENCE_TOLERANCE * offset.abs().max(1.0) {
            return Ok(offset);
        }
    }

    Err(FitError::NonConvergence {
        iterations: MAX_ITERATIONS,
    })
}

/// Pearson's chi-square test of `data` against expected values `model`,
/// returning the p-value with `n - 1` degrees of freedom. Both arrays are
/// first shifted so that the model's minimum sits at `offset`, because the
/// test needs strictly positive expected values. NaN data are ignored.
///
/// `None` is returned when there are fewer than two usable values or the
/// shifted model is not strictly positive.
pub(crate) fn chisq_pvalue(data: &[f64], model: &[f64], offset: f64) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = data
        .iter()
        .zip(model)
        .filter(|(d, m)| !d.is_nan() && !m.is_nan())
        .map(|(&d, &m)| (d, m))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let model_min = pairs.iter().map(|&(_, m)| m).fold(f64::INFINITY, f64::min);
    let shift = offset - model_min;
    let mut stat = 0.0;
    for (d, m) in pairs.iter() {
        let observed = d + shift;
        let expected = m + shift;
        if expected <= 0.0 {
            return None;
        }
        stat += (observed - expected).powi(2) / expected;
    }
    if !stat.is_finite() {
        return None;
    }
    if stat <= 0.0 {
        return Some(1.0);
    }

    let dof = (pairs.len() - 1) as f64;
    let dist = ChiSquared::new(dof).ok()?;
    Some(dist.sf(stat))
}

/// Least-squares polynomial fit of degree `deg`. The coefficients are
/// returned highest power first.
pub(crate) fn polyfit(x: &[f64], y: &[f64], deg: usize) -> Result<Vec<f64>, FitError> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    let num_coeffs = deg + 1;
    if pairs.len() < num_coeffs {
        return Err(FitError::TooFewPoints {
            got: pairs.len(),
            need: num_coeffs,
        });
    }

    let a = DMatrix::from_fn(pairs.len(), num_coeffs, |row, col| {
        pairs[row].0.powi((deg - col) as i32)
    });
    let b = DVector::from_iterator(pairs.len(), pairs.iter().map(|&(_, b)| b));
    let svd = a.svd(true, true);
    let coeffs = svd
        .solve(&b, f64::EPSILON)
        .map_err(|e| FitError::Singular(e.to_string()))?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(FitError::Singular(
            "polynomial coefficients are not finite".to_string(),
        ));
    }

    Ok(coeffs.iter().copied().collect())
}

/// Evaluate a polynomial (coefficients highest power first) with Horner's
/// method.
pub(crate) fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// The real roots of a polynomial of degree two or less (coefficients
/// highest power first), in ascending order.
pub(crate) fn real_roots(coeffs: &[f64]) -> Vec<f64> {
    // Strip leading zeros; they don't change the polynomial.
    let first_nonzero = coeffs.iter().position(|&c| c != 0.0);
    let coeffs = match first_nonzero {
        Some(i) => &coeffs[i..],
        None => return vec![],
    };

    let mut roots = match *coeffs {
        [a, b, c] => {
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                vec![]
            } else {
                // Avoid cancellation between -b and the square root.
                let q = -0.5 * (b + b.signum() * disc.sqrt());
                if q == 0.0 {
                    vec![0.0]
                } else {
                    vec![q / a, c / q]
                }
            }
        }
        [a, b] => vec![-b / a],
        _ => vec![],
    };
    roots.sort_unstable_by(|a, b| a.total_cmp(b));
    roots.dedup();
    roots
}

/// Bin `y` by `x` into `num_bins` equal-width bins spanning the range of `x`,
/// and return each bin's centre alongside the median `y` of the bin. The last
/// bin includes its right edge.
pub(crate) fn binned_medians(x: &[f64], y: &[f64], num_bins: usize) -> Vec<(f64, Option<f64>)> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.is_empty() || num_bins == 0 {
        return vec![];
    }

    let min = pairs.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max = pairs.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    // A degenerate range is widened by half a unit either side.
    let (min, max) = if max == min {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };

    let width = (max - min) / num_bins as f64;
    let mut bins: Vec<Vec<f64>> = vec![vec![]; num_bins];
    for &(a, b) in &pairs {
        let i = (((a - min) / width).floor() as usize).min(num_bins - 1);
        bins[i].push(b);
    }
    bins.iter()
        .enumerate()
        .map(|(i, values)| (min + (i as f64 + 0.5) * width, median(values)))
        .collect()
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("There are no finite values to fit")]
    NoData,

    #[error("The fit did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("A fit needs at least {need} points, but only {got} are available")]
    TooFewPoints { got: usize, need: usize },

    #[error("The fit's linear system could not be solved: {0}")]
    Singular(String),
}
