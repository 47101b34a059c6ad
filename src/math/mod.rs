// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.
//!
//! Robust statistics here ignore NaNs, and return `None` rather than a
//! sentinel when there's nothing to compute on.

mod fit;
mod interp;

pub(crate) use fit::{binned_medians, chisq_pvalue, fit_offset, polyfit, polyval, real_roots};
pub use fit::FitError;
pub use interp::InterpolationError;
pub(crate) use interp::Interpolator;

use std::f64::consts::{PI, TAU};

use crate::constants::MAD_SCALE;

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    v.sort_unstable_by(|a, b| a.total_cmp(b));
    v
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// The median of the non-NaN values.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    median_of_sorted(&finite_sorted(values))
}

/// The scaled median absolute deviation of the non-NaN values.
pub(crate) fn mad(values: &[f64]) -> Option<f64> {
    let sorted = finite_sorted(values);
    let med = median_of_sorted(&sorted)?;
    let deviations: Vec<f64> = sorted.iter().map(|x| (x - med).abs()).collect();
    median(&deviations).map(|m| m * MAD_SCALE)
}

/// The arithmetic mean of the non-NaN values.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0_usize), |(s, c), &x| (s + x, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// The population standard deviation (i.e. no Bessel correction).
pub(crate) fn std_dev<'a, I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let (sum, count) = iter.clone().fold((0.0, 0_usize), |(s, c), &x| (s + x, c + 1));
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    let var = iter.map(|&x| (x - mean).powi(2)).sum::<f64>() / count as f64;
    Some(var.sqrt())
}

/// Unwrap angles by changing any jump greater than π between consecutive
/// elements to its 2π complement.
pub(crate) fn unwrap_angles(angles: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(angles.len());
    let mut correction = 0.0;
    for (i, &a) in angles.iter().enumerate() {
        if i > 0 {
            let delta = a - angles[i - 1];
            // Map the jump into [-π, π), keeping +π jumps as +π.
            let mut wrapped = (delta + PI).rem_euclid(TAU) - PI;
            if wrapped == -PI && delta > 0.0 {
                wrapped = PI;
            }
            if delta.abs() >= PI {
                correction += wrapped - delta;
            }
        }
        out.push(a + correction);
    }
    out
}

/// Wrap an angle into [0, 2π).
#[inline]
pub(crate) fn wrap_angle(a: f64) -> f64 {
    let w = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly 2π for tiny negative inputs.
    if w >= TAU {
        0.0
    } else {
        w
    }
}
