// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Combining the gain residuals of all antenna pairs.

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{GainCurve, GainCurveError, GainResiduals};
use crate::{
    constants::GAIN_PROFILE_BINS,
    io::{get_all_matches_from_glob, ReadInputError},
    math::binned_medians,
};

/// Read and concatenate every per-pair residual file in `dir`. Unreadable
/// files are skipped with a warning.
pub fn collate_residuals(dir: &Path) -> Result<GainResiduals, ReadInputError> {
    let pattern = dir.join("*_gain_fit.json");
    let files = get_all_matches_from_glob(&pattern.display().to_string())?;
    debug!("Collating {} gain residual files", files.len());

    let mut all = GainResiduals::default();
    for file in files {
        match GainResiduals::read(&file) {
            Ok(r) => all.append(r),
            Err(e) => warn!("Skipping gain residuals: {e}"),
        }
    }
    Ok(all)
}

/// Drop residuals measured at powers outside `[min, max]`.
pub fn remove_outliers(residuals: &GainResiduals, min: f64, max: f64) -> GainResiduals {
    let (pass_data, pass_resi) = residuals
        .pass_data
        .iter()
        .zip(&residuals.pass_resi)
        .filter(|&(&p, _)| min <= p && p <= max)
        .map(|(&p, &r)| (p, r))
        .unzip();
    GainResiduals {
        pass_data,
        pass_resi,
    }
}

/// The median residual in equal-width power bins. Empty bins have no median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainProfile {
    pub centres: Vec<f64>,
    pub medians: Vec<Option<f64>>,
}

impl GainProfile {
    pub fn new(residuals: &GainResiduals, num_bins: usize) -> GainProfile {
        let (centres, medians) =
            binned_medians(&residuals.pass_data, &residuals.pass_resi, num_bins)
                .into_iter()
                .unzip();
        GainProfile { centres, medians }
    }
}

/// The result of collating all gain residuals.
#[derive(Debug, Clone)]
pub struct GainCollation {
    pub curve: GainCurve,
    pub profile: GainProfile,

    /// The number of residuals left after removing outliers.
    pub num_points: usize,
}

/// Remove outliers from the collated residuals, profile them and fit the
/// gain curve in the band where the receivers are nonlinear.
pub fn fit_collated(
    residuals: &GainResiduals,
    outlier_bounds: (f64, f64),
    band: (f64, f64),
) -> Result<GainCollation, GainCurveError> {
    let kept = remove_outliers(residuals, outlier_bounds.0, outlier_bounds.1);
    debug!(
        "{} of {} gain residuals are within [{}, {}] dBm",
        kept.len(),
        residuals.len(),
        outlier_bounds.0,
        outlier_bounds.1
    );
    let profile = GainProfile::new(&kept, GAIN_PROFILE_BINS);
    let curve = GainCurve::fit(&kept.pass_data, &kept.pass_resi, band.0, band.1)?;
    Ok(GainCollation {
        curve,
        profile,
        num_points: kept.len(),
    })
}
