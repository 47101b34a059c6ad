// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::ArrayView1;
use thiserror::Error;

use crate::{
    constants::CHISQ_OFFSET, gain::offset_or_zero, gain::GainCurve, math::chisq_pvalue,
    pass::PixelPass,
};

/// A pass's calibrated beam slice, one value per pixel of the pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPass {
    /// \[dBm\]
    pub calibrated: Vec<f64>,
    pub pvalue: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionRejection {
    #[error("the pass has no pixels")]
    Empty,

    #[error("the tile model fits poorly (p-value {pvalue:?})")]
    PoorFit { pvalue: Option<f64> },
}

/// Calibrate a pass against the tile model.
///
/// Tile powers are corrected for the receiver's gain, the beam is measured as
/// `corrected tile - ref + ref_model`, and a single offset is removed to best
/// match the tile model. The pass is kept if the result fits the model with
/// a p-value of at least `fit_thresh`.
pub fn project_pass(
    pass: &PixelPass,
    ref_model: &[f64],
    tile_model: ArrayView1<f64>,
    gain: &GainCurve,
    fit_thresh: f64,
) -> Result<ProjectedPass, ProjectionRejection> {
    if pass.is_empty() {
        return Err(ProjectionRejection::Empty);
    }
    let ref_model = pass.sample(|p| ref_model[p]);
    let model = pass.sample(|p| tile_model[p]);
    let mut calibrated: Vec<f64> = pass
        .tile_power
        .iter()
        .zip(&pass.ref_power)
        .zip(&ref_model)
        .map(|((&t, r), m)| gain.correct(t) - r + m)
        .collect();

    let offset = offset_or_zero(&calibrated, &model, &pass.sat_id);
    calibrated.iter_mut().for_each(|c| *c -= offset);

    match chisq_pvalue(&calibrated, &model, CHISQ_OFFSET) {
        Some(pvalue) if pvalue >= fit_thresh => Ok(ProjectedPass { calibrated, pvalue }),
        pvalue => Err(ProjectionRejection::PoorFit { pvalue }),
    }
}
