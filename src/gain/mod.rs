// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Characterising the nonlinear gain of the tiles' receivers.
//!
//! Each good satellite pass yields a slice of the tile beam measured against
//! a reference antenna. Where the receiver is saturating, the slice departs
//! from the tile beam model; the departures ("residuals") of many passes are
//! collated and fit with a quadratic [`GainCurve`], which the beam projection
//! then uses to undo the distortion.

mod collate;
mod curve;

pub use collate::{collate_residuals, fit_collated, remove_outliers, GainCollation, GainProfile};
pub use curve::{GainCurve, GainCurveError};

use std::path::{Path, PathBuf};

use log::{debug, warn};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    antenna::AntennaPair,
    constants::*,
    healpix::Healpix,
    io::{read_json, write_json, ReadInputError, WriteOutputError},
    math::{chisq_pvalue, fit_offset, FitError},
    pass::PixelPass,
};

/// The cuts applied to a pass before its gain residuals are kept.
#[derive(Debug, Clone, Copy)]
pub struct GainFitConfig {
    /// Tile power at or above this is in the nonlinear regime \[dBm\].
    pub peak_floor: f64,

    /// Measured beam power above this is distorted \[dBm\].
    pub distortion_ceiling: f64,

    /// Tile model power below this is in a null \[dBm\].
    pub null_floor: f64,

    pub min_points: usize,

    /// \[degrees\]
    pub zenith_proximity: f64,

    /// \[seconds\]
    pub min_span: f64,

    /// The smallest acceptable chi-square p-value.
    pub fit_thresh: f64,
}

impl Default for GainFitConfig {
    fn default() -> Self {
        GainFitConfig {
            peak_floor: GAIN_PEAK_FLOOR,
            distortion_ceiling: GAIN_DISTORTION_CEILING,
            null_floor: GAIN_NULL_FLOOR,
            min_points: GAIN_MIN_POINTS,
            zenith_proximity: GAIN_ZENITH_PROXIMITY_DEG,
            min_span: GAIN_MIN_PASS_SPAN,
            fit_thresh: DEFAULT_FIT_THRESH,
        }
    }
}

/// A pass's contribution to the gain residual population.
#[derive(Debug, Clone, PartialEq)]
pub struct PassResiduals {
    /// The measured beam slice, scaled to the raw tile power level \[dBm\].
    pub measured: Vec<f64>,

    /// Scaled model minus measured, per pixel \[dB\].
    pub residuals: Vec<f64>,

    pub pvalue: f64,
}

/// Why a pass contributed no gain residuals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GainRejection {
    #[error("only {got} undistorted pixels; at least {need} are needed")]
    TooFewPoints { got: usize, need: usize },

    #[error("the beam model fits poorly (p-value {pvalue:?})")]
    PoorFit { pvalue: Option<f64> },

    #[error("the pass never comes within {max_deg}° of zenith")]
    FarFromZenith { max_deg: f64 },

    #[error("the pass spans {span:.0} s, less than {need:.0} s")]
    TooShort { span: f64, need: f64 },
}

/// Measure the gain residuals of a single pass.
///
/// The tile's beam is measured as `tile - ref + ref_model`. This slice is
/// scaled to the raw tile power in the nonlinear regime, and the tile model
/// is then scaled to the slice over its undistorted part. The pass is kept if
/// the undistorted part fits the model well, comes close to zenith and is
/// long enough.
pub fn pass_residuals(
    pass: &PixelPass,
    ref_model: &[f64],
    tile_model: ArrayView1<f64>,
    config: &GainFitConfig,
    healpix: &Healpix,
) -> Result<PassResiduals, GainRejection> {
    let ref_model = pass.sample(|p| ref_model[p]);
    let mut model = pass.sample(|p| tile_model[p]);
    let mut measured: Vec<f64> = pass
        .tile_power
        .iter()
        .zip(&pass.ref_power)
        .zip(&ref_model)
        .map(|((t, r), m)| t - r + m)
        .collect();

    let (peak_tile, peak_measured): (Vec<f64>, Vec<f64>) = pass
        .tile_power
        .iter()
        .zip(&measured)
        .filter(|&(&t, _)| t >= config.peak_floor)
        .map(|(&t, &m)| (t, m))
        .unzip();
    let offset = offset_or_zero(&peak_tile, &peak_measured, &pass.sat_id);
    measured.iter_mut().for_each(|m| *m += offset);

    // The undistorted part of the pass, away from beam nulls.
    let (fit_measured, fit_model): (Vec<f64>, Vec<f64>) = measured
        .iter()
        .zip(&model)
        .filter(|&(&m, &f)| m <= config.distortion_ceiling && f >= config.null_floor)
        .map(|(&m, &f)| (m, f))
        .unzip();
    let offset = offset_or_zero(&fit_measured, &fit_model, &pass.sat_id);
    model.iter_mut().for_each(|f| *f += offset);
    let fit_model: Vec<f64> = fit_model.iter().map(|f| f + offset).collect();

    if fit_measured.len() < config.min_points {
        return Err(GainRejection::TooFewPoints {
            got: fit_measured.len(),
            need: config.min_points,
        });
    }
    let pvalue = chisq_pvalue(&fit_measured, &fit_model, CHISQ_OFFSET);
    let pvalue = match pvalue {
        Some(p) if p >= config.fit_thresh => p,
        _ => return Err(GainRejection::PoorFit { pvalue }),
    };
    let near_zenith = pass
        .min_zenith_angle(healpix)
        .map(|za| za <= config.zenith_proximity.to_radians())
        .unwrap_or(false);
    if !near_zenith {
        return Err(GainRejection::FarFromZenith {
            max_deg: config.zenith_proximity,
        });
    }
    if pass.span < config.min_span {
        return Err(GainRejection::TooShort {
            span: pass.span,
            need: config.min_span,
        });
    }

    let residuals = model.iter().zip(&measured).map(|(f, m)| f - m).collect();
    Ok(PassResiduals {
        measured,
        residuals,
        pvalue,
    })
}

/// Fit an additive offset, falling back to no offset when the fit can't be
/// done.
pub(crate) fn offset_or_zero(data: &[f64], model: &[f64], sat_id: &str) -> f64 {
    match fit_offset(data, model) {
        Ok(o) => o,
        Err(FitError::NoData) => {
            debug!("Satellite {sat_id}: no data to fit an offset to");
            0.0
        }
        Err(e) => {
            warn!("Satellite {sat_id}: {e}; not applying an offset");
            0.0
        }
    }
}

/// All of the gain residuals measured with one antenna pair. Each element of
/// `pass_data` is a measured power with its residual in `pass_resi`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GainResiduals {
    pub pass_data: Vec<f64>,
    pub pass_resi: Vec<f64>,
}

impl GainResiduals {
    pub fn path(dir: &Path, pair: &AntennaPair) -> PathBuf {
        dir.join(format!("{}_{}_gain_fit.json", pair.tile, pair.reference))
    }

    pub fn read(path: &Path) -> Result<GainResiduals, ReadInputError> {
        let r: GainResiduals = read_json(path)?;
        if r.pass_data.len() != r.pass_resi.len() {
            return Err(ReadInputError::ShapeMismatch {
                path: path.to_path_buf(),
                what: format!(
                    "{} measured powers but {} residuals",
                    r.pass_data.len(),
                    r.pass_resi.len()
                ),
            });
        }
        Ok(r)
    }

    pub fn write(&self, path: &Path) -> Result<(), WriteOutputError> {
        write_json(path, self)
    }

    pub fn push(&mut self, pass: &PassResiduals) {
        self.pass_data.extend_from_slice(&pass.measured);
        self.pass_resi.extend_from_slice(&pass.residuals);
    }

    pub fn append(&mut self, other: GainResiduals) {
        self.pass_data.extend(other.pass_data);
        self.pass_resi.extend(other.pass_resi);
    }

    pub fn len(&self) -> usize {
        self.pass_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pass_data.is_empty()
    }
}
