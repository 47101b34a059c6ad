// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::{io::ReadInputError, math::InterpolationError};

#[derive(Error, Debug)]
pub enum EphemError {
    #[error("Satellite {sat_id} has a pass with {got} points; at least {need} are needed")]
    TooFewPoints {
        sat_id: String,
        got: usize,
        need: usize,
    },

    #[error("Satellite {sat_id} has a pass too short to resample (it doesn't cover a whole sample period)")]
    TooShort { sat_id: String },

    #[error("Satellite {sat_id} has a pass with {times} times, {alt} altitudes and {az} azimuths")]
    LengthMismatch {
        sat_id: String,
        times: usize,
        alt: usize,
        az: usize,
    },

    #[error("Satellite {sat_id} has {times} time arrays, {alt} altitude arrays and {az} azimuth arrays")]
    PassCountMismatch {
        sat_id: String,
        times: usize,
        alt: usize,
        az: usize,
    },

    #[error("Satellite {sat_id} has a pass whose times don't strictly increase")]
    NotIncreasing { sat_id: String },

    #[error("The interpolation frequency must be positive and finite, but got {0} Hz")]
    BadFrequency(f64),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Read(#[from] ReadInputError),
}

impl EphemError {
    /// Is this only a symptom of sparse data?
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            EphemError::TooFewPoints { .. } | EphemError::TooShort { .. }
        )
    }
}
