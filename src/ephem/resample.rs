// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resampling passes onto a regular time grid.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use super::{EphemError, SatellitePass};
use crate::{
    constants::MIN_EPHEM_POINTS,
    math::{unwrap_angles, wrap_angle, Interpolator},
};

/// How to interpolate between ephemeris points.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterpKind {
    Linear,

    #[default]
    Cubic,
}

impl InterpKind {
    fn interpolator(self, x: &[f64], y: &[f64]) -> Result<Interpolator, EphemError> {
        Ok(match self {
            InterpKind::Linear => Interpolator::linear(x, y)?,
            InterpKind::Cubic => Interpolator::cubic(x, y)?,
        })
    }
}

impl SatellitePass {
    /// Resample this pass at `freq` Hz, from the first whole second at or
    /// after its rise to the last whole second at or before its set (both
    /// inclusive).
    ///
    /// Azimuth is unwrapped before interpolating so that passes crossing north
    /// don't swing through the whole sky, then wrapped back into [0, 2π).
    pub fn resample(&self, kind: InterpKind, freq: f64) -> Result<SatellitePass, EphemError> {
        if !(freq.is_finite() && freq > 0.0) {
            return Err(EphemError::BadFrequency(freq));
        }
        self.validate()?;
        if self.len() < MIN_EPHEM_POINTS {
            return Err(EphemError::TooFewPoints {
                sat_id: self.sat_id.clone(),
                got: self.len(),
                need: MIN_EPHEM_POINTS,
            });
        }

        let rise = self.time_array[0].ceil();
        let set = self.time_array[self.len() - 1].floor();
        if set < rise {
            return Err(EphemError::TooShort {
                sat_id: self.sat_id.clone(),
            });
        }
        let num_samples = ((set - rise) * freq).floor() as usize + 1;
        let times: Vec<f64> = (0..num_samples)
            .map(|i| rise + i as f64 / freq)
            .collect();

        let alt = kind.interpolator(&self.time_array, &self.altitude)?;
        let az = kind.interpolator(&self.time_array, &unwrap_angles(&self.azimuth))?;

        Ok(SatellitePass {
            sat_id: self.sat_id.clone(),
            altitude: times.iter().map(|&t| alt.eval(t)).collect(),
            azimuth: times.iter().map(|&t| wrap_angle(az.eval(t))).collect(),
            time_array: times,
        })
    }
}
