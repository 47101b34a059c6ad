// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Satellite ephemeris.
//!
//! Orbital propagation (done elsewhere) gives each satellite's altitude and
//! azimuth at an irregular cadence, one array per pass. Passes are resampled
//! to a fixed cadence and then distributed into the observation windows they
//! overlap, producing one [`WindowEphemeris`] per window.

mod error;
mod matcher;
mod resample;

pub use error::EphemError;
pub use matcher::{classify_overlap, match_pass, match_passes, Overlap};
pub use resample::InterpKind;

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::io::{read_json, write_json, ReadInputError, WriteOutputError};

/// One satellite's path across the sky. Times are unix seconds, angles are
/// radians, and azimuth is measured from north through east.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatellitePass {
    #[serde(deserialize_with = "deserialize_sat_id")]
    pub sat_id: String,

    pub time_array: Vec<f64>,

    #[serde(rename = "sat_alt")]
    pub altitude: Vec<f64>,

    #[serde(rename = "sat_az")]
    pub azimuth: Vec<f64>,
}

impl SatellitePass {
    /// Create a new pass, checking that the arrays agree in length and that
    /// time increases.
    pub fn new(
        sat_id: &str,
        time_array: Vec<f64>,
        altitude: Vec<f64>,
        azimuth: Vec<f64>,
    ) -> Result<SatellitePass, EphemError> {
        let pass = SatellitePass {
            sat_id: sat_id.to_string(),
            time_array,
            altitude,
            azimuth,
        };
        pass.validate()?;
        Ok(pass)
    }

    pub fn validate(&self) -> Result<(), EphemError> {
        if self.altitude.len() != self.time_array.len() || self.azimuth.len() != self.time_array.len()
        {
            return Err(EphemError::LengthMismatch {
                sat_id: self.sat_id.clone(),
                times: self.time_array.len(),
                alt: self.altitude.len(),
                az: self.azimuth.len(),
            });
        }
        if self.time_array.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(EphemError::NotIncreasing {
                sat_id: self.sat_id.clone(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.time_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_array.is_empty()
    }

    /// The time of the first sample.
    pub fn rise(&self) -> Option<f64> {
        self.time_array.first().copied()
    }

    /// The time of the last sample.
    pub fn set(&self) -> Option<f64> {
        self.time_array.last().copied()
    }

    /// The highest altitude reached \[radians\].
    pub fn max_altitude(&self) -> Option<f64> {
        self.altitude
            .iter()
            .copied()
            .filter(|a| !a.is_nan())
            .reduce(f64::max)
    }

    /// The part of the pass covering the given sample indices.
    pub(crate) fn slice(&self, range: Range<usize>) -> SatellitePass {
        SatellitePass {
            sat_id: self.sat_id.clone(),
            time_array: self.time_array[range.clone()].to_vec(),
            altitude: self.altitude[range.clone()].to_vec(),
            azimuth: self.azimuth[range].to_vec(),
        }
    }
}

/// Satellite ids are catalogue numbers; they may be written as strings or as
/// integers.
fn deserialize_sat_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SatId {
        Str(String),
        Int(u64),
    }

    Ok(match SatId::deserialize(d)? {
        SatId::Str(s) => s,
        SatId::Int(i) => i.to_string(),
    })
}

/// All of the passes of one satellite, as written by orbital propagation. Each
/// inner array is one pass.
#[derive(Debug, Clone, Deserialize)]
pub struct SatelliteEphemeris {
    #[serde(deserialize_with = "deserialize_sat_id")]
    pub sat_id: String,
    pub time_array: Vec<Vec<f64>>,
    pub sat_alt: Vec<Vec<f64>>,
    pub sat_az: Vec<Vec<f64>>,
}

impl SatelliteEphemeris {
    pub fn read(path: &Path) -> Result<SatelliteEphemeris, ReadInputError> {
        read_json(path)
    }

    /// Split into individual passes.
    pub fn passes(self) -> Result<Vec<SatellitePass>, EphemError> {
        let SatelliteEphemeris {
            sat_id,
            time_array,
            sat_alt,
            sat_az,
        } = self;
        if sat_alt.len() != time_array.len() || sat_az.len() != time_array.len() {
            return Err(EphemError::PassCountMismatch {
                sat_id,
                times: time_array.len(),
                alt: sat_alt.len(),
                az: sat_az.len(),
            });
        }

        time_array
            .into_iter()
            .zip(sat_alt)
            .zip(sat_az)
            .map(|((t, alt), az)| SatellitePass::new(&sat_id, t, alt, az))
            .collect()
    }
}

/// Every satellite pass (or fragment of one) inside an observation window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowEphemeris {
    pub window_id: String,
    pub passes: Vec<SatellitePass>,
}

impl WindowEphemeris {
    pub fn new(window_id: &str) -> WindowEphemeris {
        WindowEphemeris {
            window_id: window_id.to_string(),
            passes: vec![],
        }
    }

    /// Where a window's ephemeris is kept: `{dir}/{window_id}.json`.
    pub fn path(dir: &Path, window_id: &str) -> PathBuf {
        dir.join(format!("{window_id}.json"))
    }

    /// Read a window's ephemeris; the file is a JSON list of passes.
    pub fn read(dir: &Path, window_id: &str) -> Result<WindowEphemeris, ReadInputError> {
        let path = Self::path(dir, window_id);
        let passes: Vec<SatellitePass> = read_json(&path)?;
        Ok(WindowEphemeris {
            window_id: window_id.to_string(),
            passes,
        })
    }

    pub fn write(&self, dir: &Path) -> Result<(), WriteOutputError> {
        write_json(&Self::path(dir, &self.window_id), &self.passes)
    }

    /// The passes of a satellite in this window.
    pub fn passes_of<'a>(&'a self, sat_id: &'a str) -> impl Iterator<Item = &'a SatellitePass> {
        self.passes.iter().filter(move |p| p.sat_id == sat_id)
    }
}
