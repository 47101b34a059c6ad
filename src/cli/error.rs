// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all embers-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::{
    beam_map::BeamMapArgsError, channel_map::ChannelMapArgsError, common::CommonArgsError,
    ephem_chrono::EphemChronoArgsError, gain_cal::GainCalArgsError,
};
use crate::{
    antenna::AntennaError,
    ephem::EphemError,
    gain::GainCurveError,
    healpix::HealpixError,
    io::{ReadInputError, WriteOutputError},
    params::GainCalError,
    windows::WindowError,
};

/// The *only* publicly visible error from embers. Each error message should
/// include a hint, unless it's "generic".
#[derive(Error, Debug)]
pub enum EmbersError {
    /// An error related to observation windows.
    #[error("{0}\n\nDates are YYYY-MM-DD and time zones are IANA names, e.g. Australia/Perth.")]
    Windows(String),

    /// An error related to satellite ephemerides.
    #[error("{0}\n\nEphemeris files hold one JSON object per satellite, with sat_id, time_array, sat_alt and sat_az; each inner array is one pass.")]
    Ephem(String),

    /// An error related to channel identification.
    #[error("{0}\n\nChannel maps need window ephemerides (from ephem-chrono) and aligned reference data.")]
    ChannelMap(String),

    /// An error related to the gain calibration.
    #[error("{0}\n\nThe gain curve is fit to residuals from every antenna pair; try more dates, a wider --band, or a lower --fit-thresh.")]
    GainCal(String),

    /// An error related to beam maps.
    #[error("{0}\n\nBeam maps need a gain curve (from gain-cal) and the beam models.")]
    BeamMap(String),

    /// An error related to antenna names.
    #[error("{0}\n\nReferences are named like rf0XX and tiles like S33YY.")]
    Antenna(String),

    /// An error related to healpix maps.
    #[error("{0}\n\nnside must be a power of two, and beam models must have 12 nside² pixels.")]
    Healpix(String),

    /// An error reading an input file.
    #[error("{0}\n\nCheck that the input directories and files exist; increasing verbosity (-v or -vv) shows which files are read.")]
    Input(String),

    /// An error writing an output file.
    #[error("{0}\n\nCheck that the output directory is writable.")]
    Output(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files may be TOML or JSON; use --save-toml to see the expected layout.")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

// Binary sub-command errors.

impl From<CommonArgsError> for EmbersError {
    fn from(e: CommonArgsError) -> Self {
        match e {
            CommonArgsError::Missing(_)
            | CommonArgsError::BadValue { .. }
            | CommonArgsError::NoPairs => Self::Generic(e.to_string()),
            CommonArgsError::Window(e) => Self::from(e),
            CommonArgsError::Antenna(e) => Self::from(e),
            CommonArgsError::Healpix(e) => Self::from(e),
            CommonArgsError::Read(e) => Self::from(e),
        }
    }
}

impl From<EphemChronoArgsError> for EmbersError {
    fn from(e: EphemChronoArgsError) -> Self {
        let s = e.to_string();
        match e {
            EphemChronoArgsError::NoEphemDir | EphemChronoArgsError::NoEphemFiles(_) => {
                Self::Ephem(s)
            }
            EphemChronoArgsError::NoOutDir | EphemChronoArgsError::BadInterp(_) => {
                Self::Generic(s)
            }
        }
    }
}

impl From<ChannelMapArgsError> for EmbersError {
    fn from(e: ChannelMapArgsError) -> Self {
        let s = e.to_string();
        match e {
            ChannelMapArgsError::NoAlignDir | ChannelMapArgsError::NoChronoDir => {
                Self::ChannelMap(s)
            }
            ChannelMapArgsError::BadPair(_) => Self::Antenna(s),
            ChannelMapArgsError::NoOutDir => Self::Generic(s),
        }
    }
}

impl From<GainCalArgsError> for EmbersError {
    fn from(e: GainCalArgsError) -> Self {
        let s = e.to_string();
        match e {
            GainCalArgsError::BadPointing(_)
            | GainCalArgsError::NoTileModel(_)
            | GainCalArgsError::BadRange { .. } => Self::GainCal(s),
            GainCalArgsError::NoOutDir => Self::Generic(s),
        }
    }
}

impl From<BeamMapArgsError> for EmbersError {
    fn from(e: BeamMapArgsError) -> Self {
        let s = e.to_string();
        match e {
            BeamMapArgsError::NoGainCurve => Self::BeamMap(s),
            BeamMapArgsError::NoOutDir => Self::Generic(s),
        }
    }
}

// Library errors.

impl From<WindowError> for EmbersError {
    fn from(e: WindowError) -> Self {
        Self::Windows(e.to_string())
    }
}

impl From<EphemError> for EmbersError {
    fn from(e: EphemError) -> Self {
        match e {
            EphemError::Read(e) => Self::from(e),
            _ => Self::Ephem(e.to_string()),
        }
    }
}

impl From<AntennaError> for EmbersError {
    fn from(e: AntennaError) -> Self {
        Self::Antenna(e.to_string())
    }
}

impl From<HealpixError> for EmbersError {
    fn from(e: HealpixError) -> Self {
        Self::Healpix(e.to_string())
    }
}

impl From<ReadInputError> for EmbersError {
    fn from(e: ReadInputError) -> Self {
        let s = e.to_string();
        match e {
            ReadInputError::Healpix { .. } => Self::Healpix(s),
            _ => Self::Input(s),
        }
    }
}

impl From<WriteOutputError> for EmbersError {
    fn from(e: WriteOutputError) -> Self {
        Self::Output(e.to_string())
    }
}

impl From<GainCurveError> for EmbersError {
    fn from(e: GainCurveError) -> Self {
        let s = e.to_string();
        match e {
            GainCurveError::TooFewPoints { .. }
            | GainCurveError::Fit(_)
            | GainCurveError::BadCoefficients { .. } => Self::GainCal(s),
            GainCurveError::Read(e) => Self::from(e),
            GainCurveError::Write(e) => Self::from(e),
        }
    }
}

impl From<GainCalError> for EmbersError {
    fn from(e: GainCalError) -> Self {
        match e {
            GainCalError::Read(e) => Self::from(e),
            GainCalError::Write(e) => Self::from(e),
            GainCalError::Curve(e) => Self::from(e),
        }
    }
}

impl From<std::io::Error> for EmbersError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
