// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Several stages need the same
//! inputs (e.g. `gain-cal` and `beam-map` both walk every satellite pass of
//! every antenna pair), so those arguments are shared between them.

mod printers;
#[cfg(test)]
mod tests;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{
    antenna::{antenna_pairs, default_refs, default_tiles, AntennaError, AntennaPair},
    constants::{
        DEFAULT_NOI_THRESH, DEFAULT_NSIDE, DEFAULT_SAT_THRESH, DEFAULT_TILE_POW_THRESH,
        DEFAULT_TIME_ZONE,
    },
    healpix::{Healpix, HealpixError},
    io::{BeamModels, ReadInputError},
    pass::PassSource,
    pointing::PointingLookup,
    windows::{observation_windows, ObservationWindow, WindowError},
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref TIME_ZONE_HELP: String =
        format!("The observatory's IANA time zone. Windows start at local midnight. Default: {DEFAULT_TIME_ZONE}");

    static ref REFS_HELP: String =
        format!("The reference antennas to use. Default: {}", default_refs().join(" "));

    static ref TILES_HELP: String =
        format!("The MWA tiles to use. Default: all {} tiles, both polarisations", default_tiles().len() / 2);

    static ref NSIDE_HELP: String =
        format!("The healpix resolution parameter of the beam maps and models. Default: {DEFAULT_NSIDE}");

    pub(super) static ref SAT_THRESH_HELP: String =
        format!("Channels peaking below this many standard deviations of the trace are treated as noise. Default: {DEFAULT_SAT_THRESH}");

    pub(super) static ref NOI_THRESH_HELP: String =
        format!("The noise threshold is this many MADs above the median noise. Default: {DEFAULT_NOI_THRESH}");

    static ref PASS_POW_THRESH_HELP: String =
        format!("Samples of a pass must be this far above the noise floor [dB]. Default: {DEFAULT_TILE_POW_THRESH}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(EmbersError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(EmbersError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(EmbersError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// The observation windows to work on.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct WindowArgs {
    #[clap(long, help = TIME_ZONE_HELP.as_str(), help_heading = "OBSERVATION WINDOWS")]
    pub(super) time_zone: Option<String>,

    /// The first local date to use (YYYY-MM-DD).
    #[clap(long, help_heading = "OBSERVATION WINDOWS")]
    pub(super) start_date: Option<String>,

    /// The last local date to use (YYYY-MM-DD), inclusive.
    #[clap(long, help_heading = "OBSERVATION WINDOWS")]
    pub(super) stop_date: Option<String>,
}

impl WindowArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            time_zone: self.time_zone.or(other.time_zone),
            start_date: self.start_date.or(other.start_date),
            stop_date: self.stop_date.or(other.stop_date),
        }
    }

    pub(super) fn parse(
        self,
        printer: &mut InfoPrinter,
    ) -> Result<Vec<ObservationWindow>, CommonArgsError> {
        let WindowArgs {
            time_zone,
            start_date,
            stop_date,
        } = self;
        let time_zone = time_zone.unwrap_or_else(|| DEFAULT_TIME_ZONE.to_string());
        let start_date = start_date.ok_or(CommonArgsError::Missing("--start-date"))?;
        let stop_date = stop_date.ok_or(CommonArgsError::Missing("--stop-date"))?;
        let windows = observation_windows(&time_zone, &start_date, &stop_date)?;

        printer.push_block(vec![
            format!("Dates {start_date} to {stop_date} ({time_zone})").into(),
            format!("{} observation windows", windows.len()).into(),
        ]);
        Ok(windows)
    }
}

/// The reference antennas and tiles to pair up.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct AntennaArgs {
    #[clap(long, multiple_values(true), help = REFS_HELP.as_str(), help_heading = "ANTENNAS")]
    pub(super) refs: Option<Vec<String>>,

    #[clap(long, multiple_values(true), help = TILES_HELP.as_str(), help_heading = "ANTENNAS")]
    pub(super) tiles: Option<Vec<String>>,
}

impl AntennaArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            refs: self.refs.or(other.refs),
            tiles: self.tiles.or(other.tiles),
        }
    }

    pub(super) fn parse(
        self,
        printer: &mut InfoPrinter,
    ) -> Result<Vec<AntennaPair>, CommonArgsError> {
        let refs = self.refs.unwrap_or_else(default_refs);
        let tiles = self.tiles.unwrap_or_else(default_tiles);
        let pairs = antenna_pairs(&refs, &tiles)?;
        if pairs.is_empty() {
            return Err(CommonArgsError::NoPairs);
        }
        printer.push_line(
            format!(
                "{} antenna pairs from {} references and {} tiles",
                pairs.len(),
                refs.len(),
                tiles.len()
            )
            .into(),
        );
        Ok(pairs)
    }
}

/// Where the identified satellite passes come from, and how they're cut.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct PassSourceArgs {
    /// The directory of aligned reference/tile power data.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) align_dir: Option<PathBuf>,

    /// The directory of per-window ephemerides, as written by ephem-chrono.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) chrono_dir: Option<PathBuf>,

    /// The directory of per-window channel maps, as written by channel-map.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) chan_map_dir: Option<PathBuf>,

    /// The JSON file listing the windows observed at each pointing.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) pointings: Option<PathBuf>,

    #[clap(long, help = NSIDE_HELP.as_str(), help_heading = "HEALPIX")]
    pub(super) nside: Option<usize>,

    #[clap(long, help = SAT_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) sat_thresh: Option<f64>,

    #[clap(long, help = NOI_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) noi_thresh: Option<f64>,

    #[clap(long, help = PASS_POW_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) pow_thresh: Option<f64>,
}

impl PassSourceArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            align_dir: self.align_dir.or(other.align_dir),
            chrono_dir: self.chrono_dir.or(other.chrono_dir),
            chan_map_dir: self.chan_map_dir.or(other.chan_map_dir),
            pointings: self.pointings.or(other.pointings),
            nside: self.nside.or(other.nside),
            sat_thresh: self.sat_thresh.or(other.sat_thresh),
            noi_thresh: self.noi_thresh.or(other.noi_thresh),
            pow_thresh: self.pow_thresh.or(other.pow_thresh),
        }
    }

    pub(super) fn parse(
        self,
        windows: &[ObservationWindow],
        printer: &mut InfoPrinter,
    ) -> Result<PassSource, CommonArgsError> {
        let PassSourceArgs {
            align_dir,
            chrono_dir,
            chan_map_dir,
            pointings,
            nside,
            sat_thresh,
            noi_thresh,
            pow_thresh,
        } = self;
        let align_dir = align_dir.ok_or(CommonArgsError::Missing("--align-dir"))?;
        let chrono_dir = chrono_dir.ok_or(CommonArgsError::Missing("--chrono-dir"))?;
        let chan_map_dir = chan_map_dir.ok_or(CommonArgsError::Missing("--chan-map-dir"))?;
        let pointings_file = pointings.ok_or(CommonArgsError::Missing("--pointings"))?;
        let pointings = PointingLookup::read(&pointings_file)?;

        let num_pointed = windows
            .iter()
            .filter(|w| pointings.pointing_of(&w.id).is_some())
            .count();
        if num_pointed == 0 {
            format!(
                "None of the {} windows are listed in {}; no passes will be used",
                windows.len(),
                pointings_file.display()
            )
            .warn();
        }

        let healpix = Healpix::new(nside.unwrap_or(DEFAULT_NSIDE))?;
        let sat_thresh = positive("--sat-thresh", sat_thresh.unwrap_or(DEFAULT_SAT_THRESH))?;
        let noi_thresh = positive("--noi-thresh", noi_thresh.unwrap_or(DEFAULT_NOI_THRESH))?;
        let pow_thresh = non_negative("--pow-thresh", pow_thresh.unwrap_or(DEFAULT_TILE_POW_THRESH))?;

        printer.push_block(vec![
            format!("Aligned data:  {}", align_dir.display()).into(),
            format!("Ephemerides:   {}", chrono_dir.display()).into(),
            format!("Channel maps:  {}", chan_map_dir.display()).into(),
            format!("{num_pointed} windows have a known pointing").into(),
        ]);
        printer.push_line(
            format!(
                "nside {}; thresholds: sat {sat_thresh} σ, noise {noi_thresh} MAD, power {pow_thresh} dB",
                healpix.nside()
            )
            .into(),
        );

        Ok(PassSource {
            align_dir,
            chrono_dir,
            chan_map_dir,
            pointings,
            sat_thresh,
            noi_thresh,
            pow_thresh,
            healpix,
        })
    }
}

/// The reference antenna and tile beam models.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct BeamModelArgs {
    /// The reference antenna beam models (npz with XX and YY maps).
    #[clap(long, parse(from_os_str), help_heading = "BEAM MODELS")]
    pub(super) ref_model: Option<PathBuf>,

    /// The MWA tile beam models (npz keyed by pointing).
    #[clap(long, parse(from_os_str), help_heading = "BEAM MODELS")]
    pub(super) tile_model: Option<PathBuf>,
}

impl BeamModelArgs {
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            ref_model: self.ref_model.or(other.ref_model),
            tile_model: self.tile_model.or(other.tile_model),
        }
    }

    pub(super) fn parse(
        self,
        healpix: Healpix,
        printer: &mut InfoPrinter,
    ) -> Result<BeamModels, CommonArgsError> {
        let ref_model = self
            .ref_model
            .ok_or(CommonArgsError::Missing("--ref-model"))?;
        let tile_model = self
            .tile_model
            .ok_or(CommonArgsError::Missing("--tile-model"))?;
        let models = BeamModels::read(&ref_model, &tile_model, healpix)?;
        printer.push_block(vec![
            format!("Reference models: {}", ref_model.display()).into(),
            format!(
                "Tile models:      {} (pointings {})",
                tile_model.display(),
                models.pointings().iter().join(", ")
            )
            .into(),
        ]);
        Ok(models)
    }
}

/// Checks that a threshold is positive and finite.
pub(super) fn positive(arg: &'static str, value: f64) -> Result<f64, CommonArgsError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CommonArgsError::BadValue {
            arg,
            value,
            expected: "a positive number",
        })
    }
}

pub(super) fn non_negative(arg: &'static str, value: f64) -> Result<f64, CommonArgsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CommonArgsError::BadValue {
            arg,
            value,
            expected: "a non-negative number",
        })
    }
}

/// Checks that a value is a fraction (between 0 and 1 inclusive).
pub(super) fn fraction(arg: &'static str, value: f64) -> Result<f64, CommonArgsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CommonArgsError::BadValue {
            arg,
            value,
            expected: "a number between 0 and 1",
        })
    }
}

#[derive(Error, Debug)]
pub(super) enum CommonArgsError {
    #[error("{0} wasn't supplied, but is required")]
    Missing(&'static str),

    #[error("{arg} was {value}, but must be {expected}")]
    BadValue {
        arg: &'static str,
        value: f64,
        expected: &'static str,
    },

    #[error("None of the supplied references and tiles share a polarisation")]
    NoPairs,

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Antenna(#[from] AntennaError),

    #[error(transparent)]
    Healpix(#[from] HealpixError),

    #[error(transparent)]
    Read(#[from] ReadInputError),
}
