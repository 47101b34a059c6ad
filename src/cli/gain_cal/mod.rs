// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fit the receivers' gain curve from satellite passes near zenith.


use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, fraction, AntennaArgs, BeamModelArgs, InfoPrinter, PassSourceArgs,
    WindowArgs, ARG_FILE_HELP,
};
use crate::{
    antenna::Polarisation,
    constants::{
        DEFAULT_FIT_THRESH, DEFAULT_GAIN_BAND_START, DEFAULT_GAIN_BAND_STOP,
        DEFAULT_GAIN_POINTING, GAIN_OUTLIER_MAX, GAIN_OUTLIER_MIN,
    },
    gain::GainFitConfig,
    params::GainCalParams,
    pointing::Pointing,
    EmbersError,
};

lazy_static::lazy_static! {
    static ref POINTING_HELP: String =
        format!("Only windows at this pointing are used. Default: {DEFAULT_GAIN_POINTING}");

    static ref FIT_THRESH_HELP: String =
        format!("The smallest chi-square p-value a pass may fit the tile model with. Default: {DEFAULT_FIT_THRESH}");

    static ref BAND_HELP: String =
        format!("The gain curve is fit to residuals in this power band [dBm]. Default: {DEFAULT_GAIN_BAND_START} {DEFAULT_GAIN_BAND_STOP}");

    static ref OUTLIER_HELP: String =
        format!("Residuals measured outside these powers are dropped [dBm]. Default: {GAIN_OUTLIER_MIN} {GAIN_OUTLIER_MAX}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct GainCalArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "windows")]
    #[serde(default)]
    pub(super) window_args: WindowArgs,

    #[clap(flatten)]
    #[serde(rename = "antennas")]
    #[serde(default)]
    pub(super) antenna_args: AntennaArgs,

    #[clap(flatten)]
    #[serde(rename = "passes")]
    #[serde(default)]
    pub(super) source_args: PassSourceArgs,

    #[clap(flatten)]
    #[serde(rename = "models")]
    #[serde(default)]
    pub(super) model_args: BeamModelArgs,

    /// The directory to write gain residuals and the gain curve into.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) out_dir: Option<PathBuf>,

    #[clap(long, help = POINTING_HELP.as_str(), help_heading = "GAIN FIT")]
    pub(super) pointing: Option<String>,

    #[clap(long, help = FIT_THRESH_HELP.as_str(), help_heading = "GAIN FIT")]
    pub(super) fit_thresh: Option<f64>,

    #[clap(
        long,
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["START", "STOP"],
        help = BAND_HELP.as_str(),
        help_heading = "GAIN FIT"
    )]
    pub(super) band: Option<Vec<f64>>,

    #[clap(
        long,
        number_of_values = 2,
        allow_hyphen_values = true,
        value_names = &["MIN", "MAX"],
        help = OUTLIER_HELP.as_str(),
        help_heading = "GAIN FIT"
    )]
    pub(super) outlier_bounds: Option<Vec<f64>>,
}

impl GainCalArgs {
    pub(super) fn merge(self) -> Result<GainCalArgs, EmbersError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let GainCalArgs {
                args_file: _,
                window_args,
                antenna_args,
                source_args,
                model_args,
                out_dir,
                pointing,
                fit_thresh,
                band,
                outlier_bounds,
            } = unpack_arg_file!(arg_file);

            Ok(GainCalArgs {
                args_file: None,
                window_args: cli_args.window_args.merge(window_args),
                antenna_args: cli_args.antenna_args.merge(antenna_args),
                source_args: cli_args.source_args.merge(source_args),
                model_args: cli_args.model_args.merge(model_args),
                out_dir: cli_args.out_dir.or(out_dir),
                pointing: cli_args.pointing.or(pointing),
                fit_thresh: cli_args.fit_thresh.or(fit_thresh),
                band: cli_args.band.or(band),
                outlier_bounds: cli_args.outlier_bounds.or(outlier_bounds),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<GainCalParams, EmbersError> {
        debug!("{:#?}", self);

        let GainCalArgs {
            args_file: _,
            window_args,
            antenna_args,
            source_args,
            model_args,
            out_dir,
            pointing,
            fit_thresh,
            band,
            outlier_bounds,
        } = self;

        let mut printer = InfoPrinter::new("Fitting the receiver gain curve".into());
        let windows = window_args.parse(&mut printer)?;
        let pairs = antenna_args.parse(&mut printer)?;
        let source = source_args.parse(&windows, &mut printer)?;
        let models = model_args.parse(source.healpix, &mut printer)?;

        let pointing = match pointing {
            Some(p) => Pointing::from_str(p.trim()).map_err(|_| GainCalArgsError::BadPointing(p))?,
            None => DEFAULT_GAIN_POINTING,
        };
        if models.tile(pointing, Polarisation::XX).is_none() {
            return Err(GainCalArgsError::NoTileModel(pointing).into());
        }
        let out_dir = out_dir.ok_or(GainCalArgsError::NoOutDir)?;

        let band = parse_range(band, "--band", (DEFAULT_GAIN_BAND_START, DEFAULT_GAIN_BAND_STOP))?;
        let outlier_bounds = parse_range(
            outlier_bounds,
            "--outlier-bounds",
            (GAIN_OUTLIER_MIN, GAIN_OUTLIER_MAX),
        )?;
        let config = GainFitConfig {
            fit_thresh: fraction("--fit-thresh", fit_thresh.unwrap_or(DEFAULT_FIT_THRESH))?,
            ..Default::default()
        };

        printer.push_block(vec![
            format!("Passes at pointing {pointing} with p-value ≥ {}", config.fit_thresh).into(),
            format!("Outliers outside [{}, {}] dBm are dropped", outlier_bounds.0, outlier_bounds.1)
                .into(),
            format!("The curve is fit over [{}, {}] dBm", band.0, band.1).into(),
        ]);
        printer.push_line(format!("Writing to {}", out_dir.display()).into());
        printer.display();
        display_warnings();

        Ok(GainCalParams {
            source,
            models,
            pairs,
            windows,
            pointing,
            out_dir,
            config,
            outlier_bounds,
            band,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), EmbersError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

/// An increasing pair of powers, or the default.
fn parse_range(
    range: Option<Vec<f64>>,
    arg: &'static str,
    default: (f64, f64),
) -> Result<(f64, f64), GainCalArgsError> {
    match range.as_deref() {
        None => Ok(default),
        Some(&[lo, hi]) if lo < hi => Ok((lo, hi)),
        Some(other) => Err(GainCalArgsError::BadRange {
            arg,
            got: other.to_vec(),
        }),
    }
}

#[derive(Error, Debug)]
pub(super) enum GainCalArgsError {
    #[error("No output directory was supplied (--out-dir)")]
    NoOutDir,

    #[error("'{0}' isn't a pointing; expected one of 0, 2, 4 or 41")]
    BadPointing(String),

    #[error("The tile beam models have no maps for pointing {0}")]
    NoTileModel(Pointing),

    #[error("{arg} must be two increasing powers, but got {got:?}")]
    BadRange { arg: &'static str, got: Vec<f64> },
}
