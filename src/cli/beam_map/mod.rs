// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Build healpix maps of each tile's beam from calibrated satellite passes.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, fraction, AntennaArgs, BeamModelArgs, InfoPrinter, PassSourceArgs,
    WindowArgs, ARG_FILE_HELP,
};
use crate::{
    constants::DEFAULT_FIT_THRESH, gain::GainCurve, params::BeamMapParams, EmbersError,
};

lazy_static::lazy_static! {
    static ref FIT_THRESH_HELP: String =
        format!("The smallest chi-square p-value a calibrated pass may fit the tile model with. Default: {DEFAULT_FIT_THRESH}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct BeamMapArgs {
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

    /// The gain curve written by gain-cal (rfe_gain_fit.npy).
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) gain_curve: Option<PathBuf>,

    /// The directory to write beam maps into.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) out_dir: Option<PathBuf>,

    #[clap(long, help = FIT_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) fit_thresh: Option<f64>,
}

impl BeamMapArgs {
    pub(super) fn merge(self) -> Result<BeamMapArgs, EmbersError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let BeamMapArgs {
                args_file: _,
                window_args,
                antenna_args,
                source_args,
                model_args,
                gain_curve,
                out_dir,
                fit_thresh,
            } = unpack_arg_file!(arg_file);

            Ok(BeamMapArgs {
                args_file: None,
                window_args: cli_args.window_args.merge(window_args),
                antenna_args: cli_args.antenna_args.merge(antenna_args),
                source_args: cli_args.source_args.merge(source_args),
                model_args: cli_args.model_args.merge(model_args),
                gain_curve: cli_args.gain_curve.or(gain_curve),
                out_dir: cli_args.out_dir.or(out_dir),
                fit_thresh: cli_args.fit_thresh.or(fit_thresh),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<BeamMapParams, EmbersError> {
        debug!("{:#?}", self);

        let BeamMapArgs {
            args_file: _,
            window_args,
            antenna_args,
            source_args,
            model_args,
            gain_curve,
            out_dir,
            fit_thresh,
        } = self;

        let mut printer = InfoPrinter::new("Projecting satellite passes onto beam maps".into());
        let windows = window_args.parse(&mut printer)?;
        let pairs = antenna_args.parse(&mut printer)?;
        let source = source_args.parse(&windows, &mut printer)?;
        let models = model_args.parse(source.healpix, &mut printer)?;

        let gain_path = gain_curve.ok_or(BeamMapArgsError::NoGainCurve)?;
        let gain = GainCurve::read(&gain_path)?;
        let out_dir = out_dir.ok_or(BeamMapArgsError::NoOutDir)?;
        let fit_thresh = fraction("--fit-thresh", fit_thresh.unwrap_or(DEFAULT_FIT_THRESH))?;

        let [a, b, c] = gain.coeffs;
        printer.push_block(vec![
            format!("Gain curve: {}", gain_path.display()).into(),
            format!("  {a:.4e} p² + {b:.4e} p + {c:.4e}").into(),
            match gain.root() {
                Some(root) => format!("  correcting powers above {root:.2} dBm").into(),
                None => "  no real root; powers are not corrected".into(),
            },
        ]);
        printer.push_line(format!("Passes must fit with p-value ≥ {fit_thresh}").into());
        printer.push_line(format!("Writing to {}", out_dir.display()).into());
        printer.display();
        display_warnings();

        Ok(BeamMapParams {
            source,
            models,
            gain,
            pairs,
            windows,
            out_dir,
            fit_thresh,
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

#[derive(Error, Debug)]
pub(super) enum BeamMapArgsError {
    #[error("No gain curve was supplied (--gain-curve); make one with gain-cal")]
    NoGainCurve,

    #[error("No output directory was supplied (--out-dir)")]
    NoOutDir,
}
