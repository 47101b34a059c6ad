// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resample raw satellite ephemerides and sort their passes into observation
//! windows.


use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;

use super::common::{display_warnings, positive, InfoPrinter, WindowArgs, ARG_FILE_HELP};
use crate::{
    constants::DEFAULT_INTERP_FREQ_HZ,
    ephem::InterpKind,
    io::get_all_matches_from_glob,
    params::EphemChronoParams,
    EmbersError,
};

lazy_static::lazy_static! {
    static ref INTERP_HELP: String =
        format!("The interpolation used when resampling passes. Supported: {}. Default: {}", InterpKind::iter().join(", "), InterpKind::default());

    static ref INTERP_FREQ_HELP: String =
        format!("The resampling frequency [Hz]. Default: {DEFAULT_INTERP_FREQ_HZ}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct EphemChronoArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "windows")]
    #[serde(default)]
    pub(super) window_args: WindowArgs,

    /// The directory of raw per-satellite ephemeris JSON files.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) ephem_dir: Option<PathBuf>,

    /// The directory to write per-window ephemerides into.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) out_dir: Option<PathBuf>,

    #[clap(long, help = INTERP_HELP.as_str(), help_heading = "RESAMPLING")]
    pub(super) interp: Option<String>,

    #[clap(long, help = INTERP_FREQ_HELP.as_str(), help_heading = "RESAMPLING")]
    pub(super) interp_freq: Option<f64>,
}

impl EphemChronoArgs {
    pub(super) fn merge(self) -> Result<EphemChronoArgs, EmbersError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let EphemChronoArgs {
                args_file: _,
                window_args,
                ephem_dir,
                out_dir,
                interp,
                interp_freq,
            } = unpack_arg_file!(arg_file);

            Ok(EphemChronoArgs {
                args_file: None,
                window_args: cli_args.window_args.merge(window_args),
                ephem_dir: cli_args.ephem_dir.or(ephem_dir),
                out_dir: cli_args.out_dir.or(out_dir),
                interp: cli_args.interp.or(interp),
                interp_freq: cli_args.interp_freq.or(interp_freq),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<EphemChronoParams, EmbersError> {
        debug!("{:#?}", self);

        let EphemChronoArgs {
            args_file: _,
            window_args,
            ephem_dir,
            out_dir,
            interp,
            interp_freq,
        } = self;

        let mut printer = InfoPrinter::new("Sorting satellite passes into windows".into());
        let windows = window_args.parse(&mut printer)?;

        let ephem_dir = ephem_dir.ok_or(EphemChronoArgsError::NoEphemDir)?;
        let ephem_files =
            get_all_matches_from_glob(&ephem_dir.join("*.json").display().to_string())?;
        if ephem_files.is_empty() {
            return Err(EphemChronoArgsError::NoEphemFiles(ephem_dir).into());
        }
        let out_dir = out_dir.ok_or(EphemChronoArgsError::NoOutDir)?;

        let interp = match interp {
            Some(s) => InterpKind::from_str(&s.to_lowercase())
                .map_err(|_| EphemChronoArgsError::BadInterp(s))?,
            None => InterpKind::default(),
        };
        let interp_freq = positive(
            "--interp-freq",
            interp_freq.unwrap_or(DEFAULT_INTERP_FREQ_HZ),
        )?;

        printer.push_block(vec![
            format!(
                "{} ephemeris files in {}",
                ephem_files.len(),
                ephem_dir.display()
            )
            .into(),
            format!("{interp} interpolation at {interp_freq} Hz").into(),
        ]);
        printer.push_line(format!("Writing to {}", out_dir.display()).into());
        printer.display();
        display_warnings();

        Ok(EphemChronoParams {
            ephem_files,
            out_dir,
            windows,
            interp,
            interp_freq,
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
pub(super) enum EphemChronoArgsError {
    #[error("No ephemeris directory was supplied (--ephem-dir)")]
    NoEphemDir,

    #[error("No ephemeris JSON files were found in '{}'", .0.display())]
    NoEphemFiles(PathBuf),

    #[error("No output directory was supplied (--out-dir)")]
    NoOutDir,

    #[error("'{0}' isn't a supported interpolation; use 'linear' or 'cubic'")]
    BadInterp(String),
}
