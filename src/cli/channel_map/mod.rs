// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identify the channel of each satellite in each window.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{
    display_warnings, fraction, non_negative, positive, InfoPrinter, Warn, WindowArgs,
    ARG_FILE_HELP, NOI_THRESH_HELP, SAT_THRESH_HELP,
};
use crate::{
    antenna::AntennaPair,
    channels::ChannelThresholds,
    constants::{
        DEFAULT_ALT_THRESH_DEG, DEFAULT_CHANNEL_MAP_REF, DEFAULT_CHANNEL_MAP_TILE,
        DEFAULT_CHANNEL_POW_THRESH, DEFAULT_NOI_THRESH, DEFAULT_OCC_THRESH, DEFAULT_SAT_THRESH,
    },
    params::ChannelMapParams,
    EmbersError,
};

lazy_static::lazy_static! {
    static ref PAIR_HELP: String =
        format!("The antenna pair whose reference trace is searched for satellites. Default: {DEFAULT_CHANNEL_MAP_REF} {DEFAULT_CHANNEL_MAP_TILE}");

    static ref POW_THRESH_HELP: String =
        format!("A channel must peak at least this far above the noise median [dB]. Default: {DEFAULT_CHANNEL_POW_THRESH}");

    static ref OCC_THRESH_HELP: String =
        format!("The fraction of a pass a channel must be above the noise threshold. Default: {DEFAULT_OCC_THRESH}");

    static ref ALT_THRESH_HELP: String =
        format!("Passes peaking below this altitude are ignored [degrees]. Default: {DEFAULT_ALT_THRESH_DEG}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct ChannelMapArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "windows")]
    #[serde(default)]
    pub(super) window_args: WindowArgs,

    /// The directory of aligned reference/tile power data.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) align_dir: Option<PathBuf>,

    /// The directory of per-window ephemerides, as written by ephem-chrono.
    #[clap(long, parse(from_os_str), help_heading = "INPUT FILES")]
    pub(super) chrono_dir: Option<PathBuf>,

    /// The directory to write per-window channel maps into.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) out_dir: Option<PathBuf>,

    #[clap(
        long,
        number_of_values = 2,
        value_names = &["REF", "TILE"],
        help = PAIR_HELP.as_str(),
        help_heading = "ANTENNAS"
    )]
    pub(super) pair: Option<Vec<String>>,

    #[clap(long, help = SAT_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) sat_thresh: Option<f64>,

    #[clap(long, help = NOI_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) noi_thresh: Option<f64>,

    #[clap(long, help = POW_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) pow_thresh: Option<f64>,

    #[clap(long, help = OCC_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) occ_thresh: Option<f64>,

    #[clap(long, allow_hyphen_values = true, help = ALT_THRESH_HELP.as_str(), help_heading = "THRESHOLDS")]
    pub(super) alt_thresh: Option<f64>,
}

impl ChannelMapArgs {
    pub(super) fn merge(self) -> Result<ChannelMapArgs, EmbersError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let ChannelMapArgs {
                args_file: _,
                window_args,
                align_dir,
                chrono_dir,
                out_dir,
                pair,
                sat_thresh,
                noi_thresh,
                pow_thresh,
                occ_thresh,
                alt_thresh,
            } = unpack_arg_file!(arg_file);

            Ok(ChannelMapArgs {
                args_file: None,
                window_args: cli_args.window_args.merge(window_args),
                align_dir: cli_args.align_dir.or(align_dir),
                chrono_dir: cli_args.chrono_dir.or(chrono_dir),
                out_dir: cli_args.out_dir.or(out_dir),
                pair: cli_args.pair.or(pair),
                sat_thresh: cli_args.sat_thresh.or(sat_thresh),
                noi_thresh: cli_args.noi_thresh.or(noi_thresh),
                pow_thresh: cli_args.pow_thresh.or(pow_thresh),
                occ_thresh: cli_args.occ_thresh.or(occ_thresh),
                alt_thresh: cli_args.alt_thresh.or(alt_thresh),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<ChannelMapParams, EmbersError> {
        debug!("{:#?}", self);

        let ChannelMapArgs {
            args_file: _,
            window_args,
            align_dir,
            chrono_dir,
            out_dir,
            pair,
            sat_thresh,
            noi_thresh,
            pow_thresh,
            occ_thresh,
            alt_thresh,
        } = self;

        let mut printer = InfoPrinter::new("Identifying satellite channels".into());
        let windows = window_args.parse(&mut printer)?;

        let align_dir = align_dir.ok_or(ChannelMapArgsError::NoAlignDir)?;
        let chrono_dir = chrono_dir.ok_or(ChannelMapArgsError::NoChronoDir)?;
        let out_dir = out_dir.ok_or(ChannelMapArgsError::NoOutDir)?;
        let pair = match pair.as_deref() {
            Some([reference, tile]) => AntennaPair::new(reference, tile)?,
            Some(other) => return Err(ChannelMapArgsError::BadPair(other.to_vec()).into()),
            None => AntennaPair::new(DEFAULT_CHANNEL_MAP_REF, DEFAULT_CHANNEL_MAP_TILE)?,
        };

        let thresholds = ChannelThresholds {
            sat_thresh: positive("--sat-thresh", sat_thresh.unwrap_or(DEFAULT_SAT_THRESH))?,
            noi_thresh: positive("--noi-thresh", noi_thresh.unwrap_or(DEFAULT_NOI_THRESH))?,
            pow_thresh: non_negative(
                "--pow-thresh",
                pow_thresh.unwrap_or(DEFAULT_CHANNEL_POW_THRESH),
            )?,
            occ_thresh: fraction("--occ-thresh", occ_thresh.unwrap_or(DEFAULT_OCC_THRESH))?,
            alt_thresh: alt_thresh.unwrap_or(DEFAULT_ALT_THRESH_DEG),
        };
        if !(-90.0..90.0).contains(&thresholds.alt_thresh) {
            format!(
                "An altitude threshold of {}° excludes every pass",
                thresholds.alt_thresh
            )
            .warn();
        }

        printer.push_block(vec![
            format!("Aligned data:  {}", align_dir.display()).into(),
            format!("Ephemerides:   {}", chrono_dir.display()).into(),
            format!("Searching the reference trace of {pair}").into(),
        ]);
        printer.push_line(
            format!(
                "Thresholds: sat {} σ, noise {} MAD, power {} dB, occupancy {}, altitude {}°",
                thresholds.sat_thresh,
                thresholds.noi_thresh,
                thresholds.pow_thresh,
                thresholds.occ_thresh,
                thresholds.alt_thresh
            )
            .into(),
        );
        printer.push_line(format!("Writing to {}", out_dir.display()).into());
        printer.display();
        display_warnings();

        Ok(ChannelMapParams {
            align_dir,
            chrono_dir,
            out_dir,
            windows,
            pair,
            thresholds,
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
pub(super) enum ChannelMapArgsError {
    #[error("No aligned data directory was supplied (--align-dir)")]
    NoAlignDir,

    #[error("No window ephemeris directory was supplied (--chrono-dir)")]
    NoChronoDir,

    #[error("No output directory was supplied (--out-dir)")]
    NoOutDir,

    #[error("Expected a reference and a tile name for the antenna pair, but got {0:?}")]
    BadPair(Vec<String>),
}
