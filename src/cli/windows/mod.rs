// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! List the observation windows of a date range.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, WindowArgs, ARG_FILE_HELP};
use crate::{params::WindowsParams, EmbersError};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct WindowsArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "windows")]
    #[serde(default)]
    pub(super) window_args: WindowArgs,

    /// Also write the windows to this JSON file.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

impl WindowsArgs {
    pub(super) fn merge(self) -> Result<WindowsArgs, EmbersError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let WindowsArgs {
                args_file: _,
                window_args,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(WindowsArgs {
                args_file: None,
                window_args: cli_args.window_args.merge(window_args),
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<WindowsParams, EmbersError> {
        debug!("{:#?}", self);

        let WindowsArgs {
            args_file: _,
            window_args,
            output,
        } = self;

        let mut printer = InfoPrinter::new("Observation windows".into());
        let windows = window_args.parse(&mut printer)?;
        if let Some(output) = output.as_ref() {
            printer.push_line(format!("Writing to {}", output.display()).into());
        }
        printer.display();
        display_warnings();

        Ok(WindowsParams { windows, output })
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
