// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identify the channel each satellite transmits in, per window.

use std::path::PathBuf;

use indicatif::ParallelProgressIterator;
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use super::progress_bar;
use crate::{
    antenna::AntennaPair,
    channels::{window_channel_map, ChannelMap, ChannelThresholds},
    ephem::WindowEphemeris,
    io::{aligned_path, AlignedPair, ReadInputError, WriteOutputError},
    windows::ObservationWindow,
};

pub(crate) struct ChannelMapParams {
    pub(crate) align_dir: PathBuf,
    pub(crate) chrono_dir: PathBuf,
    pub(crate) out_dir: PathBuf,
    pub(crate) windows: Vec<ObservationWindow>,

    /// The pair whose reference trace is searched.
    pub(crate) pair: AntennaPair,
    pub(crate) thresholds: ChannelThresholds,
}

impl ChannelMapParams {
    /// Write a channel map for every window. Windows whose inputs are missing
    /// or unusable get an empty map.
    pub(crate) fn run(&self) -> Result<(), WriteOutputError> {
        let progress = progress_bar(self.windows.len(), "Channel maps", "windows");
        let num_identified: usize = self
            .windows
            .par_iter()
            .progress_with(progress.clone())
            .map(|window| {
                let map = self.window_map(window);
                map.write(&self.out_dir)?;
                Ok(map.len())
            })
            .sum::<Result<usize, WriteOutputError>>()?;
        progress.abandon_with_message("Wrote channel maps");

        info!(
            "Identified {num_identified} satellite channels over {} windows; written to {}",
            self.windows.len(),
            self.out_dir.display()
        );
        Ok(())
    }

    fn window_map(&self, window: &ObservationWindow) -> ChannelMap {
        let empty = ChannelMap::new(&window.id);
        let ephem = match WindowEphemeris::read(&self.chrono_dir, &window.id) {
            Ok(e) => e,
            Err(e) => {
                log_read_error(&window.id, &e);
                return empty;
            }
        };
        if ephem.passes.is_empty() {
            return empty;
        }
        let aligned = match AlignedPair::read(&aligned_path(&self.align_dir, window, &self.pair)) {
            Ok(a) => a,
            Err(e) => {
                log_read_error(&window.id, &e);
                return empty;
            }
        };

        match window_channel_map(&aligned.reference, &ephem, &self.thresholds) {
            Ok(map) => map,
            Err(e) => {
                trace!("{}: {e}", window.id);
                empty
            }
        }
    }
}

fn log_read_error(window_id: &str, e: &ReadInputError) {
    if e.is_missing() {
        debug!("{window_id}: {e}");
    } else {
        warn!("{window_id}: {e}");
    }
}
