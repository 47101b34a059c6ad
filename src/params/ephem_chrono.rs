// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Resample satellite ephemerides and sort their passes into observation
//! windows.

use std::path::{Path, PathBuf};

use indicatif::ParallelProgressIterator;
use log::{debug, info, trace, warn};
use rayon::prelude::*;

use super::progress_bar;
use crate::{
    ephem::{match_passes, InterpKind, SatelliteEphemeris, SatellitePass},
    io::WriteOutputError,
    windows::ObservationWindow,
};

pub(crate) struct EphemChronoParams {
    pub(crate) ephem_files: Vec<PathBuf>,
    pub(crate) out_dir: PathBuf,
    pub(crate) windows: Vec<ObservationWindow>,
    pub(crate) interp: InterpKind,
    pub(crate) interp_freq: f64,
}

impl EphemChronoParams {
    pub(crate) fn run(&self) -> Result<(), WriteOutputError> {
        let read_progress = progress_bar(self.ephem_files.len(), "Resampling", "satellites");
        let passes: Vec<SatellitePass> = self
            .ephem_files
            .par_iter()
            .progress_with(read_progress.clone())
            .flat_map_iter(|file| resampled_passes(file, self.interp, self.interp_freq))
            .collect();
        read_progress.abandon_with_message("Resampled passes");
        info!(
            "Resampled {} passes from {} ephemeris files",
            passes.len(),
            self.ephem_files.len()
        );

        let ephems = match_passes(&passes, &self.windows);
        let write_progress = progress_bar(ephems.len(), "Writing", "windows");
        ephems
            .par_iter()
            .progress_with(write_progress.clone())
            .try_for_each(|e| e.write(&self.out_dir))?;
        write_progress.abandon_with_message("Wrote windows");

        let num_occupied = ephems.iter().filter(|e| !e.passes.is_empty()).count();
        info!(
            "{num_occupied} of {} windows have satellite passes; written to {}",
            ephems.len(),
            self.out_dir.display()
        );
        Ok(())
    }
}

/// Every resampled pass of one ephemeris file. Problems with the file or its
/// passes only drop what they affect.
fn resampled_passes(file: &Path, interp: InterpKind, freq: f64) -> Vec<SatellitePass> {
    let ephem = match SatelliteEphemeris::read(file) {
        Ok(e) => e,
        Err(e) if e.is_missing() => {
            debug!("{e}");
            return vec![];
        }
        Err(e) => {
            warn!("Skipping ephemeris: {e}");
            return vec![];
        }
    };
    let passes = match ephem.passes() {
        Ok(p) => p,
        Err(e) => {
            warn!("Skipping {}: {e}", file.display());
            return vec![];
        }
    };

    passes
        .iter()
        .filter_map(|pass| match pass.resample(interp, freq) {
            Ok(p) => Some(p),
            Err(e) if e.is_insufficient_data() => {
                trace!("{}: {e}", file.display());
                None
            }
            Err(e) => {
                warn!("{}: {e}", file.display());
                None
            }
        })
        .collect()
}
