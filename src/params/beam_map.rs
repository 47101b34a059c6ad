// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Project calibrated satellite passes onto healpix maps of each tile's beam.

use std::path::PathBuf;

use indicatif::ParallelProgressIterator;
use log::{debug, info, trace};
use rayon::prelude::*;

use super::progress_bar;
use crate::{
    antenna::AntennaPair,
    beam_map::{project_pass, HealpixBeamMap},
    gain::GainCurve,
    io::{BeamModels, WriteOutputError},
    pass::PassSource,
    windows::ObservationWindow,
};

pub(crate) struct BeamMapParams {
    pub(crate) source: PassSource,
    pub(crate) models: BeamModels,
    pub(crate) gain: GainCurve,
    pub(crate) pairs: Vec<AntennaPair>,
    pub(crate) windows: Vec<ObservationWindow>,
    pub(crate) out_dir: PathBuf,
    pub(crate) fit_thresh: f64,
}

impl BeamMapParams {
    pub(crate) fn run(&self) -> Result<(), WriteOutputError> {
        let progress = progress_bar(self.pairs.len(), "Beam maps", "pairs");
        let num_samples: usize = self
            .pairs
            .par_iter()
            .progress_with(progress.clone())
            .map(|pair| {
                let map = self.pair_map(pair);
                let path = map.write(&self.out_dir)?;
                debug!("{pair}: wrote {} samples to {}", map.num_samples(), path.display());
                Ok(map.num_samples())
            })
            .sum::<Result<usize, WriteOutputError>>()?;
        progress.abandon_with_message("Wrote beam maps");

        info!(
            "Projected {num_samples} samples onto the beam maps of {} antenna pairs; written to {}",
            self.pairs.len(),
            self.out_dir.display()
        );
        Ok(())
    }

    fn pair_map(&self, pair: &AntennaPair) -> HealpixBeamMap {
        let pol = pair.polarisation();
        let ref_model = self.models.reference(pol);
        let mut map = HealpixBeamMap::new(
            pair.clone(),
            self.source.healpix,
            &self.models.pointings(),
        );

        self.source
            .visit(pair, &self.windows, None, |window, pointing, pass| {
                let tile_model = match self.models.tile(pointing, pol) {
                    Some(m) => m,
                    None => {
                        trace!("{pair} {}: no tile model at pointing {pointing}", window.id);
                        return;
                    }
                };
                match project_pass(&pass, ref_model, tile_model, &self.gain, self.fit_thresh) {
                    Ok(projected) => map.add_pass(pointing, &pass, &projected),
                    Err(e) => trace!("{pair} {} satellite {}: {e}", window.id, pass.sat_id),
                }
            });
        map
    }
}
