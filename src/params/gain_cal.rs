// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Measure how far the tiles' receivers depart from the beam model at high
//! power, and fit the gain curve that corrects for it.

use std::path::PathBuf;
use std::thread::{self, ScopedJoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use crossbeam_utils::atomic::AtomicCell;
use indicatif::{ParallelProgressIterator, ProgressBar};
use log::{debug, info, trace};
use rayon::prelude::*;
use scopeguard::defer_on_unwind;
use thiserror::Error;

use super::progress_bar;
use crate::{
    antenna::AntennaPair,
    constants::{GAIN_CURVE_FILENAME, GAIN_PROFILE_FILENAME},
    gain::{
        collate_residuals, fit_collated, pass_residuals, GainCurveError, GainFitConfig,
        GainResiduals,
    },
    io::{write_json, BeamModels, ReadInputError, WriteOutputError},
    pass::PassSource,
    pointing::Pointing,
    windows::ObservationWindow,
};

pub(crate) struct GainCalParams {
    pub(crate) source: PassSource,
    pub(crate) models: BeamModels,
    pub(crate) pairs: Vec<AntennaPair>,
    pub(crate) windows: Vec<ObservationWindow>,

    /// Only passes in windows at this pointing are used.
    pub(crate) pointing: Pointing,
    pub(crate) out_dir: PathBuf,
    pub(crate) config: GainFitConfig,

    /// Residuals measured outside these powers are dropped before fitting
    /// \[dBm\].
    pub(crate) outlier_bounds: (f64, f64),

    /// The curve is fit to residuals in this power band \[dBm\].
    pub(crate) band: (f64, f64),
}

impl GainCalParams {
    pub(crate) fn run(&self) -> Result<(), GainCalError> {
        // Residuals are measured per pair in parallel and written by a
        // separate thread as they arrive.
        let (tx, rx) = bounded(5);
        let progress = progress_bar(self.pairs.len(), "Gain residuals", "pairs");

        let error = AtomicCell::new(false);
        let num_written = thread::scope(|scope| {
            let measure_handle: ScopedJoinHandle<()> = thread::Builder::new()
                .name("measure".to_string())
                .spawn_scoped(scope, || {
                    defer_on_unwind! { error.store(true); }
                    self.measure_thread(tx, &error, progress.clone());
                    progress.abandon_with_message("Measured gain residuals");
                })
                .expect("OS can create threads");

            let write_handle: ScopedJoinHandle<Result<usize, WriteOutputError>> =
                thread::Builder::new()
                    .name("write".to_string())
                    .spawn_scoped(scope, || {
                        defer_on_unwind! { error.store(true); }
                        let result = self.write_thread(rx);
                        if result.is_err() {
                            error.store(true);
                        }
                        result
                    })
                    .expect("OS can create threads");

            // Panics abort, as per the Cargo.toml.
            measure_handle.join().unwrap();
            write_handle.join().unwrap()
        })?;
        info!(
            "Wrote gain residuals of {num_written} antenna pairs to {}",
            self.out_dir.display()
        );

        let all = collate_residuals(&self.out_dir)?;
        let collation = fit_collated(&all, self.outlier_bounds, self.band)?;
        let curve_path = self.out_dir.join(GAIN_CURVE_FILENAME);
        collation.curve.write(&curve_path)?;
        write_json(&self.out_dir.join(GAIN_PROFILE_FILENAME), &collation.profile)?;

        let [a, b, c] = collation.curve.coeffs;
        info!(
            "Fit the gain curve {a:.4e} p² + {b:.4e} p + {c:.4e} to {} of {} residuals",
            collation.num_points,
            all.len()
        );
        match collation.curve.root() {
            Some(root) => info!("Gain corrections apply above {root:.2} dBm"),
            None => info!("The gain curve has no real root; no corrections will be applied"),
        }
        info!("Wrote {}", curve_path.display());
        Ok(())
    }

    fn measure_thread(
        &self,
        tx: Sender<(AntennaPair, GainResiduals)>,
        error: &AtomicCell<bool>,
        progress: ProgressBar,
    ) {
        self.pairs
            .par_iter()
            .progress_with(progress)
            .for_each_with(tx, |tx, pair| {
                if error.load() {
                    return;
                }
                let residuals = self.pair_residuals(pair);
                // A closed channel means the writer has exited with an error;
                // that error is reported by the writer.
                let _ = tx.send((pair.clone(), residuals));
            });
    }

    fn write_thread(
        &self,
        rx: Receiver<(AntennaPair, GainResiduals)>,
    ) -> Result<usize, WriteOutputError> {
        let mut num_written = 0;
        for (pair, residuals) in rx {
            if residuals.is_empty() {
                debug!("{pair}: no passes survived the gain cuts");
                continue;
            }
            residuals.write(&GainResiduals::path(&self.out_dir, &pair))?;
            num_written += 1;
        }
        Ok(num_written)
    }

    /// The residuals of every surviving pass of one pair.
    fn pair_residuals(&self, pair: &AntennaPair) -> GainResiduals {
        let mut residuals = GainResiduals::default();
        let pol = pair.polarisation();
        let tile_model = match self.models.tile(self.pointing, pol) {
            Some(m) => m,
            None => return residuals,
        };
        let ref_model = self.models.reference(pol);

        self.source
            .visit(pair, &self.windows, Some(self.pointing), |window, _, pass| {
                match pass_residuals(
                    &pass,
                    ref_model,
                    tile_model,
                    &self.config,
                    &self.source.healpix,
                ) {
                    Ok(r) => residuals.push(&r),
                    Err(e) => trace!("{pair} {} satellite {}: {e}", window.id, pass.sat_id),
                }
            });
        residuals
    }
}

#[derive(Error, Debug)]
pub(crate) enum GainCalError {
    #[error(transparent)]
    Read(#[from] ReadInputError),

    #[error(transparent)]
    Write(#[from] WriteOutputError),

    #[error(transparent)]
    Curve(#[from] GainCurveError),
}
