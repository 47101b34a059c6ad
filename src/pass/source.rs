// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Walking every identified satellite pass of an antenna pair.

use std::path::PathBuf;

use log::{debug, trace, warn};

use super::{threshold_pass, PixelPass, TracePair};
use crate::{
    antenna::AntennaPair,
    channels::{ChannelMap, NoiseFloor},
    ephem::WindowEphemeris,
    healpix::Healpix,
    io::{aligned_path, AlignedPair, ReadInputError},
    pointing::{Pointing, PointingLookup},
    windows::ObservationWindow,
};

/// Where the inputs of the gain calibration and beam projection live, and
/// how passes are thresholded.
#[derive(Debug, Clone)]
pub struct PassSource {
    pub align_dir: PathBuf,
    pub chrono_dir: PathBuf,
    pub chan_map_dir: PathBuf,
    pub pointings: PointingLookup,
    pub sat_thresh: f64,
    pub noi_thresh: f64,
    pub pow_thresh: f64,
    pub healpix: Healpix,
}

impl PassSource {
    /// Call `f` with every satellite pass of `pair` which survives
    /// thresholding, in window order. Only windows with a known pointing are
    /// visited, and if `only` is given, only windows at that pointing.
    ///
    /// Missing or unreadable inputs skip their window. Returns the number of
    /// passes visited.
    pub fn visit<F>(
        &self,
        pair: &AntennaPair,
        windows: &[ObservationWindow],
        only: Option<Pointing>,
        mut f: F,
    ) -> usize
    where
        F: FnMut(&ObservationWindow, Pointing, PixelPass),
    {
        let mut num_passes = 0;
        for window in windows {
            let pointing = match self.pointings.pointing_of(&window.id) {
                Some(p) if only.map(|o| o == p).unwrap_or(true) => p,
                _ => continue,
            };

            let chan_map = match ChannelMap::read(&self.chan_map_dir, &window.id) {
                Ok(m) if m.is_empty() => continue,
                Ok(m) => m,
                Err(e) => {
                    log_read_error(pair, &window.id, &e);
                    continue;
                }
            };
            let ephem = match WindowEphemeris::read(&self.chrono_dir, &window.id) {
                Ok(e) => e,
                Err(e) => {
                    log_read_error(pair, &window.id, &e);
                    continue;
                }
            };
            let path = aligned_path(&self.align_dir, window, pair);
            let aligned = match AlignedPair::read(&path) {
                Ok(a) => a,
                Err(e) => {
                    log_read_error(pair, &window.id, &e);
                    continue;
                }
            };
            let tile = match aligned.require_tile(&path) {
                Ok(t) => t,
                Err(e) => {
                    log_read_error(pair, &window.id, &e);
                    continue;
                }
            };

            let floors = NoiseFloor::compute(
                aligned.reference.power.view(),
                self.sat_thresh,
                self.noi_thresh,
            )
            .and_then(|r| {
                NoiseFloor::compute(tile.power.view(), self.sat_thresh, self.noi_thresh)
                    .map(|t| (r, t))
            });
            let (ref_noise, tile_noise) = match floors {
                Ok(f) => f,
                Err(e) => {
                    trace!("{pair} {}: {e}", window.id);
                    continue;
                }
            };
            let traces = TracePair {
                reference: &aligned.reference,
                tile,
                ref_noise: &ref_noise,
                tile_noise: &tile_noise,
            };

            for (sat_id, &chan) in &chan_map.entries {
                for pass in ephem.passes_of(sat_id) {
                    match threshold_pass(traces, pass, chan, self.pow_thresh) {
                        Ok(samples) => {
                            num_passes += 1;
                            f(window, pointing, PixelPass::from_samples(&samples, &self.healpix));
                        }
                        Err(e) => trace!("{pair} {} satellite {sat_id}: {e}", window.id),
                    }
                }
            }
        }
        num_passes
    }
}

fn log_read_error(pair: &AntennaPair, window_id: &str, e: &ReadInputError) {
    if e.is_missing() {
        debug!("{pair} {window_id}: {e}");
    } else {
        warn!("{pair} {window_id}: skipping window: {e}");
    }
}
