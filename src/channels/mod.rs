// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Identifying the frequency channel each satellite transmits in.
//!
//! A channel is a candidate for a satellite if, while the satellite is above
//! the horizon, the channel is mostly (but not always) above the noise
//! threshold, peaks well above the noise, and is quiet immediately around the
//! pass. Of the candidates, the one occupied for longest wins.

mod noise;

pub use noise::{NoiseFloor, NoiseFloorError};

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::trace;

use crate::{
    constants::{
        DEFAULT_ALT_THRESH_DEG, DEFAULT_CHANNEL_POW_THRESH, DEFAULT_NOI_THRESH, DEFAULT_OCC_THRESH,
        DEFAULT_SAT_THRESH, EDGE_SAMPLES,
    },
    ephem::{SatellitePass, WindowEphemeris},
    io::{read_json, write_json, AlignedTrace, ReadInputError, WriteOutputError},
};

/// Thresholds used when identifying channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelThresholds {
    /// Channels peaking below this many standard deviations of the trace are
    /// noise-only.
    pub sat_thresh: f64,

    /// The noise threshold is this many MADs above the noise median.
    pub noi_thresh: f64,

    /// A candidate channel must peak at least this far above the noise median
    /// \[dB\].
    pub pow_thresh: f64,

    /// The minimum fraction of the pass a candidate must be above the noise
    /// threshold.
    pub occ_thresh: f64,

    /// Passes peaking below this altitude are ignored \[degrees\].
    pub alt_thresh: f64,
}

impl Default for ChannelThresholds {
    fn default() -> Self {
        ChannelThresholds {
            sat_thresh: DEFAULT_SAT_THRESH,
            noi_thresh: DEFAULT_NOI_THRESH,
            pow_thresh: DEFAULT_CHANNEL_POW_THRESH,
            occ_thresh: DEFAULT_OCC_THRESH,
            alt_thresh: DEFAULT_ALT_THRESH_DEG,
        }
    }
}

/// A channel which could be a satellite's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelCandidate {
    pub chan: usize,
    pub occupancy: f64,
    pub peak: f64,
}

/// Find the (inclusive) range of trace samples within `[rise, set]`.
pub fn time_filter(rise: f64, set: f64, times: &[f64]) -> Option<(usize, usize)> {
    let start = times.iter().position(|&t| t >= rise)?;
    let stop = times.iter().rposition(|&t| t <= set)?;
    if stop < start {
        None
    } else {
        Some((start, stop))
    }
}

/// All candidate channels for a pass, in channel order.
pub fn channel_candidates(
    noise: &NoiseFloor,
    times: &[f64],
    pass: &SatellitePass,
    thresholds: &ChannelThresholds,
) -> Vec<ChannelCandidate> {
    let max_alt = match pass.max_altitude() {
        Some(a) => a.to_degrees(),
        None => return vec![],
    };
    if max_alt < thresholds.alt_thresh {
        trace!(
            "Satellite {} peaks at {max_alt:.1}°, below the altitude threshold",
            pass.sat_id
        );
        return vec![];
    }
    let (w_start, w_stop) = match (pass.rise(), pass.set()) {
        (Some(rise), Some(set)) => match time_filter(rise, set, times) {
            Some(interval) => interval,
            None => {
                trace!("Satellite {} isn't in the trace's time range", pass.sat_id);
                return vec![];
            }
        },
        _ => return vec![],
    };
    let window_len = w_stop - w_start + 1;
    let num_samples = noise.shifted.nrows();
    // Edges of the pass inside the trace must be quiet.
    let check_rise = w_start > 0;
    let check_set = w_stop + 1 < num_samples;

    let threshold = noise.threshold;
    let mut candidates = vec![];
    for (chan, column) in noise.shifted.columns().into_iter().enumerate() {
        let cropped = column.slice(ndarray::s![w_start..=w_stop]);
        let peak = cropped
            .iter()
            .copied()
            .filter(|p| !p.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        if peak < thresholds.pow_thresh {
            continue;
        }
        let occupied = cropped.iter().filter(|&&p| p >= threshold).count();
        let occupancy = occupied as f64 / window_len as f64;
        if !(thresholds.occ_thresh..1.0).contains(&occupancy) {
            continue;
        }
        let quiet = |p: &f64| *p < threshold;
        if check_rise && !cropped.iter().take(EDGE_SAMPLES).all(quiet) {
            continue;
        }
        if check_set
            && !cropped
                .iter()
                .skip(window_len.saturating_sub(EDGE_SAMPLES))
                .all(quiet)
        {
            continue;
        }
        candidates.push(ChannelCandidate {
            chan,
            occupancy,
            peak,
        });
    }
    candidates
}

/// The channel a satellite occupies during a pass, if any channel stands out.
/// Ties in occupancy go to the lowest channel.
pub fn identify_channel(
    noise: &NoiseFloor,
    times: &[f64],
    pass: &SatellitePass,
    thresholds: &ChannelThresholds,
) -> Option<ChannelCandidate> {
    channel_candidates(noise, times, pass, thresholds)
        .into_iter()
        .reduce(|best, c| if c.occupancy > best.occupancy { c } else { best })
}

/// Identify the channels of all satellites in a window. When a satellite has
/// more than one pass in the window, its first pass with a channel is used.
pub fn window_channel_map(
    trace: &AlignedTrace,
    ephem: &WindowEphemeris,
    thresholds: &ChannelThresholds,
) -> Result<ChannelMap, NoiseFloorError> {
    let mut map = ChannelMap::new(&ephem.window_id);
    if ephem.passes.is_empty() {
        return Ok(map);
    }

    let noise = NoiseFloor::compute(
        trace.power.view(),
        thresholds.sat_thresh,
        thresholds.noi_thresh,
    )?;
    for pass in &ephem.passes {
        if map.entries.contains_key(&pass.sat_id) {
            continue;
        }
        match identify_channel(&noise, &trace.times, pass, thresholds) {
            Some(c) => {
                trace!(
                    "{}: satellite {} is in channel {} (occupancy {:.2})",
                    ephem.window_id,
                    pass.sat_id,
                    c.chan,
                    c.occupancy
                );
                map.entries.insert(pass.sat_id.clone(), c.chan);
            }
            None => trace!(
                "{}: no channel found for satellite {}",
                ephem.window_id,
                pass.sat_id
            ),
        }
    }
    Ok(map)
}

/// The channel of every identified satellite in a window. Written to disk as
/// a flat `{sat_id: channel}` JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChannelMap {
    pub window_id: String,
    pub entries: IndexMap<String, usize>,
}

impl ChannelMap {
    pub fn new(window_id: &str) -> ChannelMap {
        ChannelMap {
            window_id: window_id.to_string(),
            entries: IndexMap::new(),
        }
    }

    pub fn path(dir: &Path, window_id: &str) -> PathBuf {
        dir.join(format!("{window_id}.json"))
    }

    pub fn read(dir: &Path, window_id: &str) -> Result<ChannelMap, ReadInputError> {
        let entries = read_json(&Self::path(dir, window_id))?;
        Ok(ChannelMap {
            window_id: window_id.to_string(),
            entries,
        })
    }

    pub fn write(&self, dir: &Path) -> Result<(), WriteOutputError> {
        write_json(&Self::path(dir, &self.window_id), &self.entries)
    }

    pub fn channel_of(&self, sat_id: &str) -> Option<usize> {
        self.entries.get(sat_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
