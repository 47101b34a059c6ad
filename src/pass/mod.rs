// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Extracting a satellite's signal from a pair of aligned traces.
//!
//! Both the gain calibration and the beam projection take a satellite pass in
//! a known channel, keep the samples where both receivers are above their
//! noise thresholds, attach the satellite's position to each sample and then
//! average the samples falling in the same healpix pixel.

mod source;
#[cfg(test)]
mod tests;

pub use source::PassSource;

use itertools::Itertools;
use thiserror::Error;

use crate::{
    channels::{time_filter, NoiseFloor},
    constants::TIME_MATCH_TOLERANCE,
    ephem::SatellitePass,
    healpix::Healpix,
    io::AlignedTrace,
};

/// The samples of a pass where both receivers saw the satellite. Powers are
/// in dBm, angles in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSamples {
    pub sat_id: String,
    pub times: Vec<f64>,
    pub ref_power: Vec<f64>,
    pub tile_power: Vec<f64>,
    pub altitude: Vec<f64>,
    pub azimuth: Vec<f64>,
}

impl PassSamples {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The time between the first and last kept samples \[seconds\].
    pub fn span(&self) -> f64 {
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// A reference trace, a tile trace and their noise floors.
#[derive(Debug, Clone, Copy)]
pub struct TracePair<'a> {
    pub reference: &'a AlignedTrace,
    pub tile: &'a AlignedTrace,
    pub ref_noise: &'a NoiseFloor,
    pub tile_noise: &'a NoiseFloor,
}

/// Why a pass yielded no samples. These are expected with sparse data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassRejection {
    #[error("the pass isn't within the trace's time range")]
    OutsideTrace,

    #[error("channel {chan} doesn't exist; the trace has {num_chans} channels")]
    NoSuchChannel { chan: usize, num_chans: usize },

    #[error("the pass peaks {peak:.1} dB above the noise, below {thresh} dB")]
    TooFaint { peak: f64, thresh: f64 },

    #[error("no samples are above the noise in both receivers")]
    BelowNoise,

    #[error("no samples coincide with the satellite's ephemeris")]
    NoEphemeris,
}

/// Crop both traces to a satellite pass in channel `chan`, require both to
/// peak at least `pow_thresh` dB above their noise thresholds, and keep the
/// samples where both are above their thresholds. Each sample is given the
/// satellite position at the same time (to within half a second); samples
/// without one are dropped.
pub fn threshold_pass(
    traces: TracePair,
    pass: &SatellitePass,
    chan: usize,
    pow_thresh: f64,
) -> Result<PassSamples, PassRejection> {
    let num_chans = traces.reference.num_channels().min(traces.tile.num_channels());
    if chan >= num_chans {
        return Err(PassRejection::NoSuchChannel { chan, num_chans });
    }
    let (rise, set) = match (pass.rise(), pass.set()) {
        (Some(r), Some(s)) => (r, s),
        _ => return Err(PassRejection::OutsideTrace),
    };
    let times = &traces.reference.times;
    let (w_start, w_stop) =
        time_filter(rise, set, times).ok_or(PassRejection::OutsideTrace)?;

    let ref_thresh = traces.ref_noise.absolute_threshold();
    let tile_thresh = traces.tile_noise.absolute_threshold();
    let ref_c = traces.reference.channel(chan);
    let tile_c = traces.tile.channel(chan);
    let range = w_start..=w_stop;

    let peak_above = |c: &ndarray::ArrayView1<f64>, thresh: f64| {
        c.slice(ndarray::s![w_start..=w_stop])
            .iter()
            .copied()
            .filter(|p| !p.is_nan())
            .fold(f64::NEG_INFINITY, f64::max)
            - thresh
    };
    for peak in [peak_above(&ref_c, ref_thresh), peak_above(&tile_c, tile_thresh)] {
        if !(peak >= pow_thresh) {
            return Err(PassRejection::TooFaint {
                peak,
                thresh: pow_thresh,
            });
        }
    }

    let above: Vec<usize> = range
        .filter(|&i| ref_c[i] >= ref_thresh && tile_c[i] >= tile_thresh)
        .collect();
    if above.is_empty() {
        return Err(PassRejection::BelowNoise);
    }

    let mut samples = PassSamples {
        sat_id: pass.sat_id.clone(),
        times: vec![],
        ref_power: vec![],
        tile_power: vec![],
        altitude: vec![],
        azimuth: vec![],
    };
    for i in above {
        let t = times[i];
        if let Some(j) = nearest_time(&pass.time_array, t) {
            samples.times.push(t);
            samples.ref_power.push(ref_c[i]);
            samples.tile_power.push(tile_c[i]);
            samples.altitude.push(pass.altitude[j]);
            samples.azimuth.push(pass.azimuth[j]);
        }
    }
    if samples.is_empty() {
        return Err(PassRejection::NoEphemeris);
    }
    Ok(samples)
}

/// The index of the (sorted) `times` element closest to `t`, if it is within
/// the matching tolerance.
fn nearest_time(times: &[f64], t: f64) -> Option<usize> {
    let i = times.partition_point(|&x| x < t);
    [i.checked_sub(1), Some(i)]
        .into_iter()
        .flatten()
        .filter(|&j| j < times.len())
        .min_by(|&a, &b| (times[a] - t).abs().total_cmp(&(times[b] - t).abs()))
        .filter(|&j| (times[j] - t).abs() <= TIME_MATCH_TOLERANCE)
}

/// A pass reduced to one value per healpix pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelPass {
    pub sat_id: String,

    /// Unique pixels, ascending.
    pub pixels: Vec<usize>,

    /// The mean reference power in each pixel \[dBm\].
    pub ref_power: Vec<f64>,

    /// The mean tile power in each pixel \[dBm\].
    pub tile_power: Vec<f64>,

    /// The time of the first sample in each pixel.
    pub times: Vec<f64>,

    /// The span of the underlying samples \[seconds\].
    pub span: f64,
}

impl PixelPass {
    pub fn from_samples(samples: &PassSamples, healpix: &Healpix) -> PixelPass {
        let grouped = samples
            .altitude
            .iter()
            .zip(&samples.azimuth)
            .enumerate()
            .map(|(i, (&alt, &az))| (healpix.alt_az_to_pix(alt, az), i))
            .into_group_map();

        let mut pixels: Vec<usize> = grouped.keys().copied().collect();
        pixels.sort_unstable();

        let mut pass = PixelPass {
            sat_id: samples.sat_id.clone(),
            pixels: Vec::with_capacity(pixels.len()),
            ref_power: Vec::with_capacity(pixels.len()),
            tile_power: Vec::with_capacity(pixels.len()),
            times: Vec::with_capacity(pixels.len()),
            span: samples.span(),
        };
        for pix in pixels {
            let indices = &grouped[&pix];
            let n = indices.len() as f64;
            pass.pixels.push(pix);
            pass.ref_power
                .push(indices.iter().map(|&i| samples.ref_power[i]).sum::<f64>() / n);
            pass.tile_power
                .push(indices.iter().map(|&i| samples.tile_power[i]).sum::<f64>() / n);
            pass.times.push(samples.times[indices[0]]);
        }
        pass
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// The smallest zenith angle of this pass's pixel centres \[radians\].
    pub fn min_zenith_angle(&self, healpix: &Healpix) -> Option<f64> {
        self.pixels
            .iter()
            .map(|&p| healpix.pix2ang(p).0)
            .reduce(f64::min)
    }

    /// Sample a healpix map at this pass's pixels.
    pub fn sample<F: Fn(usize) -> f64>(&self, map: F) -> Vec<f64> {
        self.pixels.iter().map(|&p| map(p)).collect()
    }
}
