// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::f64::consts::FRAC_PI_2;
use std::fs::File;

use approx::assert_abs_diff_eq;
use indexmap::indexmap;
use ndarray::Array2;
use ndarray_npy::NpzWriter;
use tempfile::TempDir;

use super::*;
use crate::{
    antenna::AntennaPair,
    channels::ChannelMap,
    ephem::WindowEphemeris,
    io::aligned_path,
    pointing::{Pointing, PointingLookup},
};

const T0: f64 = 1577808000.0;

/// 200 samples of 4 channels of noise around -80 dBm, with channel 1 brought
/// up to `level` dBm over samples 50..150.
fn trace(level: f64) -> AlignedTrace {
    let mut power = Array2::from_shape_fn((200, 4), |(i, j)| {
        -80.0 + ((i * 5 + j * 13) % 21) as f64 / 10.0 - 1.0
    });
    for i in 50..150 {
        power[(i, 1)] = level + (i as f64 - 100.0).abs() / -10.0;
    }
    AlignedTrace {
        power,
        times: (0..200).map(|i| T0 + i as f64).collect(),
    }
}

fn pass(rise: usize, set: usize) -> SatellitePass {
    let n = set - rise + 1;
    SatellitePass::new(
        "25338",
        (rise..=set).map(|i| T0 + i as f64).collect(),
        (0..n).map(|i| i as f64 / (n - 1) as f64 * FRAC_PI_2).collect(),
        vec![0.3; n],
    )
    .unwrap()
}

fn noise(t: &AlignedTrace) -> NoiseFloor {
    NoiseFloor::compute(t.power.view(), 1.0, 3.0).unwrap()
}

#[test]
fn test_threshold_pass() {
    let reference = trace(-40.0);
    let tile = trace(-30.0);
    let (rn, tn) = (noise(&reference), noise(&tile));
    let traces = TracePair {
        reference: &reference,
        tile: &tile,
        ref_noise: &rn,
        tile_noise: &tn,
    };

    let samples = threshold_pass(traces, &pass(40, 159), 1, 5.0).unwrap();
    // Only the loud part of the pass survives.
    assert_eq!(samples.len(), 100);
    assert_abs_diff_eq!(samples.times[0], T0 + 50.0);
    assert_abs_diff_eq!(samples.span(), 99.0);
    assert_abs_diff_eq!(samples.ref_power[50], -40.0);
    assert_abs_diff_eq!(samples.tile_power[50], -30.0);
    // Positions come from the matching ephemeris sample (index 10 is T0 + 50).
    assert_abs_diff_eq!(samples.altitude[0], 10.0 / 119.0 * FRAC_PI_2, epsilon = 1e-12);
    assert!(samples.azimuth.iter().all(|&a| a == 0.3));
}

#[test]
fn test_threshold_pass_rejections() {
    let reference = trace(-40.0);
    let tile = trace(-30.0);
    let (rn, tn) = (noise(&reference), noise(&tile));
    let traces = TracePair {
        reference: &reference,
        tile: &tile,
        ref_noise: &rn,
        tile_noise: &tn,
    };

    assert!(matches!(
        threshold_pass(traces, &pass(40, 159), 1, 50.0),
        Err(PassRejection::TooFaint { .. })
    ));
    assert_eq!(
        threshold_pass(traces, &pass(40, 159), 9, 5.0),
        Err(PassRejection::NoSuchChannel {
            chan: 9,
            num_chans: 4
        })
    );
    assert_eq!(
        threshold_pass(traces, &pass(300, 400), 1, 5.0),
        Err(PassRejection::OutsideTrace)
    );
    // A quiet channel is too faint.
    assert!(matches!(
        threshold_pass(traces, &pass(40, 159), 2, 5.0),
        Err(PassRejection::TooFaint { .. })
    ));

    // Ephemeris with a gap over the loud part of the pass.
    let full = pass(40, 159);
    let gappy = SatellitePass::new(
        "25338",
        [&full.time_array[..10], &full.time_array[110..]].concat(),
        [&full.altitude[..10], &full.altitude[110..]].concat(),
        [&full.azimuth[..10], &full.azimuth[110..]].concat(),
    )
    .unwrap();
    assert_eq!(
        threshold_pass(traces, &gappy, 1, 5.0),
        Err(PassRejection::NoEphemeris)
    );
}

#[test]
fn test_nearest_time() {
    let times = [0.0, 1.0, 2.0, 3.0];
    assert_eq!(nearest_time(&times, 1.2), Some(1));
    assert_eq!(nearest_time(&times, 1.6), Some(2));
    assert_eq!(nearest_time(&times, 3.5), Some(3));
    assert_eq!(nearest_time(&times, 3.6), None);
    assert_eq!(nearest_time(&times, -0.5), Some(0));
    assert_eq!(nearest_time(&[], 0.0), None);
}

#[test]
fn test_pixel_averaging() {
    let healpix = Healpix::new(4).unwrap();
    let zenith = healpix.alt_az_to_pix(FRAC_PI_2, 0.0);
    let horizon = healpix.alt_az_to_pix(0.0, 1.0);
    assert_ne!(zenith, horizon);

    let samples = PassSamples {
        sat_id: "1".to_string(),
        times: vec![10.0, 11.0, 12.0, 13.0],
        ref_power: vec![-40.0, -42.0, -50.0, -41.0],
        tile_power: vec![-30.0, -32.0, -35.0, -31.0],
        altitude: vec![FRAC_PI_2, FRAC_PI_2, 0.0, FRAC_PI_2],
        azimuth: vec![0.0, 0.0, 1.0, 0.0],
    };
    let pp = PixelPass::from_samples(&samples, &healpix);
    assert_eq!(pp.len(), 2);
    assert_abs_diff_eq!(pp.span, 3.0);
    let z = pp.pixels.iter().position(|&p| p == zenith).unwrap();
    let h = pp.pixels.iter().position(|&p| p == horizon).unwrap();
    assert_abs_diff_eq!(pp.ref_power[z], -41.0);
    assert_abs_diff_eq!(pp.tile_power[z], -31.0);
    assert_abs_diff_eq!(pp.times[z], 10.0);
    assert_abs_diff_eq!(pp.ref_power[h], -50.0);
    assert_abs_diff_eq!(pp.times[h], 12.0);
    assert!(pp.pixels.windows(2).all(|w| w[0] < w[1]));

    assert!(pp.min_zenith_angle(&healpix).unwrap() < 0.3);
    let map: Vec<f64> = (0..healpix.npix()).map(|p| p as f64).collect();
    let sampled = pp.sample(|p| map[p]);
    assert_eq!(sampled, pp.pixels.iter().map(|&p| p as f64).collect::<Vec<_>>());
}

#[test]
fn test_pass_source_visits_identified_passes() {
    let tmp = TempDir::new().unwrap();
    let pair = AntennaPair::new("rf0XX", "S06XX").unwrap();
    let windows = crate::windows::observation_windows("Australia/Perth", "2020-01-01", "2020-01-01")
        .unwrap();
    let (w0, w1) = (&windows[0], &windows[1]);
    assert_abs_diff_eq!(w0.start_unix, T0);

    let source = PassSource {
        align_dir: tmp.path().join("align"),
        chrono_dir: tmp.path().join("chrono"),
        chan_map_dir: tmp.path().join("chan_map"),
        pointings: PointingLookup::from_lists(indexmap! {
            "point_0".to_string() => vec![w0.id.clone()],
            "point_2".to_string() => vec![w1.id.clone()],
        }),
        sat_thresh: 1.0,
        noi_thresh: 3.0,
        pow_thresh: 5.0,
        healpix: Healpix::new(32).unwrap(),
    };

    let path = aligned_path(&source.align_dir, w0, &pair);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let (reference, tile) = (trace(-40.0), trace(-30.0));
    let mut npz = NpzWriter::new(File::create(&path).unwrap());
    npz.add_array("ref_p_aligned", &reference.power).unwrap();
    npz.add_array("tile_p_aligned", &tile.power).unwrap();
    npz.add_array("time_array", &ndarray::Array1::from(reference.times.clone()))
        .unwrap();
    npz.finish().unwrap();

    let mut ephem = WindowEphemeris::new(&w0.id);
    ephem.passes.push(pass(40, 159));
    ephem.write(&source.chrono_dir).unwrap();
    let mut chan_map = ChannelMap::new(&w0.id);
    chan_map.entries.insert("25338".to_string(), 1);
    chan_map.write(&source.chan_map_dir).unwrap();

    // The second window has no inputs at all, and is skipped.
    let mut visited = vec![];
    let n = source.visit(&pair, &windows, None, |w, p, pp| {
        visited.push((w.id.clone(), p, pp.sat_id.clone(), pp.span))
    });
    assert_eq!(n, 1);
    assert_eq!(visited.len(), 1);
    assert_eq!(visited[0].0, w0.id);
    assert_eq!(visited[0].1, Pointing::P0);
    assert_eq!(visited[0].2, "25338");
    assert_abs_diff_eq!(visited[0].3, 99.0);

    let n = source.visit(&pair, &windows, Some(Pointing::P2), |_, _, _| {
        panic!("no pass should be visited")
    });
    assert_eq!(n, 0);
}
