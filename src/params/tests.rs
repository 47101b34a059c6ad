// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use approx::assert_abs_diff_eq;
use indoc::formatdoc;
use ndarray::Array2;
use tempfile::TempDir;

use super::*;
use crate::{
    antenna::AntennaPair,
    beam_map::BeamMapFile,
    channels::{ChannelMap, ChannelThresholds},
    constants::{GAIN_CURVE_FILENAME, GAIN_PROFILE_BINS, GAIN_PROFILE_FILENAME},
    ephem::{InterpKind, WindowEphemeris},
    gain::{GainCurve, GainCurveError, GainFitConfig, GainProfile, GainResiduals},
    healpix::Healpix,
    io::BeamModels,
    pass::PassSource,
    pointing::{Pointing, PointingLookup},
    windows::{observation_windows, ObservationWindow},
};

/// 2020-01-01 00:00 in Perth.
const T0: f64 = 1577808000.0;

fn one_day() -> Vec<ObservationWindow> {
    observation_windows("Australia/Perth", "2020-01-01", "2020-01-01").unwrap()
}

#[test]
fn test_windows_written() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("windows.json");
    let params = WindowsParams {
        windows: one_day(),
        output: Some(output.clone()),
    };
    params.run().unwrap();
    let text = std::fs::read_to_string(output).unwrap();
    let read: Vec<ObservationWindow> = serde_json::from_str(&text).unwrap();
    assert_eq!(read, params.windows);
}

#[test]
fn test_ephem_chrono() {
    let tmp = TempDir::new().unwrap();
    let ephem_dir = tmp.path().join("ephem");
    std::fs::create_dir_all(&ephem_dir).unwrap();

    // One usable pass early in the first window, and one too short to
    // resample.
    let times: Vec<f64> = (0..31).map(|i| T0 + 100.0 + 10.0 * i as f64).collect();
    let alts: Vec<f64> = (0..31).map(|i| 0.02 * i as f64).collect();
    let azs = vec![1.0; 31];
    std::fs::write(
        ephem_dir.join("25338.json"),
        formatdoc! {r#"
            {{
                "sat_id": 25338,
                "time_array": [{times:?}, [{t1}, {t2}]],
                "sat_alt": [{alts:?}, [0.1, 0.2]],
                "sat_az": [{azs:?}, [1.0, 1.0]]
            }}
        "#,
            times = times,
            alts = alts,
            azs = azs,
            t1 = T0 + 2000.0,
            t2 = T0 + 2001.0,
        },
    )
    .unwrap();
    std::fs::write(ephem_dir.join("40086.json"), "not json").unwrap();

    let params = EphemChronoParams {
        ephem_files: vec![ephem_dir.join("25338.json"), ephem_dir.join("40086.json")],
        out_dir: tmp.path().join("chrono"),
        windows: one_day(),
        interp: InterpKind::Linear,
        interp_freq: 1.0,
    };
    params.run().unwrap();

    let first = WindowEphemeris::read(&params.out_dir, &params.windows[0].id).unwrap();
    assert_eq!(first.passes.len(), 1);
    let pass = &first.passes[0];
    assert_eq!(pass.sat_id, "25338");
    assert_eq!(pass.len(), 301);
    assert_abs_diff_eq!(pass.time_array[0], T0 + 100.0);
    assert_abs_diff_eq!(pass.altitude[150], 0.3, epsilon = 1e-9);

    // Every window is written, occupied or not.
    for window in &params.windows[1..] {
        let ephem = WindowEphemeris::read(&params.out_dir, &window.id).unwrap();
        assert!(ephem.passes.is_empty());
    }
}

#[test]
fn test_channel_map_without_inputs() {
    let tmp = TempDir::new().unwrap();
    let params = ChannelMapParams {
        align_dir: tmp.path().join("align"),
        chrono_dir: tmp.path().join("chrono"),
        out_dir: tmp.path().join("chan_map"),
        windows: one_day()[..2].to_vec(),
        pair: AntennaPair::new("rf0XX", "S07XX").unwrap(),
        thresholds: ChannelThresholds::default(),
    };
    params.run().unwrap();
    for window in &params.windows {
        let map = ChannelMap::read(&params.out_dir, &window.id).unwrap();
        assert!(map.is_empty());
    }
}

/// A pass source over empty input directories, with window 0 at pointing 0.
fn empty_source(dir: &std::path::Path, windows: &[ObservationWindow]) -> PassSource {
    PassSource {
        align_dir: dir.join("align"),
        chrono_dir: dir.join("chrono"),
        chan_map_dir: dir.join("chan_map"),
        pointings: PointingLookup::from_lists(indexmap::indexmap! {
            "point_0".to_string() => vec![windows[0].id.clone()],
        }),
        sat_thresh: 1.0,
        noi_thresh: 3.0,
        pow_thresh: 5.0,
        healpix: Healpix::new(4).unwrap(),
    }
}

fn flat_models(healpix: Healpix) -> BeamModels {
    let npix = healpix.npix();
    let tile = HashMap::from([(Pointing::P0, Array2::from_elem((2, npix), -40.0))]);
    BeamModels::new(healpix, &vec![-30.0; npix], &vec![-30.0; npix], tile).unwrap()
}

fn gain_cal_params(dir: &std::path::Path) -> GainCalParams {
    let windows = one_day();
    let source = empty_source(dir, &windows);
    GainCalParams {
        models: flat_models(source.healpix),
        source,
        pairs: vec![AntennaPair::new("rf1YY", "S33YY").unwrap()],
        windows,
        pointing: Pointing::P0,
        out_dir: dir.join("gain"),
        config: GainFitConfig::default(),
        outlier_bounds: (-65.0, -25.0),
        band: (-50.0, -30.0),
    }
}

#[test]
fn test_gain_cal_collates_residual_files() {
    let tmp = TempDir::new().unwrap();
    let params = gain_cal_params(tmp.path());

    // Residuals left by an earlier run of another pair, on the curve
    // 0.01 p² + 1.4 p + 40, plus an outlier.
    let mut earlier = GainResiduals::default();
    for i in 0..=60 {
        let p = -60.0 + 0.5 * i as f64;
        earlier.pass_data.push(p);
        earlier.pass_resi.push(0.01 * p * p + 1.4 * p + 40.0);
    }
    earlier.pass_data.push(-70.0);
    earlier.pass_resi.push(100.0);
    let pair = AntennaPair::new("rf0XX", "S07XX").unwrap();
    earlier
        .write(&GainResiduals::path(&params.out_dir, &pair))
        .unwrap();

    params.run().unwrap();

    // The pair run here had no passes, so it wrote no residuals.
    assert!(!GainResiduals::path(&params.out_dir, &params.pairs[0]).exists());
    let curve = GainCurve::read(&params.out_dir.join(GAIN_CURVE_FILENAME)).unwrap();
    assert_abs_diff_eq!(curve.coeffs[0], 0.01, epsilon = 1e-9);
    assert_abs_diff_eq!(curve.coeffs[1], 1.4, epsilon = 1e-7);
    assert_abs_diff_eq!(curve.coeffs[2], 40.0, epsilon = 1e-5);
    let profile: GainProfile =
        crate::io::read_json(&params.out_dir.join(GAIN_PROFILE_FILENAME)).unwrap();
    assert_eq!(profile.centres.len(), GAIN_PROFILE_BINS);
    assert!(profile.medians.iter().all(Option::is_some));
}

#[test]
fn test_gain_cal_without_residuals() {
    let tmp = TempDir::new().unwrap();
    let params = gain_cal_params(tmp.path());
    assert!(matches!(
        params.run(),
        Err(GainCalError::Curve(GainCurveError::TooFewPoints { got: 0, .. }))
    ));
    assert!(!params.out_dir.join(GAIN_CURVE_FILENAME).exists());
}

#[test]
fn test_beam_map_without_passes() {
    let tmp = TempDir::new().unwrap();
    let windows = one_day();
    let source = empty_source(tmp.path(), &windows);
    let healpix = source.healpix;
    let npix = healpix.npix();
    let params = BeamMapParams {
        models: flat_models(healpix),
        source,
        gain: GainCurve {
            coeffs: [0.0, 0.0, 0.0],
        },
        pairs: vec![AntennaPair::new("rf1YY", "S33YY").unwrap()],
        windows,
        out_dir: tmp.path().join("maps"),
        fit_thresh: 0.8,
    };
    params.run().unwrap();

    let file = BeamMapFile::read(&tmp.path().join("maps").join("S33YY_rf1YY_sat_maps.json.gz"))
        .unwrap();
    assert_eq!(file.nside, 4);
    assert_eq!(file.pointings.keys().collect::<Vec<_>>(), vec!["0"]);
    assert!(file.pointings["0"].satellites.is_empty());
    assert_eq!(file.pointings["0"].median.len(), npix);
}
