// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tests against the shared command-line arguments.

use tempfile::TempDir;

use super::*;

fn printer() -> InfoPrinter {
    InfoPrinter::new("test".into())
}

#[test]
fn test_cli_args_override_file_args() {
    let cli = WindowArgs {
        time_zone: None,
        start_date: Some("2020-01-02".to_string()),
        stop_date: None,
    };
    let file = WindowArgs {
        time_zone: Some("UTC".to_string()),
        start_date: Some("2020-01-01".to_string()),
        stop_date: Some("2020-01-03".to_string()),
    };
    let merged = cli.merge(file);
    assert_eq!(merged.time_zone.as_deref(), Some("UTC"));
    assert_eq!(merged.start_date.as_deref(), Some("2020-01-02"));
    assert_eq!(merged.stop_date.as_deref(), Some("2020-01-03"));

    let windows = merged.parse(&mut printer()).unwrap();
    assert_eq!(windows.len(), 96);
    assert_eq!(windows[0].id, "2020-01-02-00:00");
}

#[test]
fn test_window_args_errors() {
    let result = WindowArgs {
        start_date: Some("2020-01-02".to_string()),
        ..Default::default()
    }
    .parse(&mut printer());
    assert!(matches!(result, Err(CommonArgsError::Missing("--stop-date"))));

    let result = WindowArgs {
        time_zone: Some("Mars/Olympus_Mons".to_string()),
        start_date: Some("2020-01-02".to_string()),
        stop_date: Some("2020-01-02".to_string()),
    }
    .parse(&mut printer());
    assert!(matches!(
        result,
        Err(CommonArgsError::Window(WindowError::BadTimeZone { .. }))
    ));
}

#[test]
fn test_antenna_args() {
    let pairs = AntennaArgs::default().parse(&mut printer()).unwrap();
    assert_eq!(pairs.len(), 56);

    let pairs = AntennaArgs {
        refs: Some(vec!["rf1YY".to_string()]),
        tiles: Some(vec!["S33YY".to_string(), "S33XX".to_string()]),
    }
    .parse(&mut printer())
    .unwrap();
    assert_eq!(pairs, vec![AntennaPair::new("rf1YY", "S33YY").unwrap()]);

    let result = AntennaArgs {
        refs: Some(vec!["rf1YY".to_string()]),
        tiles: Some(vec!["S33XX".to_string()]),
    }
    .parse(&mut printer());
    assert!(matches!(result, Err(CommonArgsError::NoPairs)));
}

#[test]
fn test_pass_source_args() {
    let tmp = TempDir::new().unwrap();
    let lookup = tmp.path().join("pointings.json");
    std::fs::write(&lookup, r#"{"point_0": ["2020-01-01-00:00"]}"#).unwrap();
    let windows = observation_windows("Australia/Perth", "2020-01-01", "2020-01-01").unwrap();

    let args = PassSourceArgs {
        align_dir: Some(tmp.path().join("align")),
        chrono_dir: Some(tmp.path().join("chrono")),
        chan_map_dir: Some(tmp.path().join("chan_map")),
        pointings: Some(lookup),
        nside: Some(16),
        ..Default::default()
    };
    let source = args.clone().parse(&windows, &mut printer()).unwrap();
    assert_eq!(source.healpix.nside(), 16);
    assert_eq!(source.pow_thresh, DEFAULT_TILE_POW_THRESH);
    assert!(source.pointings.pointing_of("2020-01-01-00:00").is_some());

    let result = PassSourceArgs {
        sat_thresh: Some(-1.0),
        ..args.clone()
    }
    .parse(&windows, &mut printer());
    assert!(matches!(
        result,
        Err(CommonArgsError::BadValue {
            arg: "--sat-thresh",
            ..
        })
    ));

    let result = PassSourceArgs {
        nside: Some(12),
        ..args.clone()
    }
    .parse(&windows, &mut printer());
    assert!(matches!(result, Err(CommonArgsError::Healpix(_))));

    let result = PassSourceArgs {
        pointings: Some(tmp.path().join("missing.json")),
        ..args
    }
    .parse(&windows, &mut printer());
    assert!(matches!(result, Err(CommonArgsError::Read(e)) if e.is_missing()));
}

#[test]
fn test_value_checks() {
    assert!(positive("--x", 0.0).is_err());
    assert!(positive("--x", f64::NAN).is_err());
    assert_eq!(non_negative("--x", 0.0).unwrap(), 0.0);
    assert_eq!(fraction("--x", 1.0).unwrap(), 1.0);
    assert!(fraction("--x", 1.5).is_err());
}
