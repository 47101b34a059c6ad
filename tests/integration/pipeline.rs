// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running the stages one after another, each reading the last one's output.

use std::fs::File;
use std::path::Path;

use approx::assert_abs_diff_eq;
use indoc::formatdoc;
use ndarray::{Array1, Array2};
use ndarray_npy::NpzWriter;
use tempfile::TempDir;

use crate::*;
use embers::{ChannelMap, WindowEphemeris};

/// One satellite, rising 100 s into the first window and setting 300 s later.
fn write_ephemeris(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let times: Vec<f64> = (0..31).map(|i| T0 + 100.0 + 10.0 * i as f64).collect();
    let alts: Vec<f64> = (0..31).map(|i| 0.02 * i as f64).collect();
    let azs = vec![2.0; 31];
    std::fs::write(
        dir.join("25338.json"),
        formatdoc! {r#"
            {{
                "sat_id": "25338",
                "time_array": [{times:?}],
                "sat_alt": [{alts:?}],
                "sat_az": [{azs:?}]
            }}
        "#,
            times = times,
            alts = alts,
            azs = azs,
        },
    )
    .unwrap();
}

/// Ten minutes of flat noise, with channel 3 lit up while the satellite is
/// overhead.
fn write_aligned(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut power = Array2::from_shape_fn((600, 8), |(i, j)| {
        ((i * 5 + j * 13) % 21) as f64 / 10.0 - 1.0 - 60.0
    });
    for i in 110..390 {
        power[(i, 3)] += 20.0;
    }
    let times = Array1::from_shape_fn(600, |i| T0 + i as f64);

    let mut npz = NpzWriter::new(File::create(path).unwrap());
    npz.add_array("ref_p_aligned", &power).unwrap();
    npz.add_array("tile_p_aligned", &(&power + 5.0)).unwrap();
    npz.add_array("time_array", &times).unwrap();
    npz.finish().unwrap();
}

#[test]
fn test_ephem_chrono_then_channel_map() {
    let tmp = TempDir::new().unwrap();
    let ephem_dir = tmp.path().join("ephem");
    let chrono_dir = tmp.path().join("chrono");
    let align_dir = tmp.path().join("align");
    let chan_map_dir = tmp.path().join("chan_map");
    write_ephemeris(&ephem_dir);

    let cmd = embers()
        .arg("ephem-chrono")
        .args(one_day())
        .args(["--ephem-dir", path_str(&ephem_dir)])
        .args(["--out-dir", path_str(&chrono_dir)])
        .args(["--interp", "linear", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let first = WindowEphemeris::read(&chrono_dir, "2020-01-01-00:00").unwrap();
    assert_eq!(first.passes.len(), 1);
    let pass = &first.passes[0];
    assert_eq!(pass.sat_id, "25338");
    assert_eq!(pass.len(), 301);
    assert_abs_diff_eq!(pass.time_array[300], T0 + 400.0);
    assert!(WindowEphemeris::read(&chrono_dir, "2020-01-01-00:30")
        .unwrap()
        .passes
        .is_empty());

    // Only the first window has aligned data.
    write_aligned(
        &align_dir
            .join("2020-01-01")
            .join("2020-01-01-00:00")
            .join("rf0XX_S07XX_2020-01-01-00:00_aligned.npz"),
    );
    let cmd = embers()
        .arg("channel-map")
        .args(one_day())
        .args(["--align-dir", path_str(&align_dir)])
        .args(["--chrono-dir", path_str(&chrono_dir)])
        .args(["--out-dir", path_str(&chan_map_dir)])
        .args(["--pow-thresh", "10", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let map = ChannelMap::read(&chan_map_dir, "2020-01-01-00:00").unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.channel_of("25338"), Some(3));
    // Every other window still gets a map.
    for window in ["2020-01-01-00:30", "2020-01-01-23:30"] {
        assert!(ChannelMap::read(&chan_map_dir, window).unwrap().is_empty());
    }
}
