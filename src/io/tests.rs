// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::fs::File;

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};
use ndarray_npy::NpzWriter;
use tempfile::TempDir;

use super::*;
use crate::{antenna::Polarisation, healpix::Healpix, pointing::Pointing};

fn write_aligned(path: &Path, with_tile: bool, num_times: usize) {
    let mut npz = NpzWriter::new(File::create(path).unwrap());
    let power = Array2::from_shape_fn((5, 3), |(i, j)| -(i as f64) - 10.0 * j as f64);
    npz.add_array("ref_p_aligned", &power).unwrap();
    if with_tile {
        npz.add_array("tile_p_aligned", &(&power - 1.0)).unwrap();
    }
    let times = Array1::from_iter((0..num_times).map(|i| 1e9 + i as f64));
    npz.add_array("time_array", &times).unwrap();
    npz.finish().unwrap();
}

#[test]
fn test_read_aligned() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rf0XX_S06XX_2020-01-01-00:00_aligned.npz");
    write_aligned(&path, true, 5);

    let pair = AlignedPair::read(&path).unwrap();
    assert_eq!(pair.reference.num_samples(), 5);
    assert_eq!(pair.reference.num_channels(), 3);
    assert_abs_diff_eq!(pair.reference.times[4], 1e9 + 4.0);
    let tile = pair.require_tile(&path).unwrap();
    assert_abs_diff_eq!(tile.power[(2, 1)], -13.0);
    assert_abs_diff_eq!(pair.reference.channel(2)[1], -21.0);
}

#[test]
fn test_read_reference_only() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("aligned.npz");
    write_aligned(&path, false, 5);

    let pair = AlignedPair::read(&path).unwrap();
    assert!(pair.tile.is_none());
    assert!(matches!(
        pair.require_tile(&path),
        Err(ReadInputError::MissingKey { .. })
    ));
}

#[test]
fn test_read_aligned_errors() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("aligned.npz");
    let err = AlignedPair::read(&path).unwrap_err();
    assert!(err.is_missing());

    write_aligned(&path, true, 4);
    assert!(matches!(
        AlignedPair::read(&path),
        Err(ReadInputError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_aligned_path() {
    let window = crate::windows::ObservationWindow {
        id: "2020-01-01-00:30".to_string(),
        start_unix: 0.0,
        end_unix: 1800.0,
    };
    let pair = crate::antenna::AntennaPair::new("rf0XX", "S06XX").unwrap();
    assert_eq!(
        aligned_path(Path::new("align"), &window, &pair),
        PathBuf::from("align/2020-01-01/2020-01-01-00:30/rf0XX_S06XX_2020-01-01-00:30_aligned.npz")
    );
}

#[test]
fn test_json_files() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("map.json");
    let mut map = HashMap::new();
    map.insert("25338".to_string(), 7_usize);
    write_json(&path, &map).unwrap();
    let read: HashMap<String, usize> = read_json(&path).unwrap();
    assert_eq!(read, map);

    let gz = tmp.path().join("map.json.gz");
    write_json_gz(&gz, &map).unwrap();
    // It really is compressed.
    let bytes = std::fs::read(&gz).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    let read: HashMap<String, usize> = read_json_gz(&gz).unwrap();
    assert_eq!(read, map);

    std::fs::write(tmp.path().join("bad.json"), "{not json").unwrap();
    assert!(matches!(
        read_json::<HashMap<String, usize>>(&tmp.path().join("bad.json")),
        Err(ReadInputError::Json { .. })
    ));
}

#[test]
fn test_glob_is_sorted() {
    let tmp = TempDir::new().unwrap();
    for name in ["S08XX_rf0XX_gain_fit.json", "S06XX_rf0XX_gain_fit.json", "other.json"] {
        std::fs::write(tmp.path().join(name), "{}").unwrap();
    }
    let g = format!("{}/*_gain_fit.json", tmp.path().display());
    let matches = get_all_matches_from_glob(&g).unwrap();
    assert_eq!(matches.len(), 2);
    assert!(matches[0].ends_with("S06XX_rf0XX_gain_fit.json"));
    assert!(get_all_matches_from_glob("[").is_err());
}

#[test]
fn test_beam_models() {
    let tmp = TempDir::new().unwrap();
    let healpix = Healpix::new(2).unwrap();
    let npix = healpix.npix();

    // A reference map that is uniform can't change under rotation.
    let ref_path = tmp.path().join("ref_models.npz");
    let mut npz = NpzWriter::new(File::create(&ref_path).unwrap());
    npz.add_array("XX", &Array1::from_elem(npix, -5.0)).unwrap();
    npz.add_array("YY", &Array1::from_elem(npix, -6.0)).unwrap();
    npz.finish().unwrap();

    let tile_path = tmp.path().join("tile_models.npz");
    let mut npz = NpzWriter::new(File::create(&tile_path).unwrap());
    let mut maps = Array2::<f64>::zeros((2, npix));
    maps.row_mut(1).fill(-3.0);
    npz.add_array("0", &maps).unwrap();
    npz.add_array("41", &maps).unwrap();
    npz.finish().unwrap();

    let models = BeamModels::read(&ref_path, &tile_path, healpix).unwrap();
    assert_eq!(models.reference(Polarisation::YY), vec![-6.0; npix].as_slice());
    assert_eq!(models.pointings(), vec![Pointing::P0, Pointing::P41]);
    assert!(models.tile(Pointing::P2, Polarisation::XX).is_none());
    let yy = models.tile(Pointing::P41, Polarisation::YY).unwrap();
    assert_abs_diff_eq!(yy[3], -3.0);

    // The wrong healpix resolution is caught.
    let err = BeamModels::read(&ref_path, &tile_path, Healpix::new(4).unwrap()).unwrap_err();
    assert!(matches!(err, ReadInputError::Healpix { .. }));
}

#[test]
fn test_in_memory_models_are_rotated() {
    let healpix = Healpix::new(2).unwrap();
    let npix = healpix.npix();
    let ref_map: Vec<f64> = (0..npix).map(|i| i as f64).collect();
    let mut tile = HashMap::new();
    tile.insert(Pointing::P0, Array2::zeros((2, npix)));
    let models = BeamModels::new(healpix, &ref_map, &ref_map, tile).unwrap();
    let expected = healpix
        .rotate_map(&ref_map, crate::constants::REF_MODEL_ROTATION)
        .unwrap();
    assert_eq!(models.reference(Polarisation::XX), expected.as_slice());
}
