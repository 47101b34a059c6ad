// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::f64::consts::{FRAC_PI_2, PI};

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_nside_validation() {
    assert!(Healpix::new(32).is_ok());
    assert_eq!(Healpix::new(0), Err(HealpixError::BadNside(0)));
    assert_eq!(Healpix::new(30), Err(HealpixError::BadNside(30)));
    assert_eq!(Healpix::new(32).unwrap().npix(), 12 * 32 * 32);
}

#[test]
fn test_zenith_and_horizon() {
    let hp = Healpix::new(8).unwrap();
    // The first pixels of RING ordering surround the north pole.
    assert!(hp.alt_az_to_pix(FRAC_PI_2, 0.0) < 4);
    let (za, _) = hp.pix2ang(hp.alt_az_to_pix(FRAC_PI_2 - 0.01, 1.0));
    assert!(za < 0.2);

    // Horizon pixels sit near the equator.
    let (za, _) = hp.pix2ang(hp.alt_az_to_pix(0.0, 2.0));
    assert_abs_diff_eq!(za, FRAC_PI_2, epsilon = 0.1);
}

#[test]
fn test_pixel_centres_round_trip() {
    let hp = Healpix::new(16).unwrap();
    for i in (0..hp.npix()).step_by(37) {
        let (za, az) = hp.pix2ang(i);
        assert_eq!(hp.ang2pix(za, az), i);
        // Azimuths beyond a full turn land in the same pixel.
        assert_eq!(hp.ang2pix(za, az + 2.0 * PI), i);
    }
}

#[test]
fn test_rotate_map() {
    let hp = Healpix::new(4).unwrap();
    // A map whose value is its pixel's azimuth.
    let map: Vec<f64> = (0..hp.npix()).map(|i| hp.pix2ang(i).1).collect();

    // Rotating by a full turn changes nothing.
    let same = hp.rotate_map(&map, 2.0 * PI).unwrap();
    assert_eq!(same, map);

    let rotated = hp.rotate_map(&map, -FRAC_PI_2).unwrap();
    assert_eq!(rotated.len(), map.len());
    // Pixel centres on equatorial rings are spaced so that a quarter turn is
    // an exact pixel shift.
    let eq = hp.ang2pix(FRAC_PI_2, PI / 16.0);
    let (_, az) = hp.pix2ang(eq);
    let expected = crate::math::wrap_angle(az - FRAC_PI_2);
    assert_abs_diff_eq!(rotated[eq], expected, epsilon = 1e-9);

    assert!(matches!(
        hp.rotate_map(&[0.0; 3], 0.0),
        Err(HealpixError::MapLength { got: 3, .. })
    ));
}
