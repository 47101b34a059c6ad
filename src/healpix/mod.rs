// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Healpix (RING ordering) helpers.
//!
//! Satellite positions are given as (altitude, azimuth), with azimuth measured
//! from north through east. Healpix colatitude is the zenith angle.

#[cfg(test)]
mod tests;

use std::f64::consts::{FRAC_PI_2, PI};

use scorus::{
    coordinates::SphCoord,
    healpix::{
        pix::{ang2pix_ring, pix2ang_ring},
        utils::nside2npix,
    },
};
use thiserror::Error;

use crate::math::wrap_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Healpix {
    nside: usize,
}

impl Healpix {
    pub fn new(nside: usize) -> Result<Healpix, HealpixError> {
        if nside == 0 || !nside.is_power_of_two() {
            return Err(HealpixError::BadNside(nside));
        }
        Ok(Healpix { nside })
    }

    pub fn nside(&self) -> usize {
        self.nside
    }

    /// The number of pixels on the sphere, `12 nside²`.
    pub fn npix(&self) -> usize {
        nside2npix(self.nside)
    }

    /// The pixel containing the direction with zenith angle `za` and azimuth
    /// `az` (both radians).
    pub fn ang2pix(&self, za: f64, az: f64) -> usize {
        let za = za.clamp(0.0, PI);
        ang2pix_ring::<f64>(self.nside, SphCoord::new(za, wrap_angle(az)))
    }

    /// The pixel containing a satellite at altitude `alt` and azimuth `az`.
    pub fn alt_az_to_pix(&self, alt: f64, az: f64) -> usize {
        self.ang2pix(FRAC_PI_2 - alt, az)
    }

    /// The (zenith angle, azimuth) of a pixel's centre.
    pub fn pix2ang(&self, ipix: usize) -> (f64, f64) {
        let coord = pix2ang_ring::<f64>(self.nside, ipix);
        (coord.pol, coord.az)
    }

    /// Rotate a map about the pole by `angle`. The value at each pixel is
    /// taken from the pixel found at the same colatitude and the azimuth
    /// offset by `angle`.
    pub fn rotate_map(&self, map: &[f64], angle: f64) -> Result<Vec<f64>, HealpixError> {
        self.check_map(map)?;
        Ok((0..self.npix())
            .map(|i| {
                let (za, az) = self.pix2ang(i);
                map[self.ang2pix(za, az + angle)]
            })
            .collect())
    }

    pub fn check_map(&self, map: &[f64]) -> Result<(), HealpixError> {
        if map.len() != self.npix() {
            return Err(HealpixError::MapLength {
                nside: self.nside,
                expected: self.npix(),
                got: map.len(),
            });
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum HealpixError {
    #[error("nside must be a positive power of two, but got {0}")]
    BadNside(usize),

    #[error("A healpix map with nside {nside} needs {expected} pixels, but got {got}")]
    MapLength {
        nside: usize,
        expected: usize,
        got: usize,
    },
}
