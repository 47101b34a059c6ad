// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Healpix beam models of the reference antennas and the MWA tiles.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use strum::IntoEnumIterator;

use super::{npz_has, open_npz, read_npz_array, ReadInputError};
use crate::{
    antenna::Polarisation, constants::REF_MODEL_ROTATION, healpix::Healpix, pointing::Pointing,
};

/// Reference antenna models (one map per polarisation, already rotated so
/// their azimuth origin is north) and MWA tile models (per pointing, per
/// polarisation). Read once, then shared read-only.
#[derive(Debug, Clone)]
pub struct BeamModels {
    pub healpix: Healpix,
    ref_xx: Vec<f64>,
    ref_yy: Vec<f64>,
    tile: HashMap<Pointing, Array2<f64>>,
}

impl BeamModels {
    /// Read the reference model npz (keys `XX` and `YY`) and the tile model
    /// npz (keys `0`, `2`, `4` and `41`, each a 2 × npix array).
    pub fn read(
        ref_model: &Path,
        tile_model: &Path,
        healpix: Healpix,
    ) -> Result<BeamModels, ReadInputError> {
        let mut npz = open_npz(ref_model)?;
        let mut read_ref = |key: &str| -> Result<Vec<f64>, ReadInputError> {
            let map: Array1<f64> = read_npz_array(&mut npz, ref_model, key)?;
            healpix
                .rotate_map(&map.to_vec(), REF_MODEL_ROTATION)
                .map_err(|err| ReadInputError::Healpix {
                    path: ref_model.to_path_buf(),
                    err,
                })
        };
        let ref_xx = read_ref("XX")?;
        let ref_yy = read_ref("YY")?;

        let mut npz = open_npz(tile_model)?;
        let mut tile = HashMap::new();
        for pointing in Pointing::iter() {
            let key = pointing.to_string();
            if !npz_has(&mut npz, &key) {
                continue;
            }
            let maps: Array2<f64> = read_npz_array(&mut npz, tile_model, &key)?;
            if maps.nrows() != 2 || maps.ncols() != healpix.npix() {
                return Err(ReadInputError::ShapeMismatch {
                    path: tile_model.to_path_buf(),
                    what: format!(
                        "pointing {key} has shape {:?}, expected (2, {})",
                        maps.dim(),
                        healpix.npix()
                    ),
                });
            }
            tile.insert(pointing, maps);
        }
        if tile.is_empty() {
            return Err(ReadInputError::MissingKey {
                path: tile_model.to_path_buf(),
                key: "0".to_string(),
            });
        }

        Ok(BeamModels {
            healpix,
            ref_xx,
            ref_yy,
            tile,
        })
    }

    /// Build models from in-memory maps. The reference maps are rotated here.
    pub fn new(
        healpix: Healpix,
        ref_xx: &[f64],
        ref_yy: &[f64],
        tile: HashMap<Pointing, Array2<f64>>,
    ) -> Result<BeamModels, crate::healpix::HealpixError> {
        for maps in tile.values() {
            for row in maps.rows() {
                healpix.check_map(&row.to_vec())?;
            }
        }
        Ok(BeamModels {
            healpix,
            ref_xx: healpix.rotate_map(ref_xx, REF_MODEL_ROTATION)?,
            ref_yy: healpix.rotate_map(ref_yy, REF_MODEL_ROTATION)?,
            tile,
        })
    }

    /// The rotated reference antenna model.
    pub fn reference(&self, pol: Polarisation) -> &[f64] {
        match pol {
            Polarisation::XX => &self.ref_xx,
            Polarisation::YY => &self.ref_yy,
        }
    }

    /// The tile model at a pointing, if the models include it.
    pub fn tile(&self, pointing: Pointing, pol: Polarisation) -> Option<ndarray::ArrayView1<f64>> {
        self.tile
            .get(&pointing)
            .map(|maps| maps.row(pol.model_row()))
    }

    pub fn pointings(&self) -> Vec<Pointing> {
        let mut p: Vec<Pointing> = self.tile.keys().copied().collect();
        p.sort();
        p
    }
}
