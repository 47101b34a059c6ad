// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Aligned power data.
//!
//! The receivers of a reference antenna and an MWA tile record independently;
//! an external stage puts both on a common clock and saves them per window.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2, ArrayView1};

use super::{npz_has, open_npz, read_npz_array, ReadInputError};
use crate::{antenna::AntennaPair, windows::ObservationWindow};

/// Power \[dBm\] of one receiver, with shape (samples, channels), and the
/// unix time of each sample.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTrace {
    pub power: Array2<f64>,
    pub times: Vec<f64>,
}

impl AlignedTrace {
    pub fn num_samples(&self) -> usize {
        self.power.nrows()
    }

    pub fn num_channels(&self) -> usize {
        self.power.ncols()
    }

    /// The power of one channel over time.
    pub fn channel(&self, chan: usize) -> ArrayView1<f64> {
        self.power.column(chan)
    }
}

/// The reference trace of a window, and the tile trace if it was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPair {
    pub reference: AlignedTrace,
    pub tile: Option<AlignedTrace>,
}

impl AlignedPair {
    /// Read an aligned npz file. `ref_p_aligned` and `time_array` are required;
    /// `tile_p_aligned` is optional but must match the reference's shape.
    pub fn read(path: &Path) -> Result<AlignedPair, ReadInputError> {
        let mut npz = open_npz(path)?;
        let ref_power: Array2<f64> = read_npz_array(&mut npz, path, "ref_p_aligned")?;
        let times: Array1<f64> = read_npz_array(&mut npz, path, "time_array")?;
        let tile_power: Option<Array2<f64>> = if npz_has(&mut npz, "tile_p_aligned") {
            Some(read_npz_array(&mut npz, path, "tile_p_aligned")?)
        } else {
            None
        };

        if ref_power.nrows() != times.len() {
            return Err(ReadInputError::ShapeMismatch {
                path: path.to_path_buf(),
                what: format!(
                    "ref_p_aligned has {} samples but time_array has {}",
                    ref_power.nrows(),
                    times.len()
                ),
            });
        }
        if let Some(tile_power) = tile_power.as_ref() {
            if tile_power.dim() != ref_power.dim() {
                return Err(ReadInputError::ShapeMismatch {
                    path: path.to_path_buf(),
                    what: format!(
                        "tile_p_aligned has shape {:?} but ref_p_aligned has {:?}",
                        tile_power.dim(),
                        ref_power.dim()
                    ),
                });
            }
        }

        let times = times.to_vec();
        Ok(AlignedPair {
            tile: tile_power.map(|power| AlignedTrace {
                power,
                times: times.clone(),
            }),
            reference: AlignedTrace {
                power: ref_power,
                times,
            },
        })
    }

    /// The tile trace, or a `MissingKey` error naming the file.
    pub fn require_tile(&self, path: &Path) -> Result<&AlignedTrace, ReadInputError> {
        self.tile.as_ref().ok_or_else(|| ReadInputError::MissingKey {
            path: path.to_path_buf(),
            key: "tile_p_aligned".to_string(),
        })
    }
}

/// Where the aligned data of an antenna pair for a window live:
/// `{align_dir}/{date}/{window_id}/{ref}_{tile}_{window_id}_aligned.npz`.
pub fn aligned_path(align_dir: &Path, window: &ObservationWindow, pair: &AntennaPair) -> PathBuf {
    align_dir
        .join(window.date())
        .join(&window.id)
        .join(format!(
            "{}_{}_{}_aligned.npz",
            pair.reference, pair.tile, window.id
        ))
}
