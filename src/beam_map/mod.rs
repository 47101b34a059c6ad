// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Healpix maps of a tile's beam, built up from calibrated satellite passes.
//!
//! Samples are held in a flat arena: for each pointing, one growable list of
//! [`PixelSample`]s per healpix pixel. Satellites are interned, so a sample
//! refers to its satellite by index. Only when the map is written are the
//! samples re-keyed by satellite.

mod project;

pub use project::{project_pass, ProjectedPass, ProjectionRejection};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{
    antenna::AntennaPair,
    healpix::Healpix,
    io::{read_json_gz, write_json_gz, ReadInputError, WriteOutputError},
    math::{mad, median},
    pass::PixelPass,
    pointing::Pointing,
};

/// One calibrated power sample in a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    /// Index into the map's satellites.
    pub sat: u32,
    pub time: f64,

    /// The calibrated beam power \[dBm\].
    pub power: f64,

    /// The raw reference and tile powers the sample came from \[dBm\].
    pub ref_power: f64,
    pub tile_power: f64,
}

/// The beam map of one antenna pair.
#[derive(Debug, Clone)]
pub struct HealpixBeamMap {
    pub pair: AntennaPair,
    healpix: Healpix,
    satellites: IndexSet<String>,
    pixels: BTreeMap<Pointing, Vec<Vec<PixelSample>>>,
}

impl HealpixBeamMap {
    pub fn new(pair: AntennaPair, healpix: Healpix, pointings: &[Pointing]) -> HealpixBeamMap {
        HealpixBeamMap {
            pair,
            healpix,
            satellites: IndexSet::new(),
            pixels: pointings
                .iter()
                .map(|&p| (p, vec![vec![]; healpix.npix()]))
                .collect(),
        }
    }

    pub fn healpix(&self) -> Healpix {
        self.healpix
    }

    /// Append a projected pass's samples to their pixels. Passes at pointings
    /// the map wasn't made for are ignored.
    pub fn add_pass(&mut self, pointing: Pointing, pass: &PixelPass, projected: &ProjectedPass) {
        let pixels = match self.pixels.get_mut(&pointing) {
            Some(p) => p,
            None => return,
        };
        let (sat, _) = self.satellites.insert_full(pass.sat_id.clone());
        for (i, &pix) in pass.pixels.iter().enumerate() {
            pixels[pix].push(PixelSample {
                sat: sat as u32,
                time: pass.times[i],
                power: projected.calibrated[i],
                ref_power: pass.ref_power[i],
                tile_power: pass.tile_power[i],
            });
        }
    }

    /// The samples in a pixel at a pointing.
    pub fn samples(&self, pointing: Pointing, pixel: usize) -> &[PixelSample] {
        self.pixels
            .get(&pointing)
            .and_then(|p| p.get(pixel))
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn satellite(&self, sat: u32) -> Option<&str> {
        self.satellites.get_index(sat as usize).map(|s| s.as_str())
    }

    pub fn num_samples(&self) -> usize {
        self.pixels.values().flatten().map(|s| s.len()).sum()
    }

    pub fn pointings(&self) -> impl Iterator<Item = Pointing> + '_ {
        self.pixels.keys().copied()
    }

    /// The median and MAD of each pixel's calibrated power at a pointing.
    pub fn summaries(&self, pointing: Pointing) -> Option<PixelSummaries> {
        let pixels = self.pixels.get(&pointing)?;
        let (median, mad) = pixels
            .iter()
            .map(|samples| {
                let powers: Vec<f64> = samples.iter().map(|s| s.power).collect();
                (median(&powers), mad(&powers))
            })
            .unzip();
        Some(PixelSummaries { median, mad })
    }

    /// Re-key the samples by satellite.
    pub fn by_satellite(&self) -> BeamMapFile {
        let npix = self.healpix.npix();
        let pointings = self
            .pixels
            .iter()
            .map(|(&pointing, pixels)| {
                let mut satellites: IndexMap<u32, SatelliteMaps> = IndexMap::new();
                for (pix, samples) in pixels.iter().enumerate() {
                    for s in samples {
                        let maps = satellites
                            .entry(s.sat)
                            .or_insert_with(|| SatelliteMaps::empty(npix));
                        maps.mwa_map[pix].push(s.power);
                        maps.ref_map[pix].push(s.ref_power);
                        maps.tile_map[pix].push(s.tile_power);
                        maps.time_map[pix].push(s.time);
                    }
                }
                satellites.sort_keys();
                let satellites = satellites
                    .into_iter()
                    .map(|(sat, maps)| (self.satellite(sat).unwrap_or_default().to_string(), maps))
                    .collect();
                let PixelSummaries { median, mad } =
                    self.summaries(pointing).unwrap_or_default();
                (
                    pointing.to_string(),
                    PointingMaps {
                        median,
                        mad,
                        satellites,
                    },
                )
            })
            .collect();

        BeamMapFile {
            nside: self.healpix.nside(),
            reference: self.pair.reference.clone(),
            tile: self.pair.tile.clone(),
            pointings,
        }
    }

    pub fn path(dir: &Path, pair: &AntennaPair) -> PathBuf {
        dir.join(format!("{}_{}_sat_maps.json.gz", pair.tile, pair.reference))
    }

    /// Write the map (re-keyed by satellite) into `dir`, returning the path
    /// written to.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, WriteOutputError> {
        let path = Self::path(dir, &self.pair);
        write_json_gz(&path, &self.by_satellite())?;
        Ok(path)
    }
}

/// Per-pixel summary statistics; `None` for pixels without samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelSummaries {
    pub median: Vec<Option<f64>>,
    pub mad: Vec<Option<f64>>,
}

/// A beam map as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamMapFile {
    pub nside: usize,
    pub reference: String,
    pub tile: String,

    /// Keyed by pointing.
    pub pointings: IndexMap<String, PointingMaps>,
}

impl BeamMapFile {
    pub fn read(path: &Path) -> Result<BeamMapFile, ReadInputError> {
        read_json_gz(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointingMaps {
    pub median: Vec<Option<f64>>,
    pub mad: Vec<Option<f64>>,

    /// Keyed by satellite id. Only satellites which contributed samples at
    /// this pointing are present.
    pub satellites: IndexMap<String, SatelliteMaps>,
}

/// One satellite's samples, as per-pixel lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteMaps {
    pub mwa_map: Vec<Vec<f64>>,
    pub ref_map: Vec<Vec<f64>>,
    pub tile_map: Vec<Vec<f64>>,
    pub time_map: Vec<Vec<f64>>,
}

impl SatelliteMaps {
    fn empty(npix: usize) -> SatelliteMaps {
        SatelliteMaps {
            mwa_map: vec![vec![]; npix],
            ref_map: vec![vec![]; npix],
            tile_map: vec![vec![]; npix],
            time_map: vec![vec![]; npix],
        }
    }
}
