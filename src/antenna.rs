// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reference antennas, MWA tiles and the pairs they form.
//!
//! Names end with their polarisation, e.g. "rf0XX" or "S33YY". A reference is
//! only ever compared against tiles of the same polarisation.

use itertools::iproduct;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

lazy_static::lazy_static! {
    static ref REF_NAME: Regex = Regex::new(r"^rf[0-9](XX|YY)$").expect("valid regex");

    static ref TILE_NAME: Regex = Regex::new(r"^S[0-9]{2}(XX|YY)$").expect("valid regex");
}

/// The reference antennas.
pub const DEFAULT_REFS: [&str; 4] = ["rf0XX", "rf0YY", "rf1XX", "rf1YY"];

/// The MWA tiles, without a polarisation suffix.
pub const DEFAULT_TILE_STEMS: [&str; 14] = [
    "S06", "S07", "S08", "S09", "S10", "S12", "S29", "S30", "S31", "S32", "S33", "S34", "S35",
    "S36",
];

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum Polarisation {
    XX,
    YY,
}

impl Polarisation {
    /// The row of a two-row (XX, YY) model array holding this polarisation.
    pub fn model_row(self) -> usize {
        match self {
            Polarisation::XX => 0,
            Polarisation::YY => 1,
        }
    }

    fn from_name(name: &str) -> Option<Polarisation> {
        if name.ends_with("XX") {
            Some(Polarisation::XX)
        } else if name.ends_with("YY") {
            Some(Polarisation::YY)
        } else {
            None
        }
    }
}

/// A reference antenna and the MWA tile compared against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AntennaPair {
    pub reference: String,
    pub tile: String,
}

impl AntennaPair {
    pub fn new(reference: &str, tile: &str) -> Result<AntennaPair, AntennaError> {
        let ref_pol = validate_ref(reference)?;
        let tile_pol = validate_tile(tile)?;
        if ref_pol != tile_pol {
            return Err(AntennaError::MismatchedPols {
                reference: reference.to_string(),
                tile: tile.to_string(),
            });
        }
        Ok(AntennaPair {
            reference: reference.to_string(),
            tile: tile.to_string(),
        })
    }

    pub fn polarisation(&self) -> Polarisation {
        // Names were validated on construction.
        Polarisation::from_name(&self.reference).unwrap_or(Polarisation::XX)
    }
}

impl std::fmt::Display for AntennaPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.reference, self.tile)
    }
}

/// All tile names (both polarisations).
pub fn default_tiles() -> Vec<String> {
    iproduct!(DEFAULT_TILE_STEMS, ["XX", "YY"])
        .map(|(stem, pol)| format!("{stem}{pol}"))
        .collect()
}

pub fn default_refs() -> Vec<String> {
    DEFAULT_REFS.iter().map(|s| s.to_string()).collect()
}

/// Pair every reference with every tile of the same polarisation. The output
/// is ordered by reference, then tile.
pub fn antenna_pairs<S: AsRef<str>>(
    refs: &[S],
    tiles: &[S],
) -> Result<Vec<AntennaPair>, AntennaError> {
    for tile in tiles {
        validate_tile(tile.as_ref())?;
    }

    let mut pairs = vec![];
    for reference in refs {
        let pol = validate_ref(reference.as_ref())?;
        for tile in tiles {
            if Polarisation::from_name(tile.as_ref()) == Some(pol) {
                pairs.push(AntennaPair {
                    reference: reference.as_ref().to_string(),
                    tile: tile.as_ref().to_string(),
                });
            }
        }
    }
    Ok(pairs)
}

fn validate_ref(name: &str) -> Result<Polarisation, AntennaError> {
    if REF_NAME.is_match(name) {
        Polarisation::from_name(name).ok_or_else(|| AntennaError::BadRef(name.to_string()))
    } else {
        Err(AntennaError::BadRef(name.to_string()))
    }
}

fn validate_tile(name: &str) -> Result<Polarisation, AntennaError> {
    if TILE_NAME.is_match(name) {
        Polarisation::from_name(name).ok_or_else(|| AntennaError::BadTile(name.to_string()))
    } else {
        Err(AntennaError::BadTile(name.to_string()))
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AntennaError {
    #[error("'{0}' isn't a reference antenna name; expected something like 'rf0XX'")]
    BadRef(String),

    #[error("'{0}' isn't an MWA tile name; expected something like 'S33YY'")]
    BadTile(String),

    #[error("Reference '{reference}' and tile '{tile}' have different polarisations")]
    MismatchedPols { reference: String, tile: String },
}
