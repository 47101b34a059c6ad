// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! MWA "sweet spot" pointings, and which observation windows used them.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::io::{read_json, ReadInputError};

/// The MWA beamformer pointings that beam maps are made for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Pointing {
    #[strum(serialize = "0")]
    #[serde(rename = "0")]
    P0,

    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    P2,

    #[strum(serialize = "4")]
    #[serde(rename = "4")]
    P4,

    #[strum(serialize = "41")]
    #[serde(rename = "41")]
    P41,
}

impl Pointing {
    /// The key listing this pointing's windows in a pointing lookup file.
    pub fn lookup_key(self) -> String {
        format!("point_{self}")
    }
}

/// Which pointing each observation window used.
#[derive(Debug, Clone, Default)]
pub struct PointingLookup {
    windows: HashMap<String, Pointing>,
}

impl PointingLookup {
    /// Read a pointing lookup file. It is a JSON object with keys `point_0`,
    /// `point_2`, `point_4` and `point_41`, each a list of window ids.
    pub fn read(path: &Path) -> Result<PointingLookup, ReadInputError> {
        let raw: IndexMap<String, Vec<String>> = read_json(path)?;
        Ok(PointingLookup::from_lists(raw))
    }

    pub fn from_lists(mut raw: IndexMap<String, Vec<String>>) -> PointingLookup {
        let mut windows = HashMap::new();
        // Earlier pointings take precedence if a window is listed twice.
        for pointing in Pointing::iter() {
            let ids = match raw.shift_remove(&pointing.lookup_key()) {
                Some(ids) => ids,
                None => {
                    debug!("Pointing lookup has no '{}' list", pointing.lookup_key());
                    continue;
                }
            };
            for id in ids {
                if let Some(existing) = windows.get(&id) {
                    warn!("Window {id} is listed for pointings {existing} and {pointing}; using {existing}");
                    continue;
                }
                windows.insert(id, pointing);
            }
        }
        for key in raw.keys() {
            debug!("Ignoring unrecognised pointing lookup key '{key}'");
        }
        PointingLookup { windows }
    }

    /// The pointing used during a window, if it was one of the known
    /// pointings.
    pub fn pointing_of(&self, window_id: &str) -> Option<Pointing> {
        self.windows.get(window_id).copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
