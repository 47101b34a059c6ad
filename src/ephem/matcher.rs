// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Distributing (resampled) passes into observation windows.

use log::warn;

use super::{SatellitePass, WindowEphemeris};
use crate::windows::ObservationWindow;

/// How a pass `[rise, set]` relates to a window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// No samples of the pass are in the window.
    Disjoint,

    /// The whole pass is in the window.
    Inside,

    /// The pass rises before the window starts and sets inside it.
    Suffix,

    /// The pass rises inside the window and sets after it ends.
    Prefix,

    /// The pass rises before the window starts and sets after it ends. These
    /// passes are not fragmented; the window gets nothing.
    Spanning,
}

pub fn classify_overlap(window: &ObservationWindow, rise: f64, set: f64) -> Overlap {
    let (start, end) = (window.start_unix, window.end_unix);
    if set < start || rise >= end {
        Overlap::Disjoint
    } else if rise >= start && set < end {
        Overlap::Inside
    } else if rise < start && set < end {
        Overlap::Suffix
    } else if rise >= start {
        Overlap::Prefix
    } else {
        Overlap::Spanning
    }
}

/// Clip a pass into each of the windows it overlaps. Returned are the indices
/// into `windows` and the fragments.
///
/// `windows` must be in chronological order.
pub fn match_pass(
    pass: &SatellitePass,
    windows: &[ObservationWindow],
) -> Vec<(usize, SatellitePass)> {
    let (rise, set) = match (pass.rise(), pass.set()) {
        (Some(r), Some(s)) => (r, s),
        _ => return vec![],
    };

    let first = windows.partition_point(|w| w.end_unix <= rise);
    let mut fragments = vec![];
    for (i, window) in windows.iter().enumerate().skip(first) {
        if window.start_unix > set {
            break;
        }
        match classify_overlap(window, rise, set) {
            Overlap::Disjoint => (),
            Overlap::Spanning => warn!(
                "A pass of satellite {} spans all of window {}; it isn't included in that window",
                pass.sat_id, window.id
            ),
            Overlap::Inside => fragments.push((i, pass.clone())),
            Overlap::Suffix | Overlap::Prefix => {
                let lo = pass.time_array.partition_point(|&t| t < window.start_unix);
                let hi = pass.time_array.partition_point(|&t| t < window.end_unix);
                if lo < hi {
                    fragments.push((i, pass.slice(lo..hi)));
                }
            }
        }
    }
    fragments
}

/// Build the ephemeris of every window. Windows without any passes get an
/// empty list. Within a window, fragments keep the order of `passes`.
pub fn match_passes(
    passes: &[SatellitePass],
    windows: &[ObservationWindow],
) -> Vec<WindowEphemeris> {
    let mut ephems: Vec<WindowEphemeris> = windows
        .iter()
        .map(|w| WindowEphemeris::new(&w.id))
        .collect();
    for pass in passes {
        for (i, fragment) in match_pass(pass, windows) {
            ephems[i].passes.push(fragment);
        }
    }
    ephems
}
