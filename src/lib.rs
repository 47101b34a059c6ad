// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Satellite-pass calibration and beam mapping for Murchison Widefield Array
//! (MWA) tiles.
//!
//! Satellites with known orbits act as flying calibration sources. Their
//! predicted positions are matched to 30-minute observation windows, the
//! frequency channel each one occupies is identified in the receivers' power
//! data, a correction for the receivers' nonlinear gain is fit, and finally the
//! calibrated power is accumulated onto healpix maps of each tile's beam.

pub mod antenna;
pub mod beam_map;
pub mod channels;
mod cli;
pub mod constants;
pub mod ephem;
pub mod gain;
pub mod healpix;
pub mod io;
pub(crate) mod math;
pub mod pass;
mod params;
pub mod pointing;
pub mod windows;

// Re-exports.
pub use antenna::{AntennaPair, Polarisation};
pub use beam_map::{HealpixBeamMap, PixelSample};
pub use channels::{ChannelMap, NoiseFloor};
pub use cli::{Embers, EmbersError};
pub use ephem::{InterpKind, SatellitePass, WindowEphemeris};
pub use gain::GainCurve;
pub use io::AlignedTrace;
pub use pointing::Pointing;
pub use windows::ObservationWindow;

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? This is only set by the binary.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
