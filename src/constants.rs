// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.
//!
//! All powers are in dBm (or dB for differences), all angles in radians unless
//! the name says otherwise.

use std::f64::consts::FRAC_PI_2;

/// The length of an observation window \[seconds\].
pub const WINDOW_LENGTH_SECONDS: f64 = 1800.0;

/// The number of observation windows in a calendar day.
pub const WINDOWS_PER_DAY: u32 = 48;

/// Observations were made in Western Australia.
pub const DEFAULT_TIME_ZONE: &str = "Australia/Perth";

/// The format of dates given by users.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The format of observation window ids.
pub const WINDOW_ID_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Satellite passes with fewer ephemeris points than this are not interpolated.
pub const MIN_EPHEM_POINTS: usize = 10;

/// The default ephemeris interpolation frequency \[Hz\]. This matches the
/// cadence of the aligned power data.
pub const DEFAULT_INTERP_FREQ_HZ: f64 = 1.0;

/// Two timestamps closer than this are considered the same sample \[seconds\].
pub const TIME_MATCH_TOLERANCE: f64 = 0.5;

/// Channels peaking below this many standard deviations of the whole trace
/// only contain noise.
pub const DEFAULT_SAT_THRESH: f64 = 1.0;

/// The noise threshold sits this many MADs above the noise median.
pub const DEFAULT_NOI_THRESH: f64 = 3.0;

/// A satellite's channel must peak this far above the noise threshold \[dB\].
pub const DEFAULT_CHANNEL_POW_THRESH: f64 = 20.0;

/// The peak power threshold used when calibrating gains and projecting beams
/// \[dB\].
pub const DEFAULT_TILE_POW_THRESH: f64 = 5.0;

/// The fraction of a pass a channel must be above the noise threshold.
pub const DEFAULT_OCC_THRESH: f64 = 0.8;

/// Passes peaking below this altitude are ignored \[degrees\].
pub const DEFAULT_ALT_THRESH_DEG: f64 = 0.0;

/// The number of samples at either edge of a pass which must be quiet for a
/// channel to be a candidate.
pub const EDGE_SAMPLES: usize = 10;

/// Scale factor making the MAD a consistent estimator of a Gaussian's
/// standard deviation.
pub const MAD_SCALE: f64 = 1.4826;

/// The default healpix resolution.
pub const DEFAULT_NSIDE: usize = 32;

/// The reference beam models have their azimuth origin at east. Rotating them
/// by this angle puts the origin at north, like the satellite ephemeris.
pub const REF_MODEL_ROTATION: f64 = -FRAC_PI_2;

/// Data and model are shifted to this level above the model's minimum before
/// a chi-square test, which needs strictly positive expected values.
pub const CHISQ_OFFSET: f64 = 20.0;

/// The default goodness-of-fit (p-value) threshold.
pub const DEFAULT_FIT_THRESH: f64 = 0.8;

/// Tile power at or above this level is in the receiver's nonlinear regime.
pub const GAIN_PEAK_FLOOR: f64 = -30.0;

/// Measured beam power above this level is considered distorted.
pub const GAIN_DISTORTION_CEILING: f64 = -35.0;

/// Tile model power below this level is in a beam null.
pub const GAIN_NULL_FLOOR: f64 = -55.0;

/// Passes need at least this many undistorted pixels to contribute gain
/// residuals.
pub const GAIN_MIN_POINTS: usize = 30;

/// Passes must come at least this close to zenith to contribute gain
/// residuals \[degrees\].
pub const GAIN_ZENITH_PROXIMITY_DEG: f64 = 10.0;

/// Passes must span at least this long to contribute gain residuals
/// \[seconds\].
pub const GAIN_MIN_PASS_SPAN: f64 = 600.0;

/// Residuals measured outside these power levels are outliers.
pub const GAIN_OUTLIER_MIN: f64 = -65.0;
pub const GAIN_OUTLIER_MAX: f64 = -25.0;

/// The power band in which receiver gains vary.
pub const DEFAULT_GAIN_BAND_START: f64 = -50.0;
pub const DEFAULT_GAIN_BAND_STOP: f64 = -30.0;

/// The order of the gain-curve polynomial.
pub const GAIN_POLY_ORDER: usize = 2;

/// The number of bins used for the median gain-residual profile.
pub const GAIN_PROFILE_BINS: usize = 16;

/// The file the global gain curve is written to.
pub const GAIN_CURVE_FILENAME: &str = "rfe_gain_fit.npy";

/// The file the median gain-residual profile is written to.
pub const GAIN_PROFILE_FILENAME: &str = "rfe_gain_bins.json";

/// The antenna pair whose reference trace is used to identify satellite
/// channels.
pub const DEFAULT_CHANNEL_MAP_REF: &str = "rf0XX";
pub const DEFAULT_CHANNEL_MAP_TILE: &str = "S07XX";

/// Gain residuals are only measured in windows at this pointing.
pub const DEFAULT_GAIN_POINTING: crate::pointing::Pointing = crate::pointing::Pointing::P0;
