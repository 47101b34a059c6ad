// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fixed-length observation windows.
//!
//! Each calendar day (in the observatory's local time zone) is split into 48
//! contiguous 30-minute windows starting at local midnight. A window is named
//! by its local start time (`YYYY-MM-DD-HH:MM`), but its bounds are UTC-based
//! unix timestamps.

#[cfg(test)]
mod tests;

use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DATE_FORMAT, WINDOWS_PER_DAY, WINDOW_ID_FORMAT, WINDOW_LENGTH_SECONDS};

/// A 30-minute observation window. The interval is half open; a sample at
/// `end_unix` belongs to the next window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationWindow {
    pub id: String,
    pub start_unix: f64,
    pub end_unix: f64,
}

impl ObservationWindow {
    /// The local calendar date of the window (`YYYY-MM-DD`). Aligned data
    /// are stored in per-date directories.
    pub fn date(&self) -> &str {
        // Ids are always generated with a leading YYYY-MM-DD.
        self.id.get(..10).unwrap_or(&self.id)
    }

    /// Does this window contain the unix time `t`?
    pub fn contains(&self, t: f64) -> bool {
        self.start_unix <= t && t < self.end_unix
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|e| WindowError::BadDate {
        date: date.to_string(),
        err: e.to_string(),
    })
}

/// Parse an IANA time zone name, e.g. "Australia/Perth".
pub fn parse_time_zone(time_zone: &str) -> Result<Tz, WindowError> {
    time_zone
        .trim()
        .parse::<Tz>()
        .map_err(|e| WindowError::BadTimeZone {
            tz: time_zone.to_string(),
            err: e.to_string(),
        })
}

/// Generate the observation windows for every day between `start_date` and
/// `stop_date` (inclusive), in chronological order.
pub fn observation_windows(
    time_zone: &str,
    start_date: &str,
    stop_date: &str,
) -> Result<Vec<ObservationWindow>, WindowError> {
    let tz = parse_time_zone(time_zone)?;
    let start = parse_date(start_date)?;
    let stop = parse_date(stop_date)?;
    windows_between(tz, start, stop)
}

/// As [`observation_windows`], with the inputs already parsed.
pub fn windows_between(
    tz: Tz,
    start: NaiveDate,
    stop: NaiveDate,
) -> Result<Vec<ObservationWindow>, WindowError> {
    if stop < start {
        return Err(WindowError::StopBeforeStart {
            start: start.format(DATE_FORMAT).to_string(),
            stop: stop.format(DATE_FORMAT).to_string(),
        });
    }

    let num_days = (stop - start).num_days() + 1;
    let mut windows = Vec::with_capacity(num_days as usize * WINDOWS_PER_DAY as usize);
    for day in start.iter_days().take(num_days as usize) {
        let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(|| WindowError::BadDate {
            date: day.format(DATE_FORMAT).to_string(),
            err: "no local midnight".to_string(),
        })?;
        for i in 0..WINDOWS_PER_DAY {
            let local = midnight + Duration::minutes(30 * i64::from(i));
            let start_unix = local_to_unix(&tz, local);
            windows.push(ObservationWindow {
                id: local.format(WINDOW_ID_FORMAT).to_string(),
                start_unix,
                end_unix: start_unix + WINDOW_LENGTH_SECONDS,
            });
        }
    }

    Ok(windows)
}

/// Convert a naive local wall-clock time to a unix timestamp. Times repeated
/// when clocks go back resolve to their earlier instant; times skipped when
/// clocks go forward use the offset in effect before the change.
fn local_to_unix(tz: &Tz, local: NaiveDateTime) -> f64 {
    let utc = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.naive_utc(),
        LocalResult::Ambiguous(earliest, _) => earliest.naive_utc(),
        LocalResult::None => {
            let before = local - Duration::hours(1);
            let offset = tz
                .offset_from_local_datetime(&before)
                .earliest()
                .unwrap_or_else(|| tz.offset_from_utc_datetime(&before))
                .fix();
            local - Duration::seconds(i64::from(offset.local_minus_utc()))
        }
    };
    utc.and_utc().timestamp() as f64
}

/// Does this string look like a window id (`YYYY-MM-DD-HH:MM`)?
pub fn is_window_id(s: &str) -> bool {
    NaiveDateTime::parse_from_str(s, WINDOW_ID_FORMAT).is_ok()
}

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Couldn't parse '{date}' as a YYYY-MM-DD date: {err}")]
    BadDate { date: String, err: String },

    #[error("Couldn't parse '{tz}' as a time zone: {err}")]
    BadTimeZone { tz: String, err: String },

    #[error("The stop date ({stop}) is before the start date ({start})")]
    StopBeforeStart { start: String, stop: String },
}
