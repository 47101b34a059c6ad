// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_two_days_of_windows() {
    let windows = observation_windows("Australia/Perth", "2020-01-01", "2020-01-02").unwrap();
    assert_eq!(windows.len(), 96);

    assert_eq!(windows[0].id, "2020-01-01-00:00");
    assert_abs_diff_eq!(windows[0].start_unix, 1577808000.0);
    assert_eq!(windows[1].id, "2020-01-01-00:30");
    assert_eq!(windows[47].id, "2020-01-01-23:30");
    assert_eq!(windows[48].id, "2020-01-02-00:00");
    assert_eq!(windows[95].id, "2020-01-02-23:30");

    // Perth has no daylight saving, so the windows are gap-free.
    for w in &windows {
        assert_abs_diff_eq!(w.end_unix - w.start_unix, 1800.0);
    }
    for pair in windows.windows(2) {
        assert_abs_diff_eq!(pair[0].end_unix, pair[1].start_unix);
    }
}

#[test]
fn test_single_day() {
    let windows = observation_windows("Australia/Perth", "2020-01-01", "2020-01-01").unwrap();
    assert_eq!(windows.len(), 48);
    assert_eq!(windows[0].date(), "2020-01-01");
    assert!(windows.iter().all(|w| is_window_id(&w.id)));
}

#[test]
fn test_window_contains_is_half_open() {
    let w = ObservationWindow {
        id: "2020-01-01-00:00".to_string(),
        start_unix: 100.0,
        end_unix: 1900.0,
    };
    assert!(w.contains(100.0));
    assert!(w.contains(1899.9));
    assert!(!w.contains(1900.0));
    assert!(!w.contains(99.9));
}

#[test]
fn test_clocks_going_back() {
    // Sydney leaves daylight saving at 03:00 on 2020-04-05; that day is 25
    // hours long.
    let tz = parse_time_zone("Australia/Sydney").unwrap();
    let day = parse_date("2020-04-05").unwrap();
    let windows = windows_between(tz, day, day).unwrap();
    assert_eq!(windows.len(), 48);
    assert_abs_diff_eq!(windows[0].start_unix, 1586005200.0);
    // 02:30 happens twice; the earlier instant is used.
    assert_eq!(windows[5].id, "2020-04-05-02:30");
    assert_abs_diff_eq!(windows[5].start_unix, 1586014200.0);
    assert_eq!(windows[6].id, "2020-04-05-03:00");
    assert_abs_diff_eq!(windows[6].start_unix, 1586019600.0);

    let next = parse_date("2020-04-06").unwrap();
    let windows = windows_between(tz, next, next).unwrap();
    assert_abs_diff_eq!(windows[0].start_unix, 1586095200.0);
}

#[test]
fn test_clocks_going_forward() {
    // Sydney enters daylight saving at 02:00 on 2020-10-04; 02:00 to 03:00
    // doesn't exist.
    let tz = parse_time_zone("Australia/Sydney").unwrap();
    let day = parse_date("2020-10-04").unwrap();
    let windows = windows_between(tz, day, day).unwrap();
    assert_eq!(windows.len(), 48);
    assert_abs_diff_eq!(windows[0].start_unix, 1601733600.0);
    assert_eq!(windows[3].id, "2020-10-04-01:30");
    assert_abs_diff_eq!(windows[3].start_unix, 1601739000.0);
    // Skipped times use the standard-time offset.
    assert_eq!(windows[5].id, "2020-10-04-02:30");
    assert_abs_diff_eq!(windows[5].start_unix, 1601742600.0);
    assert_eq!(windows[8].id, "2020-10-04-04:00");
    assert_abs_diff_eq!(windows[8].start_unix, 1601744400.0);
    for w in &windows {
        assert_abs_diff_eq!(w.end_unix - w.start_unix, 1800.0);
    }

    let next = parse_date("2020-10-05").unwrap();
    let windows = windows_between(tz, next, next).unwrap();
    assert_abs_diff_eq!(windows[0].start_unix, 1601816400.0);
}

#[test]
fn test_bad_inputs() {
    assert!(matches!(
        observation_windows("Australia/Perth", "2020-13-01", "2020-12-01"),
        Err(WindowError::BadDate { .. })
    ));
    assert!(matches!(
        observation_windows("Australia/Perth", "yesterday", "2020-12-01"),
        Err(WindowError::BadDate { .. })
    ));
    assert!(matches!(
        observation_windows("Middle/Earth", "2020-01-01", "2020-01-02"),
        Err(WindowError::BadTimeZone { .. })
    ));
    assert!(matches!(
        observation_windows("Australia/Perth", "2020-01-02", "2020-01-01"),
        Err(WindowError::StopBeforeStart { .. })
    ));
}

#[test]
fn test_is_window_id() {
    assert!(is_window_id("2020-10-04-23:30"));
    assert!(!is_window_id("2020-10-04"));
    assert!(!is_window_id("2020-10-04-25:30"));
}
