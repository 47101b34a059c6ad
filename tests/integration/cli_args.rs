// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path::Path;

use approx::assert_abs_diff_eq;
use indoc::formatdoc;
use tempfile::TempDir;

use crate::*;
use embers::ObservationWindow;

fn read_windows(path: &Path) -> Vec<ObservationWindow> {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_embers_help_is_correct() {
    let mut stdouts = vec![];

    // First with --help
    let cmd = embers().arg("--help").ok();
    assert!(cmd.is_ok());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty());
    stdouts.push(stdout);

    // Second with -h
    let cmd = embers().arg("-h").ok();
    assert!(cmd.is_ok());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty());
    stdouts.push(stdout);

    for stdout in stdouts {
        for sub in ["windows", "ephem-chrono", "channel-map", "gain-cal", "beam-map"] {
            assert!(stdout.contains(sub), "help is missing {sub}");
        }
    }
}

#[test]
fn test_subcommand_help_is_correct() {
    let cmd = embers().args(["gain-cal", "--help"]).ok();
    assert!(cmd.is_ok());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty());
    for flag in ["--fit-thresh", "--pointing", "--refs", "--tiles", "--nside", "--start-date"] {
        assert!(stdout.contains(flag), "gain-cal help is missing {flag}");
    }

    // Aliases work too.
    let cmd = embers().args(["chrono", "--help"]).ok();
    assert!(cmd.is_ok());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("--interp-freq"));
}

#[test]
fn test_windows_dry_run() {
    let cmd = embers()
        .arg("windows")
        .args(one_day())
        .args(["--dry-run", "--no-progress-bars"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("48 observation windows"), "{stdout}");
    assert!(stdout.contains("Dry run"));
}

#[test]
fn test_windows_written() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("windows.json");
    let cmd = embers()
        .arg("windows")
        .args(one_day())
        .args(["-o", path_str(&output)])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let windows = read_windows(&output);
    assert_eq!(windows.len(), 48);
    assert_eq!(windows[0].id, "2020-01-01-00:00");
    assert_abs_diff_eq!(windows[0].start_unix, T0);
    assert_abs_diff_eq!(windows[0].end_unix, T0 + 1800.0);
    assert_eq!(windows[47].id, "2020-01-01-23:30");
    assert_abs_diff_eq!(windows[47].start_unix, windows[46].end_unix);
}

#[test]
fn test_bad_date_is_reported() {
    let cmd = embers()
        .args(["windows", "--start-date", "2020-13-01", "--stop-date", "2020-13-02"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("YYYY-MM-DD"), "{stderr}");

    let cmd = embers()
        .args(["windows", "--stop-date", "2020-01-01"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--start-date wasn't supplied"), "{stderr}");
}

#[test]
fn test_arg_file_with_cli_override() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("windows.json");
    let arg_file = tmp.path().join("args.toml");
    std::fs::write(
        &arg_file,
        formatdoc! {r#"
            output = "{output}"

            [windows]
            time_zone = "Australia/Perth"
            start_date = "2020-01-01"
            stop_date = "2020-01-03"
        "#,
            output = path_str(&output),
        },
    )
    .unwrap();

    let cmd = embers()
        .args(["windows", path_str(&arg_file), "--stop-date", "2020-01-02"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert_eq!(read_windows(&output).len(), 96);

    // Unrecognised extensions are rejected.
    let bad = tmp.path().join("args.yaml");
    std::fs::write(&bad, "").unwrap();
    let cmd = embers().args(["windows", path_str(&bad)]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("recognised file extension"), "{stderr}");
}

#[test]
fn test_save_toml_reproduces_run() {
    let tmp = TempDir::new().unwrap();
    let saved = tmp.path().join("saved.toml");
    let cmd = embers()
        .arg("windows")
        .args(one_day())
        .args(["--dry-run", "--save-toml", path_str(&saved)])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let text = std::fs::read_to_string(&saved).unwrap();
    assert!(text.contains("Australia/Perth"), "{text}");

    let output = tmp.path().join("windows.json");
    let cmd = embers()
        .args(["windows", path_str(&saved), "-o", path_str(&output)])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    assert_eq!(read_windows(&output).len(), 48);
}

#[test]
fn test_missing_inputs_are_reported() {
    let tmp = TempDir::new().unwrap();
    let ephem_dir = tmp.path().join("ephem");
    std::fs::create_dir_all(&ephem_dir).unwrap();

    // No ephemeris files.
    let cmd = embers()
        .arg("ephem-chrono")
        .args(one_day())
        .args(["--ephem-dir", path_str(&ephem_dir), "-o", path_str(tmp.path())])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("No ephemeris JSON files"), "{stderr}");

    std::fs::write(ephem_dir.join("25338.json"), "{}").unwrap();
    let cmd = embers()
        .arg("ephem-chrono")
        .args(one_day())
        .args(["--ephem-dir", path_str(&ephem_dir), "-o", path_str(tmp.path())])
        .args(["--interp", "quadratic"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("isn't a supported interpolation"), "{stderr}");

    let cmd = embers().arg("beam-map").args(one_day()).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--align-dir wasn't supplied"), "{stderr}");
}
