//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const UART: &str = "CAPI=2:
name: \":mylib:uart\"
targets:
  default: &default
    default_tool: ghdl
  tb_uart:
    <<: *default
  uart_tb:
    default_tool: xsim
";

/// Stands in for fusesoc: fails a target when `FAIL_<target>` exists in the
/// cores root.
const FAKE_TOOL: &str = r#"
if [ "$1" = --version ]; then echo 'fusesoc 2.3'; exit 0; fi
target="$6"
root="$2"
if [ -f "$root/FAIL_$target" ]; then echo 'ERROR: assertion failed'; exit 1; fi
echo "running $7 $target"
"#;

const MISSING_TOOL: &str = "fsva-test-no-such-program";

/// Creates a workpath with one core and returns the command line selecting
/// the stand-in tool.
fn workspace(root: &Path) -> String {
    fs::write(root.join("uart.core"), UART).unwrap();
    let script = root.join("fake-fusesoc.sh");
    fs::write(&script, FAKE_TOOL).unwrap();
    format!("sh {}", script.display())
}

fn fsva(root: &Path, command: Option<&str>, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fsva"));
    cmd.arg("--workpath")
        .arg(root)
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("FSVA_LOG");
    match command {
        Some(c) => cmd.env("FSVA_COMMAND", c),
        None => cmd.env_remove("FSVA_COMMAND"),
    };
    cmd.output().unwrap()
}

/// Lists the entries of a directory by name.
fn entries(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    found.sort();
    found
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn full_pass_exits_zero_and_compresses() {
    let dir = tempfile::tempdir().unwrap();
    let command = workspace(dir.path());

    let out = fsva(dir.path(), Some(&command), &["--compress"]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("version fusesoc 2.3"));
    assert!(stdout.contains("PASSED:   2 (100.00%)"));

    // only the archive of the run remains
    let runs = entries(&dir.path().join("_fsva"));
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].extension().unwrap(), "zip");
}

#[test]
fn batch_failure_exits_one_after_report() {
    let dir = tempfile::tempdir().unwrap();
    let command = workspace(dir.path());
    fs::write(dir.path().join("FAIL_uart_tb"), "").unwrap();

    let out = fsva(dir.path(), Some(&command), &["--compress", "-n", "1"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("at least one verification target failed"));

    // the summary is written and nothing is compressed
    let runs = entries(&dir.path().join("_fsva"));
    assert_eq!(runs.len(), 1);
    assert!(runs[0].is_dir());
    let summary = fs::read_to_string(runs[0].join("summary")).unwrap();
    assert!(summary.contains("FAILED: core: :mylib:uart, target: uart_tb\n"));
    assert!(summary.contains("PASSED: core: :mylib:uart, target: tb_uart\n"));
}

#[test]
fn console_exit_code_follows_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let command = workspace(dir.path());
    fs::write(dir.path().join("FAIL_uart_tb"), "").unwrap();

    let out = fsva(dir.path(), Some(&command), &["mylib-uart", "tb_uart"]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains("running :mylib:uart tb_uart"));

    let out = fsva(dir.path(), Some(&command), &[":mylib:uart", "uart_tb"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("at least one verification target failed"));
    assert!(dir.path().join("_fsva/tmp/summary").exists() == false);

    let out = fsva(dir.path(), Some(&command), &[":mylib:uart", "tb_missing"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("has no matching target \"tb_missing\""));
}

#[test]
fn list_skips_tool_check() {
    let dir = tempfile::tempdir().unwrap();
    workspace(dir.path());

    let out = fsva(dir.path(), Some(MISSING_TOOL), &["--list"]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        ":mylib:uart  tb_uart  ghdl\n:mylib:uart  uart_tb  xsim\n"
    );
    assert!(dir.path().join("_fsva").exists() == false);

    let out = fsva(dir.path(), Some(MISSING_TOOL), &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("not found on the execution path"));
}

#[test]
fn environment_and_command_line_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let command = workspace(dir.path());
    fs::write(
        dir.path().join("fsva.toml"),
        format!("command = \"{}\"\noutdir = \"cfg-out\"\n", MISSING_TOOL),
    )
    .unwrap();

    // the configured command is used without the environment variable
    let out = fsva(dir.path(), None, &[]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains(MISSING_TOOL));

    let out = fsva(dir.path(), Some(&command), &[]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert_eq!(entries(&dir.path().join("cfg-out")).len(), 1);

    let out = fsva(dir.path(), Some(&command), &["--outdir", "cli-out"]);
    assert_eq!(out.status.code(), Some(0), "{}", stderr(&out));
    assert_eq!(entries(&dir.path().join("cli-out")).len(), 1);
}
