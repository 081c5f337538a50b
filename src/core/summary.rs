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

//! Aggregated reporting over a completed set of verification jobs.
//!
//! The same report is rendered twice: once in plain text for the persisted
//! `summary` file and once with pass/fail highlighting for the console. A
//! machine-readable `summary.json` is written alongside.

use crate::core::job::{Job, JobError, Outcome};
use crate::error::{Error, LastError};
use crate::util::anyerror::Fault;
use chrono::{DateTime, Local};
use colored::Colorize;
use serde_derive::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name of the persisted text report at the run root.
pub const SUMMARY_FILE: &str = "summary";

/// File name of the persisted machine-readable report at the run root.
pub const SUMMARY_JSON_FILE: &str = "summary.json";

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Totals {
    targets: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    warnings: usize,
}

impl Totals {
    pub fn get_targets(&self) -> usize {
        self.targets
    }

    pub fn get_passed(&self) -> usize {
        self.passed
    }

    pub fn get_failed(&self) -> usize {
        self.failed
    }

    pub fn get_errors(&self) -> usize {
        self.errors
    }

    pub fn get_warnings(&self) -> usize {
        self.warnings
    }
}

/// Wall-clock time decomposed into whole hours, minutes, and seconds.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Elapsed {
    hours: u64,
    minutes: u64,
    seconds: u64,
}

impl From<Duration> for Elapsed {
    fn from(d: Duration) -> Self {
        let s = d.as_secs();
        Self {
            hours: s / 3600,
            minutes: (s % 3600) / 60,
            seconds: s % 60,
        }
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} h {} min {} s", self.hours, self.minutes, self.seconds)
    }
}

/// Formats `part` as a percentage of `whole` with two decimals.
fn percent(part: usize, whole: usize) -> String {
    match whole {
        0 => String::from("0.00%"),
        _ => format!("{:.2}%", part as f64 / whole as f64 * 100.0),
    }
}

/// A read-only view over a run's jobs once every one of them is complete.
#[derive(Debug)]
pub struct Summary<'a> {
    entries: Vec<(&'a Job, &'a Outcome)>,
    elapsed: Duration,
    started: DateTime<Local>,
}

impl<'a> Summary<'a> {
    /// Collects the outcomes of `jobs`, in list order.
    ///
    /// Errors if any job is still pending.
    pub fn new(jobs: &'a [Job], elapsed: Duration, started: DateTime<Local>) -> Result<Self, JobError> {
        let entries = jobs
            .iter()
            .map(|j| j.expect_outcome().map(|o| (j, o)))
            .collect::<Result<Vec<_>, JobError>>()?;
        Ok(Self {
            entries,
            elapsed,
            started,
        })
    }

    pub fn totals(&self) -> Totals {
        let passed = self.entries.iter().filter(|(_, o)| o.is_pass()).count();
        Totals {
            targets: self.entries.len(),
            passed,
            failed: self.entries.len() - passed,
            errors: self.entries.iter().map(|(_, o)| o.get_errors()).sum(),
            warnings: self.entries.iter().map(|(_, o)| o.get_warnings()).sum(),
        }
    }

    /// Checks if every job in the run passed.
    pub fn all_passed(&self) -> bool {
        self.entries.iter().all(|(_, o)| o.is_pass())
    }

    /// Renders the report, highlighting each job's verdict when `color` is set.
    pub fn render(&self, color: bool) -> String {
        let mut text = String::new();
        for (job, outcome) in &self.entries {
            let verdict = match (color, outcome.is_pass()) {
                (false, _) => outcome.get_verdict().to_string(),
                (true, true) => outcome.get_verdict().to_string().green().to_string(),
                (true, false) => outcome.get_verdict().to_string().red().to_string(),
            };
            text.push_str(&format!("{}: {}\n", verdict, job));
            if outcome.get_errors() > 0 {
                text.push_str(&format!("ERRORS ({}): {}\n", outcome.get_errors(), job));
            }
            if outcome.get_warnings() > 0 {
                text.push_str(&format!("WARNINGS ({}): {}\n", outcome.get_warnings(), job));
            }
            if let Some(note) = outcome.get_note() {
                text.push_str(&format!("NOTE: {}\n", note));
            }
            if outcome.is_pass() == false || outcome.get_warnings() > 0 {
                text.push_str(&format!(
                    "For more details check file:{}\n",
                    outcome.get_output().display()
                ));
            }
            text.push('\n');
        }

        let totals = self.totals();
        text.push_str(&format!(
            "\nVERIFICATION SUMMARY:
  Total verification time: {}
  TARGETS:  {}
  PASSED:   {} ({})
  FAILED:   {} ({})
  ERRORS:   {}
  WARNINGS: {}\n\n",
            Elapsed::from(self.elapsed),
            totals.targets,
            totals.passed,
            percent(totals.passed, totals.targets),
            totals.failed,
            percent(totals.failed, totals.targets),
            totals.errors,
            totals.warnings,
        ));
        text
    }

    /// Serializes the report for other programs to consume.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let report = JsonReport {
            started: self.started.to_rfc3339(),
            elapsed: self.elapsed.as_secs_f64(),
            totals: self.totals(),
            jobs: self
                .entries
                .iter()
                .map(|(j, o)| JsonJob {
                    project: j.get_project(),
                    target: j.get_target(),
                    tool: j.get_tool(),
                    verdict: o.get_verdict(),
                    errors: o.get_errors(),
                    warnings: o.get_warnings(),
                    output: o.get_output(),
                    note: o.get_note().map(|n| n.to_string()),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&report)
    }

    /// Writes both report files into `outpath` and echoes the text report to
    /// the console.
    pub fn publish(&self, outpath: &Path) -> Result<(), Fault> {
        self.save(outpath)?;
        print!("{}", self.render(true));
        Ok(())
    }

    /// Writes `summary` and `summary.json` into `outpath`.
    pub fn save(&self, outpath: &Path) -> Result<(), Fault> {
        let json = self
            .to_json()
            .map_err(|e| Error::SummaryNotSaved(LastError(e.to_string())))?;
        std::fs::write(outpath.join(SUMMARY_FILE), self.render(false))
            .map_err(|e| Error::SummaryNotSaved(LastError(e.to_string())))?;
        std::fs::write(outpath.join(SUMMARY_JSON_FILE), json + "\n")
            .map_err(|e| Error::SummaryNotSaved(LastError(e.to_string())))?;
        tracing::debug!(path = %outpath.join(SUMMARY_FILE).display(), "saved summary");
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    started: String,
    elapsed: f64,
    totals: Totals,
    jobs: Vec<JsonJob<'a>>,
}

#[derive(Serialize)]
struct JsonJob<'a> {
    project: &'a str,
    target: &'a str,
    tool: &'a str,
    verdict: crate::core::job::Verdict,
    errors: usize,
    warnings: usize,
    output: &'a PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::job::{Note, Verdict};

    fn complete(project: &str, target: &str, outcome: Outcome) -> Job {
        let mut j = Job::new(project, target, "ghdl", Path::new("x.core"));
        j.complete(outcome).unwrap();
        j
    }

    fn mixed() -> Vec<Job> {
        vec![
            complete(
                ":mylib:uart",
                "tb_rx",
                Outcome::new(Verdict::Passed, 0, 0, PathBuf::from("/o/mylib-uart/tb_rx/output.txt")),
            ),
            complete(
                ":mylib:uart",
                "tb_tx",
                Outcome::new(Verdict::Failed, 3, 1, PathBuf::from("/o/mylib-uart/tb_tx/output.txt")),
            ),
            complete(
                "spi",
                "tb",
                Outcome::new(Verdict::Passed, 0, 2, PathBuf::from("/o/spi/tb/output.txt")),
            ),
        ]
    }

    /// Removes ANSI escape sequences.
    fn strip_color(s: &str) -> String {
        let mut result = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                // skip up to and including the final letter
                while let Some(n) = chars.next() {
                    if n.is_ascii_alphabetic() {
                        break;
                    }
                }
            } else {
                result.push(c);
            }
        }
        result
    }

    #[test]
    fn elapsed_decomposition() {
        let e = Elapsed::from(Duration::from_secs(3 * 3600 + 25 * 60 + 7));
        assert_eq!(e.to_string(), "3 h 25 min 7 s");
        assert_eq!(Elapsed::from(Duration::from_millis(999)).to_string(), "0 h 0 min 0 s");
    }

    #[test]
    fn percentages() {
        assert_eq!(percent(1, 3), "33.33%");
        assert_eq!(percent(2, 3), "66.67%");
        assert_eq!(percent(4, 4), "100.00%");
        assert_eq!(percent(0, 0), "0.00%");
    }

    #[test]
    fn pending_jobs_are_rejected() {
        let jobs = vec![Job::new("spi", "tb", "xsim", Path::new("spi.core"))];
        assert_eq!(
            Summary::new(&jobs, Duration::ZERO, Local::now()).unwrap_err(),
            JobError::Incomplete(String::from("spi"), String::from("tb"))
        );
    }

    #[test]
    fn render_per_job_lines() {
        let jobs = mixed();
        let s = Summary::new(&jobs, Duration::from_secs(65), Local::now()).unwrap();
        assert_eq!(s.all_passed(), false);
        assert_eq!(
            s.render(false),
            "PASSED: core: :mylib:uart, target: tb_rx

FAILED: core: :mylib:uart, target: tb_tx
ERRORS (3): core: :mylib:uart, target: tb_tx
WARNINGS (1): core: :mylib:uart, target: tb_tx
For more details check file:/o/mylib-uart/tb_tx/output.txt

PASSED: core: spi, target: tb
WARNINGS (2): core: spi, target: tb
For more details check file:/o/spi/tb/output.txt


VERIFICATION SUMMARY:
  Total verification time: 0 h 1 min 5 s
  TARGETS:  3
  PASSED:   2 (66.67%)
  FAILED:   1 (33.33%)
  ERRORS:   3
  WARNINGS: 3

"
        );
    }

    #[test]
    fn note_line_follows_counts() {
        let jobs = vec![complete(
            "spi",
            "tb",
            Outcome::new(Verdict::Passed, 0, 0, PathBuf::from("/o/spi/tb/output.txt"))
                .noted(Note::TimedOut(Duration::from_secs(5))),
        )];
        let s = Summary::new(&jobs, Duration::ZERO, Local::now()).unwrap();
        assert!(s.render(false).starts_with(
            "FAILED: core: spi, target: tb\nNOTE: timed out after 5 s\nFor more details check file:/o/spi/tb/output.txt\n\n"
        ));
    }

    #[test]
    fn all_passed_report() {
        let jobs = vec![
            complete("a", "tb", Outcome::new(Verdict::Passed, 0, 0, PathBuf::from("/o/a/tb/output.txt"))),
            complete("b", "tb_x", Outcome::new(Verdict::Passed, 0, 0, PathBuf::from("/o/b/tb_x/output.txt"))),
        ];
        let dir = tempfile::tempdir().unwrap();
        let s = Summary::new(&jobs, Duration::from_secs(1), Local::now()).unwrap();
        assert_eq!(s.all_passed(), true);
        s.save(dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert!(text.contains("  PASSED:   2 (100.00%)\n"));
        assert!(text.contains("  FAILED:   0 (0.00%)\n"));
        assert!(text.contains("For more details") == false);
        // the persisted file matches the console text without color codes
        assert_eq!(text, strip_color(&s.render(true)));
    }

    #[test]
    fn json_report() {
        let jobs = mixed();
        let dir = tempfile::tempdir().unwrap();
        let s = Summary::new(&jobs, Duration::from_millis(1500), Local::now()).unwrap();
        s.save(dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(SUMMARY_JSON_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["elapsed"], 1.5);
        assert_eq!(value["totals"]["targets"], 3);
        assert_eq!(value["totals"]["failed"], 1);
        assert_eq!(value["totals"]["warnings"], 3);
        assert_eq!(value["jobs"][1]["target"], "tb_tx");
        assert_eq!(value["jobs"][1]["verdict"], "failed");
        assert_eq!(value["jobs"][2]["output"], "/o/spi/tb/output.txt");
        assert!(value["jobs"][0].get("note").is_none());
    }
}
