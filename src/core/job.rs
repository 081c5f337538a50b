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

use serde_derive::Serialize;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The character separating the components of a FuseSoc core name
/// (`vendor:library:name:version`).
const CORE_NAME_DELIMITER: char = ':';

/// Replaces the core name delimiter within a project identifier.
const SANITIZED_DELIMITER: &str = "-";

/// A single (core, target) pair to be verified.
///
/// The identity is fixed at construction. The only mutation is the one-time
/// transition from pending to a completed [Outcome].
#[derive(Debug, PartialEq, Clone)]
pub struct Job {
    project: String,
    target: String,
    tool: String,
    manifest: PathBuf,
    status: Status,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Status {
    Pending,
    Complete(Outcome),
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    /// A process passes only when it exits with a code of exactly zero. A
    /// process terminated by a signal has no code and fails.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Passed,
            _ => Self::Failed,
        }
    }

    pub fn is_pass(&self) -> bool {
        self == &Self::Passed
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Explains a failure that did not come from the tool's own exit code, or a
/// problem that left the verdict untouched.
#[derive(Debug, PartialEq, Clone)]
pub enum Note {
    TimedOut(Duration),
    Crashed(String),
    Unsaved(String),
}

impl Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(d) => write!(f, "timed out after {} s", d.as_secs_f64()),
            Self::Crashed(e) => write!(f, "could not be run: {}", e),
            Self::Unsaved(e) => write!(f, "output was not saved: {}", e),
        }
    }
}

/// The terminal result state of a verification job.
#[derive(Debug, PartialEq, Clone)]
pub struct Outcome {
    verdict: Verdict,
    errors: usize,
    warnings: usize,
    output: PathBuf,
    note: Option<Note>,
}

impl Outcome {
    pub fn new(verdict: Verdict, errors: usize, warnings: usize, output: PathBuf) -> Self {
        Self {
            verdict,
            errors,
            warnings,
            output,
            note: None,
        }
    }

    /// Records a job that failed for a reason other than its exit code.
    pub fn noted(mut self, note: Note) -> Self {
        self.verdict = Verdict::Failed;
        self.note = Some(note);
        self
    }

    /// Attaches a note without changing the verdict. A note explaining a
    /// failure is kept over the new one.
    pub fn annotated(mut self, note: Note) -> Self {
        self.note.get_or_insert(note);
        self
    }

    pub fn get_verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_pass(&self) -> bool {
        self.verdict.is_pass()
    }

    pub fn get_errors(&self) -> usize {
        self.errors
    }

    pub fn get_warnings(&self) -> usize {
        self.warnings
    }

    /// References the location where the job's full output is stored.
    pub fn get_output(&self) -> &PathBuf {
        &self.output
    }

    pub fn get_note(&self) -> Option<&Note> {
        self.note.as_ref()
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum JobError {
    #[error("core {0:?} target {1:?} already completed")]
    AlreadyComplete(String, String),
    #[error("core {0:?} target {1:?} has not completed")]
    Incomplete(String, String),
}

impl Job {
    pub fn new(project: &str, target: &str, tool: &str, manifest: &Path) -> Self {
        Self {
            project: project.to_string(),
            target: target.to_string(),
            tool: tool.to_string(),
            manifest: manifest.to_path_buf(),
            status: Status::Pending,
        }
    }

    /// Checks if a target name denotes a test bench.
    ///
    /// A test bench target is named exactly `tb`, or starts with `tb_`, or ends
    /// with `_tb`. The comparison is case-sensitive.
    pub fn is_testbench(name: &str) -> bool {
        name == "tb" || name.starts_with("tb_") || name.ends_with("_tb")
    }

    /// Transforms a core name into a single path segment.
    ///
    /// One leading and one trailing delimiter are removed and any remaining
    /// delimiters become hyphens: `:mylib:core` becomes `mylib-core`.
    pub fn sanitize(project: &str) -> String {
        let s = project
            .strip_prefix(CORE_NAME_DELIMITER)
            .unwrap_or(project);
        let s = s.strip_suffix(CORE_NAME_DELIMITER).unwrap_or(s);
        s.replace(CORE_NAME_DELIMITER, SANITIZED_DELIMITER)
    }

    /// Computes the job's dedicated directory under the run's output path.
    pub fn output_dir(&self, outpath: &Path) -> PathBuf {
        outpath
            .join(Self::sanitize(&self.project))
            .join(&self.target)
    }

    /// Checks if `name` refers to this job's core, either by its full name or
    /// by its sanitized form.
    pub fn is_project(&self, name: &str) -> bool {
        self.project == name || Self::sanitize(&self.project) == name
    }

    /// Performs the one-time transition from pending to complete.
    pub fn complete(&mut self, outcome: Outcome) -> Result<(), JobError> {
        match self.status {
            Status::Pending => {
                self.status = Status::Complete(outcome);
                Ok(())
            }
            Status::Complete(_) => Err(JobError::AlreadyComplete(
                self.project.clone(),
                self.target.clone(),
            )),
        }
    }

    pub fn get_outcome(&self) -> Option<&Outcome> {
        match &self.status {
            Status::Pending => None,
            Status::Complete(o) => Some(o),
        }
    }

    /// Accesses the outcome of a job that is expected to be complete.
    pub fn expect_outcome(&self) -> Result<&Outcome, JobError> {
        self.get_outcome()
            .ok_or_else(|| JobError::Incomplete(self.project.clone(), self.target.clone()))
    }

    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    pub fn get_project(&self) -> &str {
        &self.project
    }

    pub fn get_target(&self) -> &str {
        &self.target
    }

    pub fn get_tool(&self) -> &str {
        &self.tool
    }

    pub fn get_manifest(&self) -> &PathBuf {
        &self.manifest
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "core: {}, target: {}", self.project, self.target)
    }
}
