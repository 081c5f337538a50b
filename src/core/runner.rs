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

use crate::core::backend::Registry;
use crate::core::invocation::{Invocation, Tool};
use crate::core::job::{Job, Note, Outcome, Verdict};
use colored::Colorize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

/// File within a job's output directory storing the tool's captured output.
pub const OUTPUT_FILE: &str = "output.txt";

const ERROR_PATTERN: &str = "error";
const WARNING_PATTERN: &str = "warn";

const BANNER_WIDTH: usize = 60;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to create output directory {0:?}: {1}")]
    OutputDir(PathBuf, std::io::Error),
    #[error("failed to launch {0:?}: {1}")]
    Launch(String, std::io::Error),
    #[error("failed while waiting on {0:?}: {1}")]
    Wait(String, std::io::Error),
    #[error("failed to capture the output of {0:?}")]
    Capture(String),
    #[error("failed to write output file {0:?}: {1}")]
    Persist(PathBuf, std::io::Error),
}

/// The observable result of one tool process.
#[derive(Debug, PartialEq, Clone)]
pub struct Capture {
    code: Option<i32>,
    stdout: String,
    stderr: String,
    timed_out: bool,
}

impl Capture {
    pub fn new(code: Option<i32>, stdout: &str, stderr: &str) -> Self {
        Self {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            timed_out: false,
        }
    }

    /// Counts the case-insensitive, non-overlapping occurrences of `pattern`
    /// in standard output.
    fn count(&self, pattern: &str) -> usize {
        self.stdout.to_lowercase().matches(pattern).count()
    }

    pub fn count_errors(&self) -> usize {
        self.count(ERROR_PATTERN)
    }

    pub fn count_warnings(&self) -> usize {
        self.count(WARNING_PATTERN)
    }

    pub fn get_code(&self) -> Option<i32> {
        self.code
    }

    pub fn get_stdout(&self) -> &str {
        &self.stdout
    }

    pub fn get_stderr(&self) -> &str {
        &self.stderr
    }

    /// Classifies the capture into the job's terminal state.
    ///
    /// The verdict depends only on the exit code; the error and warning counts
    /// are taken from standard output regardless of the verdict.
    pub fn classify(&self, output: PathBuf, limit: Option<Duration>) -> Outcome {
        let outcome = Outcome::new(
            Verdict::from_exit_code(self.code),
            self.count_errors(),
            self.count_warnings(),
            output,
        );
        match (self.timed_out, limit) {
            (true, Some(d)) => outcome.noted(Note::TimedOut(d)),
            _ => outcome,
        }
    }

    /// Formats standard error then standard output under labeled banners.
    pub fn sections(&self) -> String {
        format!(
            "{}\n{}\n\n{}\n{}",
            banner("STDERR"),
            self.stderr,
            banner("STDOUT"),
            self.stdout
        )
    }
}

/// Creates a three-line box around `label`.
fn banner(label: &str) -> String {
    let edge = "*".repeat(BANNER_WIDTH);
    format!(
        "{0}\n*****{1:^2$}*****\n{0}\n",
        edge,
        label,
        BANNER_WIDTH - 10
    )
}

/// Executes verification jobs against the external tool.
#[derive(Clone)]
pub struct Runner {
    tool: Tool,
    root: PathBuf,
    outpath: PathBuf,
    backends: Registry,
    timeout: Option<Duration>,
}

impl Runner {
    /// Creates a runner that verifies the cores found under `root` and stores
    /// job outputs under `outpath`. Both paths are expected to be absolute.
    pub fn new(tool: Tool, root: &Path, outpath: &Path) -> Self {
        Self {
            tool,
            root: root.to_path_buf(),
            outpath: outpath.to_path_buf(),
            backends: Registry::default(),
            timeout: None,
        }
    }

    pub fn backends(mut self, reg: Registry) -> Self {
        self.backends = reg;
        self
    }

    /// Sets the longest time a single job may run before it is killed.
    pub fn timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub fn get_outpath(&self) -> &PathBuf {
        &self.outpath
    }

    /// Creates the job's output directory and its command line.
    pub fn prepare(&self, job: &Job) -> Result<(PathBuf, Invocation), RunError> {
        let outdir = job.output_dir(&self.outpath);
        std::fs::create_dir_all(&outdir).map_err(|e| RunError::OutputDir(outdir.clone(), e))?;
        let inv = Invocation::build(&self.tool, &self.root, job, &self.backends, &outdir);
        Ok((outdir, inv))
    }

    /// Runs the process to completion (or until the timeout), capturing its
    /// output. A nonzero exit code is not an error.
    pub fn execute(&self, inv: &Invocation) -> Result<Capture, RunError> {
        tracing::debug!(command = %inv, "running");
        let mut cmd = inv.to_command();
        cmd.stdin(Stdio::null());
        match self.timeout {
            None => {
                let output = cmd
                    .output()
                    .map_err(|e| RunError::Launch(inv.get_program().to_string(), e))?;
                Ok(Capture {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    timed_out: false,
                })
            }
            Some(limit) => {
                let child = cmd
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()
                    .map_err(|e| RunError::Launch(inv.get_program().to_string(), e))?;
                Self::wait_with_limit(child, limit, inv.get_program())
            }
        }
    }

    /// Waits on `child` for at most `limit`, killing it once the limit passes.
    ///
    /// The pipes are drained on separate threads so a chatty process cannot
    /// fill them and stall.
    fn wait_with_limit(mut child: Child, limit: Duration, program: &str) -> Result<Capture, RunError> {
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let wait_err = |e| RunError::Wait(program.to_string(), e);
        let (code, timed_out) = match child.wait_timeout(limit).map_err(wait_err)? {
            Some(status) => (status.code(), false),
            None => {
                // the process may exit on its own between the check and the kill
                let _ = child.kill();
                child.wait().map_err(wait_err)?;
                (None, true)
            }
        };
        let capture_err = |_| RunError::Capture(program.to_string());
        Ok(Capture {
            code,
            stdout: String::from_utf8_lossy(&stdout.join().map_err(capture_err)?).into_owned(),
            stderr: String::from_utf8_lossy(&stderr.join().map_err(capture_err)?).into_owned(),
            timed_out,
        })
    }

    fn try_verify(&self, job: &Job) -> Result<(PathBuf, Capture), RunError> {
        let (outdir, inv) = self.prepare(job)?;
        let capture = self.execute(&inv)?;
        tracing::info!(
            project = job.get_project(),
            target = job.get_target(),
            code = ?capture.get_code(),
            timed_out = capture.timed_out,
            "finished"
        );
        Ok((outdir, capture))
    }

    /// Verifies `job` and stores its standard error and standard output in
    /// the job's output directory.
    ///
    /// Any failure to run the job is recorded in its outcome rather than
    /// returned, so it cannot affect other jobs. Once the process has run,
    /// the verdict and counts come from its capture alone; a failure to save
    /// the output is only noted.
    pub fn verify_to_file(&self, job: &Job) -> Outcome {
        println!("info: verifying {}", job);
        let (outdir, capture) = match self.try_verify(job) {
            Ok(r) => r,
            Err(e) => return self.crashed(job, e),
        };
        let file = outdir.join(OUTPUT_FILE);
        let outcome = capture.classify(file.clone(), self.timeout);
        match std::fs::write(&file, capture.sections()) {
            Ok(()) => outcome,
            Err(e) => {
                let e = RunError::Persist(file, e);
                tracing::warn!(project = job.get_project(), target = job.get_target(), "{}", e);
                outcome.annotated(Note::Unsaved(e.to_string()))
            }
        }
    }

    /// Verifies `job` and writes its standard error, standard output, and
    /// result to `w` instead of a file.
    pub fn verify_to_writer<W: Write>(&self, job: &Job, w: &mut W) -> std::io::Result<Outcome> {
        writeln!(w, "info: verifying {}", job)?;
        let (capture, outcome) = match self.try_verify(job) {
            Ok((outdir, capture)) => {
                let outcome = capture.classify(outdir, self.timeout);
                (Some(capture), outcome)
            }
            Err(e) => (None, self.crashed(job, e)),
        };
        if let Some(c) = &capture {
            writeln!(w)?;
            writeln!(w, "{}", c.sections())?;
        }
        writeln!(w, "{}", job)?;
        match outcome.get_verdict() {
            Verdict::Passed => writeln!(w, "{}", "PASSED".green())?,
            Verdict::Failed => writeln!(w, "{}", "FAILED".red())?,
        }
        if let Some(note) = outcome.get_note() {
            writeln!(w, "NOTE:      {}", note)?;
        }
        writeln!(w, "ERRORS:    {}", outcome.get_errors())?;
        writeln!(w, "WARNINGS:  {}", outcome.get_warnings())?;
        writeln!(w)?;
        Ok(outcome)
    }

    /// Verifies `job` while streaming its output to the console.
    pub fn verify_to_console(&self, job: &Job) -> std::io::Result<Outcome> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.verify_to_writer(job, &mut lock)
    }

    fn crashed(&self, job: &Job, e: RunError) -> Outcome {
        tracing::warn!(
            project = job.get_project(),
            target = job.get_target(),
            manifest = %job.get_manifest().display(),
            "{}",
            e
        );
        Outcome::new(Verdict::Failed, 0, 0, job.output_dir(&self.outpath))
            .noted(Note::Crashed(e.to_string()))
    }
}

/// Reads everything from `pipe` on a new thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        buf
    })
}
