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

use crate::error::{Error, LastError};
use crate::util::filesystem;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the directory created inside the workpath to hold every run.
pub const DEFAULT_OUTDIR: &str = "_fsva";

/// Run name used for single-job console runs, which are overwritten each time.
pub const CONSOLE_RUN_NAME: &str = "tmp";

/// Format of a batch run's directory name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// The locations and start time of a single invocation.
///
/// All paths are absolute; the process's working directory is never changed.
#[derive(Debug, PartialEq, Clone)]
pub struct Context {
    workpath: PathBuf,
    outdir: PathBuf,
    run_name: String,
    started: DateTime<Local>,
    clock: Instant,
}

impl Context {
    /// Starts the clock for a run rooted at `workpath`.
    ///
    /// Errors if the workpath does not exist.
    pub fn new(workpath: &Path) -> Result<Self, Error> {
        if workpath.is_dir() == false {
            return Err(Error::WorkpathNotFound(workpath.to_path_buf()));
        }
        let workpath = filesystem::full_normal(workpath)
            .map_err(|_| Error::WorkpathNotFound(workpath.to_path_buf()))?;
        let started = Local::now();
        Ok(Self {
            outdir: workpath.join(DEFAULT_OUTDIR),
            workpath,
            run_name: started.format(TIMESTAMP_FORMAT).to_string(),
            started,
            clock: Instant::now(),
        })
    }

    /// Sets the output directory, resolved against the workpath.
    pub fn outdir(mut self, name: &str) -> Self {
        self.outdir = filesystem::resolve_rel_path(&self.workpath, name);
        self
    }

    /// Names the run directory for console mode instead of by timestamp.
    pub fn console(mut self, enabled: bool) -> Self {
        if enabled == true {
            self.run_name = String::from(CONSOLE_RUN_NAME);
        }
        self
    }

    /// Creates the run directory and returns its path.
    pub fn create_outpath(&self) -> Result<PathBuf, Error> {
        let outpath = self.get_outpath();
        std::fs::create_dir_all(&outpath)
            .map_err(|e| Error::OutputDirFailed(outpath.clone(), LastError(e.to_string())))?;
        Ok(outpath)
    }

    pub fn get_workpath(&self) -> &PathBuf {
        &self.workpath
    }

    pub fn get_outdir(&self) -> &PathBuf {
        &self.outdir
    }

    pub fn get_run_name(&self) -> &str {
        &self.run_name
    }

    /// References the directory holding this run's job outputs and summary.
    pub fn get_outpath(&self) -> PathBuf {
        self.outdir.join(&self.run_name)
    }

    pub fn get_started(&self) -> &DateTime<Local> {
        &self.started
    }

    /// Measures the wall-clock time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_workpath() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(
            Context::new(&missing).unwrap_err(),
            Error::WorkpathNotFound(missing)
        );
    }

    #[test]
    fn batch_run_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path()).unwrap();
        assert_eq!(ctx.get_outdir(), &dir.path().join(DEFAULT_OUTDIR));
        let name = ctx.get_run_name();
        assert_eq!(name.len(), "2024-01-31_23-59-59".len());
        assert!(chrono::NaiveDateTime::parse_from_str(name, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn console_run_is_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path()).unwrap().outdir("out").console(true);
        assert_eq!(ctx.get_outpath(), dir.path().join("out/tmp"));

        let created = ctx.create_outpath().unwrap();
        assert!(created.is_dir());
        // creating it again is not an error
        assert_eq!(ctx.create_outpath().unwrap(), created);
    }
}
