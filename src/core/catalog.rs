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

use crate::core::job::Job;
use crate::core::manifest::{Manifest, MANIFEST_EXT};
use crate::error::{Error, Hint};
use crate::util::anyerror::Fault;
use colored::Colorize;
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The ordered collection of verification jobs discovered under a workpath.
#[derive(Debug, PartialEq)]
pub struct Catalog {
    manifests: Vec<PathBuf>,
    jobs: Vec<Job>,
}

impl Catalog {
    /// Finds every manifest under `root` and loads its jobs.
    ///
    /// A manifest that cannot be loaded is reported and skipped. Errors if no
    /// manifests exist or if none of them declare a test bench target.
    pub fn discover(root: &Path) -> Result<Self, Fault> {
        let manifests = Self::find_manifests(root)?;
        if manifests.is_empty() == true {
            return Err(Error::NoManifestsFound(root.to_path_buf()))?;
        }
        tracing::debug!(count = manifests.len(), "found manifests");

        let mut jobs = Vec::new();
        let mut failures = 0;
        for path in &manifests {
            match Manifest::load(path) {
                Ok(mut found) => {
                    tracing::debug!(manifest = %path.display(), jobs = found.len(), "loaded manifest");
                    jobs.append(&mut found);
                }
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    failures += 1;
                }
            }
        }
        if jobs.is_empty() == true {
            let hint = match failures {
                0 => Hint::TargetNaming,
                _ => Hint::ManifestErrors,
            };
            return Err(Error::NoJobsFound(root.to_path_buf(), hint))?;
        }
        for (project, target) in Self::find_duplicates(&jobs) {
            eprintln!(
                "{} core {:?} target {:?} is declared more than once; its runs share one output directory",
                "warning:".yellow().bold(),
                project,
                target
            );
        }
        Ok(Self { manifests, jobs })
    }

    /// Collects all files ending in `.core` at any depth under `root`.
    ///
    /// Entries are visited in file name order so the discovery order is stable
    /// across runs and platforms. Directories that cannot be read are logged
    /// and skipped.
    pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>, Fault> {
        if root.is_dir() == false {
            return Err(Error::WorkpathNotFound(root.to_path_buf()))?;
        }
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut result = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("skipping unreadable path: {}", e);
                    continue;
                }
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file == true
                && entry.path().extension().map(|e| e == MANIFEST_EXT) == Some(true)
            {
                result.push(entry.into_path());
            }
        }
        Ok(result)
    }

    /// Lists the (core, target) pairs declared by more than one job, in order
    /// of their second appearance. Cores are compared by their sanitized name
    /// since that is what names the output directory.
    pub fn find_duplicates(jobs: &[Job]) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for job in jobs {
            if seen.insert((Job::sanitize(job.get_project()), job.get_target())) == false {
                result.push((job.get_project().to_string(), job.get_target().to_string()));
            }
        }
        result
    }

    pub fn get_manifests(&self) -> &Vec<PathBuf> {
        &self.manifests
    }

    pub fn get_jobs(&self) -> &Vec<Job> {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }

    /// Creates a string to display the list of jobs, one per line.
    pub fn list_jobs(&self) -> String {
        let width = |f: fn(&Job) -> &str| self.jobs.iter().map(|j| f(j).len()).max().unwrap_or(0);
        let (p_width, t_width) = (width(Job::get_project), width(Job::get_target));
        self.jobs.iter().fold(String::new(), |acc, j| {
            acc + &format!(
                "{:<p_width$}  {:<t_width$}  {}\n",
                j.get_project(),
                j.get_target(),
                j.get_tool(),
                p_width = p_width,
                t_width = t_width
            )
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const UART: &str = "CAPI=2:
name: \":mylib:uart\"
targets:
  tb_uart:
    default_tool: ghdl
";

    const TOP: &str = "CAPI=2:
name: \":mylib:top\"
targets:
  build:
    default_tool: vivado
";

    const BROKEN: &str = "CAPI=2:
name: [\":mylib:broken\"
";

    #[test]
    fn one_job_from_two_manifests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rtl/uart")).unwrap();
        std::fs::write(dir.path().join("rtl/uart/uart.core"), UART).unwrap();
        std::fs::write(dir.path().join("top.core"), TOP).unwrap();

        let catalog = Catalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.get_manifests().len(), 2);
        assert_eq!(catalog.get_jobs().len(), 1);
        let job = &catalog.get_jobs()[0];
        assert_eq!(job.get_project(), ":mylib:uart");
        assert_eq!(job.get_target(), "tb_uart");
        assert_eq!(job.get_tool(), "ghdl");
    }

    #[test]
    fn broken_manifest_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.core"), BROKEN).unwrap();
        std::fs::write(dir.path().join("b.core"), UART).unwrap();

        let catalog = Catalog::discover(dir.path()).unwrap();
        assert_eq!(catalog.get_manifests().len(), 2);
        assert_eq!(catalog.get_jobs().len(), 1);
    }

    #[test]
    fn discovery_order_is_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::create_dir_all(dir.path().join("a/deep/er")).unwrap();
        std::fs::write(dir.path().join("b/second.core"), UART).unwrap();
        std::fs::write(dir.path().join("a/deep/er/first.core"), UART).unwrap();
        std::fs::write(dir.path().join("a/notes.txt"), "tb").unwrap();
        std::fs::write(dir.path().join("a/core"), UART).unwrap();

        let found = Catalog::find_manifests(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("a/deep/er/first.core"),
                dir.path().join("b/second.core"),
            ]
        );
    }

    #[test]
    fn list_is_aligned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("uart.core"), UART).unwrap();
        std::fs::write(
            dir.path().join("x.core"),
            "name: spi\ntargets:\n  tb:\n    default_tool: xsim\n",
        )
        .unwrap();
        let catalog = Catalog::discover(dir.path()).unwrap();
        assert_eq!(
            catalog.list_jobs(),
            ":mylib:uart  tb_uart  ghdl\nspi          tb       xsim\n"
        );
    }

    #[test]
    fn no_jobs_after_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fifo.core"),
            "name: fifo\ntargets:\n  tb_fifo:\n    toplevel: tb_fifo\n",
        )
        .unwrap();
        let err = Catalog::discover(dir.path()).unwrap_err().to_string();
        assert!(err.starts_with("no verification targets found"));
        assert!(err.contains("errors reported above"));
        assert!(err.contains("must be named") == false);

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.core"), TOP).unwrap();
        let err = Catalog::discover(dir.path()).unwrap_err().to_string();
        assert!(err.contains("must be named"));
    }

    #[test]
    fn duplicate_identities() {
        let jobs = vec![
            Job::new(":mylib:uart", "tb", "ghdl", Path::new("a.core")),
            Job::new(":mylib:uart", "tb_rx", "ghdl", Path::new("a.core")),
            Job::new("mylib:uart", "tb", "xsim", Path::new("b.core")),
            Job::new(":mylib:spi", "tb", "ghdl", Path::new("c.core")),
        ];
        assert_eq!(
            Catalog::find_duplicates(&jobs),
            vec![(String::from("mylib:uart"), String::from("tb"))]
        );

        // duplicates are still run
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.core"), UART).unwrap();
        std::fs::write(dir.path().join("b.core"), UART).unwrap();
        assert_eq!(Catalog::discover(dir.path()).unwrap().get_jobs().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::write(locked.join("hidden.core"), UART).unwrap();
        std::fs::write(dir.path().join("uart.core"), UART).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let found = Catalog::find_manifests(dir.path());
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        // privileged users may still read the directory
        assert!(found.unwrap().contains(&dir.path().join("uart.core")));
    }

    #[test]
    fn no_manifests() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::discover(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("no .core files found"));
    }

    #[test]
    fn no_jobs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.core"), TOP).unwrap();
        let err = Catalog::discover(dir.path()).unwrap_err();
        assert!(err.to_string().starts_with("no verification targets found"));
    }
}
