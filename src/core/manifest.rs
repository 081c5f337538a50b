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
use serde_derive::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// File extension of a FuseSoc core description.
pub const MANIFEST_EXT: &str = "core";

/// The subset of a FuseSoc `.core` file required to enumerate verification
/// jobs. All other fields (`CAPI=2`, `filesets`, `parameters`, ...) are ignored.
#[derive(Debug, PartialEq, Deserialize)]
pub struct Manifest {
    name: String,
    targets: Option<Mapping>,
}

/// The subset of a target's configuration required to run it.
#[derive(Debug, PartialEq, Deserialize)]
struct TargetConfig {
    default_tool: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {0:?}: {1}")]
    Unreadable(PathBuf, std::io::Error),
    #[error("failed to parse manifest {0:?}: {1}")]
    Malformed(PathBuf, serde_yaml::Error),
    #[error("manifest {0:?} target {1:?} is missing a valid \"default_tool\": {2}")]
    MissingDefaultTool(PathBuf, String, serde_yaml::Error),
}

impl std::str::FromStr for Manifest {
    type Err = serde_yaml::Error;

    /// Parses the document, resolving merge keys (`<<: *default`) so
    /// targets may inherit fields such as `default_tool`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut doc: Value = serde_yaml::from_str(s)?;
        doc.apply_merge()?;
        serde_yaml::from_value(doc)
    }
}

impl Manifest {
    /// Reads and parses the core description at `path` into its ordered list
    /// of verification jobs.
    ///
    /// A document without any test bench targets yields an empty list.
    pub fn load(path: &Path) -> Result<Vec<Job>, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::Unreadable(path.to_path_buf(), e))?;
        let manifest: Manifest = contents
            .parse()
            .map_err(|e| ManifestError::Malformed(path.to_path_buf(), e))?;
        manifest.into_jobs(path)
    }

    /// Transforms each test bench target into a job, in declaration order.
    pub fn into_jobs(self, path: &Path) -> Result<Vec<Job>, ManifestError> {
        let targets = match self.targets {
            Some(t) => t,
            None => return Ok(Vec::new()),
        };
        let mut jobs = Vec::new();
        for (key, config) in targets {
            let name = match key {
                Value::String(s) => s,
                _ => continue,
            };
            if Job::is_testbench(&name) == false {
                continue;
            }
            let config: TargetConfig = serde_yaml::from_value(config).map_err(|e| {
                ManifestError::MissingDefaultTool(path.to_path_buf(), name.clone(), e)
            })?;
            jobs.push(Job::new(&self.name, &name, &config.default_tool, path));
        }
        Ok(jobs)
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}
