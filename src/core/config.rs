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
use serde_derive::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Optional configuration file read from the workpath root.
pub const CONFIG_FILE: &str = "fsva.toml";

/// Project-level settings. Every field is optional; the command line and
/// environment take priority over any value set here.
#[derive(Debug, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    command: Option<String>,
    outdir: Option<String>,
    numprocesses: Option<i64>,
    timeout: Option<u64>,
    #[serde(rename = "ghdl-vendors")]
    ghdl_vendors: Option<String>,
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

impl Config {
    /// Reads the configuration file at `root`, if one exists.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() == false {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::ConfigNotLoaded(path.clone(), LastError(e.to_string())))?;
        let cfg = Self::from_str(&contents)
            .map_err(|e| Error::ConfigNotLoaded(path.clone(), LastError(e.to_string())))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(cfg)
    }

    pub fn get_command(&self) -> Option<&String> {
        self.command.as_ref()
    }

    pub fn get_outdir(&self) -> Option<&String> {
        self.outdir.as_ref()
    }

    pub fn get_numprocesses(&self) -> Option<i64> {
        self.numprocesses
    }

    pub fn get_timeout(&self) -> Option<u64> {
        self.timeout
    }

    pub fn get_ghdl_vendors(&self) -> Option<&String> {
        self.ghdl_vendors.as_ref()
    }
}
