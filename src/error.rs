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

use colored::Colorize;
use std::{fmt::Display, path::PathBuf};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("command {0:?} not found on the execution path{1}")]
    ToolNotFound(String, Hint),
    #[error("failed to query the version of {0:?}: {1}")]
    ToolVersionFailed(String, LastError),
    #[error("workpath {0:?} does not exist")]
    WorkpathNotFound(PathBuf),
    #[error("no .core files found under the workpath {0:?}")]
    NoManifestsFound(PathBuf),
    #[error("no verification targets found under the workpath {0:?}{1}")]
    NoJobsFound(PathBuf, Hint),
    #[error("no core named {0:?} declares a verification target{1}")]
    ProjectNotFound(String, Hint),
    #[error("core {0:?} has no matching target {1:?}{2}")]
    TargetNotFound(String, String, Hint),
    #[error("failed to create output directory {0:?}: {1}")]
    OutputDirFailed(PathBuf, LastError),
    #[error("failed to write summary: {0}")]
    SummaryNotSaved(LastError),
    #[error("failed to compress output directory {0:?}: {1}")]
    CompressionFailed(PathBuf, LastError),
    #[error("failed to read configuration file {0:?}: {1}")]
    ConfigNotLoaded(PathBuf, LastError),
    #[error("at least one verification target failed")]
    VerificationFailed,
    #[error("at least one verification target failed; check summary for details at {0:?}")]
    RunFailed(PathBuf),
}

#[derive(Debug, PartialEq)]
pub struct LastError(pub String);

impl Display for LastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Error::lowerize(self.0.to_string()))
    }
}

impl Error {
    pub fn lowerize(s: String) -> String {
        // get the first word
        let first_word = match s.split_whitespace().next() {
            Some(w) => w,
            None => return s,
        };
        // retain punctuation if the first word is all-caps and longer than 1 character
        if first_word.len() > 1 && first_word.chars().any(|c| c.is_ascii_lowercase()) == false {
            s
        } else {
            s.char_indices()
                .map(|(i, c)| if i == 0 { c.to_ascii_lowercase() } else { c })
                .collect()
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Hint {
    InstallTool,
    JobsList,
    TargetNaming,
    ManifestErrors,
}

impl Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::InstallTool => {
                "install fusesoc or point the \"FSVA_COMMAND\" environment variable to it"
            }
            Self::JobsList => "use `fsva --list` to see the list of discovered verification targets",
            Self::TargetNaming => {
                "verification targets must be named \"tb\", start with \"tb_\", or end with \"_tb\""
            }
            Self::ManifestErrors => "fix the manifest errors reported above and try again",
        };
        write!(
            f,
            "\n\n{}: {}",
            "hint".green(),
            Error::lowerize(message.to_string())
        )
    }
}
