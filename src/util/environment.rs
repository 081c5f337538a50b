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

use crate::core::invocation::Tool;
use crate::error::{Error, Hint, LastError};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Overrides the verification command (may include leading arguments).
pub const FSVA_COMMAND: &str = "FSVA_COMMAND";

/// Filter directives for internal diagnostics.
pub const FSVA_LOG: &str = "FSVA_LOG";

/// Reads an environment variable, treating an empty value as unset.
pub fn read(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() == false => Some(v),
        _ => None,
    }
}

/// Locates the tool's program on the execution path.
pub fn locate(tool: &Tool) -> Result<PathBuf, Error> {
    which::which(tool.get_program())
        .map_err(|_| Error::ToolNotFound(tool.get_program().to_string(), Hint::InstallTool))
}

/// Asks the tool for its version, returning the first line it reports.
pub fn query_version(tool: &Tool) -> Result<String, Error> {
    let failed = |e: String| Error::ToolVersionFailed(tool.to_string(), LastError(e));
    let output = Command::new(tool.get_program())
        .args(tool.get_leading())
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| failed(e.to_string()))?;
    if output.status.success() == false {
        return Err(failed(format!("exited with {}", output.status)));
    }
    // some tools report their version on standard error
    let text = match output.stdout.is_empty() {
        true => output.stderr,
        false => output.stdout,
    };
    Ok(String::from_utf8_lossy(&text)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string())
}

/// Verifies the tool is available before any job runs and returns its version.
pub fn check_tool(tool: &Tool) -> Result<String, Error> {
    let path = locate(tool)?;
    tracing::debug!(path = %path.display(), "located tool");
    query_version(tool)
}
