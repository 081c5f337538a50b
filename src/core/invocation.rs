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
use crate::core::job::Job;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default program for running verification targets.
pub const DEFAULT_TOOL: &str = "fusesoc";

/// The external verification command, possibly with leading arguments
/// (`python3 -m fusesoc`).
#[derive(Debug, PartialEq, Clone)]
pub struct Tool {
    program: String,
    leading: Vec<String>,
}

impl Tool {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            leading: Vec::new(),
        }
    }

    /// Sets the arguments placed between the program and the base arguments.
    pub fn leading(mut self, args: &[&str]) -> Self {
        self.leading = args.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_leading(&self) -> &Vec<String> {
        &self.leading
    }
}

impl Default for Tool {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

impl std::str::FromStr for Tool {
    type Err = ToolError;

    /// Splits a command line on whitespace into a program and its leading
    /// arguments.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        match words.next() {
            Some(program) => Ok(Self {
                program: program.to_string(),
                leading: words.map(|w| w.to_string()).collect(),
            }),
            None => Err(ToolError::Empty),
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        self.leading.iter().try_for_each(|a| write!(f, " {}", a))
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ToolError {
    #[error("command cannot be empty")]
    Empty,
}

/// A fully-resolved command line for verifying one job.
///
/// The argument list is built fresh for every job and never modified
/// afterward.
#[derive(Debug, PartialEq, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl Invocation {
    /// Builds the command line from the job identity, the backend's options,
    /// and the job's output directory.
    ///
    /// The base arguments are always, in order:
    /// `--cores-root <root> run --no-export --target <target> <core>`.
    pub fn build(tool: &Tool, root: &Path, job: &Job, backends: &Registry, outdir: &Path) -> Self {
        let base = [
            String::from("--cores-root"),
            root.display().to_string(),
            String::from("run"),
            String::from("--no-export"),
            String::from("--target"),
            job.get_target().to_string(),
            job.get_project().to_string(),
        ];
        let args = tool
            .get_leading()
            .iter()
            .cloned()
            .chain(base)
            .chain(backends.options(job.get_tool(), outdir))
            .collect();
        Self {
            program: tool.get_program().to_string(),
            args,
            cwd: root.to_path_buf(),
        }
    }

    pub fn get_program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &Vec<String> {
        &self.args
    }

    /// Creates the process builder, running from the cores root.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        cmd
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.program,
            self.args
                .iter()
                .fold(String::new(), |x, y| x + "\"" + y + "\" ")
                .trim_end()
        )
    }
}
