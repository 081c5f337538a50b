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

use crate::commands::helps::fsva;
use crate::core::backend::{BackendSettings, Registry};
use crate::core::catalog::Catalog;
use crate::core::config::Config;
use crate::core::context::{Context, DEFAULT_OUTDIR};
use crate::core::invocation::Tool;
use crate::core::job::Job;
use crate::core::runner::Runner;
use crate::core::scheduler::{self, Request, Workers};
use crate::core::summary::{Summary, SUMMARY_FILE};
use crate::error::{Error, LastError};
use crate::util::anyerror::Fault;
use crate::util::compress;
use crate::util::environment::{self, FSVA_COMMAND};
use crate::util::logging;
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cliproc::{cli, proc, stage::*};
use cliproc::{Arg, Cli, Command, Help};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, PartialEq)]
pub struct Fsva {
    version: bool,
    list: bool,
    compress: bool,
    verbose: bool,
    workpath: Option<PathBuf>,
    outdir: Option<String>,
    numprocesses: Option<i64>,
    timeout: Option<u64>,
    project: Option<String>,
    target: Option<String>,
}

impl Command for Fsva {
    fn interpret<'c>(cli: &'c mut Cli<Memory>) -> cli::Result<Self> {
        cli.help(Help::with(fsva::HELP))?;
        Ok(Fsva {
            // Flags
            version: cli.check(Arg::flag("version"))?,
            list: cli.check(Arg::flag("list"))?,
            compress: cli.check(Arg::flag("compress").switch('c'))?,
            verbose: cli.check(Arg::flag("verbose"))?,
            // Options
            workpath: cli.get(Arg::option("workpath").switch('w').value("path"))?,
            outdir: cli.get(Arg::option("outdir").switch('o').value("name"))?,
            numprocesses: cli.get(Arg::option("numprocesses").switch('n').value("n"))?,
            timeout: cli.get(Arg::option("timeout").value("secs"))?,
            // Positionals
            project: cli.get(Arg::positional("project"))?,
            target: cli.get(Arg::positional("target"))?,
        })
    }

    fn execute(self) -> proc::Result {
        if let Err(e) = self.run() {
            eprintln!("{} {}", "error:".red().bold(), e);
            let _ = std::io::stdout().flush();
            std::process::exit(1);
        }
        Ok(())
    }
}

impl Fsva {
    fn run(&self) -> Result<(), Fault> {
        logging::init_tracing(self.verbose);

        // prioritize version information
        if self.version == true {
            println!("fsva {}", VERSION);
            return Ok(());
        }

        let workpath = self.workpath.clone().unwrap_or(PathBuf::from("."));
        let context = Context::new(&workpath)?;
        let config = Config::load(context.get_workpath())?;

        let context = context
            .outdir(self.resolve_outdir(&config))
            .console(self.project.is_some());

        let catalog = Catalog::discover(context.get_workpath())?;

        if self.list == true {
            print!("{}", catalog.list_jobs());
            return Ok(());
        }

        let tool = Self::resolve_tool(environment::read(FSVA_COMMAND), &config)?;
        let version = environment::check_tool(&tool)?;
        println!("info: found {} version {}", tool, version);

        let timeout = self.resolve_timeout(&config);
        let backends = Registry::new(
            BackendSettings::new().ghdl_vendors(config.get_ghdl_vendors().cloned()),
        );

        let outpath = context.create_outpath()?;
        let runner = Runner::new(tool, context.get_workpath(), &outpath)
            .backends(backends)
            .timeout(timeout);
        let mut jobs = catalog.into_jobs();

        match &self.project {
            Some(project) => {
                let request = Request::new(project, self.target.as_deref());
                match scheduler::run_console(&runner, &mut jobs, &request)? {
                    true => Ok(()),
                    false => Err(Error::VerificationFailed)?,
                }
            }
            None => {
                scheduler::run_batch(&runner, &mut jobs, self.resolve_workers(&config))?;
                self.report(&context, &outpath, &jobs)
            }
        }
    }

    /// Determines the verification command; the environment's value `env`
    /// overrides the configuration file.
    fn resolve_tool(env: Option<String>, config: &Config) -> Result<Tool, Fault> {
        match env.or(config.get_command().cloned()) {
            Some(cmd) => Ok(Tool::from_str(&cmd)?),
            None => Ok(Tool::default()),
        }
    }

    /// Options given on the command line override the configuration file.
    fn resolve_outdir<'a>(&'a self, config: &'a Config) -> &'a str {
        self.outdir
            .as_ref()
            .or(config.get_outdir())
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_OUTDIR)
    }

    fn resolve_workers(&self, config: &Config) -> Workers {
        self.numprocesses
            .or(config.get_numprocesses())
            .map(Workers::from)
            .unwrap_or_else(Workers::available)
    }

    /// A limit of zero seconds disables the timeout.
    fn resolve_timeout(&self, config: &Config) -> Option<Duration> {
        self.timeout
            .or(config.get_timeout())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Writes the summary of a completed batch run and compresses the run
    /// directory when requested and every job passed.
    fn report(&self, context: &Context, outpath: &Path, jobs: &[Job]) -> Result<(), Fault> {
        let summary = Summary::new(jobs, context.elapsed(), *context.get_started())?;
        summary.publish(outpath)?;
        tracing::info!(elapsed = ?context.elapsed(), "run complete");

        if summary.all_passed() == false {
            return Err(Error::RunFailed(outpath.join(SUMMARY_FILE)))?;
        }
        if self.compress == true {
            let archive = compress::archive_run(outpath)
                .map_err(|e| Error::CompressionFailed(outpath.to_path_buf(), LastError(e.to_string())))?;
            println!("info: compressed output to {}", archive.display());
        }
        Ok(())
    }
}
