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

use crate::core::job::{Job, JobError, Outcome};
use crate::core::runner::Runner;
use crate::error::{Error, Hint};
use crate::util::anyerror::Fault;

/// The number of jobs allowed to run at the same time.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Workers(usize);

impl Workers {
    /// Uses the host's available parallelism, or a single worker if it
    /// cannot be determined.
    pub fn available() -> Self {
        Self(std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl From<i64> for Workers {
    /// Any value below 1 is treated as 1.
    fn from(value: i64) -> Self {
        Self(value.max(1) as usize)
    }
}

/// Selects the jobs a user asked for by core and optional target name.
#[derive(Debug, PartialEq, Clone)]
pub struct Request {
    project: String,
    target: Option<String>,
}

impl Request {
    pub fn new(project: &str, target: Option<&str>) -> Self {
        Self {
            project: project.to_string(),
            target: target.map(|t| t.to_string()),
        }
    }

    /// Returns the positions of the matching jobs in list order.
    ///
    /// Errors if no job belongs to the core, or if the core exists but none of
    /// its jobs match the target.
    pub fn select(&self, jobs: &[Job]) -> Result<Vec<usize>, Error> {
        let of_project: Vec<usize> = jobs
            .iter()
            .enumerate()
            .filter(|(_, j)| j.is_project(&self.project))
            .map(|(i, _)| i)
            .collect();
        if of_project.is_empty() == true {
            return Err(Error::ProjectNotFound(self.project.clone(), Hint::JobsList));
        }
        match &self.target {
            None => Ok(of_project),
            Some(target) => {
                let matched: Vec<usize> = of_project
                    .into_iter()
                    .filter(|i| jobs[*i].get_target() == target)
                    .collect();
                match matched.is_empty() {
                    true => Err(Error::TargetNotFound(
                        self.project.clone(),
                        target.clone(),
                        Hint::JobsList,
                    )),
                    false => Ok(matched),
                }
            }
        }
    }
}

/// Runs the requested jobs one after another, streaming each job's output to
/// the console.
///
/// Returns `true` only if every selected job passed.
pub fn run_console(runner: &Runner, jobs: &mut [Job], request: &Request) -> Result<bool, Fault> {
    let selected = request.select(jobs)?;
    let mut all_passed = true;
    for i in selected {
        let outcome = runner.verify_to_console(&jobs[i])?;
        all_passed &= outcome.is_pass();
        jobs[i].complete(outcome)?;
    }
    Ok(all_passed)
}

/// Runs every job on a pool of `workers` threads and blocks until all of them
/// are complete.
///
/// Jobs are submitted in list order; each worker only touches its own job's
/// output directory.
pub fn run_batch(runner: &Runner, jobs: &mut [Job], workers: Workers) -> Result<(), Fault> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.get())
        .thread_name(|i| format!("fsva-worker-{}", i))
        .build()?;
    tracing::debug!(workers = workers.get(), jobs = jobs.len(), "starting batch");

    let mut slots: Vec<Option<Outcome>> = vec![None; jobs.len()];
    pool.scope_fifo(|s| {
        for (job, slot) in jobs.iter().zip(slots.iter_mut()) {
            s.spawn_fifo(move |_| *slot = Some(runner.verify_to_file(job)));
        }
    });

    for (job, slot) in jobs.iter_mut().zip(slots) {
        match slot {
            Some(outcome) => job.complete(outcome)?,
            None => {
                return Err(JobError::Incomplete(
                    job.get_project().to_string(),
                    job.get_target().to_string(),
                ))?
            }
        }
    }
    Ok(())
}
