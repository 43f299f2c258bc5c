// This file is part of krusty, a POSIX-like command shell.
// Copyright (C) 2026 the krusty contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Job table.
//!
//! A [`Job`] tracks one shell-level unit of background/foreground work,
//! backed by a process group. [`JobTable`] owns the monotonic id counter and
//! the current/previous job designators.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::time::Instant;

/// Status of a job. Transitions only `Running ⇄ Stopped → Done`; `Done` is
/// terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobStatus {
    Running,
    Stopped,
    Done,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Running => "running",
            JobStatus::Stopped => "stopped",
            JobStatus::Done => "done",
        })
    }
}

/// A single tracked job.
#[derive(Clone, Debug)]
pub struct Job {
    pub id: u32,
    pub pgid: Pid,
    pub leader_pid: Pid,
    pub command: String,
    pub status: JobStatus,
    pub background: bool,
    pub exit_code: Option<i32>,
    pub start_time: Instant,
    /// Set once this job has been reported to the user at least once, so
    /// the next prompt's "Done" announcement for it is not repeated.
    pub reported: bool,
}

impl Job {
    /// Renders the one-line form `jobs`/`fg`/`bg` print, e.g.
    /// `[1]+ running sleep 5 &`.
    pub fn format(&self, marker: char) -> String {
        let status = match self.status {
            JobStatus::Running => "running".to_string(),
            JobStatus::Stopped => "stopped".to_string(),
            JobStatus::Done => match self.exit_code {
                Some(0) | None => "done".to_string(),
                Some(code) => format!("done({code})"),
            },
        };
        let suffix = if self.background && self.status != JobStatus::Done {
            " &"
        } else {
            ""
        };
        format!("[{}]{} {} {}{}", self.id, marker, status, self.command, suffix)
    }
}

/// Error returned by job-control operations that reference a non-existent
/// job.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no such job")]
pub struct NoSuchJob;

/// How a job was designated in a command like `fg %2` or `wait -`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobDesignator {
    Id(u32),
    Current,
    Previous,
}

/// Parses a job designator string: `%N`, `%+`/`+`, `%-`/`-`, or a bare `N`.
pub fn parse_designator(text: &str) -> Option<JobDesignator> {
    let body = text.strip_prefix('%').unwrap_or(text);
    match body {
        "+" | "" => Some(JobDesignator::Current),
        "-" => Some(JobDesignator::Previous),
        _ => body.parse().ok().map(JobDesignator::Id),
    }
}

/// The shell's job table.
#[derive(Clone, Debug, Default)]
pub struct JobTable {
    next_id: u32,
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable {
            next_id: 1,
            jobs: Vec::new(),
        }
    }

    /// Registers a new job with the next monotonic id: every background
    /// command registers exactly one job whose id is greater than all
    /// previously assigned ids.
    pub fn insert(&mut self, pgid: Pid, leader_pid: Pid, command: String, background: bool) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            pgid,
            leader_pid,
            command,
            status: JobStatus::Running,
            background,
            exit_code: None,
            start_time: Instant::now(),
            reported: false,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }

    pub fn find_by_pgid_mut(&mut self, pgid: Pid) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.pgid == pgid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    /// The most recent non-`Done` job.
    pub fn current(&self) -> Option<&Job> {
        self.jobs
            .iter()
            .rev()
            .find(|j| j.status != JobStatus::Done)
    }

    /// The second most recent non-`Done` job.
    pub fn previous(&self) -> Option<&Job> {
        let current_id = self.current().map(|j| j.id);
        self.jobs
            .iter()
            .rev()
            .filter(|j| j.status != JobStatus::Done && Some(j.id) != current_id)
            .next()
    }

    /// Resolves a designator to a job id.
    pub fn resolve(&self, designator: JobDesignator) -> Result<u32, NoSuchJob> {
        match designator {
            JobDesignator::Id(id) => {
                if self.get(id).is_some() {
                    Ok(id)
                } else {
                    Err(NoSuchJob)
                }
            }
            JobDesignator::Current => self.current().map(|j| j.id).ok_or(NoSuchJob),
            JobDesignator::Previous => self.previous().map(|j| j.id).ok_or(NoSuchJob),
        }
    }

    /// Removes a `Done` job from the table (`disown`, or reaping at the next
    /// prompt after it has been reported once).
    pub fn remove(&mut self, id: u32) -> Option<Job> {
        let pos = self.jobs.iter().position(|j| j.id == id)?;
        Some(self.jobs.remove(pos))
    }

    /// Drops every `Done` job that has already been reported once, as the
    /// REPL does between prompts.
    pub fn reap_reported(&mut self) {
        self.jobs
            .retain(|j| !(j.status == JobStatus::Done && j.reported));
    }
}

/// Process-group signal delivery primitives.
///
/// These are free functions, not `JobTable` methods, because they talk to
/// the operating system rather than shell-owned state; `krusty-semantics`
/// calls them when wiring up a pipeline's process group, and
/// `krusty-builtin`'s `fg`/`bg`/`kill`/`suspend` call them directly on a
/// job looked up from `shell.jobs`.
pub mod control {
    use super::*;

    /// Sends SIGTSTP to a job's process group (`suspend(id)`).
    pub fn suspend(pgid: Pid) -> nix::Result<()> {
        signal::kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGTSTP)
    }

    /// Sends SIGCONT to a job's process group (`resume_background(id)`).
    pub fn resume(pgid: Pid) -> nix::Result<()> {
        signal::kill(Pid::from_raw(-pgid.as_raw()), Signal::SIGCONT)
    }

    /// Delivers an arbitrary signal to a job's process group
    /// (`terminate(id, sig)`).
    pub fn signal_group(pgid: Pid, sig: Signal) -> nix::Result<()> {
        signal::kill(Pid::from_raw(-pgid.as_raw()), sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut table = JobTable::new();
        let a = table.insert(Pid::from_raw(100), Pid::from_raw(100), "sleep 1".into(), true);
        let b = table.insert(Pid::from_raw(200), Pid::from_raw(200), "sleep 2".into(), true);
        assert!(b > a);
        table.remove(a);
        let c = table.insert(Pid::from_raw(300), Pid::from_raw(300), "sleep 3".into(), true);
        assert!(c > b);
    }

    #[test]
    fn current_and_previous_track_most_recent_non_done() {
        let mut table = JobTable::new();
        let a = table.insert(Pid::from_raw(1), Pid::from_raw(1), "a".into(), true);
        let b = table.insert(Pid::from_raw(2), Pid::from_raw(2), "b".into(), true);
        assert_eq!(table.current().unwrap().id, b);
        assert_eq!(table.previous().unwrap().id, a);
    }

    #[test]
    fn done_job_is_skipped_by_current() {
        let mut table = JobTable::new();
        let a = table.insert(Pid::from_raw(1), Pid::from_raw(1), "a".into(), true);
        let b = table.insert(Pid::from_raw(2), Pid::from_raw(2), "b".into(), true);
        table.get_mut(b).unwrap().status = JobStatus::Done;
        assert_eq!(table.current().unwrap().id, a);
    }

    #[test]
    fn designator_parsing() {
        assert_eq!(parse_designator("%3"), Some(JobDesignator::Id(3)));
        assert_eq!(parse_designator("%+"), Some(JobDesignator::Current));
        assert_eq!(parse_designator("-"), Some(JobDesignator::Previous));
        assert_eq!(parse_designator("7"), Some(JobDesignator::Id(7)));
    }

    #[test]
    fn resolve_unknown_id_is_no_such_job() {
        let table = JobTable::new();
        assert_eq!(table.resolve(JobDesignator::Id(99)), Err(NoSuchJob));
    }

    #[test]
    fn fg_on_done_job_reports_no_such_job() {
        let mut table = JobTable::new();
        let a = table.insert(Pid::from_raw(1), Pid::from_raw(1), "a".into(), true);
        table.get_mut(a).unwrap().status = JobStatus::Done;
        table.reap_reported();
        // Not yet reported, so still resolvable once; simulate reporting then reaping.
        table.get_mut(a).unwrap().reported = true;
        table.reap_reported();
        assert_eq!(table.resolve(JobDesignator::Id(a)), Err(NoSuchJob));
    }
}
