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

//! Job control built-ins: `jobs`, `fg`, `bg`, `kill`, `wait`, `disown`,
//! `suspend`.

use crate::common::{parse_flags, runtime_error, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::job::{self, control, JobDesignator, JobStatus};
use krusty_env::result::CommandResult;
use krusty_env::signal;
use krusty_env::Shell;
use nix::unistd::Pid;

fn designator_or_current(arg: Option<&String>) -> Option<JobDesignator> {
    match arg {
        Some(text) => job::parse_designator(text),
        None => Some(JobDesignator::Current),
    }
}

pub fn jobs(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, _) = match parse_flags("jobs", args, "l", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let long = flags.iter().any(|(c, _)| *c == 'l');
    let current_id = shell.jobs.current().map(|j| j.id);
    let previous_id = shell.jobs.previous().map(|j| j.id);

    let mut result = CommandResult::success();
    for j in shell.jobs.iter() {
        let marker = if Some(j.id) == current_id {
            '+'
        } else if Some(j.id) == previous_id {
            '-'
        } else {
            ' '
        };
        if long {
            result
                .stdout
                .push_str(&format!("{}  {}\n", j.pgid.as_raw(), j.format(marker)));
        } else {
            result.stdout.push_str(&format!("{}\n", j.format(marker)));
        }
    }
    result
}

pub fn fg(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(designator) = designator_or_current(args.first()) else {
        return usage_error("fg", "invalid job designator");
    };
    let id = match shell.jobs.resolve(designator) {
        Ok(id) => id,
        Err(e) => return runtime_error("fg", &e.to_string()),
    };
    let Some(j) = shell.jobs.get_mut(id) else {
        return runtime_error("fg", "no such job");
    };
    let pgid = j.pgid;
    let command = j.command.clone();
    j.status = JobStatus::Running;
    j.background = false;
    if control::resume(pgid).is_err() {
        return runtime_error("fg", "failed to resume job");
    }
    let mut result = CommandResult::success();
    result.stdout = format!("{command}\n");
    result
}

pub fn bg(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(designator) = designator_or_current(args.first()) else {
        return usage_error("bg", "invalid job designator");
    };
    let id = match shell.jobs.resolve(designator) {
        Ok(id) => id,
        Err(e) => return runtime_error("bg", &e.to_string()),
    };
    let Some(j) = shell.jobs.get_mut(id) else {
        return runtime_error("bg", "no such job");
    };
    let pgid = j.pgid;
    j.status = JobStatus::Running;
    if control::resume(pgid).is_err() {
        return runtime_error("bg", "failed to resume job");
    }
    CommandResult::success()
}

/// `kill [-SIG|-s SIG] %job|pid...` / `kill -l`.
pub fn kill(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    if args.first().map(String::as_str) == Some("-l") {
        let mut result = CommandResult::success();
        for info in signal::TABLE {
            result.stdout.push_str(&format!("{} {}\n", info.number, info.name));
        }
        return result;
    }

    let mut sig = nix::sys::signal::Signal::SIGTERM;
    let mut rest = args;
    if let Some(first) = rest.first() {
        if let Some(name) = first.strip_prefix("-s") {
            let name = if name.is_empty() { rest.get(1).map(String::as_str).unwrap_or("") } else { name };
            match signal::by_name(name).and_then(|i| signal::to_nix_signal(i.number)) {
                Some(s) => sig = s,
                None => return usage_error("kill", &format!("{name}: unknown signal")),
            }
            rest = if first == "-s" { &rest[2..] } else { &rest[1..] };
        } else if let Some = first.strip_prefix('-') {
            match signal::by_name
                .or_else(|| spec.parse::<i32>().ok().and_then(signal::by_number))
                .and_then(|i| signal::to_nix_signal(i.number))
            {
                Some(s) => {
                    sig = s;
                    rest = &rest[1..];
                }
                None => {}
            }
        }
    }

    let mut result = CommandResult::success();
    for target in rest {
        if let Some(designator) = target.strip_prefix('%').and_then(job::parse_designator) {
            match shell.jobs.resolve(designator) {
                Ok(id) => {
                    let pgid = shell.jobs.get(id).unwrap().pgid;
                    if control::signal_group(pgid, sig).is_err() {
                        result.exit_code = 1;
                        result.stderr.push_str(&format!("kill: ({target}): failed to signal\n"));
                    }
                }
                Err(_) => {
                    result.exit_code = 1;
                    result.stderr.push_str(&format!("kill: {target}: no such job\n"));
                }
            }
        } else if let Ok(pid) = target.parse::<i32>() {
            if nix::sys::signal::kill(Pid::from_raw(pid), sig).is_err() {
                result.exit_code = 1;
                result.stderr.push_str(&format!("kill: ({target}) - no such process\n"));
            }
        } else {
            result.exit_code = 1;
            result.stderr.push_str(&format!("kill: {target}: arguments must be process or job IDs\n"));
        }
    }
    result
}

/// `wait [%job|pid...]`: polls until named jobs (or every
/// job, if none named) finish. Runs on the caller's thread without its own
/// reap loop since `krusty-semantics::reap_background_jobs` already does
/// that; `wait` just blocks until the table reflects `Done`.
pub fn wait(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let targets: Vec<u32> = if args.is_empty() {
        shell.jobs.iter().map(|j| j.id).collect()
    } else {
        let mut ids = Vec::new();
        for arg in args {
            let designator = arg
                .strip_prefix('%')
                .and_then(job::parse_designator)
                .or_else(|| job::parse_designator(arg));
            match designator.and_then(|d| shell.jobs.resolve(d).ok()) {
                Some(id) => ids.push(id),
                None => return runtime_error("wait", &format!("{arg}: no such job")),
            }
        }
        ids
    };

    let mut last_code = 0;
    loop {
        krusty_semantics::reap_background_jobs(shell);
        let all_done = targets.iter().all(|id| {
            shell
                .jobs
                .get(*id)
                .map(|j| j.status == JobStatus::Done)
                .unwrap_or(true)
        });
        if all_done {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    for id in &targets {
        if let Some(j) = shell.jobs.get(*id) {
            last_code = j.exit_code.unwrap_or(0);
        }
    }
    CommandResult::with_code(last_code)
}

pub fn disown(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(designator) = designator_or_current(args.first()) else {
        return usage_error("disown", "invalid job designator");
    };
    match shell.jobs.resolve(designator) {
        Ok(id) => {
            shell.jobs.remove(id);
            shell.background_pids.remove(&id);
            CommandResult::success()
        }
        Err(e) => runtime_error("disown", &e.to_string()),
    }
}

pub fn suspend(_args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let pid = nix::unistd::getpid();
    let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTSTP);
    CommandResult::success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;

    #[test]
    fn jobs_lists_current_marker() {
        let mut shell = Shell::new();
        shell.jobs.insert(Pid::from_raw(1), Pid::from_raw(1), "sleep 1".into(), true);
        let mut io = BufferIo::new();
        let result = jobs(&[], &mut shell, &mut io);
        assert!(result.stdout.contains("sleep 1"));
        assert!(result.stdout.contains('+'));
    }

    #[test]
    fn kill_dash_l_lists_signals() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = kill(&["-l".to_string()], &mut shell, &mut io);
        assert!(result.stdout.contains("9 KILL"));
    }

    #[test]
    fn disown_removes_from_job_table() {
        let mut shell = Shell::new();
        let id = shell.jobs.insert(Pid::from_raw(1), Pid::from_raw(1), "sleep 1".into(), true);
        let mut io = BufferIo::new();
        let result = disown(&[format!("%{id}")], &mut shell, &mut io);
        assert!(result.is_success());
        assert!(shell.jobs.get(id).is_none());
    }

    #[test]
    fn wait_with_unknown_job_is_runtime_error() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = wait(&["%9".to_string()], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }
}
