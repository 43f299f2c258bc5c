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

//! Command-line frontend: argument parsing, REPL loop, and script
//! execution.
//!
//! This is the thinnest layer in the workspace: it wires `krusty-env`'s
//! [`Shell`] state, `krusty-builtin`'s registry, and `krusty-semantics`'
//! execution engine together and drives them from either stdin (an
//! interactive read-eval-print loop) or a script file.

mod args;

use krusty_builtin::register_all;
use krusty_env::bookmark::FileBookmarks;
use krusty_env::builtin::Divert;
use krusty_env::option::Option as ShellOption;
use krusty_env::variable::{PS1, PS2};
use krusty_env::Shell;
use krusty_semantics::{execute, expand_aliases, reap_background_jobs, ExecContext};
use nix::unistd::isatty;
use std::io::{self, BufRead, Write};
use std::os::unix::io::AsRawFd;
use std::process::ExitCode;

fn is_tty(fd: impl AsRawFd) -> bool {
    isatty(fd.as_raw_fd()).unwrap_or(false)
}

/// Default bookmark store location: a convention, not a contract — an
/// embedder wiring up its own [`krusty_env::bookmark::Bookmarks`] impl is
/// free to ignore this path entirely.
fn bookmarks_path() -> Option<std::path::PathBuf> {
    dirs::home_dir().map(|home| home.join(".krusty").join("bookmarks.json"))
}

fn setup_shell() -> Shell {
    let mut shell = Shell::new();
    register_all(&mut shell.builtins);
    if let Some(path) = bookmarks_path() {
        if let Ok(store) = FileBookmarks::load(path) {
            shell.bookmarks = Some(Box::new(store));
        }
    }
    shell
}

/// Reports a background job that finished since it was last announced
/// (each job reports `Done` exactly once), then drops it from the table.
fn announce_finished_jobs(shell: &mut Shell) {
    let done_ids: Vec<u32> = shell
        .jobs
        .iter()
        .filter(|j| j.status == krusty_env::job::JobStatus::Done && !j.reported)
        .map(|j| j.id)
        .collect();
    for id in done_ids {
        if let Some(job) = shell.jobs.get_mut(id) {
            eprintln!("{}", job.format('+'));
            job.reported = true;
        }
    }
    shell.jobs.reap_reported();
}

/// Parses, alias-expands, and runs one line of input, printing its output
/// and returning the [`Divert`] it requested, if any.
fn run_line(ctx: &mut ExecContext, shell: &mut Shell, line: &str) -> Option<Divert> {
    if line.trim().is_empty() {
        return None;
    }
    let parsed = match krusty_syntax::parse(line) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("krusty: {e}");
            shell.last_exit_code = krusty_syntax::error::ParseError::EXIT_CODE;
            return None;
        }
    };
    if parsed.is_empty() {
        return None;
    }
    let expanded = match expand_aliases(shell, parsed) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("krusty: {e}");
            shell.last_exit_code = 1;
            return None;
        }
    };
    let result = execute(ctx, shell, &expanded);
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    let _ = io::stdout().flush();
    shell.last_exit_code = result.exit_code;
    shell.last_duration_ms = result.duration.as_millis() as u64;
    reap_background_jobs(shell);
    result.divert
}

fn prompt(shell: &Shell, continuation: bool) -> String {
    let name = if continuation { PS2 } else { PS1 };
    shell.variables.get_str(name).unwrap_or("$ ").to_string()
}

/// Runs the interactive read-eval-print loop against stdin.
fn run_repl(shell: &mut Shell) -> i32 {
    let stdin_tty = is_tty(io::stdin());
    let stdout_tty = is_tty(io::stdout());
    shell.options.set(ShellOption::Monitor, if stdout_tty { krusty_env::option::On } else { krusty_env::option::Off });
    let mut ctx = ExecContext::new(true, stdin_tty, stdout_tty);
    let stdin = io::stdin();

    loop {
        announce_finished_jobs(shell);
        if stdin_tty {
            eprint!("{}", prompt(shell, false));
            let _ = io::stderr().flush();
        }

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line);
        match read {
            Ok(0) => {
                if shell.options.is_on(ShellOption::IgnoreEof) {
                    continue;
                }
                break;
            }
            Ok(_) => {}
            Err(_) => break,
        }

        if let Some(divert) = run_line(&mut ctx, shell, line.trim_end_matches('\n')) {
            match divert {
                Divert::Exit(code) => return code,
                _ => {}
            }
        }
    }
    shell.last_exit_code
}

/// Runs every line of a script file in sequence; each line is its own
/// top-level command, since the tokenizer
/// treats a bare newline as ordinary whitespace rather than a statement
/// separator (see DESIGN.md).
fn run_script(shell: &mut Shell, contents: &str, script_args: Vec<String>) -> i32 {
    shell.variables.positional_params.values = script_args;
    let mut ctx = ExecContext::new(false, false, false);
    for line in contents.lines() {
        if let Some(Divert::Exit(code)) = run_line(&mut ctx, shell, line) {
            return code;
        }
    }
    shell.last_exit_code
}

fn main() -> ExitCode {
    let parsed = args::parse(std::env::args().skip(1));
    let mut shell = setup_shell();

    let code = match parsed {
        args::Invocation::Command(text) => {
            let mut ctx = ExecContext::new(false, false, false);
            run_line(&mut ctx, &mut shell, &text);
            shell.last_exit_code
        }
        args::Invocation::Script { path, args } => match std::fs::read_to_string(&path) {
            Ok(contents) => run_script(&mut shell, &contents, args),
            Err(e) => {
                eprintln!("krusty: {path}: {e}");
                127
            }
        },
        args::Invocation::Interactive => run_repl(&mut shell),
    };

    ExitCode::from((code as u32 % 256) as u8)
}
