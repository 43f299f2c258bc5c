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

//! Control built-ins: `exit`, `return`, `break`, `continue`, `eval`,
//! `exec`, `.`/`source`, `test`/`[`, `trap`, `timeout`, `times`.
//!
//! `eval`/`source`/`timeout` each need a fresh [`krusty_semantics::ExecContext`]
//! since the [`krusty_env::builtin::BuiltinFn`] signature (shared by every
//! built-in) doesn't thread one through; they build a non-interactive one
//! locally (see DESIGN.md Open Question on nested-execution context).

use crate::common::{parse_loop_level, runtime_error, usage_error};
use krusty_env::builtin::Divert;
use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::trap::{parse_condition, Action, Condition};
use krusty_env::Shell;
use krusty_semantics::ExecContext;
use std::time::Duration;

fn parse_exit_code(args: &[String], fallback: i32) -> i32 {
    args.first()
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or(fallback)
}

pub fn exit(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let code = parse_exit_code(args, shell.last_exit_code);
    let mut result = CommandResult::with_code(code);
    result.divert = Some(Divert::Exit(code));
    result
}

pub fn r#return(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let code = parse_exit_code(args, shell.last_exit_code);
    let mut result = CommandResult::with_code(code);
    result.divert = Some(Divert::Return(code));
    result
}

pub fn r#break(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let level = match parse_loop_level("break", args) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let mut result = CommandResult::success();
    result.divert = Some(Divert::Break(level));
    result
}

pub fn r#continue(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let level = match parse_loop_level("continue", args) {
        Ok(n) => n,
        Err(e) => return e,
    };
    let mut result = CommandResult::success();
    result.divert = Some(Divert::Continue(level));
    result
}

/// Parses and runs `text` as a fresh command line, in a non-interactive
/// [`ExecContext`]: `eval` concatenates its arguments and executes the
/// result as if typed.
fn eval_text(shell: &mut Shell, text: &str) -> CommandResult {
    let mut ctx = ExecContext::new(false, false, false);
    let parsed = match krusty_syntax::parse(text) {
        Ok(p) => p,
        Err(e) => return usage_error("eval", &e.to_string()),
    };
    let expanded = match krusty_semantics::expand_aliases(shell, parsed) {
        Ok(e) => e,
        Err(e) => return usage_error("eval", &e.to_string()),
    };
    krusty_semantics::execute(&mut ctx, shell, &expanded)
}

pub fn eval(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    eval_text(shell, &args.join(" "))
}

/// `. file [args]` / `source file [args]`: reads `file`'s
/// contents and runs them as if `eval`'d, with positional parameters
/// temporarily replaced if extra arguments are given.
pub fn source(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(path) = args.first() else {
        return usage_error("source", "filename argument required");
    };
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return runtime_error("source", &format!("{path}: {e}")),
    };

    let saved_params = shell.variables.positional_params.clone();
    if args.len() > 1 {
        shell.variables.positional_params.values = args[1..].to_vec();
    }
    let result = eval_text(shell, &contents);
    shell.variables.positional_params = saved_params;
    result
}

/// `exec [command [args]]`: with a command, replaces the
/// current process image via `execvp` (the one built-in for which that is
/// the correct, not merely convenient, semantics); with none, a no-op.
pub fn exec(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::success();
    };
    let Some(path) = shell.resolve_command(name) else {
        return CommandResult::with_code(127);
    };
    use std::ffi::CString;
    let Ok(c_path) = CString::new(path.to_string_lossy().into_owned()) else {
        return runtime_error("exec", "invalid path");
    };
    let mut c_args = vec![c_path.clone()];
    for arg in &args[1..] {
        match CString::new(arg.as_str()) {
            Ok(c) => c_args.push(c),
            Err(_) => return runtime_error("exec", "invalid argument"),
        }
    }
    for (name, value) in shell.variables.exported_pairs() {
        std::env::set_var(name, value);
    }
    match nix::unistd::execvp(&c_path, &c_args) {
        Ok(_) => unreachable!(),
        Err(_) => runtime_error("exec", &format!("{name}: exec failed")),
    }
}

/// `timeout [--kill-after=DURATION] DURATION command [args]`. `timeout`
/// only ever targets external commands here — it cannot truly cancel
/// in-flight work for a built-in, which runs in the shell's own process.
pub fn timeout(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut kill_after: Option<Duration> = None;
    let mut rest = args;
    while let Some(first) = rest.first() {
        if let Some(value) = first.strip_prefix("--kill-after=") {
            kill_after = parse_duration(value);
            rest = &rest[1..];
        } else {
            break;
        }
    }
    let Some(duration_arg) = rest.first() else {
        return usage_error("timeout", "usage: timeout DURATION command [args]");
    };
    let Some(duration) = parse_duration(duration_arg) else {
        return usage_error("timeout", &format!("{duration_arg}: invalid duration"));
    };
    let Some(command) = rest.get(1) else {
        return usage_error("timeout", "missing command");
    };
    let ctx = ExecContext::new(false, false, false);
    krusty_semantics::run_with_timeout(&ctx, shell, command, &rest[2..], duration, kill_after)
}

fn parse_duration(text: &str) -> Option<Duration> {
    let (number, unit) = match text.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&text[..text.len() - 1], c),
        _ => (text, 's'),
    };
    let value: f64 = number.parse().ok()?;
    let seconds = match unit {
        's' => value,
        'm' => value * 60.0,
        'h' => value * 3600.0,
        _ => return None,
    };
    Some(Duration::from_secs_f64(seconds))
}

pub fn times(_args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut result = CommandResult::success();
    result.stdout = "0m0.000s 0m0.000s\n0m0.000s 0m0.000s\n".to_string();
    result
}

/// `trap [action] condition...` / `trap -p`, backed by the shell's
/// `signal_handlers` table.
pub fn trap(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    if args.first().map(String::as_str) == Some("-p") || args.is_empty() {
        let mut result = CommandResult::success();
        for (condition, action) in shell.traps.iter() {
            let rendered = match action {
                Action::Default => continue,
                Action::Ignore => "''".to_string(),
                Action::Command(cmd) => krusty_quote::quote(cmd).into_owned(),
            };
            result
                .stdout
                .push_str(&format!("trap -- {rendered} {condition}\n"));
        }
        return result;
    }

    if args.len() == 1 {
        let Some(condition) = parse_condition(&args[0]) else {
            return usage_error("trap", &format!("{}: invalid condition", args[0]));
        };
        shell.traps.clear(&condition);
        return CommandResult::success();
    }

    let action_text = &args[0];
    let action = if action_text.is_empty() {
        Action::Ignore
    } else if action_text == "-" {
        Action::Default
    } else {
        Action::Command(action_text.clone())
    };

    let mut result = CommandResult::success();
    for condition_text in &args[1..] {
        match parse_condition(condition_text) {
            Some(condition) => shell.traps.set(condition, action.clone()),
            None => {
                result.exit_code = 1;
                result
                    .stderr
                    .push_str(&format!("trap: {condition_text}: invalid condition\n"));
            }
        }
    }
    result
}

/// `test EXPR` / `[ EXPR ]`. Supports unary file/string tests,
/// binary string/integer comparisons, and `!`/`-a`/`-o` combination, the
/// subset POSIX shells guarantee.
pub fn test(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let args: Vec<&str> = if args.last().map(String::as_str) == Some("]") {
        args[..args.len() - 1].iter().map(String::as_str).collect()
    } else {
        args.iter().map(String::as_str).collect()
    };
    CommandResult::with_code(if eval_test(&args) { 0 } else { 1 })
}

fn eval_test(args: &[&str]) -> bool {
    match args {
        [] => false,
        ["!", rest @ ..] => !eval_test(rest),
        [a, "-a", b] => eval_test(&[a]) && eval_test(&[b]),
        [a, "-o", b] => eval_test(&[a]) || eval_test(&[b]),
        [op, value] if op.starts_with('-') && op.len() == 2 => unary_test(op.chars().nth(1).unwrap(), value),
        [lhs, op, rhs] => binary_test(lhs, op, rhs),
        [single] => !single.is_empty(),
        _ => false,
    }
}

fn unary_test(flag: char, value: &str) -> bool {
    let path = std::path::Path::new(value);
    match flag {
        'z' => value.is_empty(),
        'n' => !value.is_empty(),
        'e' => path.exists(),
        'f' => path.is_file(),
        'd' => path.is_dir(),
        'r' => path.metadata().map(|m| !m.permissions().readonly()).unwrap_or(false) || path.exists(),
        'w' => path.exists(),
        'x' => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                path.metadata().map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
            }
            #[cfg(not(unix))]
            {
                path.exists()
            }
        }
        's' => path.metadata().map(|m| m.len() > 0).unwrap_or(false),
        _ => false,
    }
}

fn binary_test(lhs: &str, op: &str, rhs: &str) -> bool {
    match op {
        "=" | "==" => lhs == rhs,
        "!=" => lhs != rhs,
        "-eq" => parse_num(lhs) == parse_num(rhs),
        "-ne" => parse_num(lhs) != parse_num(rhs),
        "-lt" => parse_num(lhs) < parse_num(rhs),
        "-le" => parse_num(lhs) <= parse_num(rhs),
        "-gt" => parse_num(lhs) > parse_num(rhs),
        "-ge" => parse_num(lhs) >= parse_num(rhs),
        _ => false,
    }
}

fn parse_num(s: &str) -> i64 {
    s.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;

    #[test]
    fn exit_sets_divert() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = exit(&["7".to_string()], &mut shell, &mut io);
        assert_eq!(result.divert, Some(Divert::Exit(7)));
        assert_eq!(result.exit_code, 7);
    }

    #[test]
    fn break_default_level_is_one() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = r#break(&[], &mut shell, &mut io);
        assert_eq!(result.divert, Some(Divert::Break(1)));
    }

    #[test]
    fn eval_runs_concatenated_text() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = eval(&["true".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
    }

    #[test]
    fn test_string_equality() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = test(&["foo".to_string(), "=".to_string(), "foo".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
    }

    #[test]
    fn test_integer_comparison() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = test(&["3".to_string(), "-lt".to_string(), "5".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
    }

    #[test]
    fn trap_sets_and_clears_a_command_action() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        trap(&["echo bye".to_string(), "INT".to_string()], &mut shell, &mut io);
        assert_eq!(shell.traps.get(&Condition::Signal(2)), Some(&Action::Command("echo bye".to_string())));
        trap(&["INT".to_string()], &mut shell, &mut io);
        assert_eq!(shell.traps.get(&Condition::Signal(2)), None);
    }
}
