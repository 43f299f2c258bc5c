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

//! Shared flag parsing and error-result helpers used by every built-in.
//!
//! `krusty-builtin` has no `clap` dependency — built-ins parse POSIX-style
//! short-option clusters by hand, in a flat "flags-then-operands" shape (no
//! long options, no per-occurrence bookkeeping) since none of the built-ins
//! here need more than that.

use krusty_env::result::CommandResult;

/// Parses `args` against `known` (every short flag letter this built-in
/// accepts) and `with_value` (the subset of those that consume the next
/// word as a value, e.g. `-o pipefail`). Stops at `--` or the first
/// argument that isn't `-`-prefixed, the rest becoming operands.
///
/// Returns `(flag, value)` pairs in encounter order plus the operand list.
/// An unknown flag or a value-flag missing its value yields a usage-error
/// `CommandResult` the caller can return directly.
pub fn parse_flags(
    prog: &str,
    args: &[String],
    known: &str,
    with_value: &str,
) -> Result<(Vec<(char, Option<String>)>, Vec<String>), CommandResult> {
    let mut flags = Vec::new();
    let mut operands = Vec::new();
    let mut iter = args.iter().peekable();
    let mut seen_double_dash = false;

    while let Some(arg) = iter.next() {
        if seen_double_dash {
            operands.push(arg.clone());
            continue;
        }
        if arg == "--" {
            seen_double_dash = true;
            continue;
        }
        if arg == "-" || !arg.starts_with('-') {
            operands.push(arg.clone());
            continue;
        }

        let cluster = &arg[1..];
        let mut chars = cluster.chars().peekable();
        while let Some(c) = chars.next() {
            if !known.contains(c) {
                return Err(usage_error(prog, &format!("-{c}: unknown option")));
            }
            if with_value.contains(c) {
                let rest: String = chars.collect();
                let value = if !rest.is_empty() {
                    rest
                } else {
                    match iter.next() {
                        Some(v) => v.clone(),
                        None => return Err(usage_error(prog, &format!("-{c}: option requires an argument"))),
                    }
                };
                flags.push((c, Some(value)));
                break;
            }
            flags.push((c, None));
        }
    }

    Ok((flags, operands))
}

/// Parses an integer "loop level" argument shared by `break`/`continue`:
/// defaults to 1, must be a positive integer if given.
pub fn parse_loop_level(prog: &str, args: &[String]) -> Result<u32, CommandResult> {
    match args.first() {
        None => Ok(1),
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| usage_error(prog, &format!("{s}: numeric argument required"))),
    }
}

/// A malformed invocation: usage errors exit 2.
pub fn usage_error(prog: &str, detail: &str) -> CommandResult {
    let mut result = CommandResult::with_code(2);
    result.stderr = format!("{prog}: {detail}\n");
    result
}

/// A well-formed invocation that failed at runtime: runtime errors exit 1.
pub fn runtime_error(prog: &str, detail: &str) -> CommandResult {
    let mut result = CommandResult::with_code(1);
    result.stderr = format!("{prog}: {detail}\n");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_flags_and_operands() {
        let (flags, operands) = parse_flags("echo", &["-n".to_string(), "hi".to_string()], "n", "").unwrap();
        assert_eq!(flags, vec![('n', None)]);
        assert_eq!(operands, vec!["hi".to_string()]);
    }

    #[test]
    fn value_flag_consumes_next_word() {
        let (flags, operands) = parse_flags(
            "read",
            &["-d".to_string(), ":".to_string(), "x".to_string()],
            "d",
            "d",
        )
        .unwrap();
        assert_eq!(flags, vec![('d', Some(":".to_string()))]);
        assert_eq!(operands, vec!["x".to_string()]);
    }

    #[test]
    fn double_dash_stops_flag_parsing() {
        let (flags, operands) = parse_flags("echo", &["--".to_string(), "-n".to_string()], "n", "").unwrap();
        assert!(flags.is_empty());
        assert_eq!(operands, vec!["-n".to_string()]);
    }

    #[test]
    fn unknown_flag_is_a_usage_error() {
        let result = parse_flags("read", &["-z".to_string()], "a", "").unwrap_err();
        assert_eq!(result.exit_code, 2);
    }
}
