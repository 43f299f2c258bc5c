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

//! Command result type: the built-in contract requires every field
//! populated (exit_code, stdout, stderr, duration).
//!
//! `CommandResult` is plain data, not a `Result`: built-in errors are never
//! fatal to the shell, so failure is represented by a nonzero `exit_code`,
//! not a propagated error.

use crate::builtin::Divert;
use std::time::Duration;

/// The outcome of running a built-in, external command, pipeline, or chain.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    /// Non-local control flow requested by a built-in (`exit`, `return`,
    /// `break`, `continue`); `None` for ordinary completion. Absorbed by the
    /// nearest enclosing context that understands it (the control
    /// built-ins: `exit`, `return`, `break`, `continue`).
    pub divert: Option<Divert>,
}

impl CommandResult {
    pub fn success() -> Self {
        CommandResult {
            exit_code: 0,
            ..Default::default()
        }
    }

    pub fn with_code(exit_code: i32) -> Self {
        CommandResult {
            exit_code,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Appends another result's output in sequence, keeping the later
    /// result's exit code and summing durations (used when aggregating
    /// chain segments: aggregates stdout and stderr in order, sums
    /// durations.
    pub fn append(&mut self, other: CommandResult) {
        self.stdout.push_str(&other.stdout);
        self.stderr.push_str(&other.stderr);
        self.duration += other.duration;
        self.exit_code = other.exit_code;
        if other.divert.is_some() {
            self.divert = other.divert;
        }
    }
}

/// Exit-code mapping for terminating signals.
pub fn exit_code_for_signal(signal: i32) -> i32 {
    match signal {
        2 => 130,  // SIGINT
        15 => 143, // SIGTERM
        other => 128 + other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_concatenates_output_and_sums_duration() {
        let mut a = CommandResult {
            exit_code: 0,
            stdout: "a".into(),
            stderr: String::new(),
            duration: Duration::from_millis(10),
            divert: None,
        };
        let b = CommandResult {
            exit_code: 7,
            stdout: "b".into(),
            stderr: "e".into(),
            duration: Duration::from_millis(5),
            divert: None,
        };
        a.append(b);
        assert_eq!(a.stdout, "ab");
        assert_eq!(a.stderr, "e");
        assert_eq!(a.exit_code, 7);
        assert_eq!(a.duration, Duration::from_millis(15));
    }

    #[test]
    fn signal_exit_codes_follow_the_spec_table() {
        assert_eq!(exit_code_for_signal(2), 130);
        assert_eq!(exit_code_for_signal(15), 143);
        assert_eq!(exit_code_for_signal(9), 137);
    }
}
