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

//! Internal diagnostics facade.
//!
//! The shell's own stderr is its log sink — there is no global logger to
//! configure. [`trace`] additionally routes internal diagnostics (signal
//! queue draining, job reaping) through `eprintln!` when `KRUSTY_DEBUG_LOG`
//! is set in the environment, so a developer can watch job-control
//! internals without instrumenting call sites by hand.

use std::sync::OnceLock;

fn debug_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("KRUSTY_DEBUG_LOG").is_some())
}

/// Emits a trace line prefixed `krusty: trace:` iff `KRUSTY_DEBUG_LOG` is set.
pub fn trace(args: std::fmt::Arguments<'_>) {
    if debug_enabled() {
        eprintln!("krusty: trace: {args}");
    }
}

/// Prints a user-visible error in the standard `"<prog>: <detail>"` form, to
/// the given writer (normally the shell's stderr, but tests pass an
/// in-memory buffer).
pub fn print_error(out: &mut impl std::io::Write, prog: &str, detail: &str) {
    let _ = writeln!(out, "{prog}: {detail}");
}

/// Convenience macro mirroring `log::trace!`'s call shape, without pulling
/// in a global logging crate.
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::diag::trace(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_error_follows_prog_detail_pattern() {
        let mut buf = Vec::new();
        print_error(&mut buf, "cd", "no such file or directory");
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "cd: no such file or directory\n"
        );
    }
}
