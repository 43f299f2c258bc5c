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

//! Signal name/number table. `kill -l` lists at least HUP, INT, KILL, TERM,
//! STOP, CONT, TSTP with numeric codes.
//!
//! krusty targets POSIX-ish Unix systems, so the table below follows the
//! common Linux/macOS numbering. Where the two platforms disagree (there are
//! none among the signals this shell names), the Linux numbering wins.

use nix::sys::signal::Signal;

/// One row of the `kill -l` table: canonical name (without `SIG` prefix) and
/// numeric value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignalInfo {
    pub name: &'static str,
    pub number: i32,
}

/// The signals krusty knows by name, in `kill -l` listing order.
pub const TABLE: &[SignalInfo] = &[
    SignalInfo { name: "HUP", number: 1 },
    SignalInfo { name: "INT", number: 2 },
    SignalInfo { name: "QUIT", number: 3 },
    SignalInfo { name: "ILL", number: 4 },
    SignalInfo { name: "TRAP", number: 5 },
    SignalInfo { name: "ABRT", number: 6 },
    SignalInfo { name: "BUS", number: 7 },
    SignalInfo { name: "FPE", number: 8 },
    SignalInfo { name: "KILL", number: 9 },
    SignalInfo { name: "USR1", number: 10 },
    SignalInfo { name: "SEGV", number: 11 },
    SignalInfo { name: "USR2", number: 12 },
    SignalInfo { name: "PIPE", number: 13 },
    SignalInfo { name: "ALRM", number: 14 },
    SignalInfo { name: "TERM", number: 15 },
    SignalInfo { name: "CHLD", number: 17 },
    SignalInfo { name: "CONT", number: 18 },
    SignalInfo { name: "STOP", number: 19 },
    SignalInfo { name: "TSTP", number: 20 },
    SignalInfo { name: "TTIN", number: 21 },
    SignalInfo { name: "TTOU", number: 22 },
    SignalInfo { name: "URG", number: 23 },
    SignalInfo { name: "XCPU", number: 24 },
    SignalInfo { name: "XFSZ", number: 25 },
    SignalInfo { name: "VTALRM", number: 26 },
    SignalInfo { name: "PROF", number: 27 },
    SignalInfo { name: "WINCH", number: 28 },
];

/// Looks up a signal by name, accepting both `INT` and `SIGINT` spellings
/// (case-insensitively), per `kill -SIG`/`trap` argument conventions.
pub fn by_name(name: &str) -> Option<SignalInfo> {
    let trimmed = name
        .strip_prefix("SIG")
        .or_else(|| name.strip_prefix("sig"))
        .unwrap_or(name);
    let upper = trimmed.to_ascii_uppercase();
    TABLE.iter().find(|s| s.name == upper).copied()
}

/// Looks up a signal by number.
pub fn by_number(number: i32) -> Option<SignalInfo> {
    TABLE.iter().find(|s| s.number == number).copied()
}

/// Converts a krusty signal number to the `nix` [`Signal`] used to actually
/// deliver it, when the platform supports that number.
pub fn to_nix_signal(number: i32) -> Option<Signal> {
    Signal::try_from(number).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_the_boundary_required_signals() {
        for name in ["HUP", "INT", "KILL", "TERM", "STOP", "CONT", "TSTP"] {
            assert!(by_name(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn by_name_accepts_sig_prefix_case_insensitively() {
        assert_eq!(by_name("SIGINT").unwrap().number, 2);
        assert_eq!(by_name("sigint").unwrap().number, 2);
        assert_eq!(by_name("int").unwrap().number, 2);
    }

    #[test]
    fn by_number_round_trips() {
        assert_eq!(by_number(9).unwrap().name, "KILL");
    }
}
