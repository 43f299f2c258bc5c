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

//! Trap table, backing the `trap` built-in.
//!
//! Follows POSIX `trap [action] condition...` grammar, supporting the
//! `EXIT` and `ERR` pseudo-conditions alongside real signal names.

use crate::signal;
use std::collections::BTreeMap;
use std::fmt;

/// A condition a trap can be registered against: a real signal, or one of
/// the two pseudo-conditions POSIX shells recognize.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Condition {
    Signal(i32),
    Exit,
    Err,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Signal(n) => match signal::by_number(*n) {
                Some(info) => write!(f, "{}", info.name),
                None => write!(f, "{n}"),
            },
            Condition::Exit => write!(f, "EXIT"),
            Condition::Err => write!(f, "ERR"),
        }
    }
}

/// Parses a `trap` condition argument: `EXIT`, `ERR`, a signal name
/// (`INT`/`SIGINT`), or a bare signal number.
pub fn parse_condition(text: &str) -> Option<Condition> {
    match text.to_ascii_uppercase().as_str() {
        "EXIT" | "0" => Some(Condition::Exit),
        "ERR" => Some(Condition::Err),
        _ => {
            if let Some(info) = signal::by_name(text) {
                Some(Condition::Signal(info.number))
            } else {
                text.parse().ok().map(Condition::Signal)
            }
        }
    }
}

/// What happens when a trapped condition fires.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Restore the condition's default disposition.
    Default,
    /// Ignore the condition entirely.
    Ignore,
    /// Run the given command text when the condition fires.
    Command(String),
}

/// The shell's trap table: a flat map from condition to action, mirroring
/// the alias table's "flat map, not a graph" design (see
/// [`crate::alias::AliasSet`]).
#[derive(Clone, Debug, Default)]
pub struct TrapSet {
    entries: BTreeMap<Condition, Action>,
}

impl TrapSet {
    pub fn new() -> Self {
        TrapSet::default()
    }

    pub fn set(&mut self, condition: Condition, action: Action) {
        self.entries.insert(condition, action);
    }

    pub fn get(&self, condition: &Condition) -> Option<&Action> {
        self.entries.get(condition)
    }

    pub fn clear(&mut self, condition: &Condition) {
        self.entries.remove(condition);
    }

    /// Iterates over every user-set trap, in condition order, for `trap -p`
    /// listing output.
    pub fn iter(&self) -> impl Iterator<Item = (&Condition, &Action)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exit_and_err_pseudo_conditions() {
        assert_eq!(parse_condition("EXIT"), Some(Condition::Exit));
        assert_eq!(parse_condition("0"), Some(Condition::Exit));
        assert_eq!(parse_condition("ERR"), Some(Condition::Err));
    }

    #[test]
    fn parses_signal_name_and_number() {
        assert_eq!(parse_condition("INT"), Some(Condition::Signal(2)));
        assert_eq!(parse_condition("SIGINT"), Some(Condition::Signal(2)));
        assert_eq!(parse_condition("2"), Some(Condition::Signal(2)));
    }

    #[test]
    fn set_get_clear_round_trip() {
        let mut traps = TrapSet::new();
        traps.set(Condition::Signal(2), Action::Command("echo bye".into()));
        assert_eq!(
            traps.get(&Condition::Signal(2)),
            Some(&Action::Command("echo bye".into()))
        );
        traps.clear(&Condition::Signal(2));
        assert_eq!(traps.get(&Condition::Signal(2)), None);
    }

    #[test]
    fn display_prefers_signal_name() {
        assert_eq!(Condition::Signal(15).to_string(), "TERM");
        assert_eq!(Condition::Exit.to_string(), "EXIT");
    }
}
