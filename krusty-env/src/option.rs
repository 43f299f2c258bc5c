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

//! Shell option state.
//!
//! [`OptionSet`] is a map from [`Option`] to [`State`]. It only tracks
//! whether an option is on or off; it is the execution engine's job to
//! actually change behavior accordingly.

use enumset::{EnumSet, EnumSetIter, EnumSetType};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// State of an option: either enabled or disabled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    On,
    Off,
}

pub use State::*;

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            On => "on",
            Off => "off",
        })
    }
}

impl std::ops::Not for State {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            On => Off,
            Off => On,
        }
    }
}

/// A `set -o`/`set +o` option.
///
/// `ErrExit`, `NounSet`, `XTrace`, and `PipeFail` are the four named in the
/// core design; the rest round out the option set to the fuller POSIX
/// surface (see DESIGN.md).
#[derive(Clone, Copy, Debug, EnumSetType, Eq, Hash, PartialEq)]
#[enumset(no_super_impls)]
pub enum Option {
    /// Exit as soon as a pipeline fails.
    ErrExit,
    /// Treat expansion of an unset variable as an error.
    NounSet,
    /// Print each command's expanded words before executing it.
    XTrace,
    /// A pipeline's exit status is that of its rightmost failing stage.
    PipeFail,
    /// Refuse to `>` over an existing file (use `>|` to override).
    NoClobber,
    /// Read commands and check syntax, but do not execute them.
    NoExec,
    /// Echo input lines as they are read.
    Verbose,
    /// Enable job control (process groups, foreground/background).
    Monitor,
    /// Ignore EOF on stdin in interactive mode instead of exiting.
    IgnoreEof,
    /// Export every variable that is assigned or created.
    AllExport,
}

pub use self::Option::*;

impl Option {
    /// The canonical option name used by `set -o`/`set +o`, the one
    /// [`FromStr`] accepts in full.
    pub fn long_name(self) -> &'static str {
        match self {
            ErrExit => "errexit",
            NounSet => "nounset",
            XTrace => "xtrace",
            PipeFail => "pipefail",
            NoClobber => "noclobber",
            NoExec => "noexec",
            Verbose => "verbose",
            Monitor => "monitor",
            IgnoreEof => "ignoreeof",
            AllExport => "allexport",
        }
    }

    /// Creates an iterator over all options in alphabetical order of their
    /// discriminant (declaration order above).
    pub fn iter() -> Iter {
        Iter {
            inner: EnumSet::<Option>::all().iter(),
        }
    }
}

impl fmt::Display for Option {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.long_name().fmt(f)
    }
}

/// Error returned when a string does not name a valid option.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FromStrError {
    NoSuchOption,
    Ambiguous,
}

pub use FromStrError::*;

/// Parses a canonical (lowercased, depunctuated) option name, allowing an
/// unambiguous prefix abbreviation (`set -o pipef` resolves to `pipefail`).
impl FromStr for Option {
    type Err = FromStrError;

    fn from_str(name: &str) -> Result<Self, FromStrError> {
        const OPTIONS: &[(&str, Option)] = &[
            ("allexport", AllExport),
            ("errexit", ErrExit),
            ("ignoreeof", IgnoreEof),
            ("monitor", Monitor),
            ("noclobber", NoClobber),
            ("noexec", NoExec),
            ("nounset", NounSet),
            ("pipefail", PipeFail),
            ("verbose", Verbose),
            ("xtrace", XTrace),
        ];

        match OPTIONS.binary_search_by_key(&name, |&(full, _)| full) {
            Ok(index) => Ok(OPTIONS[index].1),
            Err(index) => {
                let mut matches = OPTIONS[index..]
                    .iter()
                    .filter(|&&(full, _)| full.starts_with(name));
                match matches.next() {
                    Some(first) => match matches.next() {
                        Some(_second) => Err(Ambiguous),
                        None => Ok(first.1),
                    },
                    None => Err(NoSuchOption),
                }
            }
        }
    }
}

/// Canonicalizes an option name: lowercase, alphanumeric characters only.
pub fn canonicalize(name: &str) -> Cow<'_, str> {
    if name.chars().all(|c| c.is_alphanumeric() && !c.is_ascii_uppercase()) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(
            name.chars()
                .filter(|c| c.is_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    }
}

/// Iterator over all defined options.
#[derive(Clone, Debug)]
pub struct Iter {
    inner: EnumSetIter<Option>,
}

impl Iterator for Iter {
    type Item = Option;
    fn next(&mut self) -> std::option::Option<Option> {
        self.inner.next()
    }
    fn size_hint(&self) -> (usize, std::option::Option<usize>) {
        self.inner.size_hint()
    }
}

/// Set of shell options and their states.
///
/// All options are off by default; `krusty-cli` turns on `Monitor` when the
/// shell starts interactively attached to a terminal.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct OptionSet {
    enabled: EnumSet<Option>,
}

impl OptionSet {
    pub fn empty() -> Self {
        OptionSet { enabled: EnumSet::empty() }
    }

    pub fn get(&self, option: Option) -> State {
        if self.enabled.contains(option) { On } else { Off }
    }

    pub fn set(&mut self, option: Option, state: State) {
        match state {
            On => self.enabled.insert(option),
            Off => self.enabled.remove(option),
        };
    }

    pub fn is_on(&self, option: Option) -> bool {
        self.get(option) == On
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_round_trips_every_long_name() {
        for option in Option::iter() {
            assert_eq!(Option::from_str(option.long_name()), Ok(option));
        }
    }

    #[test]
    fn from_str_accepts_unambiguous_abbreviation() {
        assert_eq!(Option::from_str("pipef"), Ok(PipeFail));
        assert_eq!(Option::from_str("x"), Ok(XTrace));
    }

    #[test]
    fn from_str_rejects_ambiguous_abbreviation() {
        assert_eq!(Option::from_str("no"), Err(Ambiguous));
    }

    #[test]
    fn from_str_rejects_unknown_name() {
        assert_eq!(Option::from_str("bogus"), Err(NoSuchOption));
    }

    #[test]
    fn option_set_defaults_all_off() {
        let options = OptionSet::default();
        for option in Option::iter() {
            assert_eq!(options.get(option), Off);
        }
    }

    #[test]
    fn option_set_get_set_round_trip() {
        let mut options = OptionSet::empty();
        options.set(ErrExit, On);
        assert!(options.is_on(ErrExit));
        assert_eq!(options.get(NounSet), Off);
        options.set(ErrExit, Off);
        assert!(!options.is_on(ErrExit));
    }

    #[test]
    fn canonicalize_strips_punctuation_and_lowercases() {
        assert_eq!(canonicalize("Pipe-Fail"), "pipefail");
        assert_eq!(canonicalize("xtrace"), "xtrace");
    }
}
