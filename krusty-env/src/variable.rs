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

//! Shell variables: storage, variable expansion, and the
//! `export`/`readonly`/`unset`/`declare`/`local` attributes.
//!
//! krusty does not implement shell functions, so there is no notion of a
//! function-local variable scope to push and pop; [`VariableSet`] is a flat
//! name-to-[`Variable`] map. `local` is accepted as a synonym for `declare`
//! (see DESIGN.md) rather than creating a scoped binding.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Name and initial value of `IFS`, used for field splitting by `read`.
pub const IFS: &str = "IFS";
pub const IFS_INITIAL_VALUE: &str = " \t\n";

/// Name of the variable the `cd` built-in reads to search relative targets.
pub const CDPATH: &str = "CDPATH";
pub const HOME: &str = "HOME";
pub const OLDPWD: &str = "OLDPWD";
pub const PATH: &str = "PATH";
pub const PWD: &str = "PWD";
pub const PS1: &str = "PS1";
pub const PS2: &str = "PS2";

/// The name and initial value of `OPTIND`, consumed and reset by `getopts`.
pub const OPTIND: &str = "OPTIND";
pub const OPTIND_INITIAL_VALUE: &str = "1";
pub const OPTARG: &str = "OPTARG";

/// A single shell variable: its value plus the attributes `declare`,
/// `export`, and `readonly` can set on it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variable {
    /// `None` means declared but unassigned (`declare -x FOO` with no `=`).
    pub value: Option<String>,
    pub exported: bool,
    pub readonly: bool,
}

impl Variable {
    pub fn new(value: impl Into<String>) -> Self {
        Variable {
            value: Some(value.into()),
            exported: false,
            readonly: false,
        }
    }

    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Error returned when an assignment would violate a `readonly` variable
/// `readonly` rejects reassignment with a non-zero status and a diagnostic
/// naming the variable.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{name}: is read only")]
pub struct AssignError {
    pub name: String,
}

/// Positional parameters (`$1`..`$N`, `$@`, `$#`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PositionalParams {
    pub values: Vec<String>,
}

impl PositionalParams {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `$N` (1-indexed), or `None` if out of range.
    pub fn get(&self, n: usize) -> Option<&str> {
        n.checked_sub(1)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }
}

/// The full set of shell variables, plus positional parameters.
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    vars: HashMap<String, Variable>,
    pub positional_params: PositionalParams,
}

impl VariableSet {
    pub fn new() -> Self {
        VariableSet::default()
    }

    /// Seeds the well-known defaults a freshly started shell should have
    ///.
    pub fn with_defaults() -> Self {
        let mut set = VariableSet::new();
        set.vars
            .insert(IFS.to_string(), Variable::new(IFS_INITIAL_VALUE));
        set.vars
            .insert(OPTIND.to_string(), Variable::new(OPTIND_INITIAL_VALUE));
        set
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(|v| v.value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Assigns `value` to `name`, creating the variable if absent and
    /// preserving its `exported`/`readonly` attributes if present. Fails if
    /// the variable is readonly.
    pub fn assign(&mut self, name: &str, value: impl Into<String>) -> Result<(), AssignError> {
        match self.vars.entry(name.to_string()) {
            Entry::Occupied(mut e) => {
                if e.get().readonly {
                    return Err(AssignError { name: name.to_string() });
                }
                e.get_mut().value = Some(value.into());
            }
            Entry::Vacant(e) => {
                e.insert(Variable::new(value));
            }
        }
        Ok(())
    }

    /// Declares `name` without assigning a value, applying `export`/
    /// `readonly` attribute changes (`declare -x`/`declare -r` with no
    /// `=value`). Creates the variable unset if it does not exist.
    pub fn declare(&mut self, name: &str, export: Option<bool>, readonly: Option<bool>) {
        let var = self.vars.entry(name.to_string()).or_default();
        if let Some(export) = export {
            var.exported = export;
        }
        if let Some(readonly) = readonly {
            var.readonly = readonly;
        }
    }

    /// Removes `name`. Fails silently (a no-op) if the variable does not
    /// exist, per POSIX `unset` semantics; refuses and returns `false` if
    /// it is readonly.
    pub fn unset(&mut self, name: &str) -> bool {
        if let Some(var) = self.vars.get(name) {
            if var.readonly {
                return false;
            }
        }
        self.vars.remove(name);
        true
    }

    /// Iterates over all variables currently marked for export, as
    /// `(name, value)` pairs suitable for a child process's environment
    ///.
    pub fn exported_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().filter_map(|(name, var)| {
            if var.exported {
                var.value.as_deref().map(|v| (name.as_str(), v))
            } else {
                None
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_creates_and_updates() {
        let mut set = VariableSet::new();
        set.assign("FOO", "bar").unwrap();
        assert_eq!(set.get_str("FOO"), Some("bar"));
        set.assign("FOO", "baz").unwrap();
        assert_eq!(set.get_str("FOO"), Some("baz"));
    }

    #[test]
    fn readonly_rejects_reassignment() {
        let mut set = VariableSet::new();
        set.assign("FOO", "bar").unwrap();
        set.declare("FOO", None, Some(true));
        let err = set.assign("FOO", "baz").unwrap_err();
        assert_eq!(err.name, "FOO");
        assert_eq!(set.get_str("FOO"), Some("bar"));
    }

    #[test]
    fn unset_refuses_readonly() {
        let mut set = VariableSet::new();
        set.assign("FOO", "bar").unwrap();
        set.declare("FOO", None, Some(true));
        assert!(!set.unset("FOO"));
        assert!(set.contains("FOO"));
    }

    #[test]
    fn exported_pairs_only_includes_exported_with_values() {
        let mut set = VariableSet::new();
        set.assign("FOO", "bar").unwrap();
        set.declare("FOO", Some(true), None);
        set.assign("BAZ", "qux").unwrap();
        let pairs: Vec<_> = set.exported_pairs().collect();
        assert_eq!(pairs, vec![("FOO", "bar")]);
    }

    #[test]
    fn positional_params_are_one_indexed() {
        let params = PositionalParams {
            values: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(params.get(1), Some("a"));
        assert_eq!(params.get(2), Some("b"));
        assert_eq!(params.get(3), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn with_defaults_seeds_ifs_and_optind() {
        let set = VariableSet::with_defaults();
        assert_eq!(set.get_str(IFS), Some(IFS_INITIAL_VALUE));
        assert_eq!(set.get_str(OPTIND), Some("1"));
    }
}
