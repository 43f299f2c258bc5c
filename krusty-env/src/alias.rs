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

//! Alias definitions.
//!
//! Aliases are looked up by the expansion engine before a command word is
//! otherwise interpreted. Definitions are kept behind `Rc` so an expansion
//! already in progress keeps its alias even if `unalias` removes it partway
//! through: a command word is never re-expanded against the same alias
//! within one expansion pass.

use std::collections::HashMap;
use std::rc::Rc;

/// A single alias definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Alias {
    pub name: String,
    pub replacement: String,
}

/// The shell's alias table.
#[derive(Clone, Debug, Default)]
pub struct AliasSet {
    entries: HashMap<String, Rc<Alias>>,
}

impl AliasSet {
    pub fn new() -> Self {
        AliasSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn look_up(&self, name: &str) -> Option<Rc<Alias>> {
        self.entries.get(name).cloned()
    }

    pub fn insert(&mut self, name: impl Into<String>, replacement: impl Into<String>) {
        let name = name.into();
        let alias = Rc::new(Alias {
            name: name.clone(),
            replacement: replacement.into(),
        });
        self.entries.insert(name, alias);
    }

    /// Removes an alias. Returns `false` if no such alias existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates in a stable, name-sorted order (for `alias` with no
    /// arguments, which lists every definition).
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Alias> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
            .into_iter()
            .map(move |n| self.entries.get(n).unwrap().as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_look_up() {
        let mut aliases = AliasSet::new();
        aliases.insert("ll", "ls -la");
        let found = aliases.look_up("ll").unwrap();
        assert_eq!(found.replacement, "ls -la");
    }

    #[test]
    fn remove_reports_whether_it_existed() {
        let mut aliases = AliasSet::new();
        aliases.insert("ll", "ls -la");
        assert!(aliases.remove("ll"));
        assert!(!aliases.remove("ll"));
        assert!(aliases.look_up("ll").is_none());
    }

    #[test]
    fn redefining_replaces_value() {
        let mut aliases = AliasSet::new();
        aliases.insert("g", "git");
        aliases.insert("g", "git status");
        assert_eq!(aliases.look_up("g").unwrap().replacement, "git status");
    }

    #[test]
    fn iter_sorted_is_alphabetical() {
        let mut aliases = AliasSet::new();
        aliases.insert("z", "zzz");
        aliases.insert("a", "aaa");
        let names: Vec<&str> = aliases.iter_sorted().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "z"]);
    }

    #[test]
    fn rc_handle_survives_removal() {
        let mut aliases = AliasSet::new();
        aliases.insert("ll", "ls -la");
        let handle = aliases.look_up("ll").unwrap();
        aliases.remove("ll");
        assert_eq!(handle.replacement, "ls -la");
    }
}
