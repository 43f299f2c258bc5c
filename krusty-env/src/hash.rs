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

//! Command hash table.
//!
//! Populated the first time a bare command name is resolved against `PATH`;
//! invalidated wholesale whenever `PATH` is reassigned. In-memory only —
//! nothing here persists across shell invocations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct HashTable {
    entries: HashMap<String, PathBuf>,
}

impl HashTable {
    pub fn new() -> Self {
        HashTable::default()
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn insert(&mut self, name: impl Into<String>, path: PathBuf) {
        self.entries.insert(name.into(), path);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Drops every cached entry, as must happen whenever `PATH` changes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut table = HashTable::new();
        table.insert("ls", PathBuf::from("/bin/ls"));
        assert_eq!(table.get("ls"), Some(Path::new("/bin/ls")));
        assert!(table.remove("ls"));
        assert_eq!(table.get("ls"), None);
    }

    #[test]
    fn clear_drops_everything() {
        let mut table = HashTable::new();
        table.insert("ls", PathBuf::from("/bin/ls"));
        table.insert("cat", PathBuf::from("/bin/cat"));
        table.clear();
        assert_eq!(table.get("ls"), None);
        assert_eq!(table.get("cat"), None);
    }
}
