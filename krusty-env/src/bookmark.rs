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

//! Bookmark collaborator trait and file-backed default implementation: a
//! JSON object mapping `name → absolute_path`, read/written at `cd :name`
//! and `bookmark add/del` points. The default on-disk location,
//! `~/.krusty/bookmarks.json`, is a convention the CLI frontend chooses,
//! not a contract this crate enforces.
//!
//! The core only depends on the [`Bookmarks`] trait; `krusty-cli` wires up
//! [`FileBookmarks`] at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Persisted/queryable bookmark store consumed by the `cd`/`bookmark`
/// built-ins.
pub trait Bookmarks {
    fn get(&self, name: &str) -> Option<PathBuf>;
    fn insert(&mut self, name: String, path: PathBuf) -> io::Result<()>;
    fn remove(&mut self, name: &str) -> io::Result<bool>;
    fn list(&self) -> Vec<(String, PathBuf)>;
}

/// A JSON-file-backed [`Bookmarks`] implementation, at `~/.krusty/bookmarks.json`
/// by convention.
#[derive(Clone, Debug, Default)]
pub struct FileBookmarks {
    path: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

#[derive(Deserialize, Serialize)]
struct Schema {
    #[serde(flatten)]
    entries: BTreeMap<String, PathBuf>,
}

impl FileBookmarks {
    /// Loads bookmarks from `path`, tolerating a missing file (treated as
    /// empty) but propagating any other I/O or parse error.
    pub fn load(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let schema: Schema = serde_json::from_str(&contents)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                schema.entries
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(FileBookmarks { path, entries })
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let schema = Schema {
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&schema)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Bookmarks for FileBookmarks {
    fn get(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).cloned()
    }

    fn insert(&mut self, name: String, path: PathBuf) -> io::Result<()> {
        self.entries.insert(name, path);
        self.save()
    }

    fn remove(&mut self, name: &str) -> io::Result<bool> {
        let existed = self.entries.remove(name).is_some();
        if existed {
            self.save()?;
        }
        Ok(existed)
    }

    fn list(&self) -> Vec<(String, PathBuf)> {
        self.entries
            .iter()
            .map(|(n, p)| (n.clone(), p.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let bookmarks = FileBookmarks::load(dir.path().join("bookmarks.json")).unwrap();
        assert!(bookmarks.list().is_empty());
    }

    #[test]
    fn insert_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("bookmarks.json");
        let mut bookmarks = FileBookmarks::load(&file).unwrap();
        bookmarks
            .insert("proj".to_string(), PathBuf::from("/tmp/proj"))
            .unwrap();

        let reloaded = FileBookmarks::load(&file).unwrap();
        assert_eq!(reloaded.get("proj"), Some(PathBuf::from("/tmp/proj")));
    }

    #[test]
    fn remove_reports_whether_it_existed() {
        let dir = tempdir().unwrap();
        let mut bookmarks = FileBookmarks::load(dir.path().join("bookmarks.json")).unwrap();
        bookmarks
            .insert("proj".to_string(), PathBuf::from("/tmp/proj"))
            .unwrap();
        assert!(bookmarks.remove("proj").unwrap());
        assert!(!bookmarks.remove("proj").unwrap());
    }
}
