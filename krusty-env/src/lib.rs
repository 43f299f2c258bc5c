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

//! Shell state: variables/environment, options, aliases, jobs, traps, hash
//! table, and the small system-facing conveniences (umask, directory
//! stack) that the built-ins and execution engine share.
//!
//! This crate has no knowledge of parsing or execution; it only owns
//! mutable state and exposes methods the higher layers call into.

pub mod alias;
pub mod bookmark;
pub mod builtin;
pub mod diag;
pub mod hash;
pub mod hook;
pub mod io;
pub mod job;
pub mod option;
pub mod result;
pub mod signal;
pub mod trap;
pub mod variable;

use alias::AliasSet;
use hash::HashTable;
use job::JobTable;
use option::OptionSet;
use std::path::{Path, PathBuf};
use trap::TrapSet;
use variable::{VariableSet, HOME, OLDPWD, PATH, PWD};

/// Everything the execution engine and built-ins read and mutate over the
/// life of one shell process.
pub struct Shell {
    pub cwd: PathBuf,
    pub variables: VariableSet,
    pub aliases: AliasSet,
    pub options: OptionSet,
    pub last_exit_code: i32,
    pub last_duration_ms: u64,
    pub jobs: JobTable,
    pub hashtable: HashTable,
    pub traps: TrapSet,
    pub umask: u32,
    /// `pushd`/`popd`/`dirs` stack, most-recently-pushed last.
    pub dir_stack: Vec<PathBuf>,
    /// Positional-index stack entries used for `cd -N`, kept in
    /// the same order as `dir_stack`.
    pub bookmarks: Option<Box<dyn bookmark::Bookmarks>>,
    /// Name→handler map populated by `krusty-builtin` at startup; kept on
    /// `Shell` rather than threaded separately so built-ins that dispatch to
    /// other built-ins (`command`, `builtin`) can look themselves up.
    pub builtins: builtin::Registry,
    /// Process ids spawned for each still-`Running` background job, keyed
    /// by job id: the job table itself only remembers the
    /// pipeline's leader pid/pgid, but reaping needs every pid in the
    /// pipeline so a partially-exited background pipeline isn't reported
    /// done early.
    pub background_pids: std::collections::HashMap<u32, Vec<nix::unistd::Pid>>,
    /// Lifecycle-event subscribers.
    pub hooks: hook::HookManager,
}

impl Shell {
    /// Builds a fresh shell state, seeding variables from the calling
    /// process's environment the way a real shell inherits its parent's
    /// environment at startup.
    pub fn new() -> Self {
        let mut variables = VariableSet::with_defaults();
        for (name, value) in std::env::vars() {
            let _ = variables.assign(&name, value);
            variables.declare(&name, Some(true), None);
        }

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let _ = variables.assign(PWD, cwd.to_string_lossy().into_owned());
        variables.declare(PWD, Some(true), None);

        Shell {
            cwd,
            variables,
            aliases: AliasSet::new(),
            options: OptionSet::empty(),
            last_exit_code: 0,
            last_duration_ms: 0,
            jobs: JobTable::new(),
            hashtable: HashTable::new(),
            traps: TrapSet::new(),
            umask: 0o022,
            dir_stack: Vec::new(),
            bookmarks: None,
            builtins: builtin::Registry::new(),
            background_pids: std::collections::HashMap::new(),
            hooks: hook::HookManager::new(),
        }
    }

    /// Changes the shell's working directory, maintaining `PWD`/`OLDPWD`
    /// and invalidating nothing else —
    /// the hash table survives a `cd` since resolved command paths are
    /// independent of cwd for anything found via an absolute `PATH` entry.
    pub fn chdir(&mut self, target: &Path) -> std::io::Result<()> {
        let resolved = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.cwd.join(target)
        };
        std::env::set_current_dir(&resolved)?;
        let old = std::mem::replace(&mut self.cwd, resolved);
        let _ = self
            .variables
            .assign(OLDPWD, old.to_string_lossy().into_owned());
        self.variables.declare(OLDPWD, Some(true), None);
        let _ = self
            .variables
            .assign(PWD, self.cwd.to_string_lossy().into_owned());
        self.variables.declare(PWD, Some(true), None);
        let cwd = self.cwd.clone();
        self.hooks
            .fire(hook::Event::DirectoryChanged, &hook::Payload::Directory(cwd));
        Ok(())
    }

    pub fn home_dir(&self) -> Option<PathBuf> {
        self.variables
            .get_str(HOME)
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }

    pub fn old_pwd(&self) -> Option<PathBuf> {
        self.variables.get_str(OLDPWD).map(PathBuf::from)
    }

    /// Builds the `PATH`-ordered directory list used to search for external
    /// commands and by `cd`'s bare relative-target lookup.
    pub fn path_dirs(&self) -> Vec<PathBuf> {
        self.variables
            .get_str(PATH)
            .unwrap_or_default()
            .split(':')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Resolves `name` to an executable path by consulting the hash table
    /// first, then searching `PATH`, caching the result in the command hash
    /// table.
    pub fn resolve_command(&mut self, name: &str) -> Option<PathBuf> {
        if name.contains('/') {
            let path = self.cwd.join(name);
            return path.is_file().then_some(path);
        }
        if let Some(cached) = self.hashtable.get(name) {
            if cached.is_file() {
                return Some(cached.to_path_buf());
            }
        }
        for dir in self.path_dirs() {
            let candidate = dir.join(name);
            if candidate.is_file() {
                self.hashtable.insert(name, candidate.clone());
                return Some(candidate);
            }
        }
        None
    }

    /// Reassigns `PATH`, invalidating the hash table wholesale
    /// Invalidates the hash table wholesale, since any entry in it may now
    /// point at the wrong binary.
    pub fn set_path(&mut self, value: impl Into<String>) {
        let _ = self.variables.assign(PATH, value);
        self.hashtable.clear();
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn chdir_updates_cwd_and_oldpwd() {
        let dir = tempdir().unwrap();
        let mut shell = Shell::new();
        let start = shell.cwd.clone();
        shell.chdir(dir.path()).unwrap();
        assert_eq!(shell.cwd, dir.path());
        assert_eq!(shell.old_pwd(), Some(start));
    }

    #[test]
    fn set_path_clears_hash_table() {
        let mut shell = Shell::new();
        shell.hashtable.insert("ls", PathBuf::from("/bin/ls"));
        shell.set_path("/usr/bin");
        assert_eq!(shell.hashtable.get("ls"), None);
    }

    #[test]
    fn path_dirs_splits_on_colon_and_skips_empties() {
        let mut shell = Shell::new();
        shell.set_path("/usr/bin::/bin");
        assert_eq!(
            shell.path_dirs(),
            vec![PathBuf::from("/usr/bin"), PathBuf::from("/bin")]
        );
    }
}
