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

//! `bookmark` built-in: `bookmark add|del|ls [name [path]]`. Bookmarks are
//! read and written at `cd :name` and `bookmark add/del`.

use crate::common::{runtime_error, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::Shell;
use std::path::PathBuf;

pub fn bookmark(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(bookmarks) = shell.bookmarks.as_mut() else {
        return runtime_error("bookmark", "no bookmark store configured");
    };

    match args.first().map(String::as_str) {
        None | Some("ls") => {
            let mut entries = bookmarks.list();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut result = CommandResult::success();
            for (name, path) in entries {
                result.stdout.push_str(&format!("{name}\t{}\n", path.display()));
            }
            result
        }
        Some("add") => {
            let Some(name) = args.get(1) else {
                return usage_error("bookmark", "add: missing name");
            };
            let path = match args.get(2) {
                Some(p) => PathBuf::from(p),
                None => shell.cwd.clone(),
            };
            match bookmarks.insert(name.clone(), path) {
                Ok(()) => CommandResult::success(),
                Err(e) => runtime_error("bookmark", &e.to_string()),
            }
        }
        Some("del") => {
            let Some(name) = args.get(1) else {
                return usage_error("bookmark", "del: missing name");
            };
            match bookmarks.remove(name) {
                Ok(true) => CommandResult::success(),
                Ok(false) => runtime_error("bookmark", &format!("{name}: no such bookmark")),
                Err(e) => runtime_error("bookmark", &e.to_string()),
            }
        }
        Some(other) => usage_error("bookmark", &format!("{other}: unknown subcommand")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::bookmark::FileBookmarks;
    use krusty_env::io::BufferIo;
    use tempfile::tempdir;

    fn shell_with_bookmarks() -> (Shell, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut shell = Shell::new();
        let file = dir.path().join("bookmarks.json");
        shell.bookmarks = Some(Box::new(FileBookmarks::load(file).unwrap()));
        (shell, dir)
    }

    #[test]
    fn add_then_ls_shows_entry() {
        let (mut shell, _dir) = shell_with_bookmarks();
        let mut io = BufferIo::new();
        let result = bookmark(&["add".to_string(), "proj".to_string(), "/tmp".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        let result = bookmark(&["ls".to_string()], &mut shell, &mut io);
        assert!(result.stdout.contains("proj\t/tmp\n"));
    }

    #[test]
    fn del_missing_bookmark_is_runtime_error() {
        let (mut shell, _dir) = shell_with_bookmarks();
        let mut io = BufferIo::new();
        let result = bookmark(&["del".to_string(), "nope".to_string()], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }
}
