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

//! Directory navigation built-ins: `cd`, `pwd`, `pushd`, `popd`, `dirs`
//!.

use crate::common::{parse_flags, runtime_error, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::variable::CDPATH;
use krusty_env::Shell;
use std::path::{Path, PathBuf};

/// Resolves `cd`'s target argument: `~...`/absolute/relative paths,
/// `-` (OLDPWD), `:name` (bookmark lookup), and `-N` (stack index, spec
/// §4.4 "cd (supports ~, -, :bookmark, -N stack index)").
///
/// `-N` is not part of POSIX or bash; krusty's own reading is to treat
/// `[shell.cwd] + shell.dir_stack.rev()` as a 0-indexed list and jump to
/// entry N without popping the stack (see DESIGN.md Open Question).
fn resolve_target(shell: &Shell, arg: &str) -> Result<PathBuf, String> {
    if let Some(name) = arg.strip_prefix(':') {
        return shell
            .bookmarks
            .as_ref()
            .and_then(|b| b.get(name))
            .ok_or_else(|| format!("{name}: no such bookmark"));
    }
    if arg == "-" {
        return shell.old_pwd().ok_or_else(|| "OLDPWD not set".to_string());
    }
    if let Some(rest) = arg.strip_prefix('-') {
        if let Ok(n) = rest.parse::<usize>() {
            let mut entries: Vec<&Path> = vec![shell.cwd.as_path()];
            entries.extend(shell.dir_stack.iter().rev().map(PathBuf::as_path));
            return entries
                .get(n)
                .map(|p| p.to_path_buf())
                .ok_or_else(|| format!("-{n}: directory stack index out of range"));
        }
    }
    if let Some(rest) = arg.strip_prefix('~') {
        let home = shell.home_dir().ok_or_else(|| "HOME not set".to_string())?;
        return Ok(if rest.is_empty() {
            home
        } else {
            home.join(rest.trim_start_matches('/'))
        });
    }
    let path = Path::new(arg);
    if path.is_absolute() || arg.starts_with("./") || arg.starts_with("../") {
        return Ok(path.to_path_buf());
    }
    if let Some(cdpath) = shell.variables.get_str(CDPATH) {
        for dir in cdpath.split(':').filter(|s| !s.is_empty()) {
            let candidate = Path::new(dir).join(arg);
            if candidate.is_dir() {
                return Ok(candidate);
            }
        }
    }
    Ok(path.to_path_buf())
}

pub fn cd(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let target = match args.first() {
        None => match shell.home_dir() {
            Some(home) => home,
            None => return runtime_error("cd", "HOME not set"),
        },
        Some(arg) => match resolve_target(shell, arg) {
            Ok(p) => p,
            Err(e) => return runtime_error("cd", &e),
        },
    };
    match shell.chdir(&target) {
        Ok(()) => CommandResult::success(),
        Err(e) => runtime_error("cd", &format!("{}: {e}", target.display())),
    }
}

pub fn pwd(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, _) = match parse_flags("pwd", args, "LP", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let _ = flags;
    let mut result = CommandResult::success();
    result.stdout = format!("{}\n", shell.cwd.display());
    result
}

pub fn pushd(args: &[String], shell: &mut Shell, io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(arg) = args.first() else {
        return usage_error;
    };
    let target = match resolve_target(shell, arg) {
        Ok(p) => p,
        Err(e) => return runtime_error("pushd", &e),
    };
    let previous = shell.cwd.clone();
    match shell.chdir(&target) {
        Ok(()) => {
            shell.dir_stack.push(previous);
            dirs_builtin(&[], shell, io)
        }
        Err(e) => runtime_error("pushd", &format!("{}: {e}", target.display())),
    }
}

pub fn popd(_args: &[String], shell: &mut Shell, io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(previous) = shell.dir_stack.pop() else {
        return runtime_error("popd", "directory stack empty");
    };
    match shell.chdir(&previous) {
        Ok(()) => dirs_builtin(&[], shell, io),
        Err(e) => runtime_error("popd", &format!("{}: {e}", previous.display())),
    }
}

pub fn dirs_builtin(_args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut entries: Vec<&Path> = vec![shell.cwd.as_path()];
    entries.extend(shell.dir_stack.iter().rev().map(PathBuf::as_path));
    let line = entries
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let mut result = CommandResult::success();
    result.stdout = format!("{line}\n");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;
    use tempfile::tempdir;

    #[test]
    fn cd_with_no_args_goes_home() {
        let dir = tempdir().unwrap();
        let mut shell = Shell::new();
        shell.variables.assign("HOME", dir.path().to_str().unwrap()).unwrap();
        let mut io = BufferIo::new();
        let result = cd(&[], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.cwd, dir.path());
    }

    #[test]
    fn cd_dash_returns_to_oldpwd() {
        let dir = tempdir().unwrap();
        let mut shell = Shell::new();
        let start = shell.cwd.clone();
        shell.chdir(dir.path()).unwrap();
        let mut io = BufferIo::new();
        let result = cd(&["-".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.cwd, start);
    }

    #[test]
    fn pushd_popd_round_trip() {
        let dir = tempdir().unwrap();
        let mut shell = Shell::new();
        let start = shell.cwd.clone();
        let mut io = BufferIo::new();
        let result = pushd(&[dir.path().to_str().unwrap().to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.cwd, dir.path());
        let result = popd(&[], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.cwd, start);
    }

    #[test]
    fn cd_unknown_bookmark_is_a_runtime_error() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = cd(&[":nope".to_string()], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }
}
