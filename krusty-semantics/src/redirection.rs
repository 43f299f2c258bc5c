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

//! Redirection application.
//!
//! Redirections are resolved in the order they were parsed and spliced onto
//! the child's file descriptor table right before `exec`. This module only
//! computes *what to open and where*; wiring the results into a spawned
//! [`std::process::Command`] is execution.rs's job, since that also has to
//! reconcile redirections with pipeline fd plumbing (stdout piped to the
//! next stage, etc).

use crate::error::RedirectionError;
use krusty_syntax::{FdTarget, Redirection, RedirectionDirection};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// What a single resolved redirection does to a child's standard streams,
/// expressed independently of any process-spawning API.
#[derive(Debug)]
pub enum ResolvedRedirection {
    /// Replace fd 0 with this open file (read-only).
    Stdin(File),
    /// Replace fd 1 with this open file.
    Stdout(File),
    /// Replace fd 2 with this open file.
    Stderr(File),
    /// Replace both fd 1 and fd 2 with this open file (`&>`/`&>>`).
    StdoutAndStderr(File),
    /// `n>&m`: duplicate fd `m` onto fd `n`, recorded for the spawner to
    /// apply after opening files, since it must run after any `File`
    /// redirections targeting the same fd.
    DupFd { src_fd: u8, target_fd: u8 },
    /// `n>&-`: close fd `n`.
    CloseFd { src_fd: u8 },
    /// Missing input file: this does not abort redirection processing —
    /// the child's stdin is closed and a diagnostic line is queued for its
    /// stderr instead of erroring the whole command.
    MissingInput { diagnostic: String },
    /// A here-document or here-string body, to be fed to fd 0 verbatim.
    /// Distinct from [`Stdin`](Self::Stdin) because the content never
    /// touches the filesystem — see [`resolve_heredoc`]/[`resolve_herestring`].
    StdinBytes(String),
}

/// Resolves one parsed [`Redirection`] against `cwd`, opening files as
/// needed. Here-documents and here-strings are resolved to an in-memory
/// body by the caller before reaching here: their content comes from the
/// command itself, not the filesystem — see
/// [`resolve_heredoc`]/[`resolve_herestring`].
pub fn resolve_file_redirection(
    redirection: &Redirection,
    cwd: &Path,
) -> Result<ResolvedRedirection, RedirectionError> {
    match redirection {
        Redirection::File { direction, target } => resolve_file(*direction, target, cwd),
        Redirection::FdDup { src_fd, target } => Ok(match target {
            FdTarget::Close => ResolvedRedirection::CloseFd { src_fd: *src_fd },
            FdTarget::Fd(target_fd) => ResolvedRedirection::DupFd {
                src_fd: *src_fd,
                target_fd: *target_fd,
            },
        }),
        Redirection::HereDoc { .. } | Redirection::HereString { .. } => {
            unreachable!("here-docs/here-strings are resolved via resolve_heredoc/resolve_herestring")
        }
    }
}

fn resolve_file(
    direction: RedirectionDirection,
    target: &str,
    cwd: &Path,
) -> Result<ResolvedRedirection, RedirectionError> {
    let path = resolve_path(target, cwd);
    let io_err = |source: std::io::Error| RedirectionError::Io {
        path: target.to_string(),
        source,
    };

    match direction {
        RedirectionDirection::In => match File::open(&path) {
            Ok(f) => Ok(ResolvedRedirection::Stdin(f)),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Ok(ResolvedRedirection::MissingInput {
                    diagnostic: format!("{target}: No such file or directory"),
                })
            }
            Err(source) => Err(io_err(source)),
        },
        RedirectionDirection::Out => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map(ResolvedRedirection::Stdout)
            .map_err(io_err),
        RedirectionDirection::Append => OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&path)
            .map(ResolvedRedirection::Stdout)
            .map_err(io_err),
        RedirectionDirection::Err => OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map(ResolvedRedirection::Stderr)
            .map_err(io_err),
        RedirectionDirection::ErrAppend => OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&path)
            .map(ResolvedRedirection::Stderr)
            .map_err(io_err),
        RedirectionDirection::Both { append } => OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map(ResolvedRedirection::StdoutAndStderr)
            .map_err(io_err),
    }
}

fn resolve_path(target: &str, cwd: &Path) -> std::path::PathBuf {
    let path = Path::new(target);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// A here-document/here-string's body, ready to be fed to the child's
/// stdin through a pipe (they never touch the filesystem).
pub fn resolve_heredoc(body: &str) -> String {
    body.to_string()
}

pub fn resolve_herestring(content: &str) -> String {
    format!("{content}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_input_file_closes_stdin_instead_of_erroring() {
        let dir = tempdir().unwrap();
        let redir = Redirection::File {
            direction: RedirectionDirection::In,
            target: "does-not-exist.txt".to_string(),
        };
        let resolved = resolve_file_redirection(&redir, dir.path()).unwrap();
        assert!(matches!(
            resolved,
            ResolvedRedirection::MissingInput { .. }
        ));
    }

    #[test]
    fn output_redirection_creates_and_truncates() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        std::fs::write(&target, "stale content").unwrap();
        let redir = Redirection::File {
            direction: RedirectionDirection::Out,
            target: target.to_string_lossy().into_owned(),
        };
        let resolved = resolve_file_redirection(&redir, dir.path()).unwrap();
        assert!(matches!(resolved, ResolvedRedirection::Stdout(_)));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "");
    }

    #[test]
    fn append_redirection_preserves_existing_content() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.txt");
        std::fs::write(&target, "existing\n").unwrap();
        let redir = Redirection::File {
            direction: RedirectionDirection::Append,
            target: target.to_string_lossy().into_owned(),
        };
        resolve_file_redirection(&redir, dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "existing\n");
    }

    #[test]
    fn fd_dup_and_close_are_recorded_not_applied() {
        let dup = Redirection::FdDup {
            src_fd: 2,
            target: FdTarget::Fd(1),
        };
        let resolved = resolve_file_redirection(&dup, Path::new("/")).unwrap();
        assert!(matches!(
            resolved,
            ResolvedRedirection::DupFd { src_fd: 2, target_fd: 1 }
        ));

        let close = Redirection::FdDup {
            src_fd: 0,
            target: FdTarget::Close,
        };
        let resolved = resolve_file_redirection(&close, Path::new("/")).unwrap();
        assert!(matches!(resolved, ResolvedRedirection::CloseFd { src_fd: 0 }));
    }

    #[test]
    fn relative_target_resolves_against_cwd() {
        let dir = tempdir().unwrap();
        let redir = Redirection::File {
            direction: RedirectionDirection::Out,
            target: "relative.txt".to_string(),
        };
        resolve_file_redirection(&redir, dir.path()).unwrap();
        assert!(dir.path().join("relative.txt").is_file());
    }
}
