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

//! Error types for expansion and redirection.

use thiserror::Error;

/// Failure during alias/variable/brace/command-substitution expansion.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ExpansionError {
    #[error("alias expansion cycle detected for `{name}`")]
    AliasCycle { name: String },
    #[error("alias expansion depth exceeded (limit {limit})")]
    AliasDepthExceeded { limit: u32 },
    #[error("{name}: unbound variable")]
    UnboundVariable { name: String },
}

impl ExpansionError {
    /// Exit code for this error: alias cycle/depth and nounset violations
    /// both use this crate's own convention of 1, matching usage errors.
    pub const EXIT_CODE: i32 = 1;
}

/// Failure applying a redirection that is not itself the documented
/// "missing input file" case (which writes to the child's stderr rather
/// than aborting).
#[derive(Debug, Error)]
pub enum RedirectionError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{text}: invalid fd duplication target")]
    BadFdDup { text: String },
}
