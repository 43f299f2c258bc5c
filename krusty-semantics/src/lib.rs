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

//! Expansion, redirection, and execution.
//!
//! This crate sits between the pure syntax tree `krusty-syntax` produces and
//! the built-in handlers `krusty-builtin` provides: it turns a
//! [`krusty_syntax::ParsedCommand`] into running processes and aggregated
//! [`krusty_env::result::CommandResult`]s, consulting `krusty-env`'s shell
//! state for variables, aliases, options, and jobs along the way.

pub mod error;
pub mod execution;
pub mod expansion;
pub mod redirection;

pub use error::{ExpansionError, RedirectionError};
pub use execution::{execute, reap_background_jobs, run_with_timeout, ExecContext};
pub use expansion::expand_aliases;
pub use redirection::ResolvedRedirection;
