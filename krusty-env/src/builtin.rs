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

//! Built-in registry: a name→handler map with a stable contract,
//! shared by `krusty-builtin` (which populates it) and `krusty-semantics`
//! (which dispatches through it). Living here, rather than in either of
//! those crates, is what lets both depend on it without a cycle.

use crate::io::BuiltinIo;
use crate::result::CommandResult;
use crate::Shell;
use std::collections::HashMap;

/// Non-local control flow a built-in can request: `exit`, `return`, `break`,
/// `continue`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Divert {
    /// `exit [N]`: terminate the shell process with this status.
    Exit(i32),
    /// `return [N]`: stop the current `source`/`eval` invocation.
    Return(i32),
    /// `break [N]`: break out of N enclosing loop constructs.
    Break(u32),
    /// `continue [N]`: restart the Nth enclosing loop construct.
    Continue(u32),
}

/// The function signature every built-in implements: given its arguments
/// (argv[0] excluded) and the shell state, produce a [`CommandResult`].
/// Redirections against the built-in's buffered streams are spliced in by
/// the caller afterward.
pub type BuiltinFn = fn(&[String], &mut Shell, &mut dyn BuiltinIo) -> CommandResult;

/// Name→handler map.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<&'static str, BuiltinFn>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(&mut self, name: &'static str, handler: BuiltinFn) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.handlers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
        CommandResult::success()
    }

    #[test]
    fn register_and_look_up() {
        let mut registry = Registry::new();
        registry.register("true", noop);
        assert!(registry.contains("true"));
        assert!(registry.get("true").is_some());
        assert!(registry.get("false").is_none());
    }
}
