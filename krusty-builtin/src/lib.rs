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

//! Built-in command implementations.
//!
//! Every function here matches [`krusty_env::builtin::BuiltinFn`]; none of
//! them touch the outside world except through the `Shell` state and the
//! `&mut dyn BuiltinIo` they're handed, so redirections and capture work
//! the same way for a built-in as for an external command.

pub mod bookmark;
pub mod common;
pub mod control;
pub mod introspect;
pub mod io_builtins;
pub mod jobs;
pub mod navigation;
pub mod true_false;
pub mod vars;

use krusty_env::builtin::Registry;

/// Registers every built-in this crate implements into `registry`, called
/// once at shell startup.
pub fn register_all(registry: &mut Registry) {
    registry.register("true", true_false::r#true);
    registry.register("false", true_false::r#false);
    registry.register(":", true_false::r#true);

    registry.register("cd", navigation::cd);
    registry.register("pwd", navigation::pwd);
    registry.register("pushd", navigation::pushd);
    registry.register("popd", navigation::popd);
    registry.register("dirs", navigation::dirs_builtin);

    registry.register("bookmark", bookmark::bookmark);

    registry.register("alias", vars::alias);
    registry.register("unalias", vars::unalias);
    registry.register("export", vars::export);
    registry.register("declare", vars::declare);
    registry.register("readonly", vars::readonly);
    registry.register("local", vars::local);
    registry.register("unset", vars::unset);
    registry.register("set", vars::set);
    registry.register("env", vars::env);

    registry.register("echo", io_builtins::echo);
    registry.register("printf", io_builtins::printf);
    registry.register("read", io_builtins::read);

    registry.register("exit", control::exit);
    registry.register("return", control::r#return);
    registry.register("break", control::r#break);
    registry.register("continue", control::r#continue);
    registry.register("eval", control::eval);
    registry.register("exec", control::exec);
    registry.register(".", control::source);
    registry.register("source", control::source);
    registry.register("test", control::test);
    registry.register("[", control::test);
    registry.register("trap", control::trap);
    registry.register("timeout", control::timeout);
    registry.register("times", control::times);

    registry.register("jobs", jobs::jobs);
    registry.register("fg", jobs::fg);
    registry.register("bg", jobs::bg);
    registry.register("kill", jobs::kill);
    registry.register("wait", jobs::wait);
    registry.register("disown", jobs::disown);
    registry.register("suspend", jobs::suspend);

    registry.register;
    registry.register;
    registry.register;
    registry.register;
    registry.register;
    registry.register;
    registry.register;
    registry.register;
    registry.register;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_populates_every_core_builtin() {
        let mut registry = Registry::new();
        register_all(&mut registry);
        for name in [
            "true", "false", "cd", "pwd", "alias", "export", "echo", "printf", "read", "exit",
            "break", "continue", "eval", "exec", "source", "test", "trap", "jobs", "fg", "bg",
            "kill", "wait", "which", "type", "hash", "getopts", "umask",
        ] {
            assert!(registry.contains(name), "missing builtin: {name}");
        }
    }
}
