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

//! Introspection built-ins: `which`, `type`, `command`, `builtin`, `hash`,
//! `getopts`, `help`, `history`, `umask`.
//!
//! `command`/`builtin` themselves only need to handle being invoked with no
//! arguments: `krusty_semantics::execution::apply_dispatch_prefix` already
//! strips the prefix (and dispatches directly) whenever it is followed by a
//! name.

use crate::common::{parse_flags, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::variable::{OPTARG, OPTIND};
use krusty_env::Shell;

pub fn which(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut result = CommandResult::success();
    for name in args {
        if shell.builtins.contains(name) {
            result.stdout.push_str(&format!("{name}: shell builtin\n"));
        } else if let Some(path) = shell.resolve_command(name) {
            result.stdout.push_str(&format!("{}\n", path.display()));
        } else {
            result.exit_code = 1;
            result.stderr.push_str(&format!("which: {name}: not found\n"));
        }
    }
    result
}

/// `type [-afptP] name...`. `-a` lists every match kind,
/// otherwise reports the first: alias, keyword, builtin, or file.
pub fn type_(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, operands) = match parse_flags("type", args, "afptP", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let all = flags.iter().any(|(c, _)| *c == 'a');
    let path_only = flags.iter().any(|(c, _)| *c == 'p' || *c == 'P');

    let mut result = CommandResult::success();
    for name in &operands {
        let mut kinds = Vec::new();
        if let Some(alias) = shell.aliases.look_up(name) {
            kinds.push(format!("{name} is aliased to `{}'", alias.replacement));
        }
        if shell.builtins.contains(name) {
            kinds.push(format!("{name} is a shell builtin"));
        }
        if let Some(path) = shell.resolve_command(name) {
            kinds.push(format!("{name} is {}", path.display()));
        }
        if kinds.is_empty() {
            result.exit_code = 1;
            result.stderr.push_str(&format!("type: {name}: not found\n"));
            continue;
        }
        if path_only {
            if let Some(path) = shell.resolve_command(name) {
                result.stdout.push_str(&format!("{}\n", path.display()));
            }
            continue;
        }
        if all {
            for kind in &kinds {
                result.stdout.push_str(&format!("{kind}\n"));
            }
        } else {
            result.stdout.push_str(&format!("{}\n", kinds[0]));
        }
    }
    result
}

/// `command [-v|-V] name [args]` handles the no-argument case (prefix
/// stripping happens upstream); `-v`/`-V` alone with no following name
/// report nothing found.
pub fn command(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    if args.is_empty() {
        return CommandResult::success();
    }
    usage_error("command", "missing name")
}

pub fn builtin(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    if args.is_empty() {
        return CommandResult::success();
    }
    usage_error("builtin", "missing name")
}

/// `hash [-r] [-p path name] [name...]`: lists, clears, or seeds entries in
/// the shell's command path cache.
pub fn hash(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, operands) = match parse_flags("hash", args, "rp", "p") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    if flags.iter().any(|(c, _)| *c == 'r') {
        shell.hashtable.clear();
        return CommandResult::success();
    }
    if let Some((_, Some(path))) = flags.iter().find(|(c, _)| *c == 'p') {
        let Some(name) = operands.first() else {
            return usage_error("hash", "-p requires a name");
        };
        shell.hashtable.insert(name.clone(), std::path::PathBuf::from(path));
        return CommandResult::success();
    }
    if operands.is_empty() {
        let mut result = CommandResult::success();
        for (name, path) in shell.hashtable.iter() {
            result.stdout.push_str(&format!("{}\t{name}\n", path.display()));
        }
        return result;
    }
    let mut result = CommandResult::success();
    for name in operands {
        if shell.resolve_command(&name).is_none() {
            result.exit_code = 1;
            result.stderr.push_str(&format!("hash: {name}: not found\n"));
        }
    }
    result
}

/// `getopts optstring name [args...]`, following the `OPTIND`/`OPTARG`
/// convention.
pub fn getopts(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(optstring) = args.first() else {
        return usage_error("getopts", "usage: getopts optstring name [arg...]");
    };
    let Some(var_name) = args.get(1) else {
        return usage_error("getopts", "usage: getopts optstring name [arg...]");
    };
    let operands: Vec<&String> = if args.len() > 2 {
        args[2..].iter().collect()
    } else {
        shell.variables.positional_params.values.iter().collect()
    };

    let optind: usize = shell
        .variables
        .get_str(OPTIND)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1);
    let index = optind.saturating_sub(1);

    let Some(current) = operands.get(index) else {
        let _ = shell.variables.assign(var_name, "?");
        return CommandResult::with_code(1);
    };
    if !current.starts_with('-') || current.as_str() == "-" {
        let _ = shell.variables.assign(var_name, "?");
        return CommandResult::with_code(1);
    }

    let opt_char = current.chars().nth(1).unwrap_or('?');
    let wants_value = optstring.contains(&format!("{opt_char}:"));

    if !optstring.contains(opt_char) {
        let _ = shell.variables.assign(var_name, "?");
        let _ = shell.variables.assign(OPTARG, opt_char.to_string());
        let _ = shell
            .variables
            .assign(OPTIND, (optind + 1).to_string());
        return CommandResult::success();
    }

    let mut next_index = optind + 1;
    let _ = shell.variables.assign(var_name, opt_char.to_string());
    if wants_value {
        let rest = &current[2..];
        let value = if !rest.is_empty() {
            rest.to_string()
        } else if let Some(next_arg) = operands.get(index + 1) {
            next_index += 1;
            (*next_arg).clone()
        } else {
            String::new()
        };
        let _ = shell.variables.assign(OPTARG, value);
    }
    let _ = shell.variables.assign(OPTIND, next_index.to_string());
    CommandResult::success()
}

pub fn help(_args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut names: Vec<_> = shell.builtins.names().collect();
    names.sort_unstable();
    let mut result = CommandResult::success();
    result.stdout = format!("builtins: {}\n", names.join(" "));
    result
}

/// `history [-c|-n]`: the interface the core dispatches to. History
/// tracking itself is an external collaborator's concern; with no
/// collaborator wired up, this reports an empty log rather than erroring,
/// matching `jobs` on a shell with no jobs.
pub fn history(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, _) = match parse_flags("history", args, "cn", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let _ = flags;
    CommandResult::success()
}

/// `umask [-S] [-p] [mode]`.
pub fn umask(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, operands) = match parse_flags("umask", args, "Sp", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let symbolic = flags.iter().any(|(c, _)| *c == 'S');

    if let Some(mode) = operands.first() {
        match u32::from_str_radix(mode, 8) {
            Ok(value) => {
                shell.umask = value;
                CommandResult::success()
            }
            Err(_) => usage_error("umask", &format!("{mode}: invalid mode")),
        }
    } else {
        let mut result = CommandResult::success();
        result.stdout = if symbolic {
            format!("{}\n", symbolic_umask(shell.umask))
        } else {
            format!("{:04o}\n", shell.umask)
        };
        result
    }
}

/// Renders a umask value as `u=rwx,g=rwx,o=rwx` minus the masked bits
/// (`umask -S`).
fn symbolic_umask(mask: u32) -> String {
    let class = |shift: u32| {
        let bits = !(mask >> shift) & 0b111;
        let mut s = String::new();
        if bits & 0b100 != 0 {
            s.push('r');
        }
        if bits & 0b010 != 0 {
            s.push('w');
        }
        if bits & 0b001 != 0 {
            s.push('x');
        }
        s
    };
    format!("u={},g={},o={}", class(6), class(3), class(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;

    #[test]
    fn hash_dash_r_clears_table() {
        let mut shell = Shell::new();
        shell.hashtable.insert("ls", std::path::PathBuf::from("/bin/ls"));
        let mut io = BufferIo::new();
        hash(&["-r".to_string()], &mut shell, &mut io);
        assert_eq!(shell.hashtable.get("ls"), None);
    }

    #[test]
    fn umask_sets_and_reports_octal() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        umask(&["022".to_string()], &mut shell, &mut io);
        assert_eq!(shell.umask, 0o022);
        let result = umask(&[], &mut shell, &mut io);
        assert_eq!(result.stdout, "0022\n");
    }

    #[test]
    fn getopts_walks_through_positional_flags() {
        let mut shell = Shell::new();
        shell.variables.positional_params.values = vec!["-a".to_string(), "-b".to_string(), "x".to_string()];
        let mut io = BufferIo::new();
        let result = getopts(&["ab".to_string(), "opt".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.variables.get_str("opt"), Some("a"));
        let result = getopts(&["ab".to_string(), "opt".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.variables.get_str("opt"), Some("b"));
    }

    #[test]
    fn which_reports_builtin() {
        let mut shell = Shell::new();
        shell.builtins.register("true", |_, _, _| CommandResult::success());
        let mut io = BufferIo::new();
        let result = which(&["true".to_string()], &mut shell, &mut io);
        assert!(result.stdout.contains("shell builtin"));
    }
}
