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

//! Alias and variable built-ins: `alias`, `unalias`, `export`, `declare`,
//! `readonly`, `local`, `unset`, `set`, `env`.

use crate::common::{parse_flags, runtime_error, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::option::{self, Option as ShellOption};
use krusty_env::result::CommandResult;
use krusty_env::Shell;
use krusty_quote::quote;

/// Splits `NAME=value` into its parts, or `None` if `text` has no `=`.
fn split_assignment(text: &str) -> Option<(&str, &str)> {
    text.split_once('=')
}

pub fn alias(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    if args.is_empty() {
        let mut result = CommandResult::success();
        for a in shell.aliases.iter_sorted() {
            result
                .stdout
                .push_str(&format!("alias {}={}\n", a.name, quote(&a.replacement)));
        }
        return result;
    }

    let mut result = CommandResult::success();
    for arg in args {
        match split_assignment(arg) {
            Some((name, value)) => shell.aliases.insert(name, value),
            None => match shell.aliases.look_up(arg) {
                Some(a) => result
                    .stdout
                    .push_str(&format!("alias {}={}\n", a.name, quote(&a.replacement))),
                None => {
                    result.exit_code = 1;
                    result.stderr.push_str(&format!("alias: {arg}: not found\n"));
                }
            },
        }
    }
    result
}

pub fn unalias(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, operands) = match parse_flags("unalias", args, "a", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    if flags.iter().any(|(c, _)| *c == 'a') {
        shell.aliases.clear();
        return CommandResult::success();
    }
    let mut result = CommandResult::success();
    for name in operands {
        if !shell.aliases.remove(&name) {
            result.exit_code = 1;
            result.stderr.push_str(&format!("unalias: {name}: not found\n"));
        }
    }
    result
}

/// Shared implementation for `export`/`declare`/`readonly`/`local`: all
/// four act on `krusty_env::variable::VariableSet` attributes, differing
/// only in which attribute(s) they set (`local` is a synonym for `declare`,
/// see DESIGN.md).
fn declare_like(
    prog: &str,
    args: &[String],
    shell: &mut Shell,
    export: Option<bool>,
    readonly: Option<bool>,
    list_flag: char,
) -> CommandResult {
    let (flags, operands) = match parse_flags(prog, args, "xrp", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let mut export = export;
    let mut readonly = readonly;
    for (c, _) in &flags {
        match c {
            'x' => export = Some(true),
            'r' => readonly = Some(true),
            'p' => {}
            _ => {}
        }
    }

    if operands.is_empty() || flags.iter().any(|(c, _)| *c == list_flag) {
        let mut result = CommandResult::success();
        let mut names: Vec<_> = shell.variables.iter().map(|(n, _)| n.to_string()).collect();
        names.sort();
        for name in names {
            let var = shell.variables.get(&name).unwrap();
            if export == Some(true) && !var.exported {
                continue;
            }
            if let Some(value) = &var.value {
                result
                    .stdout
                    .push_str(&format!("{name}={}\n", quote(value)));
            } else {
                result.stdout.push_str(&format!("{name}\n"));
            }
        }
        return result;
    }

    let mut result = CommandResult::success();
    for operand in operands {
        match split_assignment(&operand) {
            Some((name, value)) => {
                if let Err(e) = shell.variables.assign(name, value) {
                    result.exit_code = 1;
                    result.stderr.push_str(&format!("{prog}: {e}\n"));
                    continue;
                }
                shell.variables.declare(name, export, readonly);
            }
            None => shell.variables.declare(&operand, export, readonly),
        }
    }
    result
}

pub fn export(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    declare_like("export", args, shell, Some(true), None, 'p')
}

pub fn readonly(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    declare_like("readonly", args, shell, None, Some(true), 'p')
}

pub fn declare(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    declare_like("declare", args, shell, None, None, 'p')
}

pub fn local(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    declare_like("local", args, shell, None, None, 'p')
}

pub fn unset(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let (_flags, operands) = match parse_flags("unset", args, "vf", "") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };
    let mut result = CommandResult::success();
    for name in operands {
        if !shell.variables.unset(&name) {
            result.exit_code = 1;
            result.stderr.push_str(&format!("unset: {name}: readonly variable\n"));
        }
    }
    result
}

pub fn env(_args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut result = CommandResult::success();
    let mut pairs: Vec<_> = shell.variables.exported_pairs().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in pairs {
        result.stdout.push_str(&format!("{name}={value}\n"));
    }
    result
}

/// `set -e`/`-u`/`-x`/`-o name`/`+o name`, and bare `set -o`/`set` to list
/// current option states.
pub fn set(args: &[String], shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut iter = args.iter().peekable();
    let mut saw_option = false;

    while let Some(arg) = iter.peek() {
        if arg.as_str() == "--" {
            iter.next();
            break;
        }
        let Some(sign) = arg.chars().next() else { break };
        if sign != '-' && sign != '+' {
            break;
        }
        let arg = iter.next().unwrap();
        let state = if sign == '-' { option::On } else { option::Off };
        let body = &arg[1..];

        if body == "o" {
            saw_option = true;
            match iter.peek().map(|s| s.as_str()) {
                Some(name) if !name.starts_with('-') && !name.starts_with('+') => {
                    let name = iter.next().unwrap();
                    match name.parse::<ShellOption>() {
                        Ok(opt) => shell.options.set(opt, state),
                        Err(_) => return usage_error("set", &format!("{name}: unknown option")),
                    }
                }
                _ => {
                    let mut result = CommandResult::success();
                    for opt in option::Option::iter() {
                        result
                            .stdout
                            .push_str(&format!("{}\t{}\n", opt.long_name(), shell.options.get(opt)));
                    }
                    return result;
                }
            }
            continue;
        }

        for c in body.chars() {
            let opt = match c {
                'e' => ShellOption::ErrExit,
                'u' => ShellOption::NounSet,
                'x' => ShellOption::XTrace,
                'n' => ShellOption::NoExec,
                'v' => ShellOption::Verbose,
                _ => return usage_error("set", &format!("-{c}: unknown option")),
            };
            shell.options.set(opt, state);
        }
    }

    if !saw_option {
        let operands: Vec<String> = iter.cloned().collect();
        if !operands.is_empty() {
            shell.variables.positional_params.values = operands;
        }
    }

    CommandResult::success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;

    #[test]
    fn alias_define_and_list() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        alias(&["ll=ls -la".to_string()], &mut shell, &mut io);
        let result = alias(&[], &mut shell, &mut io);
        assert!(result.stdout.contains("alias ll="));
    }

    #[test]
    fn unalias_unknown_is_error() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = unalias(&["nope".to_string()], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn export_marks_variable_exported() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        export(&["FOO=bar".to_string()], &mut shell, &mut io);
        assert!(shell.variables.get("FOO").unwrap().exported);
        assert_eq!(shell.variables.get_str("FOO"), Some("bar"));
    }

    #[test]
    fn readonly_then_unset_fails() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        readonly(&["FOO=bar".to_string()], &mut shell, &mut io);
        let result = unset(&["FOO".to_string()], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn set_dash_e_turns_on_errexit() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        set(&["-e".to_string()], &mut shell, &mut io);
        assert!(shell.options.is_on(ShellOption::ErrExit));
    }

    #[test]
    fn set_dash_o_pipefail_by_name() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        set(&["-o".to_string(), "pipefail".to_string()], &mut shell, &mut io);
        assert!(shell.options.is_on(ShellOption::PipeFail));
    }

    #[test]
    fn set_operands_become_positional_params() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        set(&["--".to_string(), "a".to_string(), "b".to_string()], &mut shell, &mut io);
        assert_eq!(shell.variables.positional_params.get(1), Some("a"));
        assert_eq!(shell.variables.positional_params.get(2), Some("b"));
    }
}
