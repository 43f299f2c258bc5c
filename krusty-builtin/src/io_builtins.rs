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

//! `echo`, `printf`, `read`.

use crate::common::{parse_flags, usage_error};
use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::variable::IFS;
use krusty_env::Shell;
use krusty_quote::quote_printf;

pub fn echo(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let mut no_newline = false;
    let mut words: &[String] = args;
    if let Some(first) = words.first() {
        if first == "-n" {
            no_newline = true;
            words = &words[1..];
        }
    }
    let mut result = CommandResult::success();
    result.stdout = words.join(" ");
    if !no_newline {
        result.stdout.push('\n');
    }
    result
}

/// Expands backslash escapes in a `printf` format/string argument:
/// `\n \t \\ \" \a \b \f \r \v` and `\0NNN` octal.
fn expand_backslashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0C}'),
            Some('v') => out.push('\u{0B}'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('0') => {
                let mut digits = String::new();
                for _ in 0..3 {
                    if let Some(d) = chars.peek() {
                        if d.is_digit(8) {
                            digits.push(*d);
                            chars.next();
                            continue;
                        }
                    }
                    break;
                }
                if let Ok(value) = u8::from_str_radix(&digits, 8) {
                    out.push(value as char);
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Renders one `%`-directive against `arg`, consuming the conversion
/// character. Supports `%s %d %i %q %b %o %x %X %f %e %g %c %%` with
/// optional `-`/`0` flags, width, and `.precision`.
fn format_one -> String {
    let body = &spec[1..spec.len() - 1];
    let conv = spec.chars().last().unwrap();
    let (flags_and_width, precision) = match body.split_once('.') {
        Some((w, p)) => (w, Some(p)),
        None => (body, None),
    };
    let left_align = flags_and_width.starts_with('-');
    let zero_pad = flags_and_width.trim_start_matches('-').starts_with('0');
    let width: usize = flags_and_width
        .trim_start_matches('-')
        .trim_start_matches('0')
        .parse()
        .unwrap_or(0);
    let precision: Option<usize> = precision.and_then(|p| p.parse().ok());

    let arg = arg.unwrap_or("");
    let mut rendered = match conv {
        '%' => "%".to_string(),
        's' => match precision {
            Some(p) => arg.chars().take(p).collect(),
            None => arg.to_string(),
        },
        'q' => quote_printf(arg),
        'b' => expand_backslashes(arg),
        'c' => arg.chars().next().map(String::from).unwrap_or_default(),
        'd' | 'i' => arg.parse::<i64>().unwrap_or(0).to_string(),
        'o' => format!("{:o}", arg.parse::<i64>().unwrap_or(0)),
        'x' => format!("{:x}", arg.parse::<i64>().unwrap_or(0)),
        'X' => format!("{:X}", arg.parse::<i64>().unwrap_or(0)),
        'f' | 'e' | 'g' => {
            let value = arg.parse::<f64>().unwrap_or(0.0);
            let p = precision.unwrap_or(6);
            match conv {
                'e' => format!("{value:.p$e}"),
                _ => format!("{value:.p$}"),
            }
        }
        _ => arg.to_string(),
    };

    if rendered.len() < width {
        let pad = width - rendered.len();
        if left_align {
            rendered.push_str(&" ".repeat(pad));
        } else if zero_pad && matches!(conv, 'd' | 'i' | 'o' | 'x' | 'X' | 'f' | 'e' | 'g') {
            rendered = format!("{}{}", "0".repeat(pad), rendered);
        } else {
            rendered = format!("{}{}", " ".repeat(pad), rendered);
        }
    }
    rendered
}

/// Splits a format string into literal and `%directive` pieces, expanding
/// `\`-escapes in the literal pieces along the way. `args[start..]` feeds
/// the directives; returns the rendered text and how many args it consumed
/// (for `printf`'s format-repeat-until-args-exhausted loop).
fn render_format(format: &str, args: &[String], start: usize) -> (String, usize) {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut index = start;

    while let Some(c) = chars.next() {
        if c == '%' {
            let mut spec = String::from("%");
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            while let Some(&next) = chars.peek() {
                spec.push(next);
                chars.next();
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            let consumes_arg = !spec.ends_with('%');
            let arg = if consumes_arg {
                let a = args.get(index);
                if a.is_some() {
                    index += 1;
                }
                a
            } else {
                None
            };
            out.push_str(&format_one(&spec, arg.map(String::as_str)));
        } else if c == '\\' {
            let mut escape = String::from("\\");
            if let Some(&next) = chars.peek() {
                escape.push(next);
                chars.next();
                if next == '0' {
                    for _ in 0..3 {
                        if let Some(&d) = chars.peek() {
                            if d.is_digit(8) {
                                escape.push(d);
                                chars.next();
                                continue;
                            }
                        }
                        break;
                    }
                }
            }
            out.push_str(&expand_backslashes(&escape));
        } else {
            out.push(c);
        }
    }
    (out, index - start)
}

pub fn printf(args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    let Some(format) = args.first() else {
        return usage_error("printf", "usage: printf format [arguments]");
    };
    let operands = &args[1..];
    let mut result = CommandResult::success();
    let mut index = 0;

    loop {
        let (rendered, consumed) = render_format(format, operands, index);
        result.stdout.push_str(&rendered);
        index += consumed;
        if consumed == 0 || index >= operands.len() {
            break;
        }
    }
    result
}

/// `read [-r] [-s] [-n N | -N N] [-d delim] [-p prompt] [-a array] name...`
///. `-s`/`-t`/`-u` are accepted but documented no-ops since
/// [`BuiltinIo`] has no terminal/timeout/fd concept to act on. `-a array`
/// stores the split fields under the indexed flat-map keys `array[0]`,
/// `array[1]`, ... — see DESIGN.md's Open Question: `VariableSet` has no
/// array value type and the expansion engine has no `${array[i]}` syntax,
/// so these entries are only reachable via `declare -p`/`env`, not `$`.
pub fn read(args: &[String], shell: &mut Shell, io: &mut dyn BuiltinIo) -> CommandResult {
    let (flags, operands) = match parse_flags("read", args, "rsnNdpatu", "anNdptu") {
        Ok(parsed) => parsed,
        Err(e) => return e,
    };

    let mut raw = false;
    let mut delim = '\n';
    let mut max_chars: Option<usize> = None;
    let mut prompt: Option<String> = None;
    let mut array_name: Option<String> = None;

    for (c, value) in &flags {
        match c {
            'r' => raw = true,
            'd' => {
                delim = value.as_deref().and_then(|v| v.chars().next()).unwrap_or('\0');
            }
            'n' | 'N' => {
                max_chars = value.as_deref().and_then(|v| v.parse().ok());
            }
            'p' => prompt = value.clone(),
            'a' => array_name = value.clone(),
            _ => {}
        }
    }

    if let Some(p) = prompt {
        io.write_stderr(&p);
    }

    let Some(line) = io.read_until(delim, max_chars) else {
        return CommandResult::with_code(1);
    };

    let line = if raw { line } else { expand_backslashes(&line) };

    let ifs = shell
        .variables
        .get_str(IFS)
        .unwrap_or(" \t\n")
        .to_string();
    let fields: Vec<&str> = line.split(|c: char| ifs.contains(c)).filter(|s| !s.is_empty()).collect();

    if let Some(array_name) = array_name {
        for (i, field) in fields.iter().enumerate() {
            let key = format!("{array_name}[{i}]");
            if let Err(e) = shell.variables.assign(&key, field.to_string()) {
                return CommandResult {
                    exit_code: 1,
                    stdout: String::new(),
                    stderr: format!("read: {e}\n"),
                    duration: Default::default(),
                    divert: None,
                };
            }
        }
        return CommandResult::success();
    }

    if operands.is_empty() {
        let _ = shell.variables.assign("REPLY", line);
        return CommandResult::success();
    }

    for (i, name) in operands.iter().enumerate() {
        let value = if i + 1 == operands.len() {
            fields.get(i..).map(|rest| rest.join(" ")).unwrap_or_default()
        } else {
            fields.get(i).map(|s| s.to_string()).unwrap_or_default()
        };
        if let Err(e) = shell.variables.assign(name, value) {
            return CommandResult {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("read: {e}\n"),
                duration: Default::default(),
                divert: None,
            };
        }
    }
    CommandResult::success()
}

#[cfg(test)]
mod tests {
    use super::*;
    use krusty_env::io::BufferIo;

    #[test]
    fn echo_joins_with_spaces_and_newline() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = echo(&["a".to_string(), "b".to_string()], &mut shell, &mut io);
        assert_eq!(result.stdout, "a b\n");
    }

    #[test]
    fn echo_dash_n_suppresses_newline() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = echo(&["-n".to_string(), "hi".to_string()], &mut shell, &mut io);
        assert_eq!(result.stdout, "hi");
    }

    #[test]
    fn printf_substitutes_and_repeats_format_for_extra_args() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = printf(
            &["%s-%s\\n".to_string(), "a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
            &mut shell,
            &mut io,
        );
        assert_eq!(result.stdout, "a-b\nc-d\n");
    }

    #[test]
    fn printf_percent_q_quotes_its_argument() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = printf(&["%q\\n".to_string(), "a b".to_string()], &mut shell, &mut io);
        assert_eq!(result.stdout, "a\\ b\n");
    }

    #[test]
    fn read_splits_on_ifs_into_named_variables() {
        let mut shell = Shell::new();
        let mut io = BufferIo::with_stdin("one two three\n");
        let result = read(&["a".to_string(), "b".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.variables.get_str("a"), Some("one"));
        assert_eq!(shell.variables.get_str("b"), Some("two three"));
    }

    #[test]
    fn read_dash_n_limits_character_count() {
        let mut shell = Shell::new();
        let mut io = BufferIo::with_stdin("hello");
        let result = read(&["-n".to_string(), "3".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.variables.get_str("REPLY"), Some("hel"));
    }

    #[test]
    fn read_dash_a_splits_fields_into_indexed_keys() {
        let mut shell = Shell::new();
        let mut io = BufferIo::with_stdin("one two three\n");
        let result = read(&["-a".to_string(), "arr".to_string()], &mut shell, &mut io);
        assert!(result.is_success());
        assert_eq!(shell.variables.get_str("arr[0]"), Some("one"));
        assert_eq!(shell.variables.get_str("arr[1]"), Some("two"));
        assert_eq!(shell.variables.get_str("arr[2]"), Some("three"));
    }

    #[test]
    fn read_at_eof_fails() {
        let mut shell = Shell::new();
        let mut io = BufferIo::new();
        let result = read(&[], &mut shell, &mut io);
        assert_eq!(result.exit_code, 1);
    }
}
