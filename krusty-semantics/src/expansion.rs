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

//! Expansion engine: alias substitution with cycle detection,
//! parameter expansion, brace expansion, tilde expansion, and the glue
//! command substitution hooks into (the execution engine supplies the
//! actual "run this and capture stdout" callback, since that requires the
//! built-in registry this crate doesn't otherwise need).

use crate::error::ExpansionError;
use krusty_env::Shell;
use krusty_syntax::{ChainLink, ChainOp, Command, ParsedCommand, Quoting, Stage};
use std::collections::HashSet;

/// Hard cap on recursive alias expansion.
pub const ALIAS_DEPTH_CAP: u32 = 10;

/// Expands every alias-eligible command name in `parsed`, recursively and
/// cycle-safely, splicing re-parsed pipelines/chains back into place.
///
/// A stage that is the sole stage of the sole pipeline in its chain link
/// may expand into a full multi-stage/multi-link fragment: alias values
/// containing `|`, `;`, `&&`, `||` are re-parsed as a sequence. A
/// stage that shares its pipeline with other stages can still have its own
/// command aliased, but the fragment is collapsed to its first stage — see
/// DESIGN.md for why a mid-pipeline alias cannot fan out into new stages.
pub fn expand_aliases(shell: &Shell, parsed: ParsedCommand) -> Result<ParsedCommand, ExpansionError> {
    let mut new_links = Vec::with_capacity(parsed.links.len());
    for link in parsed.links {
        if link.pipeline.len() == 1 {
            let stage = link.pipeline.into_iter().next().unwrap();
            match expand_stage_to_fragment(shell, &stage)? {
                None => new_links.push(ChainLink {
                    pipeline: vec![stage],
                    op: link.op,
                    background: link.background,
                }),
                Some(mut fragment) => {
                    if let Some(last) = fragment.last_mut() {
                        last.op = link.op;
                        last.background = last.background || link.background;
                    }
                    new_links.extend(fragment);
                }
            }
        } else {
            let mut pipeline = Vec::with_capacity(link.pipeline.len());
            for stage in link.pipeline {
                match expand_stage_to_fragment(shell, &stage)? {
                    None => pipeline.push(stage),
                    Some(fragment) => {
                        let first_stage = fragment
                            .into_iter()
                            .next()
                            .and_then(|l| l.pipeline.into_iter().next())
                            .unwrap_or_else(|| stage.clone());
                        pipeline.push(first_stage);
                    }
                }
            }
            new_links.push(ChainLink {
                pipeline,
                op: link.op,
                background: link.background,
            });
        }
    }
    Ok(ParsedCommand { links: new_links })
}

/// Chases a single stage's command name through the alias table, following
/// the alias substitution rules, returning `None` if the name is not
/// aliased at all.
fn expand_stage_to_fragment(
    shell: &Shell,
    stage: &Stage,
) -> Result<Option<Vec<ChainLink>>, ExpansionError> {
    if shell.aliases.look_up(&stage.command.name).is_none() {
        return Ok(None);
    }

    let mut visited = HashSet::new();
    let mut name = stage.command.name.clone();
    let mut args = stage.command.args.clone();

    for depth in 1..=ALIAS_DEPTH_CAP + 1 {
        if depth > ALIAS_DEPTH_CAP {
            return Err(ExpansionError::AliasDepthExceeded {
                limit: ALIAS_DEPTH_CAP,
            });
        }
        let Some(alias) = shell.aliases.look_up(&name) else {
            // `name` is no longer aliased: build the final fragment from
            // the last expansion's reparse.
            return Ok(Some(vec![single_command_link(name, args)]));
        };
        if !visited.insert(name.clone()) {
            return Err(ExpansionError::AliasCycle { name });
        }

        let body = if alias.replacement.trim().is_empty() {
            empty_alias_body(&args)
        } else {
            let rendered = render_alias_body(&alias.replacement, &args);
            expand_alias_env_and_cwd(&rendered, shell)
        };

        match krusty_syntax::parse(&body) {
            Ok(parsed) if !parsed.is_empty() => {
                if parsed.links.len() == 1 && parsed.links[0].pipeline.len() == 1 {
                    let next = &parsed.links[0].pipeline[0].command;
                    name = next.name.clone();
                    args = next.args.clone();
                    continue;
                }
                return Ok(Some(brace_expand_links(parsed.links)));
            }
            _ => {
                let mut parts = body.split_whitespace().map(str::to_string);
                let fallback_name = parts.next().unwrap_or_default();
                let fallback_args: Vec<String> = parts.collect();
                return Ok(Some(vec![single_command_link(fallback_name, fallback_args)]));
            }
        }
    }
    unreachable!("loop always returns or errors before exhausting the depth cap")
}

fn single_command_link(name: String, args: Vec<String>) -> ChainLink {
    let (expanded_name, expanded_args) = brace_expand_command(&name, &args);
    ChainLink {
        pipeline: vec![Stage {
            command: Command {
                name: expanded_name,
                args: expanded_args,
                ..Default::default()
            },
            redirections: Vec::new(),
        }],
        op: ChainOp::None,
        background: false,
    }
}

fn brace_expand_links(links: Vec<ChainLink>) -> Vec<ChainLink> {
    links
        .into_iter()
        .map(|mut link| {
            for stage in &mut link.pipeline {
                let (name, args) = brace_expand_command(&stage.command.name, &stage.command.args);
                stage.command.name = name;
                stage.command.args = args;
            }
            link
        })
        .collect()
}

fn brace_expand_command(name: &str, args: &[String]) -> (String, Vec<String>) {
    let name = brace_expand(name).into_iter().next().unwrap_or_else(|| name.to_string());
    let args = args.iter().flat_map(|a| brace_expand(a)).collect();
    (name, args)
}

/// Empty-alias rule: drop the name; the first argument becomes
/// the new command, or the command becomes a no-op `true` if there are no
/// arguments.
fn empty_alias_body(args: &[String]) -> String {
    if args.is_empty() {
        "true".to_string()
    } else {
        args.join(" ")
    }
}

/// Substitutes `$@`/`$1`..`$N` into an alias's replacement text, then
/// appends any unreferenced extra arguments per the trailing-space rule
///.
fn render_alias_body(value: &str, args: &[String]) -> String {
    let (substituted, used_positional) = substitute_positional(value, args);
    if used_positional || args.is_empty() {
        return substituted;
    }
    if substituted.ends_with(' ') {
        format!("{substituted}{}", args.join(" "))
    } else {
        format!("{substituted} {}", args.join(" "))
    }
}

fn substitute_positional(value: &str, args: &[String]) -> (String, bool) {
    let mut out = String::new();
    let mut used = false;
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' {
            if chars.get(i + 1) == Some(&'@') {
                used = true;
                let rendered: Vec<String> = args
                    .iter()
                    .map(|a| {
                        if a.chars().any(char::is_whitespace) {
                            format!("\"{a}\"")
                        } else {
                            a.clone()
                        }
                    })
                    .collect();
                out.push_str(&rendered.join(" "));
                i += 2;
                continue;
            }
            if let Some(d) = chars.get(i + 1).filter(|c| c.is_ascii_digit() && **c != '0') {
                used = true;
                let idx = d.to_digit(10).unwrap() as usize;
                if let Some(arg) = args.get(idx - 1) {
                    out.push_str(arg);
                }
                i += 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    (out, used)
}

/// The restricted expansion an alias's own replacement text undergoes
/// before being re-parsed: `$NAME` (uppercase/digits/
/// underscore only) and literal `` `pwd` ``/`$(pwd)`.
fn expand_alias_env_and_cwd(text: &str, shell: &Shell) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1).is_some_and(|c| c.is_ascii_uppercase() || *c == '_') {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_ascii_uppercase() || chars[j].is_ascii_digit() || chars[j] == '_') {
                j += 1;
            }
            let name: String = chars[i + 1..j].iter().collect();
            if let Some(v) = shell.variables.get_str(&name) {
                out.push_str(v);
            }
            i = j;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    let cwd = shell.cwd.to_string_lossy();
    out.replace("$(pwd)", &cwd).replace("`pwd`", &cwd)
}

/// Expands `$NAME`/`${NAME}` and `$@`/`$1`..`$N` in a single word, and
/// (unless `quoting` is [`Quoting::Single`]) runs `run_cmd` for any
/// `$(...)` or backtick command substitution found. Tilde expansion runs
/// last so a substitution result is never itself tilde-expanded.
///
/// Callers whose `run_cmd` needs a mutable borrow of the same `Shell` this
/// function also borrows immutably (i.e. the execution engine, where
/// command substitution recursively executes against `shell`) cannot call
/// this all-in-one form — the two borrows would overlap at the call site.
/// Use [`run_command_substitutions`] followed by [`expand_rest`] instead;
/// they split the command-substitution step (which only needs `run_cmd`)
/// from the variable/tilde step (which only needs `&Shell`), so the two
/// borrows never need to be alive at once.
pub fn expand_word(
    word: &str,
    quoting: Quoting,
    shell: &Shell,
    nounset: bool,
    run_cmd: &mut dyn FnMut(&str) -> String,
) -> Result<String, ExpansionError> {
    if quoting == Quoting::Single {
        return Ok(word.to_string());
    }
    let after_cmd_subst = run_command_substitutions(word, run_cmd);
    let after_vars = substitute_variables(&after_cmd_subst, shell, nounset)?;
    Ok(expand_tilde(&after_vars, shell))
}

/// Runs `$(...)`/backtick command substitution over `word`, leaving
/// variable and tilde expansion to [`expand_rest`].
pub fn run_command_substitutions(word: &str, run_cmd: &mut dyn FnMut(&str) -> String) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'(') {
            let mut depth = 1;
            let mut j = i + 2;
            while j < chars.len() && depth > 0 {
                match chars[j] {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            let inner: String = chars[i + 2..j.min(chars.len())].iter().collect();
            out.push_str(&run_cmd(&inner));
            i = j + 1;
            continue;
        }
        if chars[i] == '`' {
            if let Some(rel) = chars[i + 1..].iter().position(|&c| c == '`') {
                let end = i + 1 + rel;
                let inner: String = chars[i + 1..end].iter().collect();
                out.push_str(&run_cmd(&inner));
                i = end + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn substitute_variables(text: &str, shell: &Shell, nounset: bool) -> Result<String, ExpansionError> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' {
            if chars.get(i + 1) == Some(&'{') {
                if let Some(rel) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let end = i + 2 + rel;
                    let name: String = chars[i + 2..end].iter().collect();
                    out.push_str(&lookup_var(&name, shell, nounset)?);
                    i = end + 1;
                    continue;
                }
            } else if chars.get(i + 1) == Some(&'@') {
                out.push_str(&shell.variables.positional_params.values.join(" "));
                i += 2;
                continue;
            } else if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
                let idx = chars[i + 1].to_digit(10).unwrap() as usize;
                if let Some(v) = shell.variables.positional_params.get(idx) {
                    out.push_str(v);
                }
                i += 2;
                continue;
            } else if chars.get(i + 1).is_some_and(|c| is_name_start(*c)) {
                let mut j = i + 1;
                while j < chars.len() && is_name_continue(chars[j]) {
                    j += 1;
                }
                let name: String = chars[i + 1..j].iter().collect();
                out.push_str(&lookup_var(&name, shell, nounset)?);
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    Ok(out)
}

/// Variable and tilde expansion only, for callers that already ran command
/// substitution separately (see [`expand_word`]'s doc comment for why).
/// `quoting` is still honored: a single-quoted word is returned unchanged.
pub fn expand_rest(
    text: &str,
    quoting: Quoting,
    shell: &Shell,
    nounset: bool,
) -> Result<String, ExpansionError> {
    if quoting == Quoting::Single {
        return Ok(text.to_string());
    }
    let after_vars = substitute_variables(text, shell, nounset)?;
    Ok(expand_tilde(&after_vars, shell))
}

fn lookup_var(name: &str, shell: &Shell, nounset: bool) -> Result<String, ExpansionError> {
    match shell.variables.get_str(name) {
        Some(v) => Ok(v.to_string()),
        None if nounset => Err(ExpansionError::UnboundVariable {
            name: name.to_string(),
        }),
        None => Ok(String::new()),
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit()
}

fn expand_tilde(word: &str, shell: &Shell) -> String {
    if let Some(rest) = word.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = shell.home_dir() {
                return format!("{}{}", home.display(), rest);
            }
        }
    }
    word.to_string()
}

/// Brace expansion: `{a,b,c}` and ascending/descending numeric
/// ranges `{1..5}`, applied recursively left-to-right.
pub fn brace_expand(word: &str) -> Vec<String> {
    let Some((prefix, body, suffix)) = find_first_brace(word) else {
        return vec![word.to_string()];
    };
    let alternatives = expand_brace_body(&body);
    if alternatives.is_empty() {
        return vec![word.to_string()];
    }
    alternatives
        .into_iter()
        .flat_map(|alt| brace_expand(&format!("{prefix}{alt}{suffix}")))
        .collect()
}

fn find_first_brace(word: &str) -> Option<(String, String, String)> {
    let start = word.find('{')?;
    let mut depth = 0i32;
    let mut end = None;
    for (i, c) in word[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    let body = &word[start + 1..end];
    if !body.contains(',') && !body.contains("..") {
        return None;
    }
    Some((word[..start].to_string(), body.to_string(), word[end + 1..].to_string()))
}

fn expand_brace_body(body: &str) -> Vec<String> {
    if let Some((lo, hi)) = parse_range(body) {
        return numeric_range(lo, hi);
    }
    split_top_level_commas(body)
}

fn split_top_level_commas(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in body.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn parse_range(body: &str) -> Option<(i64, i64)> {
    let (a, b) = body.split_once("..")?;
    if a.contains(',') || b.contains(',') || a.is_empty() || b.is_empty() {
        return None;
    }
    Some((a.parse().ok()?, b.parse().ok()?))
}

fn numeric_range(lo: i64, hi: i64) -> Vec<String> {
    if lo <= hi {
        (lo..=hi).map(|n| n.to_string()).collect()
    } else {
        (hi..=lo).rev().map(|n| n.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_subst(_: &str) -> String {
        String::new()
    }

    #[test]
    fn alias_expansion_terminates_on_cycle() {
        let mut shell = Shell::new();
        shell.aliases.insert("a", "b");
        shell.aliases.insert("b", "a");
        let parsed = krusty_syntax::parse("a").unwrap();
        let err = expand_aliases(&shell, parsed).unwrap_err();
        assert!(matches!(err, ExpansionError::AliasCycle { .. }));
    }

    #[test]
    fn simple_alias_expands_to_command() {
        let mut shell = Shell::new();
        shell.aliases.insert("ll", "ls -la");
        let parsed = krusty_syntax::parse("ll /tmp").unwrap();
        let expanded = expand_aliases(&shell, parsed).unwrap();
        let stage = &expanded.links[0].pipeline[0];
        assert_eq!(stage.command.name, "ls");
        assert_eq!(stage.command.args, vec!["-la", "/tmp"]);
    }

    #[test]
    fn positional_placeholder_alias() {
        let mut shell = Shell::new();
        shell.aliases.insert("a", "echo $1");
        let parsed = krusty_syntax::parse("a hi").unwrap();
        let expanded = expand_aliases(&shell, parsed).unwrap();
        let stage = &expanded.links[0].pipeline[0];
        assert_eq!(stage.command.name, "echo");
        assert_eq!(stage.command.args, vec!["hi"]);
    }

    #[test]
    fn empty_alias_promotes_first_arg() {
        let mut shell = Shell::new();
        shell.aliases.insert("noop", "");
        let parsed = krusty_syntax::parse("noop echo hi").unwrap();
        let expanded = expand_aliases(&shell, parsed).unwrap();
        let stage = &expanded.links[0].pipeline[0];
        assert_eq!(stage.command.name, "echo");
        assert_eq!(stage.command.args, vec!["hi"]);
    }

    #[test]
    fn alias_containing_pipe_reparses_into_pipeline() {
        let mut shell = Shell::new();
        shell.aliases.insert("loud", "echo hi | tr a-z A-Z");
        let parsed = krusty_syntax::parse("loud").unwrap();
        let expanded = expand_aliases(&shell, parsed).unwrap();
        assert_eq!(expanded.links[0].pipeline.len(), 2);
        assert_eq!(expanded.links[0].pipeline[1].command.name, "tr");
    }

    #[test]
    fn variable_expansion_substitutes_env() {
        let mut shell = Shell::new();
        shell.variables.assign("FOO", "bar").unwrap();
        let got = expand_word("$FOO", Quoting::None, &shell, false, &mut no_subst).unwrap();
        assert_eq!(got, "bar");
    }

    #[test]
    fn nounset_errors_on_missing_variable() {
        let shell = Shell::new();
        let err = expand_word("$NOPE", Quoting::None, &shell, true, &mut no_subst).unwrap_err();
        assert!(matches!(err, ExpansionError::UnboundVariable { .. }));
    }

    #[test]
    fn single_quoted_word_is_never_expanded() {
        let mut shell = Shell::new();
        shell.variables.assign("FOO", "bar").unwrap();
        let got = expand_word("$FOO", Quoting::Single, &shell, false, &mut no_subst).unwrap();
        assert_eq!(got, "$FOO");
    }

    #[test]
    fn brace_expansion_lists_alternatives() {
        assert_eq!(brace_expand("a{b,c,d}e"), vec!["abe", "ace", "ade"]);
    }

    #[test]
    fn brace_expansion_handles_ascending_and_descending_ranges() {
        assert_eq!(brace_expand("{1..3}"), vec!["1", "2", "3"]);
        assert_eq!(brace_expand("{3..1}"), vec!["3", "2", "1"]);
    }

    #[test]
    fn command_substitution_runs_callback() {
        let shell = Shell::new();
        let mut calls = Vec::new();
        let got = expand_word("x=$(pwd)", Quoting::None, &shell, false, &mut |cmd| {
            calls.push(cmd.to_string());
            "/tmp".to_string()
        })
        .unwrap();
        assert_eq!(got, "x=/tmp");
        assert_eq!(calls, vec!["pwd"]);
    }
}
