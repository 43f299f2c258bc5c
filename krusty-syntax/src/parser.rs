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

//! Parser.
//!
//! `parse` turns tokenized input into a [`ParsedCommand`]: a chain of
//! pipelines, each pipeline a sequence of stages, each stage a command and
//! its redirections.

use crate::ast::{
    ChainLink, ChainOp, Command, FdTarget, ParsedCommand, Redirection, RedirectionDirection,
    Stage,
};
use crate::error::ParseError;
use crate::lexer::tokenize;
use crate::token::{Quoting, Token, TokenKind};

/// Keywords that open a compound construct, and the keyword that closes it.
/// While any of these is open, operator splitting is suppressed: a depth
/// counter tracks nesting and operator recognition is disabled whenever it
/// is above zero.
///
/// krusty's execution engine does not evaluate the bodies of compound
/// constructs (control-flow scripting is out of this core's scope); the
/// parser still has to recognize them so it does not mis-split
/// `;`/`&&`/`||` that occur inside one. A recognized construct is parsed
/// into a single opaque [`Command`] whose `name` is the opening keyword and
/// whose `args` is the remaining raw text — command dispatch will then try
/// (and fail) to resolve it like any other external command, which is the
/// documented limitation (see DESIGN.md).
const OPENERS: &[(&str, &str)] = &[
    ("if", "fi"),
    ("for", "done"),
    ("while", "done"),
    ("until", "done"),
    ("case", "esac"),
    ("{", "}"),
];

fn opener_for(word: &str) -> Option<&'static str> {
    OPENERS.iter().find(|(o, _)| *o == word).map(|(_, c)| *c)
}

fn is_closer(word: &str, stack: &[&'static str]) -> bool {
    stack.last().is_some_and(|closer| *closer == word)
}

/// Parses `input` into a [`ParsedCommand`].
pub fn parse(input: &str) -> Result<ParsedCommand, ParseError> {
    let tokens = tokenize(input)?;
    parse_tokens(&tokens)
}

fn parse_tokens(tokens: &[Token]) -> Result<ParsedCommand, ParseError> {
    let mut links = Vec::new();
    let mut depth_stack: Vec<&'static str> = Vec::new();
    let mut seg_start = 0usize;
    let mut i = 0usize;

    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.kind == TokenKind::Word && tok.quoted == Quoting::None {
            if let Some(closer) = opener_for(&tok.text) {
                depth_stack.push(closer);
            } else if is_closer(&tok.text, &depth_stack) {
                depth_stack.pop();
            }
        }

        if depth_stack.is_empty()
            && tok.kind == TokenKind::Operator
            && matches!(tok.text.as_str(), ";" | "&" | "&&" | "||")
        {
            let op = match tok.text.as_str() {
                ";" | "&" => ChainOp::Seq,
                "&&" => ChainOp::And,
                "||" => ChainOp::Or,
                _ => unreachable!(),
            };
            let background = tok.text == "&";
            let seg_tokens = &tokens[seg_start..i];
            if !seg_tokens.is_empty() {
                let pipeline = parse_pipeline(seg_tokens)?;
                links.push(ChainLink { pipeline, op, background });
            } else if !links.is_empty() {
                // `;;` / stray separators with nothing between: harmless no-op.
            }
            seg_start = i + 1;
        }

        i += 1;
    }

    if !depth_stack.is_empty() {
        return Err(ParseError::UnmatchedConstruct {
            index: tokens.get(seg_start).map(|t| t.start).unwrap_or(0),
            opener: depth_stack[0].to_string(),
        });
    }

    let tail = &tokens[seg_start..];
    if !tail.is_empty() {
        let pipeline = parse_pipeline(tail)?;
        links.push(ChainLink {
            pipeline,
            op: ChainOp::None,
            background: false,
        });
    } else if let Some(last) = links.last_mut() {
        last.op = ChainOp::None;
    }

    Ok(ParsedCommand { links })
}

/// Splits a chain segment into pipeline stages on unquoted `|` (not `||`,
/// which the caller has already consumed as a chain operator).
fn parse_pipeline(tokens: &[Token]) -> Result<Vec<Stage>, ParseError> {
    let mut stages = Vec::new();
    let mut start = 0usize;
    for (idx, tok) in tokens.iter().enumerate() {
        if tok.kind == TokenKind::Operator && tok.text == "|" {
            stages.push(parse_stage(&tokens[start..idx])?);
            start = idx + 1;
        }
    }
    stages.push(parse_stage(&tokens[start..])?);
    Ok(stages)
}

/// Parses one stage: pulls out redirections, detects the command name and
/// arguments from the remaining words.
fn parse_stage(tokens: &[Token]) -> Result<Stage, ParseError> {
    let mut redirections = Vec::new();
    let mut words: Vec<&Token> = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.kind == TokenKind::Redirect {
            let (redir, consumed) = parse_redirection(&tokens[i..])?;
            redirections.push(redir);
            i += consumed;
            continue;
        }
        if tok.kind == TokenKind::Word {
            words.push(tok);
        }
        i += 1;
    }

    if words.is_empty() {
        // A stage with only redirections (e.g. `> file`) is valid in
        // bash, but krusty's Command invariant requires a non-empty name
        // once parsing succeeds, so the segment has no dispatchable
        // command: caller treats it as the shell's `:`-equivalent no-op
        // by naming it `:`, consistent with "empty alias" handling rules.
        let raw = render_raw(tokens);
        return Ok(Stage {
            command: Command {
                name: ":".to_string(),
                args: Vec::new(),
                arg_quoting: Vec::new(),
                name_quoting: Quoting::None,
                raw,
                original_args: Vec::new(),
            },
            redirections,
        });
    }

    let name = words[0].text.clone();
    let name_quoting = words[0].quoted;
    let args: Vec<String> = words[1..].iter().map(|t| t.text.clone()).collect();
    let arg_quoting: Vec<Quoting> = words[1..].iter().map(|t| t.quoted).collect();
    let raw = render_raw(tokens);

    Ok(Stage {
        command: Command {
            name,
            args: args.clone(),
            arg_quoting,
            name_quoting,
            raw,
            original_args: args,
        },
        redirections,
    })
}

fn render_raw(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::HereDocBody)
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses one redirection starting at `tokens[0]` (a `Redirect`-kind
/// token). Returns the redirection and how many tokens it consumed.
fn parse_redirection(tokens: &[Token]) -> Result<(Redirection, usize), ParseError> {
    let op = &tokens[0];
    let text = op.text.as_str();

    // fd-duplication: an optional leading digit, then `>&`/`<&`, then a
    // target fd or `-`.
    if let Some(amp_pos) = text.find(['>', '<']) {
        if text[amp_pos + 1..].starts_with('&') {
            let src_fd: u8 = text[..amp_pos].parse().unwrap_or(if text.starts_with('<') { 0 } else { 1 });
            let rest = &text[amp_pos + 2..];
            let target = if rest == "-" {
                FdTarget::Close
            } else {
                let fd: u8 = rest
                    .parse()
                    .map_err(|_| ParseError::BadRedirection { index: op.start, text: text.to_string() })?;
                FdTarget::Fd(fd)
            };
            return Ok((Redirection::FdDup { src_fd, target }, 1));
        }
    }

    match text {
        "<<" | "<<-" => {
            let strip_tabs = text == "<<-";
            let delimiter = tokens
                .get(1)
                .ok_or(ParseError::BadRedirection { index: op.start, text: text.to_string() })?
                .text
                .clone();
            let body = tokens
                .get(2)
                .filter(|t| t.kind == TokenKind::HereDocBody)
                .map(|t| t.text.clone())
                .unwrap_or_default();
            Ok((
                Redirection::HereDoc {
                    delimiter,
                    strip_tabs,
                    body,
                },
                3,
            ))
        }
        "<<<" => {
            let content = tokens
                .get(1)
                .ok_or(ParseError::BadRedirection { index: op.start, text: text.to_string() })?
                .text
                .clone();
            Ok((Redirection::HereString { content }, 2))
        }
        "&>" | "&>>" => {
            let target = tokens
                .get(1)
                .ok_or(ParseError::BadRedirection { index: op.start, text: text.to_string() })?
                .text
                .clone();
            Ok((
                Redirection::File {
                    direction: RedirectionDirection::Both { append: text == "&>>" },
                    target,
                },
                2,
            ))
        }
        "<" | ">" | ">>" => {
            let target = tokens
                .get(1)
                .ok_or(ParseError::BadRedirection { index: op.start, text: text.to_string() })?
                .text
                .clone();
            let direction = match text {
                "<" => RedirectionDirection::In,
                ">" => RedirectionDirection::Out,
                ">>" => RedirectionDirection::Append,
                _ => unreachable!(),
            };
            Ok((Redirection::File { direction, target }, 2))
        }
        _ => {
            // Numeric-prefixed standard redirections, e.g. `2>`, `2>>`.
            let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
            let suffix = &text[digits.len()..];
            let target = tokens
                .get(1)
                .ok_or(ParseError::BadRedirection { index: op.start, text: text.to_string() })?
                .text
                .clone();
            let direction = match (digits.as_str(), suffix) {
                ("2", ">") => RedirectionDirection::Err,
                ("2", ">>") => RedirectionDirection::ErrAppend,
                ("0", "<") => RedirectionDirection::In,
                (_, ">") => RedirectionDirection::Out,
                (_, ">>") => RedirectionDirection::Append,
                (_, "<") => RedirectionDirection::In,
                _ => {
                    return Err(ParseError::BadRedirection {
                        index: op.start,
                        text: text.to_string(),
                    })
                }
            };
            Ok((Redirection::File { direction, target }, 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_links() {
        let parsed = parse("").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn simple_pipeline() {
        let parsed = parse("echo hello | tr a-z A-Z").unwrap();
        assert_eq!(parsed.links.len(), 1);
        let pipeline = &parsed.links[0].pipeline;
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0].command.name, "echo");
        assert_eq!(pipeline[1].command.name, "tr");
        assert_eq!(pipeline[1].command.args, vec!["a-z", "A-Z"]);
    }

    #[test]
    fn chain_operators() {
        let parsed = parse("false && echo x; echo y").unwrap();
        assert_eq!(parsed.links.len(), 3);
        assert_eq!(parsed.links[0].op, ChainOp::And);
        assert_eq!(parsed.links[1].op, ChainOp::Seq);
        assert_eq!(parsed.links[2].op, ChainOp::None);
    }

    #[test]
    fn redirection_out_and_append() {
        let parsed = parse("echo a > /tmp/x").unwrap();
        let stage = &parsed.links[0].pipeline[0];
        assert_eq!(stage.redirections.len(), 1);
        assert!(matches!(
            &stage.redirections[0],
            Redirection::File { direction: RedirectionDirection::Out, target } if target == "/tmp/x"
        ));
    }

    #[test]
    fn stderr_redirection() {
        let parsed = parse("cmd 2> err.log").unwrap();
        let stage = &parsed.links[0].pipeline[0];
        assert!(matches!(
            &stage.redirections[0],
            Redirection::File { direction: RedirectionDirection::Err, .. }
        ));
    }

    #[test]
    fn fd_dup_merges_streams() {
        let parsed = parse("cmd 2>&1").unwrap();
        let stage = &parsed.links[0].pipeline[0];
        assert!(matches!(
            &stage.redirections[0],
            Redirection::FdDup { src_fd: 2, target: FdTarget::Fd(1) }
        ));
    }

    #[test]
    fn background_marks_the_chain_link() {
        let parsed = parse("sleep 5 &").unwrap();
        assert!(parsed.links[0].background);
    }

    #[test]
    fn background_marks_every_stage_of_a_multi_stage_pipeline() {
        let parsed = parse("sleep 5 | cat &").unwrap();
        assert_eq!(parsed.links[0].pipeline.len(), 2);
        assert!(parsed.links[0].background);
    }

    #[test]
    fn heredoc_round_trips_into_redirection() {
        let parsed = parse("cat <<EOF\nhello\nEOF\n").unwrap();
        let stage = &parsed.links[0].pipeline[0];
        assert!(matches!(
            &stage.redirections[0],
            Redirection::HereDoc { delimiter, body, .. }
                if delimiter == "EOF" && body == "hello\n"
        ));
    }

    #[test]
    fn compound_construct_does_not_split_on_inner_operators() {
        // The `;` after `true` must not split the chain, since it is
        // inside an `if`..`fi` construct.
        let parsed = parse("if true; then echo yes; fi").unwrap();
        assert_eq!(parsed.links.len(), 1);
    }

    #[test]
    fn unmatched_construct_is_an_error() {
        let err = parse("if true; then echo yes").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedConstruct { .. }));
    }
}
