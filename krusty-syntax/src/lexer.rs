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

//! Tokenizer.
//!
//! `tokenize` splits input into [`Token`]s respecting quotes and escapes.
//! Operators are recognized only outside quotes. Here-document bodies are
//! captured as soon as their terminator line is found and appended to the
//! token stream as a [`TokenKind::HereDocBody`] token immediately following
//! the `<<`/`<<-` [`TokenKind::Redirect`] token that introduced them.

use crate::error::ParseError;
use crate::token::{Quoting, Token, TokenKind};

/// The shell operators recognized outside quotes, longest first so that
/// greedy matching picks `&&` over `&`, `<<<` over `<<`, etc.
const OPERATORS: &[&str] = &[
    "<<<", "<<-", "&>>", "<<", "&&", "||", ">>", "&>", ";", "&", "|", "<", ">",
];

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Lexer {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn rest_str(&self) -> &str {
        std::str::from_utf8(&self.input[self.pos..]).unwrap_or("")
    }
}

/// Tries to match an operator at the lexer's current position. A leading
/// `&` is ambiguous with `&&`/`&>`/`&>>`, and a leading `<`/`>` is ambiguous
/// with several multi-character forms, so longest-match-first is required.
fn match_operator(rest: &str) -> Option<&'static str> {
    OPERATORS.iter().find(|op| rest.starts_with(*op)).copied()
}

/// Tries to match an fd-duplication redirection like `2>&1` or `1>&-`
/// starting at the current byte, where a leading digit is the source fd.
fn match_fd_dup(rest: &str) -> Option<usize> {
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let after = &rest[digits.len()..];
    if after.starts_with(">&") || after.starts_with("<&") {
        let tail = &after[2..];
        let fd_len = tail.chars().take_while(|c| c.is_ascii_digit()).count();
        if fd_len > 0 {
            return Some(digits.len() + 2 + fd_len);
        }
        if tail.starts_with('-') {
            return Some(digits.len() + 3);
        }
    } else if after.starts_with(">>") {
        // n>>: the digit is an fd prefix on a standard append redirect.
        return Some(digits.len() + 2);
    } else if after.starts_with('>') || after.starts_with('<') {
        // n> / n<: the digit is an fd prefix on a standard redirect.
        return Some(digits.len() + 1);
    }
    None
}

/// Splits `input` into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut lx = Lexer::new(input);
    let mut tokens = Vec::new();
    // Pending here-doc delimiters collected on the current logical line,
    // each as (delimiter, strip_tabs, token_index_of_redirect).
    let mut pending_heredocs: Vec<(String, bool)> = Vec::new();

    loop {
        skip_inline_whitespace(&mut lx);
        let Some(c) = lx.peek() else { break };

        if c == b'\n' {
            lx.bump();
            if !pending_heredocs.is_empty() {
                consume_heredoc_bodies(&mut lx, &mut pending_heredocs, &mut tokens)?;
            }
            continue;
        }

        // fd-duplication / numbered redirects: n>&m, n>&-, n>, n<, n>>
        if c.is_ascii_digit() {
            let rest = lx.rest_str();
            if let Some(len) = match_fd_dup(rest) {
                let text = rest[..len].to_string();
                let start = lx.pos;
                for _ in 0..len {
                    lx.bump();
                }
                tokens.push(Token::redirect(text, start));
                continue;
            }
        }

        let rest = lx.rest_str();
        if let Some(op) = match_operator(rest) {
            let start = lx.pos;
            for _ in 0..op.len() {
                lx.bump();
            }
            if matches!(op, "<" | ">" | ">>" | "&>" | "&>>" | "<<" | "<<-" | "<<<") {
                tokens.push(Token::redirect(op, start));
                if op == "<<" || op == "<<-" {
                    skip_inline_whitespace(&mut lx);
                    let (delim, quoted) = read_heredoc_delimiter(&mut lx)?;
                    pending_heredocs.push((delim.clone(), op == "<<-"));
                    let _ = quoted; // quoting of the delimiter only affects body expansion, handled later.
                    tokens.push(Token::word(delim, start));
                }
            } else {
                tokens.push(Token::operator(op, start));
            }
            continue;
        }

        // A plain word: quote/escape aware.
        let (word, quoting, start) = read_word(&mut lx)?;
        tokens.push(Token {
            text: word,
            kind: TokenKind::Word,
            quoted: quoting,
            start,
        });
    }

    if !pending_heredocs.is_empty() {
        // Input ended without a newline terminating the last command; still
        // try to consume whatever here-doc bodies remain from stdin-less
        // buffered input (there is none left), which is an error.
        return Err(ParseError::UnterminatedHereDoc {
            index: input.len(),
            delimiter: pending_heredocs[0].0.clone(),
        });
    }

    Ok(tokens)
}

fn skip_inline_whitespace(lx: &mut Lexer<'_>) {
    while matches!(lx.peek(), Some(b' ') | Some(b'\t')) {
        lx.bump();
    }
}

/// Reads the delimiter word following `<<`/`<<-`. Returns `(delimiter,
/// was_quoted)`; a quoted delimiter (e.g. `<<'EOF'`) means the body should
/// not undergo expansion, but this tokenizer only reports the fact.
fn read_heredoc_delimiter(lx: &mut Lexer<'_>) -> Result<(String, bool), ParseError> {
    let start = lx.pos;
    let mut out = String::new();
    let mut quoted = false;
    loop {
        match lx.peek() {
            None | Some(b' ') | Some(b'\t') | Some(b'\n') => break,
            Some(b'\'') | Some(b'"') => {
                quoted = true;
                let q = lx.bump().unwrap();
                loop {
                    match lx.bump() {
                        Some(c) if c == q => break,
                        Some(c) => out.push(c as char),
                        None => return Err(ParseError::UnterminatedQuote { index: start }),
                    }
                }
            }
            Some(b'\\') => {
                lx.bump();
                if let Some(c) = lx.bump() {
                    out.push(c as char);
                    quoted = true;
                }
            }
            Some(_) => {
                out.push(lx.bump().unwrap() as char);
            }
        }
    }
    Ok((out, quoted))
}

/// Consumes raw lines until one matches a pending here-doc delimiter,
/// producing a [`TokenKind::HereDocBody`] token per pending here-doc, in
/// the order the `<<`/`<<-` operators appeared.
fn consume_heredoc_bodies(
    lx: &mut Lexer<'_>,
    pending: &mut Vec<(String, bool)>,
    tokens: &mut Vec<Token>,
) -> Result<(), ParseError> {
    for (delimiter, strip_tabs) in pending.drain(..) {
        let start = lx.pos;
        let mut body = String::new();
        loop {
            if lx.peek().is_none() {
                return Err(ParseError::UnterminatedHereDoc {
                    index: start,
                    delimiter,
                });
            }
            let line_start = lx.pos;
            let mut line = String::new();
            while let Some(c) = lx.peek() {
                if c == b'\n' {
                    break;
                }
                line.push(lx.bump().unwrap() as char);
            }
            lx.bump(); // consume the newline (or EOF, harmlessly a no-op)
            let compare = if strip_tabs {
                line.trim_start_matches('\t')
            } else {
                line.as_str()
            };
            if compare == delimiter {
                break;
            }
            let _ = line_start;
            body.push_str(if strip_tabs { compare } else { &line });
            body.push('\n');
        }
        tokens.push(Token {
            text: body,
            kind: TokenKind::HereDocBody,
            quoted: Quoting::None,
            start,
        });
    }
    Ok(())
}

/// Reads one word token: a maximal run of non-whitespace, non-operator
/// text, honoring quotes and backslash escapes.
///
/// - A backslash escapes the next character; a trailing lone backslash (at
///   end of input) is kept literally.
/// - Single-quoted spans disable escapes entirely.
/// - Double-quoted spans allow `\` to escape `"`, `\`, `$`, and backtick.
/// - If the *entire* token is one quoted span, `quoted` records which kind.
fn read_word(lx: &mut Lexer<'_>) -> Result<(String, Quoting, usize), ParseError> {
    let start = lx.pos;
    let mut out = String::new();
    let mut spans = 0usize;
    let mut last_span_kind = Quoting::None;

    loop {
        match lx.peek() {
            None => break,
            Some(b' ') | Some(b'\t') | Some(b'\n') => break,
            Some(b'\'') => {
                spans += 1;
                last_span_kind = Quoting::Single;
                lx.bump();
                loop {
                    match lx.bump() {
                        Some(b'\'') => break,
                        Some(c) => out.push(c as char),
                        None => return Err(ParseError::UnterminatedQuote { index: start }),
                    }
                }
            }
            Some(b'"') => {
                spans += 1;
                last_span_kind = Quoting::Double;
                lx.bump();
                loop {
                    match lx.bump() {
                        Some(b'"') => break,
                        Some(b'\\') => match lx.peek() {
                            Some(c @ (b'"' | b'\\' | b'$' | b'`')) => {
                                lx.bump();
                                out.push(c as char);
                            }
                            _ => out.push('\\'),
                        },
                        Some(c) => out.push(c as char),
                        None => return Err(ParseError::UnterminatedQuote { index: start }),
                    }
                }
            }
            Some(b'\\') => {
                lx.bump();
                match lx.bump() {
                    Some(c) => out.push(c as char),
                    None => out.push('\\'), // trailing lone backslash kept literally
                }
            }
            Some(_) => {
                let rest = lx.rest_str();
                if match_operator(rest).is_some() || match_fd_dup(rest).is_some() {
                    break;
                }
                out.push(lx.bump().unwrap() as char);
            }
        }
    }

    let quoting = if spans == 1 && out.chars().count() > 0 {
        last_span_kind
    } else {
        Quoting::None
    };
    Ok((out, quoting, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind as K;

    fn words(toks: &[Token]) -> Vec<&str> {
        toks.iter()
            .filter(|t| t.kind == K::Word)
            .map(|t| t.text.as_str())
            .collect()
    }

    #[test]
    fn splits_on_unquoted_whitespace() {
        let toks = tokenize("echo  hello\tworld").unwrap();
        assert_eq!(words(&toks), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn preserves_quoted_substrings() {
        let toks = tokenize("echo 'hello world'").unwrap();
        assert_eq!(words(&toks), vec!["echo", "hello world"]);
    }

    #[test]
    fn escaped_quote_inside_double_quotes() {
        let toks = tokenize(r#"echo "say \"hi\"""#).unwrap();
        assert_eq!(words(&toks), vec!["echo", "say \"hi\""]);
    }

    #[test]
    fn trailing_backslash_is_literal() {
        let toks = tokenize("echo foo\\").unwrap();
        assert_eq!(words(&toks), vec!["echo", "foo\\"]);
    }

    #[test]
    fn single_quotes_disable_escapes() {
        let toks = tokenize(r"echo 'a\nb'").unwrap();
        assert_eq!(words(&toks), vec!["echo", "a\\nb"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize("echo 'unterminated").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedQuote { .. }));
    }

    #[test]
    fn recognizes_operators() {
        let toks = tokenize("a && b || c ; d & e | f").unwrap();
        let ops: Vec<&str> = toks
            .iter()
            .filter(|t| t.kind == K::Operator)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["&&", "||", ";", "&", "|"]);
    }

    #[test]
    fn heredoc_body_is_captured() {
        let toks = tokenize("cat <<EOF\nhello\nEOF\n").unwrap();
        let body = toks.iter().find(|t| t.kind == K::HereDocBody).unwrap();
        assert_eq!(body.text, "hello\n");
    }

    #[test]
    fn numbered_redirect_is_one_token() {
        let toks = tokenize("cmd 2>> err.log").unwrap();
        let redirects: Vec<&str> = toks
            .iter()
            .filter(|t| t.kind == K::Redirect)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(redirects, vec!["2>>"]);
    }

    #[test]
    fn heredoc_strip_tabs() {
        let toks = tokenize("cat <<-EOF\n\t\thello\nEOF\n").unwrap();
        let body = toks.iter().find(|t| t.kind == K::HereDocBody).unwrap();
        assert_eq!(body.text, "hello\n");
    }
}
