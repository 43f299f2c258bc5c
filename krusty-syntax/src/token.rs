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

//! Token type produced by the tokenizer.

/// How a token's text was quoted in the source, if at all.
///
/// A token produced from a mix of quoting styles (e.g. `foo"bar"'baz'`)
/// keeps [`Quoting::None`] — the tokenizer only records quoting when the
/// *entire* token came from a single quoted span, which is the only case
/// later stages need to distinguish (e.g. to suppress expansion).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub enum Quoting {
    #[default]
    None,
    Single,
    Double,
}

/// Category of a token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// A plain word: command name, argument, or part of one.
    Word,
    /// A chain/pipeline operator: `;`, `&`, `&&`, `||`, `|`.
    Operator,
    /// A redirection operator: `<`, `>`, `>>`, `<<`, `<<-`, `<<<`, `&>`,
    /// `&>>`, `2>`, `2>>`, `n>&m`, `n>&-`.
    Redirect,
    /// The captured body of a here-document, emitted once its terminator
    /// line has been consumed.
    HereDocBody,
}

/// A single lexical token.
///
/// Insertion order matters: the parser walks tokens left to right and
/// never reorders them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub quoted: Quoting,
    /// Byte offset of the first character of this token in the original
    /// input, used for parse-error caret indicators.
    pub start: usize,
}

impl Token {
    pub fn word(text: impl Into<String>, start: usize) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::Word,
            quoted: Quoting::None,
            start,
        }
    }

    pub fn operator(text: impl Into<String>, start: usize) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::Operator,
            quoted: Quoting::None,
            start,
        }
    }

    pub fn redirect(text: impl Into<String>, start: usize) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::Redirect,
            quoted: Quoting::None,
            start,
        }
    }
}
