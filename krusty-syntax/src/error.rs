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

//! Parse error types.

use thiserror::Error;

/// A parse failure, carrying the byte index at which it occurred so the
/// caller can render a caret indicator pointing to the failure index.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("unterminated quote")]
    UnterminatedQuote { index: usize },

    #[error("unterminated here-document (expecting `{delimiter}`)")]
    UnterminatedHereDoc { index: usize, delimiter: String },

    #[error("unexpected token `{token}`")]
    UnexpectedToken { index: usize, token: String },

    #[error("missing command name")]
    MissingCommandName { index: usize },

    #[error("bad redirection `{text}`")]
    BadRedirection { index: usize, text: String },

    #[error("unmatched `{opener}`")]
    UnmatchedConstruct { index: usize, opener: String },
}

impl ParseError {
    /// The byte index in the original input at which the error was
    /// detected; used to point a caret.
    pub fn index(&self) -> usize {
        match self {
            ParseError::UnterminatedQuote { index }
            | ParseError::UnterminatedHereDoc { index, .. }
            | ParseError::UnexpectedToken { index, .. }
            | ParseError::MissingCommandName { index }
            | ParseError::BadRedirection { index, .. }
            | ParseError::UnmatchedConstruct { index, .. } => *index,
        }
    }

    /// The shell exit code that corresponds to a parse error.
    pub const EXIT_CODE: i32 = 2;
}
