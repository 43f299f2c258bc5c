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

//! Tokenizer, parser, and abstract syntax tree for the krusty command
//! language.
//!
//! This crate implements the first two subsystems named in the shell's
//! design: the tokenizer (quote/escape/operator aware) and the parser
//! (chain/pipeline/redirection aware, with here-doc and here-string
//! support). It has no knowledge of expansion, execution, or job control —
//! those live in `krusty-semantics`, `krusty-builtin`, and `krusty-env`.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    ChainLink, ChainOp, Command, FdTarget, ParsedCommand, Pipeline, Redirection,
    RedirectionDirection, Stage,
};
pub use error::ParseError;
pub use parser::parse;
pub use token::{Quoting, Token, TokenKind};
