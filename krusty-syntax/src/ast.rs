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

//! Abstract syntax tree produced by the parser.

use crate::token::Quoting;

/// A single command: name, arguments, and bookkeeping needed by later
/// expansion/execution stages.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Command {
    /// Command name. Empty only transiently during parsing; [`parse`]
    /// never returns a `Command` with an empty name.
    ///
    /// [`parse`]: crate::parser::parse
    pub name: String,
    /// Arguments in order, after quote/escape post-processing.
    pub args: Vec<String>,
    /// How each argument was quoted in the source, parallel to `args`.
    /// Single-quoted words are never expanded; unquoted and double-quoted
    /// words are. `name_quoting` is the same fact for `name`.
    pub arg_quoting: Vec<Quoting>,
    pub name_quoting: Quoting,
    /// The original segment text, unparsed, kept for history and `eval`
    /// round-tripping.
    pub raw: String,
    /// Arguments as they appeared before alias/variable/brace/command-
    /// substitution expansion, preserved for `$0`-style introspection and
    /// for re-deriving `$@`/`$1`.. during alias expansion.
    pub original_args: Vec<String>,
}

/// Direction of a file redirection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RedirectionDirection {
    In,
    Out,
    Append,
    Err,
    ErrAppend,
    /// `&>` (non-append) or `&>>` (append): merge stdout+stderr into one file.
    Both { append: bool },
}

/// Target of an `FdDup` redirection (`n>&m` or `n>&-`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FdTarget {
    Close,
    Fd(u8),
}

/// A redirection attached to a command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Redirection {
    File {
        direction: RedirectionDirection,
        target: String,
    },
    HereDoc {
        delimiter: String,
        strip_tabs: bool,
        body: String,
    },
    HereString {
        content: String,
    },
    FdDup {
        src_fd: u8,
        target: FdTarget,
    },
}

/// A single stage of a pipeline: one command plus the redirections parsed
/// alongside it.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct Stage {
    pub command: Command,
    pub redirections: Vec<Redirection>,
}

/// A sequence of stages connected by unquoted `|`.
pub type Pipeline = Vec<Stage>;

/// The operator that precedes the *next* chain link. `None` marks the last
/// link in the chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChainOp {
    /// No operator follows; this is the last link.
    None,
    /// `;`
    Seq,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// One pipeline within a chain, paired with the operator that follows it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainLink {
    pub pipeline: Pipeline,
    pub op: ChainOp,
    /// Whether this whole pipeline was launched in the background with a
    /// trailing unquoted `&`. This applies to the pipeline as a unit, not
    /// any single stage: every stage of a backgrounded multi-stage pipeline
    /// (e.g. `sleep 5 | cat &`) runs without the shell waiting on it.
    pub background: bool,
}

/// A fully parsed command line: an ordered sequence of pipelines joined by
/// chain operators.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ParsedCommand {
    pub links: Vec<ChainLink>,
}

impl ParsedCommand {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
