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

//! Built-in I/O collaborator: redirections against a built-in's buffered
//! streams are applied post-hoc by the execution engine.
//!
//! Built-ins never touch file descriptors directly; they write to a
//! [`BuiltinIo`] which buffers stdout/stderr (later spliced into the
//! command's redirections by `krusty-semantics`) and exposes both a
//! line-at-a-time and a delimiter/count-aware stdin reader, the latter for
//! `read`'s `-d`/`-n`/`-N` options.

/// Buffered, redirection-agnostic I/O handed to every built-in invocation.
pub trait BuiltinIo {
    fn write_stdout(&mut self, s: &str);
    fn write_stderr(&mut self, s: &str);
    /// Reads one line from the built-in's stdin (e.g. for `read`), without
    /// the trailing newline. `None` at EOF with nothing left to return.
    fn read_line(&mut self) -> Option<String>;
    /// Reads characters up to (and consuming) `delim`, or up to `max_chars`
    /// if given, whichever comes first. Returns `None` only when nothing at
    /// all remains (mirrors `read_line`'s EOF convention). The returned
    /// string never includes `delim` itself.
    fn read_until(&mut self, delim: char, max_chars: Option<usize>) -> Option<String>;
}

/// An in-memory [`BuiltinIo`] that simply accumulates output and replays a
/// pre-supplied stdin, used both by the real execution engine (which
/// splices the buffers into redirections afterward) and by tests.
#[derive(Clone, Debug, Default)]
pub struct BufferIo {
    pub stdout: String,
    pub stderr: String,
    stdin: Vec<char>,
    cursor: usize,
}

impl BufferIo {
    pub fn new() -> Self {
        BufferIo::default()
    }

    pub fn with_stdin(input: &str) -> Self {
        let mut io = BufferIo::new();
        io.feed_stdin(input);
        io
    }

    /// Queues `input` to be read back via [`read_line`]/[`read_until`].
    pub fn feed_stdin(&mut self, input: &str) {
        self.stdin.extend(input.chars());
    }

    fn at_eof(&self) -> bool {
        self.cursor >= self.stdin.len()
    }
}

impl BuiltinIo for BufferIo {
    fn write_stdout(&mut self, s: &str) {
        self.stdout.push_str(s);
    }

    fn write_stderr(&mut self, s: &str) {
        self.stderr.push_str(s);
    }

    fn read_line(&mut self) -> Option<String> {
        self.read_until('\n', None)
    }

    fn read_until(&mut self, delim: char, max_chars: Option<usize>) -> Option<String> {
        if self.at_eof() {
            return None;
        }
        let mut out = String::new();
        let mut consumed = 0usize;
        while self.cursor < self.stdin.len() {
            if let Some(max) = max_chars {
                if consumed >= max {
                    break;
                }
            }
            let c = self.stdin[self.cursor];
            self.cursor += 1;
            consumed += 1;
            if c == delim {
                break;
            }
            out.push(c);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_io_accumulates_output() {
        let mut io = BufferIo::new();
        io.write_stdout("a");
        io.write_stdout("b");
        io.write_stderr("e");
        assert_eq!(io.stdout, "ab");
        assert_eq!(io.stderr, "e");
    }

    #[test]
    fn buffer_io_replays_stdin_lines() {
        let mut io = BufferIo::with_stdin("one\ntwo\n");
        assert_eq!(io.read_line().as_deref(), Some("one"));
        assert_eq!(io.read_line().as_deref(), Some("two"));
        assert_eq!(io.read_line(), None);
    }

    #[test]
    fn read_until_stops_at_custom_delimiter() {
        let mut io = BufferIo::with_stdin("a:b:c");
        assert_eq!(io.read_until(':', None).as_deref(), Some("a"));
        assert_eq!(io.read_until(':', None).as_deref(), Some("b"));
        assert_eq!(io.read_until(':', None).as_deref(), Some("c"));
        assert_eq!(io.read_until(':', None), None);
    }

    #[test]
    fn read_until_respects_max_chars() {
        let mut io = BufferIo::with_stdin("hello");
        assert_eq!(io.read_until('\n', Some(3)).as_deref(), Some("hel"));
        assert_eq!(io.read_until('\n', None).as_deref(), Some("lo"));
    }

    #[test]
    fn last_line_without_trailing_newline_is_still_returned() {
        let mut io = BufferIo::with_stdin("only");
        assert_eq!(io.read_line().as_deref(), Some("only"));
        assert_eq!(io.read_line(), None);
    }
}
