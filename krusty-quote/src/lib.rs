// This file is part of krusty, a POSIX-like command shell.
// Copyright (C) 2026 the krusty contributors

//! Shell-safe requoting.
//!
//! `krusty` re-quotes words in a handful of places where a value must be
//! printed back in a form that would re-parse to the same value: `xtrace`
//! output, `declare -p`/`export -p` listings, `alias` output, and `printf
//! %q`. This crate centralizes that single concern so every call site
//! quotes the same way.

use std::borrow::Cow;
use std::fmt;

/// Characters that are safe to print unquoted in a POSIX-ish shell word.
fn is_safe_unquoted(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ',' | ':' | '@' | '%' | '+')
}

/// Quotes `s` so that re-parsing the result yields `s` back.
///
/// An empty string is quoted as `''` since an empty unquoted word would
/// disappear entirely. Strings that need no quoting are returned unchanged
/// (as a borrow) to avoid needless allocation.
pub fn quote(s: &str) -> Cow<'_, str> {
    if !s.is_empty() && s.chars().all(is_safe_unquoted) {
        return Cow::Borrowed(s);
    }
    if !s.contains('\'') {
        return Cow::Owned(format!("'{s}'"));
    }
    // Contains a single quote: use the $'...' ANSI-C style with escapes,
    // since naive '\''-splicing gets unreadable fast for repeated quotes.
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str("$'");
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    Cow::Owned(out)
}

/// Writes `quote(s)` to a formatter; convenience for `Display` impls that
/// need to print a requoted field inline (e.g. xtrace's `+ name args…`).
pub fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "{}", quote(s))
}

/// Implements `printf %q`: like [`quote`] but always backslash-escapes
/// rather than switching to the `$'...'` form, matching bash's `%q`.
pub fn quote_printf(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_safe_unquoted) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            ' ' | '\t' | '\n' | '\'' | '"' | '\\' | '$' | '`' | '|' | '&' | ';' | '(' | ')'
            | '<' | '>' | '{' | '}' | '*' | '?' | '[' | ']' | '#' | '~' | '!' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_word_is_unquoted() {
        assert_eq!(quote("hello"), "hello");
    }

    #[test]
    fn whitespace_gets_single_quoted() {
        assert_eq!(quote("hello world"), "'hello world'");
    }

    #[test]
    fn empty_string_is_quoted() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn embedded_single_quote_uses_dollar_form() {
        assert_eq!(quote("it's"), "$'it\\'s'");
    }

    #[test]
    fn printf_q_escapes_individual_metacharacters() {
        assert_eq!(quote_printf("a b"), "a\\ b");
        assert_eq!(quote_printf("plain"), "plain");
    }
}
