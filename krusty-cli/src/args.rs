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

//! Command-line argument parsing: `krusty [-c command | script
//! [args...]]`, falling back to an interactive read-eval-print loop when
//! neither is given.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "krusty", about = "A POSIX-ish interactive shell core")]
struct Cli {
    /// Runs `command` instead of reading a script or stdin.
    #[arg(short = 'c', value_name = "command")]
    command: Option<String>,

    /// Script file to run, followed by its positional parameters.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_and_args: Vec<String>,
}

/// How the shell was asked to run.
#[derive(Debug, Eq, PartialEq)]
pub enum Invocation {
    Command(String),
    Script { path: String, args: Vec<String> },
    Interactive,
}

/// Parses `args` (program name already excluded) into an [`Invocation`].
pub fn parse(args: impl IntoIterator<Item = String>) -> Invocation {
    let cli = Cli::parse_from(std::iter::once("krusty".to_string()).chain(args));
    if let Some(command) = cli.command {
        return Invocation::Command(command);
    }
    let mut rest = cli.script_and_args.into_iter();
    match rest.next() {
        Some(path) => Invocation::Script {
            path,
            args: rest.collect(),
        },
        None => Invocation::Interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_c_takes_priority_over_script() {
        let invocation = parse(["-c".to_string(), "echo hi".to_string()]);
        assert_eq!(invocation, Invocation::Command("echo hi".to_string()));
    }

    #[test]
    fn script_path_with_trailing_args() {
        let invocation = parse(["run.sh".to_string(), "a".to_string(), "b".to_string()]);
        assert_eq!(
            invocation,
            Invocation::Script {
                path: "run.sh".to_string(),
                args: vec!["a".to_string(), "b".to_string()],
            }
        );
    }

    #[test]
    fn no_arguments_means_interactive() {
        assert_eq!(parse(std::iter::empty()), Invocation::Interactive);
    }
}
