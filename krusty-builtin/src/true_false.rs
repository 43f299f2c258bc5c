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

//! `true` and `false`.

use krusty_env::io::BuiltinIo;
use krusty_env::result::CommandResult;
use krusty_env::Shell;

pub fn r#true(_args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    CommandResult::success()
}

pub fn r#false(_args: &[String], _shell: &mut Shell, _io: &mut dyn BuiltinIo) -> CommandResult {
    CommandResult::with_code(1)
}
