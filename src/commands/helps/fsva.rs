//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

// This help page was automatically generated from the mangen.py tool.
pub const HELP: &str = r#"Verification automation for HDL projects using FuseSoc.

Usage:
    fsva [options] [<project> [<target>]]

Args:
    <project>                   run only the targets of this core in the console
    <target>                    run only this target of the core

Options:
    --workpath, -w <path>       directory to search for .core files [default: .]
    --outdir, -o <name>         output directory created in the workpath [default: _fsva]
    --numprocesses, -n <n>      number of targets to verify in parallel
    --timeout <secs>            kill a target that runs longer than this (0 disables)
    --compress, -c              compress the output directory if all targets pass
    --list                      print the discovered verification targets and exit
    --verbose                   print internal diagnostics
    --version                   print the version and exit
    --help, -h                  print this help information and exit

Environment:
    FSVA_COMMAND                the verification command [default: fusesoc]
    FSVA_LOG                    filter for internal diagnostics [default: warn]
"#;
