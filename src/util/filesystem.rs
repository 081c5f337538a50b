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

use std::path::{Component, Path, PathBuf};

/// Converts `path` into an absolute path without touching the filesystem or
/// changing the process's working directory.
///
/// Relative paths are resolved against the current working directory, then
/// `.` and `..` components are removed lexically.
pub fn full_normal(path: &Path) -> std::io::Result<PathBuf> {
    let full = match path.is_absolute() {
        true => path.to_path_buf(),
        false => std::env::current_dir()?.join(path),
    };
    Ok(normalize(&full))
}

/// Removes `.` and `..` components from `path` without resolving symbolic links.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => {
                // cannot go above the root
                if result.file_name().is_some() {
                    result.pop();
                }
            }
            _ => result.push(comp),
        }
    }
    result
}

/// Resolves `s` against `root` when it is a relative path.
pub fn resolve_rel_path(root: &Path, s: &str) -> PathBuf {
    let p = Path::new(s);
    match p.is_relative() {
        true => normalize(&root.join(p)),
        false => p.to_path_buf(),
    }
}
