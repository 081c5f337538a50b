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

//! Abstraction layer for writing a directory to a zip file
//!
//! Reference: https://github.com/zip-rs/zip/blob/master/examples/write_dir.rs

use std::io::prelude::*;
use std::io::{Seek, Write};
use zip::result::{ZipError, ZipResult};
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::util::anyerror::AnyError;
use ignore::{DirEntry, WalkBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Declare the type of compression algorithm to use.
const COMPRESSION_METHOD: CompressionMethod = CompressionMethod::Deflated;

/// Converts a relative path into an archive entry name, always separated by
/// forward slashes.
fn entry_name(prefix: &str, rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .fold(String::from(prefix), |acc, c| acc + "/" + &c)
}

fn zip_dir<T>(
    it: &mut dyn Iterator<Item = DirEntry>,
    src_dir: &Path,
    prefix: &str,
    writer: T,
) -> ZipResult<()>
where
    T: Write + Seek,
{
    let mut zip = zip::ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(COMPRESSION_METHOD)
        .unix_permissions(0o644);

    let mut buffer = Vec::new();
    for entry in it {
        let path = entry.path();
        let rel = match path.strip_prefix(src_dir) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let name = entry_name(prefix, rel);

        // write file or directory explicitly
        if path.is_file() {
            zip.start_file(name, options)?;
            let mut f = File::open(path)?;
            f.read_to_end(&mut buffer)?;
            zip.write_all(&buffer)?;
            buffer.clear();
        } else {
            zip.add_directory(name, options)?;
        }
    }
    zip.finish()?;
    Ok(())
}

/// Writes every file under `src_dir` into a new archive at `dst_file`.
///
/// Entries are stored beneath a top-level directory named after `src_dir`,
/// so extracting the archive recreates the directory itself.
pub fn write_zip_dir(src_dir: &Path, dst_file: &Path) -> ZipResult<()> {
    if src_dir.is_dir() == false {
        return Err(ZipError::FileNotFound);
    }
    let prefix = match src_dir.file_name() {
        Some(n) => n.to_string_lossy().into_owned(),
        None => return Err(ZipError::FileNotFound),
    };

    let file = File::create(dst_file)?;

    let walkdir = WalkBuilder::new(src_dir)
        .standard_filters(false)
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    zip_dir(
        &mut walkdir.filter_map(|e| e.ok()),
        src_dir,
        &prefix,
        file,
    )
}

/// Compresses a run directory into `<parent>/<name>.zip` and removes the
/// directory once the archive is complete.
pub fn archive_run(run_dir: &Path) -> Result<PathBuf, AnyError> {
    let dst = run_dir.with_extension("zip");
    write_zip_dir(run_dir, &dst).map_err(|e| AnyError(e.to_string()))?;
    std::fs::remove_dir_all(run_dir)?;
    Ok(dst)
}
