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

use crate::util::environment::FSVA_LOG;
use tracing_subscriber::EnvFilter;

/// Default filter level for internal diagnostics.
const DEFAULT_LEVEL: &str = "warn";

/// Filter level when verbose output is requested.
const VERBOSE_LEVEL: &str = "debug";

/// Installs the global subscriber for internal diagnostics, written to
/// standard error.
///
/// Directives in `FSVA_LOG` take priority over the verbosity flag. Installing
/// a second time is a no-op.
pub fn init_tracing(verbose: bool) {
    let level = match verbose {
        true => VERBOSE_LEVEL,
        false => DEFAULT_LEVEL,
    };
    let filter = EnvFilter::try_from_env(FSVA_LOG).unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
