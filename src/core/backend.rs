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

//! Backend-specific options appended to the base FuseSoc invocation.
//!
//! Each supported backend tool registers a function that produces its extra
//! arguments from the job's output directory. Unregistered backends run with
//! the base arguments only.

use std::collections::HashMap;
use std::path::Path;

/// Default installation path of GHDL's pre-analyzed vendor libraries.
pub const GHDL_VENDORS: &str = "/usr/local/lib/ghdl/vendors";

/// File name of GHDL's PSL coverage report.
pub const GHDL_PSL_REPORT: &str = "ghdl_psl_report.json";

/// File name of GHDL's waveform dump.
pub const GHDL_WAVE: &str = "ghdl.ghw";

/// Settings available to every backend when producing its arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct BackendSettings {
    ghdl_vendors: String,
}

impl BackendSettings {
    pub fn new() -> Self {
        Self {
            ghdl_vendors: String::from(GHDL_VENDORS),
        }
    }

    /// Sets the path to GHDL's pre-analyzed libraries.
    pub fn ghdl_vendors(mut self, path: Option<String>) -> Self {
        if let Some(p) = path {
            self.ghdl_vendors = p;
        }
        self
    }

    pub fn get_ghdl_vendors(&self) -> &str {
        &self.ghdl_vendors
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Produces the extra arguments for one backend given the job's output directory.
pub type OptionsFn = fn(&BackendSettings, &Path) -> Vec<String>;

/// Maps backend tool identifiers to their option producers.
#[derive(Clone)]
pub struct Registry {
    settings: BackendSettings,
    entries: HashMap<String, OptionsFn>,
}

impl Registry {
    /// Creates a registry with no backends.
    pub fn empty(settings: BackendSettings) -> Self {
        Self {
            settings,
            entries: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in backend.
    pub fn new(settings: BackendSettings) -> Self {
        Self::empty(settings).register("ghdl", ghdl_options)
    }

    pub fn register(mut self, tool: &str, f: OptionsFn) -> Self {
        self.entries.insert(tool.to_string(), f);
        self
    }

    pub fn is_registered(&self, tool: &str) -> bool {
        self.entries.contains_key(tool)
    }

    /// Returns the extra arguments for `tool`, which are empty for an
    /// unregistered backend.
    pub fn options(&self, tool: &str, outdir: &Path) -> Vec<String> {
        match self.entries.get(tool) {
            Some(f) => f(&self.settings, outdir),
            None => Vec::new(),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(BackendSettings::default())
    }
}

/// GHDL: search the pre-analyzed libraries, relax the parsing rules, enable
/// PSL, and redirect the PSL report and waveform into the job's directory.
///
/// FuseSoc forwards these strings to GHDL; the leading backslash keeps them
/// from being read as FuseSoc's own flags.
fn ghdl_options(settings: &BackendSettings, outdir: &Path) -> Vec<String> {
    vec![
        String::from("--analyze_options"),
        format!("\\-P{} -frelaxed-rules -fpsl", settings.get_ghdl_vendors()),
        String::from("--run_options"),
        format!(
            "\\--psl-report={} --wave={}",
            outdir.join(GHDL_PSL_REPORT).display(),
            outdir.join(GHDL_WAVE).display()
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn ghdl_is_registered() {
        let reg = Registry::default();
        assert_eq!(reg.is_registered("ghdl"), true);
        assert_eq!(reg.is_registered("xsim"), false);
    }

    #[test]
    fn ghdl_options_point_into_outdir() {
        let reg = Registry::default();
        let out = PathBuf::from("/work/_fsva/tmp/mylib-uart/tb_uart");
        assert_eq!(
            reg.options("ghdl", &out),
            vec![
                String::from("--analyze_options"),
                String::from("\\-P/usr/local/lib/ghdl/vendors -frelaxed-rules -fpsl"),
                String::from("--run_options"),
                String::from("\\--psl-report=/work/_fsva/tmp/mylib-uart/tb_uart/ghdl_psl_report.json --wave=/work/_fsva/tmp/mylib-uart/tb_uart/ghdl.ghw"),
            ]
        );
    }

    #[test]
    fn custom_vendor_path() {
        let reg = Registry::new(
            BackendSettings::new().ghdl_vendors(Some(String::from("/opt/ghdl/vendors"))),
        );
        let opts = reg.options("ghdl", Path::new("/out"));
        assert_eq!(opts[1], "\\-P/opt/ghdl/vendors -frelaxed-rules -fpsl");
    }

    #[test]
    fn unknown_backend_has_no_options() {
        let reg = Registry::default();
        assert_eq!(reg.options("questa", Path::new("/out")), Vec::<String>::new());
    }

    #[test]
    fn register_new_backend() {
        fn verilator(_: &BackendSettings, outdir: &Path) -> Vec<String> {
            vec![format!("--trace-dir={}", outdir.display())]
        }
        let reg = Registry::default().register("verilator", verilator);
        assert_eq!(
            reg.options("verilator", Path::new("/out")),
            vec![String::from("--trace-dir=/out")]
        );
        // existing entries are untouched
        assert_eq!(reg.options("ghdl", Path::new("/out")).len(), 4);
    }
}
