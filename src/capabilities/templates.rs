//! Remote file templates embedded at compile time.

use crate::config::{resolve_string, TemplateVars};
use crate::error::{Result, VmdeskError};
use include_dir::{include_dir, Dir};
use std::path::PathBuf;

/// Embedded templates directory.
static TEMPLATES_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

pub const XRDP_STARTWM: &str = "xrdp/startwm.sh";
pub const VNC_XSTARTUP: &str = "vnc/xstartup";
pub const VNC_SERVICE_UNIT: &str = "vnc/vncserver@.service";
pub const NOVNC_SERVICE_UNIT: &str = "novnc/novnc.service";

/// Raw template text.
pub fn source(path: &str) -> Result<&'static str> {
    let file = TEMPLATES_DIR
        .get_file(path)
        .ok_or_else(|| VmdeskError::ConfigNotFound {
            path: PathBuf::from("templates").join(path),
        })?;

    file.contents_utf8()
        .ok_or_else(|| VmdeskError::ConfigParseError {
            path: PathBuf::from("templates").join(path),
            message: "Invalid UTF-8".to_string(),
        })
}

/// Template text with every `${var}` resolved.
pub fn render(path: &str, vars: &TemplateVars) -> Result<String> {
    resolve_string(source(path)?, vars)
}

/// Paths of all embedded templates, sorted.
pub fn template_paths() -> Vec<String> {
    let mut paths = Vec::new();
    collect(&TEMPLATES_DIR, &mut paths);
    paths.sort();
    paths
}

fn collect(dir: &Dir<'_>, paths: &mut Vec<String>) {
    for file in dir.files() {
        paths.push(file.path().to_string_lossy().into_owned());
    }
    for sub in dir.dirs() {
        collect(sub, paths);
    }
}
