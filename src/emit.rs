//! Writing the font as a base64 string constant in a JavaScript module.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;

use crate::error::BuildError;

/// Sizes of what was written, in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub font_size: usize,
    pub js_size: usize,
}

/// The JavaScript source declaring `const_name` as the base64 encoding of `font`.
pub fn js_module(const_name: &str, font: &[u8]) -> String {
    format!("const {} = '{}';\n", const_name, STANDARD.encode(font))
}

/// Write the JavaScript module for `font` to `path`, creating parent directories.
pub fn write_js(path: &Path, const_name: &str, font: &[u8]) -> Result<EmitReport, BuildError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
    }

    let js = js_module(const_name, font);
    fs::write(path, &js).map_err(|err| BuildError::io(path, err))?;

    let report = EmitReport {
        font_size: font.len(),
        js_size: js.len(),
    };
    info!("Font size: {} bytes", report.font_size);
    info!("Wrote {} ({} bytes)", path.display(), report.js_size);
    Ok(report)
}
