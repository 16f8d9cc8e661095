//! The end to end build: source font in, PUA font and JavaScript module out.

use std::fs;

use log::{info, warn};

use crate::codepoints;
use crate::config::Config;
use crate::emit::{self, EmitReport};
use crate::error::{BuildError, ParseError, ReadWriteError};
use crate::font::{self, FontTables};
use crate::pua::{self, PuaMapping, Resolution};
use crate::subset::subset;
use crate::tables::FontTableProvider;
use crate::tag::{self, DisplayTag};
use crate::verify::{self, VerifyReport};

/// A remapped font, ready to be saved.
#[derive(Debug, Clone)]
pub struct PuaFont {
    pub data: Vec<u8>,
    pub resolution: Resolution,
    pub mapping: PuaMapping,
    /// Tags of the tables that were stripped
    pub removed_tables: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub font: PuaFont,
    /// `None` when the saved font could not be read back
    pub verify: Option<VerifyReport>,
    /// `None` when the JavaScript module was not requested
    pub emit: Option<EmitReport>,
}

/// Run the whole build described by `config`.
///
/// The source font is read, remapped and saved to `config.output`, then read back and
/// reported on. Unless disabled the JavaScript module is written last.
pub fn build_font(config: &Config) -> Result<BuildReport, BuildError> {
    info!("Loading {}", config.input.display());
    let data = fs::read(&config.input).map_err(|err| BuildError::io(&config.input, err))?;
    let font = build_pua_font(&data, config)?;

    if let Some(parent) = config
        .output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        fs::create_dir_all(parent).map_err(|err| BuildError::io(parent, err))?;
    }
    fs::write(&config.output, &font.data).map_err(|err| BuildError::io(&config.output, err))?;
    info!("Saved {}", config.output.display());

    let verify = match fs::read(&config.output) {
        Ok(saved) => verify::verify(&saved, &config.verify_samples)
            .map_err(|err| warn!("unable to verify {}: {}", config.output.display(), err))
            .ok(),
        Err(err) => {
            warn!("unable to reopen {}: {}", config.output.display(), err);
            None
        }
    };

    let emit = if config.emit_js {
        Some(emit::write_js(
            &config.js_output,
            &config.const_name,
            &font.data,
        )?)
    } else {
        None
    };

    Ok(BuildReport { font, verify, emit })
}

/// Remap the font in `data` according to `config`, without touching the filesystem.
pub fn build_pua_font(data: &[u8], config: &Config) -> Result<PuaFont, BuildError> {
    let strip_tags = config.strip_tags()?;
    let codepoints = codepoints::dedup(&config.codepoints);
    info!("Codepoints requested: {}", codepoints.len());

    let source = FontTables::read(data)?;
    if source.has_table(tag::CFF) || source.has_table(tag::CFF2) || !source.has_table(tag::GLYF)
    {
        return Err(BuildError::UnsupportedOutlines);
    }

    let (record, mappings) = font::best_cmap_mappings(&source)?;
    info!(
        "Source cmap subtable {} has {} entries",
        record,
        mappings.len()
    );
    let resolution = pua::resolve(&codepoints, &mappings);
    if resolution.available.is_empty() {
        return Err(BuildError::NoGlyphs);
    }

    let mut font = subset(&source, &resolution.glyph_ids(), &resolution.mappings())
        .map_err(|err| match err {
            ReadWriteError::Read(ParseError::NotImplemented) => BuildError::UnsupportedOutlines,
            err => BuildError::Font(err),
        })?;
    info!("Subset font has {} glyphs", font.num_glyphs()?);

    let mapping = pua::remap(&font, &resolution, config.pua_start, config.strict)?;
    if mapping.is_empty() {
        return Err(BuildError::NoGlyphs);
    }
    if let Some((first, last)) = mapping.range() {
        info!(
            "Assigned {} codepoints U+{:04X}..U+{:04X}",
            mapping.len(),
            first,
            last
        );
    }
    pua::replace_cmap(&mut font, &mapping)?;

    let removed_tables = font.strip(&strip_tags);
    if !removed_tables.is_empty() {
        let names = removed_tables
            .iter()
            .map(|&tag| DisplayTag(tag).to_string())
            .collect::<Vec<_>>();
        info!("Removed tables: {}", names.join(", "));
    }

    let data = font.to_bytes()?;
    Ok(PuaFont {
        data,
        resolution,
        mapping,
        removed_tables,
    })
}
