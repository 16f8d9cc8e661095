//! TrueType font subsetting.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use itertools::Itertools;
use log::debug;

use crate::binary::read::ReadScope;
use crate::error::{ParseError, ReadWriteError, WriteError};
use crate::font::FontTables;
use crate::post;
use crate::tables::cmap::owned;
use crate::tables::glyf::{BoundingBox, GlyfTable};
use crate::tables::loca::LocaTable;
use crate::tables::{
    FontTableProvider, HeadTable, HheaTable, HmtxTable, MaxpTable, OwnedHmtxTable, TTF_MAGIC,
};
use crate::tag;

/// Tables that do not reference glyph ids and are copied into the subset unchanged.
const GLYPH_INDEPENDENT_TABLES: [u32; 6] = [
    tag::NAME,
    tag::OS_2,
    tag::CVT,
    tag::FPGM,
    tag::PREP,
    tag::GASP,
];

pub(crate) trait SubsetGlyphs {
    /// The number of glyphs in this collection
    fn len(&self) -> usize;

    /// Return the old glyph id for the supplied new glyph id
    fn old_id(&self, new_id: u16) -> u16;

    /// Return the new glyph id for the supplied old glyph id
    fn new_id(&self, old_id: u16) -> u16;
}

/// Subset a TrueType font so that it only contains the glyphs with the supplied `glyph_ids`.
///
/// The first entry must be 0, the `.notdef` glyph, otherwise `WriteError::BadValue` is returned.
/// Repeated glyph ids are kept once. Components of composite glyphs are added after the
/// requested glyphs.
///
/// `mappings` associates codepoints with glyph ids of the source font. Those whose glyph
/// survives are written to the `cmap` of the subset font against the new glyph ids.
pub fn subset(
    provider: &impl FontTableProvider,
    glyph_ids: &[u16],
    mappings: &BTreeMap<u32, u16>,
) -> Result<FontTables, ReadWriteError> {
    if glyph_ids.first() != Some(&0) {
        // glyph index 0 is the .notdef glyph, the fallback, it must always be first
        return Err(ReadWriteError::Write(WriteError::BadValue));
    }
    if provider.has_table(tag::CFF) || provider.has_table(tag::CFF2) {
        return Err(ReadWriteError::Read(ParseError::NotImplemented));
    }
    let glyph_ids = glyph_ids.iter().copied().unique().collect_vec();

    let mut head = ReadScope::new(&provider.read_table_data(tag::HEAD)?).read::<HeadTable>()?;
    let mut maxp = ReadScope::new(&provider.read_table_data(tag::MAXP)?).read::<MaxpTable>()?;
    let loca_data = provider.read_table_data(tag::LOCA)?;
    let loca = ReadScope::new(&loca_data)
        .read_dep::<LocaTable<'_>>((maxp.num_glyphs, head.index_to_loc_format))?;
    let glyf_data = provider.read_table_data(tag::GLYF)?;
    let glyf = ReadScope::new(&glyf_data).read_dep::<GlyfTable<'_>>(&loca)?;
    let mut hhea = ReadScope::new(&provider.read_table_data(tag::HHEA)?).read::<HheaTable>()?;
    let hmtx_data = provider.read_table_data(tag::HMTX)?;
    let hmtx = ReadScope::new(&hmtx_data).read_dep::<HmtxTable<'_>>((
        usize::from(maxp.num_glyphs),
        usize::from(hhea.num_h_metrics),
    ))?;

    // Subset the glyphs
    let subset_glyphs = glyf.subset(&glyph_ids)?;
    let num_glyphs = u16::try_from(subset_glyphs.len()).map_err(ParseError::from)?;
    debug!(
        "subsetting {} glyphs down to {} ({} requested)",
        maxp.num_glyphs,
        num_glyphs,
        glyph_ids.len()
    );

    // The bounding box of the font is the union of its remaining glyphs
    let mut bounding_box: Option<BoundingBox> = None;
    for glyph in subset_glyphs.glyphs() {
        if let Some(bbox) = glyph.record.bounding_box()? {
            bounding_box = Some(bounding_box.map_or(bbox, |acc| acc.union(bbox)));
        }
    }
    if let Some(bbox) = bounding_box {
        head.x_min = bbox.x_min;
        head.y_min = bbox.y_min;
        head.x_max = bbox.x_max;
        head.y_max = bbox.y_max;
    }

    maxp.num_glyphs = num_glyphs;

    let hmtx = create_hmtx_table(&hmtx, &subset_glyphs)?;
    hhea.num_h_metrics = num_glyphs;
    hhea.advance_width_max = hmtx
        .h_metrics
        .iter()
        .map(|metric| metric.advance_width)
        .max()
        .unwrap_or(0);

    // Map the codepoints whose glyphs were kept onto their new ids
    let new_mappings = mappings
        .iter()
        .filter_map(|(&ch, &old_id)| match subset_glyphs.new_id(old_id) {
            0 => None,
            new_id => Some((ch, new_id)),
        })
        .collect::<BTreeMap<_, _>>();
    let cmap = owned::Cmap::unicode_from_mappings(&new_mappings)?;

    let glyf = GlyfTable::from(subset_glyphs);

    // Build the new font
    let mut font = FontTables::new(TTF_MAGIC);
    font.insert_table::<_, owned::Cmap>(tag::CMAP, cmap, ())?;
    font.insert_table::<_, HheaTable>(tag::HHEA, &hhea, ())?;
    font.insert_table::<_, OwnedHmtxTable>(tag::HMTX, &hmtx, ())?;
    font.insert_table::<_, MaxpTable>(tag::MAXP, &maxp, ())?;
    if let Some(post_data) = provider.table_data(tag::POST)? {
        // Version 3 does not carry glyph names, which would no longer match
        let post = ReadScope::new(&post_data).read::<post::Header>()?;
        font.insert_table::<_, post::Header>(tag::POST, &post.to_version_3(), ())?;
    }
    for tag in GLYPH_INDEPENDENT_TABLES {
        if let Some(data) = provider.table_data(tag)? {
            font.insert(tag, data.into_owned());
        }
    }

    let loca = font.insert_table::<_, GlyfTable<'_>>(tag::GLYF, glyf, ())?;
    head.index_to_loc_format = loca.preferred_format();
    let index_to_loc_format = head.index_to_loc_format;
    font.insert_table::<_, crate::tables::loca::owned::LocaTable>(
        tag::LOCA,
        loca,
        index_to_loc_format,
    )?;
    font.insert_table::<_, HeadTable>(tag::HEAD, &head, ())?;

    Ok(font)
}

fn create_hmtx_table(
    hmtx: &HmtxTable<'_>,
    subset_glyphs: &impl SubsetGlyphs,
) -> Result<OwnedHmtxTable, ReadWriteError> {
    let h_metrics = (0..subset_glyphs.len())
        .map(|new_id| {
            let new_id = u16::try_from(new_id).map_err(ParseError::from)?;
            hmtx.metric(subset_glyphs.old_id(new_id))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OwnedHmtxTable { h_metrics })
}
