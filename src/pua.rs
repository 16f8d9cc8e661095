//! Assignment of emoji glyphs to Private Use Area codepoints.
//!
//! Emoji are looked up twice. First in the source font, to find the glyphs to keep
//! ([`resolve`]), then in the subset font, to find where those glyphs ended up ([`remap`]).
//! Only emoji found both times receive a PUA codepoint, so the assigned range has no holes.

use std::collections::BTreeMap;
use std::convert::TryFrom;

use log::{info, warn};

use crate::error::BuildError;
use crate::font::{self, FontTables};
use crate::tables::cmap::owned::{self, CmapSubtable, CmapSubtableFormat4};
use crate::tables::cmap::{EncodingId, PlatformId};
use crate::tables::os2::CharIndexRange;
use crate::tag;

/// First codepoint of the BMP Private Use Area.
pub const PUA_FIRST: u32 = 0xE000;
/// Last codepoint of the BMP Private Use Area.
pub const PUA_LAST: u32 = 0xF8FF;

/// The outcome of looking up a list of codepoints in the source font.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// Codepoints present in the font with their glyph, in list order.
    pub available: Vec<(u32, u16)>,
    /// Codepoints the font has no glyph for, in list order.
    pub missing: Vec<u32>,
}

/// A Private Use Area codepoint and the emoji it stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PuaEntry {
    pub pua: u32,
    /// The emoji codepoint this entry was assigned for
    pub codepoint: u32,
    /// Glyph id in the subset font
    pub glyph_id: u16,
}

/// Densely assigned PUA codepoints, in assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PuaMapping {
    entries: Vec<PuaEntry>,
    unresolved: Vec<u32>,
}

impl Resolution {
    /// Glyph ids to subset to: `.notdef` followed by the available glyphs in list order.
    ///
    /// A glyph shared by several codepoints appears more than once; the subsetter keeps it
    /// once.
    pub fn glyph_ids(&self) -> Vec<u16> {
        std::iter::once(0)
            .chain(self.available.iter().map(|&(_, glyph_id)| glyph_id))
            .collect()
    }

    /// The available codepoints as a codepoint to source glyph map.
    pub fn mappings(&self) -> BTreeMap<u32, u16> {
        self.available.iter().copied().collect()
    }

    pub fn total(&self) -> usize {
        self.available.len() + self.missing.len()
    }
}

/// Look up each codepoint in `mappings`, the best Unicode cmap of the source font.
///
/// Codepoints without a glyph are logged and recorded as missing.
pub fn resolve(codepoints: &[u32], mappings: &BTreeMap<u32, u16>) -> Resolution {
    let mut resolution = Resolution::default();
    for &ch in codepoints {
        match mappings.get(&ch) {
            Some(&glyph_id) if glyph_id != 0 => resolution.available.push((ch, glyph_id)),
            _ => {
                warn!("MISSING: U+{:04X}", ch);
                resolution.missing.push(ch);
            }
        }
    }

    info!("Total codepoints: {}", resolution.total());
    info!("Available in font: {}", resolution.available.len());
    info!("Missing: {}", resolution.missing.len());
    resolution
}

/// Assign PUA codepoints from `pua_start` to the emoji of `resolution` found in `font`.
///
/// `font` is the subset font; its best Unicode cmap tells where each emoji's glyph is now.
/// An emoji that cannot be found there is skipped with a warning, or reported as
/// [`BuildError::Unresolved`] when `strict` is set. Assignment skips such emoji without
/// leaving a gap.
pub fn remap(
    font: &FontTables,
    resolution: &Resolution,
    pua_start: u32,
    strict: bool,
) -> Result<PuaMapping, BuildError> {
    let (record, subset_mappings) = font::best_cmap_mappings(font)?;
    let num_glyphs = font.num_glyphs()?;
    info!(
        "Post-subset cmap entries: {} from subtable {}",
        subset_mappings.len(),
        record
    );

    let mut resolved = Vec::with_capacity(resolution.available.len());
    let mut unresolved = Vec::new();
    for &(ch, _) in &resolution.available {
        match subset_mappings.get(&ch) {
            Some(&glyph_id) if glyph_id < num_glyphs => resolved.push((ch, glyph_id)),
            _ => {
                warn!("U+{:04X} not in post-subset cmap", ch);
                unresolved.push(ch);
            }
        }
    }
    if strict && !unresolved.is_empty() {
        return Err(BuildError::Unresolved(unresolved));
    }

    let count = resolved.len();
    let overflow = || BuildError::PuaOverflow {
        start: pua_start,
        count,
    };
    if !(PUA_FIRST..=PUA_LAST).contains(&pua_start) {
        return Err(overflow());
    }
    let last = u32::try_from(count)
        .ok()
        .and_then(|count| pua_start.checked_add(count))
        .ok_or_else(overflow)?;
    if count > 0 && last - 1 > PUA_LAST {
        return Err(overflow());
    }

    let entries = resolved
        .into_iter()
        .zip(pua_start..)
        .map(|((codepoint, glyph_id), pua)| PuaEntry {
            pua,
            codepoint,
            glyph_id,
        })
        .collect();

    Ok(PuaMapping {
        entries,
        unresolved,
    })
}

impl PuaMapping {
    pub fn entries(&self) -> &[PuaEntry] {
        &self.entries
    }

    /// Emoji that were available in the source font but not in the subset font.
    pub fn unresolved(&self) -> &[u32] {
        &self.unresolved
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first and last PUA codepoint assigned.
    pub fn range(&self) -> Option<(u32, u32)> {
        Some((self.entries.first()?.pua, self.entries.last()?.pua))
    }

    /// PUA codepoint to glyph id, as written to the output cmap.
    pub fn cmap_mappings(&self) -> BTreeMap<u32, u16> {
        self.entries
            .iter()
            .map(|entry| (entry.pua, entry.glyph_id))
            .collect()
    }
}

/// Replace the `cmap` of `font` with PUA-only subtables built from `mapping`.
///
/// Two format 4 subtables with the same content are written, Unicode BMP (0, 3) and
/// Windows Unicode BMP (3, 1), in the sorted order a cmap requires. The `OS/2` character
/// index range is updated to the PUA range when the font has an `OS/2` table.
pub fn replace_cmap(font: &mut FontTables, mapping: &PuaMapping) -> Result<(), BuildError> {
    let subtable = CmapSubtable::Format4(CmapSubtableFormat4::from_mappings(
        &mapping.cmap_mappings(),
    )?);
    let cmap = owned::Cmap {
        encoding_records: vec![
            owned::EncodingRecord {
                platform_id: PlatformId::UNICODE,
                encoding_id: EncodingId::UNICODE_BMP,
                sub_table: subtable.clone(),
            },
            owned::EncodingRecord {
                platform_id: PlatformId::WINDOWS,
                encoding_id: EncodingId::WINDOWS_UNICODE_BMP_UCS2,
                sub_table: subtable,
            },
        ],
    };
    font.insert_table::<_, owned::Cmap>(tag::CMAP, cmap, ())?;

    let range = CharIndexRange::from_codepoints(mapping.entries.iter().map(|entry| entry.pua));
    if let Some(range) = range {
        let os2 = font.get(tag::OS_2).map(|os2| range.apply(os2)).transpose()?;
        if let Some(os2) = os2 {
            font.insert(tag::OS_2, os2);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::subset::subset;
    use crate::tables::cmap::Cmap;
    use crate::tables::FontTableProvider;
    use crate::tests::{minimal_font, FIXTURE_MAPPINGS};

    fn source_mappings() -> BTreeMap<u32, u16> {
        FIXTURE_MAPPINGS.iter().copied().collect()
    }

    fn subset_font(resolution: &Resolution) -> FontTables {
        let font = FontTables::read(&minimal_font()).unwrap();
        subset(&font, &resolution.glyph_ids(), &resolution.mappings()).unwrap()
    }

    /// A font whose cmap maps only the first of `mappings`
    fn font_missing_mappings(resolution: &Resolution) -> FontTables {
        let mut font = subset_font(resolution);
        let (_, mut mappings) = font::best_cmap_mappings(&font).unwrap();
        let (&first, _) = mappings.iter().next().unwrap();
        mappings.retain(|&ch, _| ch == first);
        let cmap = owned::Cmap::unicode_from_mappings(&mappings).unwrap();
        font.insert_table::<_, owned::Cmap>(tag::CMAP, cmap, ())
            .unwrap();
        font
    }

    #[test]
    fn resolve_records_missing() {
        let resolution = resolve(&[0x2600, 0x1F600, 0x9999], &source_mappings());
        assert_eq!(resolution.available, vec![(0x2600, 1), (0x1F600, 2)]);
        assert_eq!(resolution.missing, vec![0x9999]);
        assert_eq!(resolution.total(), 3);
        assert_eq!(resolution.glyph_ids(), vec![0, 1, 2]);
    }

    #[test]
    fn resolve_treats_notdef_as_missing() {
        let mut mappings = source_mappings();
        mappings.insert(0x2601, 0);
        let resolution = resolve(&[0x2601], &mappings);
        assert!(resolution.available.is_empty());
        assert_eq!(resolution.missing, vec![0x2601]);
    }

    #[test]
    fn remap_assigns_dense_range() {
        let resolution = resolve(&[0x2600, 0x1F600, 0x9999], &source_mappings());
        let font = subset_font(&resolution);
        let mapping = remap(&font, &resolution, PUA_FIRST, false).unwrap();

        let expected = vec![
            PuaEntry {
                pua: 0xE000,
                codepoint: 0x2600,
                glyph_id: 1,
            },
            PuaEntry {
                pua: 0xE001,
                codepoint: 0x1F600,
                glyph_id: 2,
            },
        ];
        assert_eq!(mapping.entries(), expected.as_slice());
        assert_eq!(mapping.range(), Some((0xE000, 0xE001)));
        assert!(mapping.unresolved().is_empty());
    }

    #[test]
    fn remap_follows_codepoint_order() {
        let resolution = resolve(&[0x1F601, 0x2614, 0x2600], &source_mappings());
        let font = subset_font(&resolution);
        let mapping = remap(&font, &resolution, 0xE010, false).unwrap();
        let codepoints = mapping
            .entries()
            .iter()
            .map(|entry| (entry.pua, entry.codepoint))
            .collect::<Vec<_>>();
        assert_eq!(
            codepoints,
            vec![(0xE010, 0x1F601), (0xE011, 0x2614), (0xE012, 0x2600)]
        );
    }

    #[test]
    fn remap_compacts_unresolved() {
        let resolution = resolve(&[0x2600, 0x2614, 0x1F600], &source_mappings());
        let font = font_missing_mappings(&resolution);
        let mapping = remap(&font, &resolution, PUA_FIRST, false).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.entries()[0].pua, 0xE000);
        assert_eq!(mapping.unresolved(), &[0x2614, 0x1F600]);
    }

    #[test]
    fn remap_strict_fails_on_unresolved() {
        let resolution = resolve(&[0x2600, 0x2614, 0x1F600], &source_mappings());
        let font = font_missing_mappings(&resolution);
        match remap(&font, &resolution, PUA_FIRST, true) {
            Err(BuildError::Unresolved(codepoints)) => {
                assert_eq!(codepoints, vec![0x2614, 0x1F600])
            }
            other => panic!("expected unresolved error, got {:?}", other),
        }
    }

    #[test]
    fn remap_rejects_overflow() {
        let resolution = resolve(&[0x2600, 0x1F600], &source_mappings());
        let font = subset_font(&resolution);
        assert!(remap(&font, &resolution, PUA_LAST, false).is_err());
        assert!(remap(&font, &resolution, PUA_LAST - 1, false).is_ok());
        match remap(&font, &resolution, 0xF900, false) {
            Err(BuildError::PuaOverflow { start, count }) => {
                assert_eq!((start, count), (0xF900, 2))
            }
            other => panic!("expected overflow error, got {:?}", other),
        }
    }

    #[test]
    fn replace_cmap_writes_identical_subtables() {
        let resolution = resolve(&[0x2600, 0x1F600, 0x2614], &source_mappings());
        let mut font = subset_font(&resolution);
        let mapping = remap(&font, &resolution, PUA_FIRST, false).unwrap();
        replace_cmap(&mut font, &mapping).unwrap();

        let cmap_data = font.read_table_data(tag::CMAP).unwrap();
        let cmap = ReadScope::new(&cmap_data).read::<Cmap<'_>>().unwrap();
        let records = cmap.encoding_records().collect::<Vec<_>>();
        let ids = records
            .iter()
            .map(|record| (record.platform_id, record.encoding_id))
            .collect::<Vec<_>>();
        assert_eq!(
            ids,
            vec![
                (PlatformId::UNICODE, EncodingId::UNICODE_BMP),
                (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            ]
        );

        let subtables = records
            .iter()
            .map(|record| cmap.subtable(record).unwrap())
            .collect::<Vec<_>>();
        for subtable in &subtables {
            assert_eq!(subtable.format(), 4);
            assert_eq!(subtable.language(), 0);
            assert_eq!(subtable.mappings().unwrap(), mapping.cmap_mappings());
        }

        let os2 = CharIndexRange::read(font.get(tag::OS_2).unwrap()).unwrap();
        assert_eq!(
            os2,
            CharIndexRange {
                first: 0xE000,
                last: 0xE002
            }
        );
    }
}
