//! Diagnostics for a finished font.
//!
//! The output file is parsed again from its bytes and its glyph count and cmap are
//! reported. Nothing here decides whether a build succeeded.

use log::info;

use crate::binary::read::ReadScope;
use crate::error::ParseError;
use crate::font::{self, FontTables};
use crate::tables::cmap::Cmap;
use crate::tables::FontTableProvider;
use crate::tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub num_glyphs: u16,
    /// Entries in the best Unicode cmap subtable
    pub cmap_entries: usize,
    /// Each sample codepoint with the glyph it maps to, if any
    pub samples: Vec<(u32, Option<u16>)>,
    pub subtables: Vec<SubtableSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtableSummary {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub format: u16,
    pub entries: usize,
    /// Lowest and highest mapped codepoint
    pub range: Option<(u32, u32)>,
}

/// Reopen `data` and describe its glyphs and cmap, logging each finding.
pub fn verify(data: &[u8], samples: &[u32]) -> Result<VerifyReport, ParseError> {
    let font = FontTables::read(data)?;
    let num_glyphs = font.num_glyphs()?;
    info!("Glyphs: {}", num_glyphs);

    let (_, mappings) = font::best_cmap_mappings(&font)?;
    info!("Cmap entries: {}", mappings.len());

    let samples = samples
        .iter()
        .map(|&ch| {
            let glyph_id = mappings.get(&ch).copied();
            match glyph_id {
                Some(glyph_id) => info!("  U+{:04X} -> glyph {}", ch, glyph_id),
                None => info!("  U+{:04X} -> NOT FOUND", ch),
            }
            (ch, glyph_id)
        })
        .collect();

    let cmap_data = font.read_table_data(tag::CMAP)?;
    let cmap = ReadScope::new(&cmap_data).read::<Cmap<'_>>()?;
    let mut subtables = Vec::new();
    for record in cmap.encoding_records() {
        let subtable = cmap.subtable(&record)?;
        let mappings = subtable.mappings()?;
        let range = mappings
            .keys()
            .next()
            .zip(mappings.keys().next_back())
            .map(|(&first, &last)| (first, last));
        match range {
            Some((first, last)) => info!(
                "Subtable {} format {}: {} entries, U+{:04X}..U+{:04X}",
                record,
                subtable.format(),
                mappings.len(),
                first,
                last
            ),
            None => info!("Subtable {} format {}: empty", record, subtable.format()),
        }
        subtables.push(SubtableSummary {
            platform_id: record.platform_id.0,
            encoding_id: record.encoding_id.0,
            format: subtable.format(),
            entries: mappings.len(),
            range,
        });
    }

    Ok(VerifyReport {
        num_glyphs,
        cmap_entries: mappings.len(),
        samples,
        subtables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::minimal_font;

    #[test]
    fn report_for_fixture() {
        let report = verify(&minimal_font(), &[0x2600, 0x1F601, 0xE000]).unwrap();
        assert_eq!(report.num_glyphs, 5);
        assert_eq!(report.cmap_entries, 4);
        assert_eq!(
            report.samples,
            vec![(0x2600, Some(1)), (0x1F601, Some(4)), (0xE000, None)]
        );
        assert_eq!(
            report.subtables,
            vec![
                SubtableSummary {
                    platform_id: 0,
                    encoding_id: 3,
                    format: 4,
                    entries: 2,
                    range: Some((0x2600, 0x2614)),
                },
                SubtableSummary {
                    platform_id: 3,
                    encoding_id: 10,
                    format: 12,
                    entries: 4,
                    range: Some((0x2600, 0x1F601)),
                },
            ]
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(verify(b"not a font", &[]).is_err());
    }
}
