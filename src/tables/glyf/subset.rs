use rustc_hash::FxHashMap;

use super::{GlyfRecord, GlyfTable, ParseError};
use crate::subset::SubsetGlyphs;
use crate::tables::glyf::CompositeGlyph;

#[derive(Clone)]
pub struct SubsetGlyph<'a> {
    pub old_id: u16,
    pub record: GlyfRecord<'a>,
}

/// A `glyf` table that has been subset.
#[derive(Clone)]
pub struct SubsetGlyf<'a> {
    glyphs: Vec<SubsetGlyph<'a>>,
    /// Maps an old glyph index to its index in the new table
    old_to_new_id: FxHashMap<u16, u16>,
}

impl<'a> GlyfTable<'a> {
    /// Returns a copy of this table that only contains the glyphs specified by `glyph_ids`.
    ///
    /// Components of composite glyphs are appended after the requested glyphs and the
    /// composite glyph indices rewritten to match.
    pub fn subset(&self, glyph_ids: &[u16]) -> Result<SubsetGlyf<'a>, ParseError> {
        let mut glyph_ids = glyph_ids.to_vec();
        let mut records = Vec::with_capacity(glyph_ids.len());

        let mut i = 0;
        while i < glyph_ids.len() {
            let glyph_id = glyph_ids[i];
            let mut record = self
                .records
                .get(usize::from(glyph_id))
                .ok_or(ParseError::BadIndex)?
                .clone();
            if record.is_composite() {
                record.parse()?;
                if let GlyfRecord::Composite(composite) = &mut record {
                    add_components(&mut glyph_ids, composite)?;
                }
            }
            records.push(SubsetGlyph {
                old_id: glyph_id,
                record,
            });
            i += 1;
        }

        let old_to_new_id = records
            .iter()
            .enumerate()
            .map(|(new_id, glyph)| -> Result<(u16, u16), ParseError> {
                Ok((glyph.old_id, u16::try_from(new_id)?))
            })
            .collect::<Result<FxHashMap<_, _>, _>>()?;
        Ok(SubsetGlyf {
            glyphs: records,
            old_to_new_id,
        })
    }
}

impl<'a> SubsetGlyf<'a> {
    pub fn glyphs(&self) -> &[SubsetGlyph<'a>] {
        &self.glyphs
    }
}

impl<'a> SubsetGlyphs for SubsetGlyf<'a> {
    fn len(&self) -> usize {
        self.glyphs.len()
    }

    fn old_id(&self, new_id: u16) -> u16 {
        self.glyphs
            .get(usize::from(new_id))
            .map_or(0, |glyph| glyph.old_id)
    }

    fn new_id(&self, old_id: u16) -> u16 {
        self.old_to_new_id.get(&old_id).copied().unwrap_or(0)
    }
}

impl<'a> From<SubsetGlyf<'a>> for GlyfTable<'a> {
    fn from(subset_glyphs: SubsetGlyf<'a>) -> Self {
        let records = subset_glyphs
            .glyphs
            .into_iter()
            .map(|subset_record| subset_record.record)
            .collect();

        GlyfTable { records }
    }
}

/// Add each of the component glyphs of a composite glyph to the subset font.
///
/// Updates the component glyph indexes to point at the new indexes.
fn add_components(
    glyph_ids: &mut Vec<u16>,
    composite: &mut CompositeGlyph<'_>,
) -> Result<(), ParseError> {
    for component in composite.components.iter_mut() {
        let new_id = match glyph_ids
            .iter()
            .position(|&id| id == component.glyph_index)
        {
            Some(position) => position,
            None => {
                glyph_ids.push(component.glyph_index);
                glyph_ids.len() - 1
            }
        };
        component.glyph_index = u16::try_from(new_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::tests::{composite_glyph, simple_glyph};
    use super::*;
    use crate::binary::read::ReadScope;

    fn present(data: &[u8], number_of_contours: i16) -> GlyfRecord<'_> {
        GlyfRecord::Present {
            number_of_contours,
            scope: ReadScope::new(data),
        }
    }

    #[test]
    fn components_are_appended_and_renumbered() {
        let simple_a = simple_glyph(1, 1);
        let simple_b = simple_glyph(2, 2);
        let composite = composite_glyph(&[3, 1]);
        let glyf = GlyfTable {
            records: vec![
                GlyfRecord::Empty,
                present(&simple_a, 1),
                present(&composite, -1),
                present(&simple_b, 1),
            ],
        };

        let subset = glyf.subset(&[0, 2]).unwrap();
        assert_eq!(subset.len(), 4);
        assert_eq!(
            (0..4).map(|id| subset.old_id(id)).collect::<Vec<_>>(),
            vec![0, 2, 3, 1]
        );
        assert_eq!(subset.new_id(1), 3);
        assert_eq!(subset.new_id(7), 0);

        let table = GlyfTable::from(subset);
        match &table.records[1] {
            GlyfRecord::Composite(composite) => {
                let indices = composite
                    .components
                    .iter()
                    .map(|component| component.glyph_index)
                    .collect::<Vec<_>>();
                assert_eq!(indices, vec![2, 3]);
            }
            record => panic!("expected composite, got {:?}", record),
        }
    }

    #[test]
    fn shared_component_included_once() {
        let simple = simple_glyph(1, 1);
        let first = composite_glyph(&[1]);
        let second = composite_glyph(&[1]);
        let glyf = GlyfTable {
            records: vec![
                GlyfRecord::Empty,
                present(&simple, 1),
                present(&first, -1),
                present(&second, -1),
            ],
        };

        let subset = glyf.subset(&[0, 2, 3]).unwrap();
        assert_eq!(subset.len(), 4);
        assert_eq!(subset.old_id(3), 1);
    }

    #[test]
    fn out_of_range_glyph() {
        let glyf = GlyfTable {
            records: vec![GlyfRecord::Empty],
        };
        assert!(matches!(glyf.subset(&[0, 5]), Err(ParseError::BadIndex)));
    }
}
