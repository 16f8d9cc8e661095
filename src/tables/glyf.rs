//! Parsing and writing of the `glyf` table.
//!
//! > This table contains information that describes the glyphs in the font in the TrueType outline
//! > format.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/glyf>
//!
//! Simple glyphs are carried as raw bytes. Composite glyphs are parsed far enough to
//! rewrite the glyph indices of their components.

mod subset;

use std::convert::TryFrom;

use bitflags::bitflags;
use itertools::Itertools;
use log::warn;

use crate::binary::read::{ReadBinary, ReadBinaryDep, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{word_align, I16Be, U16Be};
use crate::error::{ParseError, WriteError};
use crate::tables::loca::{owned, LocaTable};

pub use subset::{SubsetGlyf, SubsetGlyph};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct CompositeGlyphFlag: u16 {
        /// Bit 0: If this is set, the arguments are 16-bit (uint16 or int16); otherwise, they are
        /// bytes (uint8 or int8).
        const ARG_1_AND_2_ARE_WORDS = 0x0001;
        /// Bit 1: If this is set, the arguments are signed xy values; otherwise, they are unsigned
        /// point numbers.
        const ARGS_ARE_XY_VALUES = 0x0002;
        const ROUND_XY_TO_GRID = 0x0004;
        /// Bit 3: There is a simple scale for the component. Otherwise, scale = 1.0.
        const WE_HAVE_A_SCALE = 0x0008;
        /// Bit 5: Indicates at least one more glyph after this one.
        const MORE_COMPONENTS = 0x0020;
        const WE_HAVE_AN_X_AND_Y_SCALE = 0x0040;
        const WE_HAVE_A_TWO_BY_TWO = 0x0080;
        /// Bit 8: Following the last component are instructions for the composite character.
        const WE_HAVE_INSTRUCTIONS = 0x0100;
        const USE_MY_METRICS = 0x0200;
        const OVERLAP_COMPOUND = 0x0400;
        const SCALED_COMPONENT_OFFSET = 0x0800;
        const UNSCALED_COMPONENT_OFFSET = 0x1000;
    }
}

/// `glyf` table
#[derive(Debug, PartialEq)]
pub struct GlyfTable<'a> {
    pub records: Vec<GlyfRecord<'a>>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum GlyfRecord<'a> {
    Empty,
    Present {
        number_of_contours: i16,
        scope: ReadScope<'a>,
    },
    Composite(CompositeGlyph<'a>),
}

/// A composite glyph with its components split out.
#[derive(Debug, PartialEq, Clone)]
pub struct CompositeGlyph<'a> {
    pub bounding_box: BoundingBox,
    pub components: Vec<CompositeComponent<'a>>,
    /// Instructions and any trailing bytes following the last component
    pub trailer: &'a [u8],
}

#[derive(Debug, PartialEq, Clone)]
pub struct CompositeComponent<'a> {
    pub flags: CompositeGlyphFlag,
    pub glyph_index: u16,
    /// Offset arguments and transform, kept verbatim
    pub arguments: &'a [u8],
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct BoundingBox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl<'b> ReadBinaryDep for GlyfTable<'b> {
    type Args<'a> = &'a LocaTable<'a>;
    type HostType<'a> = GlyfTable<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        loca: &'a LocaTable<'a>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        if loca.offsets.len() < 2 {
            return Err(ParseError::BadIndex);
        }

        let offsets = (0..loca.offsets.len()).filter_map(|index| loca.offsets.get(index));
        let records = offsets
            .tuple_windows()
            .map(|(start, end)| match end.checked_sub(start) {
                Some(0) => Ok(GlyfRecord::Empty),
                Some(length) => {
                    let offset = usize::try_from(start)?;
                    let length = usize::try_from(length)?;
                    let scope = match ctxt.scope().offset_length(offset, length) {
                        Ok(scope) => scope,
                        Err(ParseError::BadEof) => {
                            // Some fonts have a final loca offset past the end of glyf. Keep
                            // whatever data is there and let the glyph header decide.
                            warn!("glyph length out of bounds, truncating");
                            ctxt.scope().offset(offset)
                        }
                        Err(err) => return Err(err),
                    };
                    let number_of_contours = scope.read::<I16Be>()?;
                    Ok(GlyfRecord::Present {
                        number_of_contours,
                        scope,
                    })
                }
                None => Err(ParseError::BadOffset),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GlyfTable { records })
    }
}

impl<'a> WriteBinary for GlyfTable<'a> {
    type Output = owned::LocaTable;

    /// Write the glyph data, returning the matching `loca` offsets.
    ///
    /// Every glyph is padded to a 16-bit boundary so the offsets remain valid for either
    /// `loca` format.
    fn write<C: WriteContext>(ctxt: &mut C, table: GlyfTable<'a>) -> Result<Self::Output, WriteError> {
        let mut offsets: Vec<u32> = Vec::with_capacity(table.records.len() + 1);

        let start = ctxt.bytes_written();
        for record in table.records {
            let offset = ctxt.bytes_written();
            offsets.push(u32::try_from(offset - start)?);

            match record {
                GlyfRecord::Empty => (),
                GlyfRecord::Present { scope, .. } => ReadScope::write(ctxt, scope)?,
                GlyfRecord::Composite(composite) => CompositeGlyph::write(ctxt, composite)?,
            }

            let length = ctxt.bytes_written() - offset;
            ctxt.write_zeros(word_align(length) - length)?;
        }

        // Add the final loca entry
        offsets.push(u32::try_from(ctxt.bytes_written() - start)?);

        Ok(owned::LocaTable { offsets })
    }
}

impl<'b> ReadBinary for CompositeGlyph<'b> {
    type HostType<'a> = CompositeGlyph<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let number_of_contours = ctxt.read_i16be()?;
        ctxt.check(number_of_contours < 0)?;
        let bounding_box = ctxt.read::<BoundingBox>()?;

        let mut components = Vec::new();
        loop {
            let flags = CompositeGlyphFlag::from_bits_truncate(ctxt.read_u16be()?);
            let glyph_index = ctxt.read_u16be()?;
            let arguments = ctxt.read_slice(flags.arguments_len())?;
            components.push(CompositeComponent {
                flags,
                glyph_index,
                arguments,
            });

            if !flags.contains(CompositeGlyphFlag::MORE_COMPONENTS) {
                break;
            }
        }

        let trailer = ctxt.scope().data();
        Ok(CompositeGlyph {
            bounding_box,
            components,
            trailer,
        })
    }
}

impl<'a> WriteBinary for CompositeGlyph<'a> {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, glyph: CompositeGlyph<'a>) -> Result<(), WriteError> {
        I16Be::write(ctxt, -1i16)?;
        BoundingBox::write(ctxt, glyph.bounding_box)?;
        for component in glyph.components {
            U16Be::write(ctxt, component.flags.bits())?;
            U16Be::write(ctxt, component.glyph_index)?;
            ctxt.write_bytes(component.arguments)?;
        }
        ctxt.write_bytes(glyph.trailer)?;

        Ok(())
    }
}

impl ReadFrom for BoundingBox {
    type ReadType = (I16Be, I16Be, I16Be, I16Be);

    fn read_from((x_min, y_min, x_max, y_max): (i16, i16, i16, i16)) -> Self {
        BoundingBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }
}

impl WriteBinary for BoundingBox {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, bbox: BoundingBox) -> Result<(), WriteError> {
        I16Be::write(ctxt, bbox.x_min)?;
        I16Be::write(ctxt, bbox.y_min)?;
        I16Be::write(ctxt, bbox.x_max)?;
        I16Be::write(ctxt, bbox.y_max)?;
        Ok(())
    }
}

impl CompositeGlyphFlag {
    /// Number of bytes of arguments and transform following the glyph index.
    fn arguments_len(self) -> usize {
        let arguments = if self.contains(Self::ARG_1_AND_2_ARE_WORDS) {
            4
        } else {
            2
        };
        let transform = if self.contains(Self::WE_HAVE_A_SCALE) {
            2
        } else if self.contains(Self::WE_HAVE_AN_X_AND_Y_SCALE) {
            4
        } else if self.contains(Self::WE_HAVE_A_TWO_BY_TWO) {
            8
        } else {
            0
        };
        arguments + transform
    }
}

impl<'a> GlyfRecord<'a> {
    pub fn number_of_contours(&self) -> i16 {
        match self {
            GlyfRecord::Empty => 0,
            GlyfRecord::Present {
                number_of_contours, ..
            } => *number_of_contours,
            GlyfRecord::Composite(_) => -1,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.number_of_contours() < 0
    }

    /// Split the components out of a composite glyph. Other records are unchanged.
    pub fn parse(&mut self) -> Result<(), ParseError> {
        if let GlyfRecord::Present {
            number_of_contours,
            scope,
        } = self
        {
            if *number_of_contours < 0 {
                let composite = scope.read::<CompositeGlyph<'_>>()?;
                *self = GlyfRecord::Composite(composite);
            }
        }
        Ok(())
    }

    /// The bounding box from the glyph header, `None` for empty glyphs.
    pub fn bounding_box(&self) -> Result<Option<BoundingBox>, ParseError> {
        match self {
            GlyfRecord::Empty => Ok(None),
            GlyfRecord::Present { scope, .. } => {
                let mut ctxt = scope.offset(2).ctxt();
                ctxt.read::<BoundingBox>().map(Some)
            }
            GlyfRecord::Composite(composite) => Ok(Some(composite.bounding_box)),
        }
    }
}

impl BoundingBox {
    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::write::WriteBuffer;
    use crate::tables::IndexToLocFormat;
    use crate::tests::{composite_glyph, simple_glyph};

    fn glyf_and_loca(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        for glyph in glyphs {
            loca.extend_from_slice(&u32::try_from(glyf.len()).unwrap().to_be_bytes());
            glyf.extend_from_slice(glyph);
        }
        loca.extend_from_slice(&u32::try_from(glyf.len()).unwrap().to_be_bytes());
        (glyf, loca)
    }

    #[test]
    fn read_records() {
        let (glyf, loca) = glyf_and_loca(&[Vec::new(), simple_glyph(5, 7), composite_glyph(&[1])]);
        let loca = ReadScope::new(&loca)
            .read_dep::<LocaTable<'_>>((3, IndexToLocFormat::Long))
            .unwrap();
        let table = ReadScope::new(&glyf)
            .read_dep::<GlyfTable<'_>>(&loca)
            .unwrap();

        assert_eq!(table.records.len(), 3);
        assert_eq!(table.records[0], GlyfRecord::Empty);
        assert_eq!(table.records[1].number_of_contours(), 1);
        assert!(table.records[2].is_composite());
        assert_eq!(
            table.records[1].bounding_box().unwrap(),
            Some(BoundingBox {
                x_min: 5,
                y_min: 7,
                x_max: 5,
                y_max: 7
            })
        );
    }

    #[test]
    fn composite_round_trip() {
        let data = composite_glyph(&[4, 9]);
        let glyph = ReadScope::new(&data).read::<CompositeGlyph<'_>>().unwrap();
        assert_eq!(
            glyph
                .components
                .iter()
                .map(|component| component.glyph_index)
                .collect::<Vec<_>>(),
            vec![4, 9]
        );

        let mut buffer = WriteBuffer::new();
        CompositeGlyph::write(&mut buffer, glyph).unwrap();
        assert_eq!(buffer.bytes(), data.as_slice());
    }

    #[test]
    fn write_pads_glyphs() {
        let (glyf, loca) = glyf_and_loca(&[simple_glyph(1, 1), Vec::new(), simple_glyph(2, 2)]);
        let loca = ReadScope::new(&loca)
            .read_dep::<LocaTable<'_>>((3, IndexToLocFormat::Long))
            .unwrap();
        let table = ReadScope::new(&glyf)
            .read_dep::<GlyfTable<'_>>(&loca)
            .unwrap();

        let mut buffer = WriteBuffer::new();
        let new_loca = GlyfTable::write(&mut buffer, table).unwrap();
        assert_eq!(new_loca.offsets, vec![0, 20, 20, 40]);
        assert_eq!(buffer.len(), 40);
        assert_eq!(new_loca.preferred_format(), IndexToLocFormat::Short);
    }
}
