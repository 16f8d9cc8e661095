//! Parsing and writing of the `loca` table.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/loca>

use crate::binary::read::{ReadArray, ReadBinaryDep, ReadCtxt};
use crate::binary::{U16Be, U32Be};
use crate::error::ParseError;
use crate::tables::IndexToLocFormat;

/// `loca` table
#[derive(Clone, Debug)]
pub struct LocaTable<'a> {
    pub offsets: LocaOffsets<'a>,
}

#[derive(Clone, Debug)]
pub enum LocaOffsets<'a> {
    Short(ReadArray<'a, U16Be>),
    Long(ReadArray<'a, U32Be>),
}

impl<'b> ReadBinaryDep for LocaTable<'b> {
    type Args<'a> = (u16, IndexToLocFormat);
    type HostType<'a> = LocaTable<'a>;

    /// Read a `loca` table from `ctxt`
    ///
    /// * `num_glyphs` is the number of glyphs in the font, from the `maxp` table.
    /// * `index_to_loc_format` comes from the `head` table.
    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (num_glyphs, index_to_loc_format): (u16, IndexToLocFormat),
    ) -> Result<Self::HostType<'a>, ParseError> {
        let count = usize::from(num_glyphs) + 1;
        let offsets = match index_to_loc_format {
            IndexToLocFormat::Short => LocaOffsets::Short(ctxt.read_array::<U16Be>(count)?),
            IndexToLocFormat::Long => LocaOffsets::Long(ctxt.read_array::<U32Be>(count)?),
        };

        Ok(LocaTable { offsets })
    }
}

impl<'a> LocaOffsets<'a> {
    /// Returns the number of offsets in the table.
    pub fn len(&self) -> usize {
        match self {
            LocaOffsets::Short(array) => array.len(),
            LocaOffsets::Long(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the byte offset at `index`. Short offsets are scaled back up.
    pub fn get(&self, index: usize) -> Option<u32> {
        match self {
            LocaOffsets::Short(array) => array.get_item(index).map(|offset| u32::from(offset) * 2),
            LocaOffsets::Long(array) => array.get_item(index),
        }
    }
}

impl<'a> LocaTable<'a> {
    /// The byte range of `glyph_id` within the `glyf` table.
    ///
    /// An empty range means the glyph has no outline.
    pub fn glyph_range(&self, glyph_id: u16) -> Result<(usize, usize), ParseError> {
        let index = usize::from(glyph_id);
        let start = self.offsets.get(index).ok_or(ParseError::BadIndex)?;
        let end = self.offsets.get(index + 1).ok_or(ParseError::BadIndex)?;
        if end < start {
            return Err(ParseError::BadOffset);
        }
        Ok((usize::try_from(start)?, usize::try_from(end)?))
    }
}

pub mod owned {
    use super::{IndexToLocFormat, U16Be, U32Be};
    use crate::binary::write::{WriteBinary, WriteBinaryDep, WriteContext};
    use crate::error::WriteError;

    /// A `loca` table under construction, holding byte offsets.
    #[derive(Debug, Default)]
    pub struct LocaTable {
        pub offsets: Vec<u32>,
    }

    impl LocaTable {
        pub fn new() -> Self {
            LocaTable {
                offsets: Vec::new(),
            }
        }

        /// Short offsets when every offset is even and fits after halving.
        pub fn preferred_format(&self) -> IndexToLocFormat {
            let fits_short = self
                .offsets
                .iter()
                .all(|&offset| offset & 1 == 0 && offset / 2 <= u32::from(u16::MAX));
            if fits_short {
                IndexToLocFormat::Short
            } else {
                IndexToLocFormat::Long
            }
        }
    }

    impl WriteBinaryDep<Self> for LocaTable {
        type Output = ();
        type Args = IndexToLocFormat;

        fn write_dep<C: WriteContext>(
            ctxt: &mut C,
            loca: LocaTable,
            index_to_loc_format: Self::Args,
        ) -> Result<(), WriteError> {
            match index_to_loc_format {
                IndexToLocFormat::Short => {
                    for offset in loca.offsets {
                        if offset & 1 == 1 {
                            return Err(WriteError::BadValue);
                        }
                        let short = u16::try_from(offset / 2)?;
                        U16Be::write(ctxt, short)?;
                    }
                }
                IndexToLocFormat::Long => {
                    ctxt.write_vec::<U32Be, _>(loca.offsets)?;
                }
            }

            Ok(())
        }
    }
}
