//! `post` table parsing and writing.
//!
//! Subset fonts drop glyph names, so only the fixed header is modelled.

use crate::binary::read::{ReadBinary, ReadCtxt};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, I32Be, U32Be};
use crate::error::{ParseError, WriteError};

/// Version 3.0 carries no glyph names.
pub const VERSION_3: i32 = 0x00030000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: i32,
    pub italic_angle: i32,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
    pub min_mem_type_42: u32,
    pub max_mem_type_42: u32,
    pub min_mem_type_1: u32,
    pub max_mem_type_1: u32,
}

impl ReadBinary for Header {
    type HostType<'a> = Self;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self, ParseError> {
        let version = ctxt.read_i32be()?;
        let italic_angle = ctxt.read_i32be()?;
        let underline_position = ctxt.read_i16be()?;
        let underline_thickness = ctxt.read_i16be()?;
        let is_fixed_pitch = ctxt.read_u32be()?;
        let min_mem_type_42 = ctxt.read_u32be()?;
        let max_mem_type_42 = ctxt.read_u32be()?;
        let min_mem_type_1 = ctxt.read_u32be()?;
        let max_mem_type_1 = ctxt.read_u32be()?;

        Ok(Header {
            version,
            italic_angle,
            underline_position,
            underline_thickness,
            is_fixed_pitch,
            min_mem_type_42,
            max_mem_type_42,
            min_mem_type_1,
            max_mem_type_1,
        })
    }
}

impl WriteBinary<&Self> for Header {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, table: &Header) -> Result<(), WriteError> {
        I32Be::write(ctxt, table.version)?;
        I32Be::write(ctxt, table.italic_angle)?;
        I16Be::write(ctxt, table.underline_position)?;
        I16Be::write(ctxt, table.underline_thickness)?;
        U32Be::write(ctxt, table.is_fixed_pitch)?;
        U32Be::write(ctxt, table.min_mem_type_42)?;
        U32Be::write(ctxt, table.max_mem_type_42)?;
        U32Be::write(ctxt, table.min_mem_type_1)?;
        U32Be::write(ctxt, table.max_mem_type_1)?;

        Ok(())
    }
}

impl Header {
    /// This header as a version 3 table, with no glyph names and memory hints cleared.
    pub fn to_version_3(&self) -> Header {
        Header {
            version: VERSION_3,
            min_mem_type_42: 0,
            max_mem_type_42: 0,
            min_mem_type_1: 0,
            max_mem_type_1: 0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read::ReadScope;
    use crate::binary::write::WriteBuffer;

    #[test]
    fn downgrade_keeps_metrics() {
        let mut data = vec![0x00, 0x02, 0x00, 0x00]; // version 2
        data.extend_from_slice(&(-12i32 << 16).to_be_bytes());
        data.extend_from_slice(&(-150i16).to_be_bytes());
        data.extend_from_slice(&50i16.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 1]);
        data.extend_from_slice(&[0, 0, 1, 0].repeat(4));
        data.extend_from_slice(&[0, 4, 0, 0]); // start of glyph name data

        let header = ReadScope::new(&data).read::<Header>().unwrap();
        assert_eq!(header.version, 0x00020000);

        let v3 = header.to_version_3();
        let mut buffer = WriteBuffer::new();
        Header::write(&mut buffer, &v3).unwrap();
        assert_eq!(buffer.len(), 32);

        let read = ReadScope::new(buffer.bytes()).read::<Header>().unwrap();
        assert_eq!(read.version, VERSION_3);
        assert_eq!(read.italic_angle, -12 << 16);
        assert_eq!(read.underline_position, -150);
        assert_eq!(read.underline_thickness, 50);
        assert_eq!(read.is_fixed_pitch, 1);
        assert_eq!(read.max_mem_type_1, 0);
    }
}
