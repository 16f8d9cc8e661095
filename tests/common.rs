/// Codepoints mapped by the font built by `minimal_font`, with their glyph ids.
///
/// Glyphs 1 to 3 are single point simple glyphs, glyph 4 is a composite of glyphs 3 and 1.
pub const FIXTURE_MAPPINGS: [(u32, u16); 4] =
    [(0x2600, 1), (0x2614, 3), (0x1F600, 2), (0x1F601, 4)];

/// Values making up raw font data, written big-endian.
#[derive(Clone, Copy)]
pub enum TtfType {
    Raw(&'static [u8]),
    TrueTypeMagic,
    OpenTypeMagic,
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
}

pub fn convert(values: &[TtfType]) -> Vec<u8> {
    let mut data = Vec::with_capacity(256);
    for v in values {
        convert_type(*v, &mut data);
    }

    data
}

pub fn convert_type(value: TtfType, data: &mut Vec<u8>) {
    match value {
        TtfType::Raw(bytes) => data.extend_from_slice(bytes),
        TtfType::TrueTypeMagic => data.extend_from_slice(&[0x00, 0x01, 0x00, 0x00]),
        TtfType::OpenTypeMagic => data.extend_from_slice(b"OTTO"),
        TtfType::Int16(n) => data.extend_from_slice(&n.to_be_bytes()),
        TtfType::UInt16(n) => data.extend_from_slice(&n.to_be_bytes()),
        TtfType::Int32(n) => data.extend_from_slice(&n.to_be_bytes()),
        TtfType::UInt32(n) => data.extend_from_slice(&n.to_be_bytes()),
        TtfType::Int64(n) => data.extend_from_slice(&n.to_be_bytes()),
    }
}

/// Assembles tables into an sfnt file.
pub struct FontWriter {
    magic: TtfType,
    tables: Vec<([u8; 4], Vec<u8>)>,
}

impl FontWriter {
    pub fn new(magic: TtfType) -> Self {
        FontWriter {
            magic,
            tables: Vec::new(),
        }
    }

    pub fn table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.tables.push((*tag, data));
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        use TtfType::*;

        self.tables.sort_by(|a, b| a.0.cmp(&b.0));
        let num_tables = self.tables.len() as u16;
        let entry_selector = 15u16.saturating_sub(num_tables.leading_zeros() as u16);
        let search_range = (1u16 << entry_selector) * 16;

        let mut data = Vec::new();
        convert_type(self.magic, &mut data);
        for value in [
            UInt16(num_tables),
            UInt16(search_range),
            UInt16(entry_selector),
            UInt16(num_tables * 16 - search_range),
        ] {
            convert_type(value, &mut data);
        }

        let mut offset = 12 + 16 * self.tables.len();
        for (tag, table) in &self.tables {
            data.extend_from_slice(tag);
            convert_type(UInt32(font_checksum(table)), &mut data);
            convert_type(UInt32(offset as u32), &mut data);
            convert_type(UInt32(table.len() as u32), &mut data);
            offset += (table.len() + 3) / 4 * 4;
        }
        for (_, table) in &self.tables {
            data.extend_from_slice(table);
            data.resize((data.len() + 3) / 4 * 4, 0);
        }

        data
    }
}

/// A single point simple glyph at (`x`, `y`).
pub fn simple_glyph(x: i16, y: i16) -> Vec<u8> {
    use TtfType::*;

    convert(&[
        Int16(1), // numberOfContours
        Int16(x),
        Int16(y),
        Int16(x),
        Int16(y),
        UInt16(0), // endPtsOfContours[0]
        UInt16(0), // instructionLength
        Raw(&[0x01]), // flags: on curve, long coordinates
        Int16(x),
        Int16(y),
    ])
}

/// A composite glyph placing each of `components` with 16-bit xy offsets.
pub fn composite_glyph(components: &[u16]) -> Vec<u8> {
    use TtfType::*;

    let mut data = convert(&[Int16(-1), Int16(0), Int16(0), Int16(100), Int16(100)]);
    for (i, &glyph_index) in components.iter().enumerate() {
        // ARG_1_AND_2_ARE_WORDS | ARGS_ARE_XY_VALUES, plus MORE_COMPONENTS
        let flags = if i + 1 < components.len() { 0x0023 } else { 0x0003 };
        for value in [UInt16(flags), UInt16(glyph_index), Int16(10), Int16(20)] {
            convert_type(value, &mut data);
        }
    }
    data
}

pub fn head_table(index_to_loc_format: i16) -> Vec<u8> {
    use TtfType::*;

    convert(&[
        UInt16(1), // majorVersion
        UInt16(0), // minorVersion
        Int32(0x00010000), // fontRevision
        UInt32(0), // checksumAdjustment
        UInt32(0x5F0F3CF5), // magicNumber
        UInt16(0), // flags
        UInt16(1000), // unitsPerEm
        Int64(0), // created
        Int64(0), // modified
        Int16(0), // xMin
        Int16(0), // yMin
        Int16(300), // xMax
        Int16(400), // yMax
        UInt16(0), // macStyle
        UInt16(8), // lowestRecPPEM
        Int16(2), // fontDirectionHint
        Int16(index_to_loc_format),
        Int16(0), // glyphDataFormat
    ])
}

fn hhea_table(num_h_metrics: u16) -> Vec<u8> {
    use TtfType::*;

    convert(&[
        UInt16(1),
        UInt16(0),
        Int16(800),  // ascender
        Int16(-200), // descender
        Int16(0),    // lineGap
        UInt16(504), // advanceWidthMax
        Int16(0),
        Int16(0),
        Int16(300), // xMaxExtent
        Int16(1),   // caretSlopeRise
        Int16(0),
        Int16(0),
        Int16(0),
        Int16(0),
        Int16(0),
        Int16(0),
        Int16(0), // metricDataFormat
        UInt16(num_h_metrics),
    ])
}

fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut data = convert(&[TtfType::UInt32(0x00010000), TtfType::UInt16(num_glyphs)]);
    // maxPoints, maxContours, maxCompositePoints, ... maxComponentDepth
    for value in [4u16, 1, 2, 1, 2, 0, 0, 0, 0, 0, 0, 2, 1] {
        convert_type(TtfType::UInt16(value), &mut data);
    }
    data
}

/// cmap with a (0, 3) format 4 subtable for the BMP codepoints and a (3, 10) format 12
/// subtable for all of them.
fn cmap_table() -> Vec<u8> {
    use TtfType::*;

    let mut data = convert(&[
        UInt16(0), // version
        UInt16(2), // numTables
        UInt16(0),
        UInt16(3),
        UInt32(20),
        UInt16(3),
        UInt16(10),
        UInt32(60),
    ]);
    // format 4: U+2600 -> 1, U+2614 -> 3, terminating segment
    data.extend(convert(&[
        UInt16(4),
        UInt16(40), // length
        UInt16(0),  // language
        UInt16(6),  // segCountX2
        UInt16(4),  // searchRange
        UInt16(1),  // entrySelector
        UInt16(2),  // rangeShift
        UInt16(0x2600),
        UInt16(0x2614),
        UInt16(0xFFFF),
        UInt16(0), // reservedPad
        UInt16(0x2600),
        UInt16(0x2614),
        UInt16(0xFFFF),
        Int16((1i32 - 0x2600) as i16),
        Int16((3i32 - 0x2614) as i16),
        Int16(1),
        UInt16(0),
        UInt16(0),
        UInt16(0),
    ]));
    // format 12
    data.extend(convert(&[
        UInt16(12),
        UInt16(0),
        UInt32(16 + 12 * 4),
        UInt32(0),
        UInt32(4),
        UInt32(0x2600),
        UInt32(0x2600),
        UInt32(1),
        UInt32(0x2614),
        UInt32(0x2614),
        UInt32(3),
        UInt32(0x1F600),
        UInt32(0x1F600),
        UInt32(2),
        UInt32(0x1F601),
        UInt32(0x1F601),
        UInt32(4),
    ]));
    data
}

fn os2_table() -> Vec<u8> {
    let mut data = vec![0; 96];
    data[0..2].copy_from_slice(&4u16.to_be_bytes());
    data[64..66].copy_from_slice(&0x2600u16.to_be_bytes());
    data[66..68].copy_from_slice(&0xFFFFu16.to_be_bytes());
    data
}

/// A small TrueType font with five glyphs and the tables an emoji font carries.
pub fn minimal_font() -> Vec<u8> {
    use TtfType::*;

    let glyphs = [
        Vec::new(),
        simple_glyph(100, 200),
        simple_glyph(300, 400),
        simple_glyph(50, 60),
        composite_glyph(&[3, 1]),
    ];
    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for glyph in &glyphs {
        convert_type(UInt32(glyf.len() as u32), &mut loca);
        glyf.extend_from_slice(glyph);
    }
    convert_type(UInt32(glyf.len() as u32), &mut loca);

    let mut hmtx = Vec::new();
    for glyph_id in 0..glyphs.len() as u16 {
        convert_type(UInt16(500 + glyph_id), &mut hmtx);
        convert_type(Int16(0), &mut hmtx);
    }

    let mut post = convert(&[
        Int32(0x00020000),
        Int32(0),
        Int16(-100),
        Int16(50),
        UInt32(0),
        UInt32(0),
        UInt32(0),
        UInt32(0),
        UInt32(0),
        UInt16(glyphs.len() as u16),
    ]);
    for _ in &glyphs {
        convert_type(UInt16(0), &mut post);
    }

    FontWriter::new(TrueTypeMagic)
        .table(b"head", head_table(1))
        .table(b"hhea", hhea_table(glyphs.len() as u16))
        .table(b"maxp", maxp_table(glyphs.len() as u16))
        .table(b"hmtx", hmtx)
        .table(b"loca", loca)
        .table(b"glyf", glyf)
        .table(b"cmap", cmap_table())
        .table(b"post", post)
        .table(b"name", convert(&[UInt16(0), UInt16(0), UInt16(6)]))
        .table(b"OS/2", os2_table())
        .table(b"GSUB", convert(&[UInt16(1), UInt16(0), UInt16(0), UInt16(0), UInt16(0)]))
        .table(b"GDEF", convert(&[UInt16(1), UInt16(0), UInt16(0), UInt16(0)]))
        .table(b"fvar", convert(&[UInt16(1), UInt16(0), UInt16(16), UInt16(2)]))
        .table(b"STAT", convert(&[UInt16(1), UInt16(1), UInt16(8), UInt16(0)]))
        .finish()
}

/// A font with CFF outlines, which cannot be subset.
pub fn cff_font() -> Vec<u8> {
    FontWriter::new(TtfType::OpenTypeMagic)
        .table(b"head", head_table(0))
        .table(b"maxp", convert(&[TtfType::UInt32(0x00005000), TtfType::UInt16(1)]))
        .table(b"cmap", cmap_table())
        .table(b"CFF ", vec![1, 0, 4, 1])
        .finish()
}

/// Sum of the font data as big-endian 32-bit words, zero padded.
pub fn font_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// A correct `head.checkSumAdjustment` makes the whole font sum to 0xB1B0AFBA.
pub fn assert_font_checksum(data: &[u8]) {
    assert_eq!(font_checksum(data), 0xB1B0AFBA, "font checksum mismatch");
}
