//! Parsing and writing of the `cmap` table.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/cmap>

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use crate::binary::read::{ReadArray, ReadBinary, ReadCtxt, ReadFrom, ReadScope};
use crate::binary::write::{WriteBinary, WriteContext};
use crate::binary::{I16Be, U16Be, U32Be, U8};
use crate::error::{ParseError, WriteError};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformId(pub u16);

impl PlatformId {
    pub const UNICODE: PlatformId = PlatformId(0);
    pub const MACINTOSH: PlatformId = PlatformId(1);
    pub const WINDOWS: PlatformId = PlatformId(3);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodingId(pub u16);

impl EncodingId {
    pub const UNICODE_1_0: EncodingId = EncodingId(0);
    pub const UNICODE_1_1: EncodingId = EncodingId(1);
    pub const UNICODE_ISO_10646: EncodingId = EncodingId(2);
    pub const UNICODE_BMP: EncodingId = EncodingId(3);
    pub const UNICODE_FULL: EncodingId = EncodingId(4);
    pub const UNICODE_VARIATION: EncodingId = EncodingId(5);
    pub const UNICODE_FULL_LAST_RESORT: EncodingId = EncodingId(6);

    pub const WINDOWS_SYMBOL: EncodingId = EncodingId(0);
    pub const WINDOWS_UNICODE_BMP_UCS2: EncodingId = EncodingId(1);
    pub const WINDOWS_UNICODE_UCS4: EncodingId = EncodingId(10);
}

/// Platform/encoding pairs that carry Unicode mappings, most preferred first.
///
/// Matches the search order used by fontTools' `getBestCmap`.
pub const UNICODE_PREFERENCE: [(PlatformId, EncodingId); 8] = [
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_UCS4),
    (PlatformId::UNICODE, EncodingId::UNICODE_FULL_LAST_RESORT),
    (PlatformId::UNICODE, EncodingId::UNICODE_FULL),
    (PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2),
    (PlatformId::UNICODE, EncodingId::UNICODE_BMP),
    (PlatformId::UNICODE, EncodingId::UNICODE_ISO_10646),
    (PlatformId::UNICODE, EncodingId::UNICODE_1_1),
    (PlatformId::UNICODE, EncodingId::UNICODE_1_0),
];

pub struct Cmap<'a> {
    pub scope: ReadScope<'a>,
    encoding_records: ReadArray<'a, EncodingRecord>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodingRecord {
    pub platform_id: PlatformId,
    pub encoding_id: EncodingId,
    pub offset: u32,
}

pub enum CmapSubtable<'a> {
    Format0 {
        language: u16,
        glyph_id_array: ReadArray<'a, U8>,
    },
    Format4 {
        language: u16,
        end_codes: ReadArray<'a, U16Be>,
        start_codes: ReadArray<'a, U16Be>,
        id_deltas: ReadArray<'a, I16Be>,
        id_range_offsets: ReadArray<'a, U16Be>,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format6 {
        language: u16,
        first_code: u16,
        glyph_id_array: ReadArray<'a, U16Be>,
    },
    Format12 {
        language: u32,
        groups: ReadArray<'a, SequentialMapGroup>,
    },
}

#[derive(Copy, Clone)]
struct Format4Calculator {
    seg_count: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl<'b> ReadBinary for Cmap<'b> {
    type HostType<'a> = Cmap<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let scope = ctxt.scope();
        let version = ctxt.read_u16be()?;
        ctxt.check_version(version == 0)?;
        let num_tables = usize::from(ctxt.read_u16be()?);
        let encoding_records = ctxt.read_array::<EncodingRecord>(num_tables)?;
        Ok(Cmap {
            scope,
            encoding_records,
        })
    }
}

impl ReadFrom for EncodingRecord {
    type ReadType = (U16Be, U16Be, U32Be);

    fn read_from((platform_id, encoding_id, offset): (u16, u16, u32)) -> Self {
        EncodingRecord {
            platform_id: PlatformId(platform_id),
            encoding_id: EncodingId(encoding_id),
            offset,
        }
    }
}

impl<'b> ReadBinary for CmapSubtable<'b> {
    type HostType<'a> = CmapSubtable<'a>;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        let subtable_format = ctxt.read_u16be()?;
        match subtable_format {
            0 => {
                let length = usize::from(ctxt.read_u16be()?);
                ctxt.check(length >= 3 * 2 + 256)?;
                let language = ctxt.read_u16be()?;
                let glyph_id_array = ctxt.read_array::<U8>(256)?;
                Ok(CmapSubtable::Format0 {
                    language,
                    glyph_id_array,
                })
            }
            4 => {
                let length = usize::from(ctxt.read_u16be()?);
                let language = ctxt.read_u16be()?;
                let seg_count_x2 = usize::from(ctxt.read_u16be()?);
                ctxt.check((seg_count_x2 & 1) == 0)?;
                let seg_count = seg_count_x2 >> 1;
                let _search_range = ctxt.read_u16be()?;
                let _entry_selector = ctxt.read_u16be()?;
                let _range_shift = ctxt.read_u16be()?;
                let end_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let _reserved_pad = ctxt.read_u16be()?;
                let start_codes = ctxt.read_array::<U16Be>(seg_count)?;
                let id_deltas = ctxt.read_array::<I16Be>(seg_count)?;
                let id_range_offsets = ctxt.read_array::<U16Be>(seg_count)?;
                let header_size = (8 + 4 * seg_count) * 2;
                ctxt.check(length >= header_size)?;
                let remaining = length - header_size;
                let num_indices = remaining >> 1;
                let glyph_id_array = ctxt.read_array::<U16Be>(num_indices)?;
                Ok(CmapSubtable::Format4 {
                    language,
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                })
            }
            6 => {
                let _length = ctxt.read_u16be()?;
                let language = ctxt.read_u16be()?;
                let first_code = ctxt.read_u16be()?;
                let entry_count = usize::from(ctxt.read_u16be()?);
                let glyph_id_array = ctxt.read_array::<U16Be>(entry_count)?;
                Ok(CmapSubtable::Format6 {
                    language,
                    first_code,
                    glyph_id_array,
                })
            }
            12 => {
                let reserved = ctxt.read_u16be()?;
                ctxt.check(reserved == 0)?;
                let _length = ctxt.read_u32be()?;
                let language = ctxt.read_u32be()?;
                let num_groups = usize::try_from(ctxt.read_u32be()?)?;
                let groups = ctxt.read_array::<SequentialMapGroup>(num_groups)?;
                Ok(CmapSubtable::Format12 { language, groups })
            }
            _ => Err(ParseError::NotImplemented),
        }
    }
}

impl Format4Calculator {
    fn seg_count_x2(self) -> u16 {
        2 * self.seg_count
    }

    fn search_range(self) -> u16 {
        2 * (1 << self.entry_selector())
    }

    fn entry_selector(self) -> u16 {
        15u16.saturating_sub(self.seg_count.leading_zeros() as u16)
    }

    fn range_shift(self) -> u16 {
        self.seg_count_x2() - self.search_range()
    }
}

impl ReadFrom for SequentialMapGroup {
    type ReadType = (U32Be, U32Be, U32Be);

    fn read_from((start_char_code, end_char_code, start_glyph_id): (u32, u32, u32)) -> Self {
        SequentialMapGroup {
            start_char_code,
            end_char_code,
            start_glyph_id,
        }
    }
}

impl WriteBinary for SequentialMapGroup {
    type Output = ();

    fn write<C: WriteContext>(ctxt: &mut C, group: SequentialMapGroup) -> Result<(), WriteError> {
        U32Be::write(ctxt, group.start_char_code)?;
        U32Be::write(ctxt, group.end_char_code)?;
        U32Be::write(ctxt, group.start_glyph_id)?;
        Ok(())
    }
}

impl<'a> Cmap<'a> {
    pub fn encoding_records(&self) -> impl Iterator<Item = EncodingRecord> + 'a {
        self.encoding_records.iter()
    }

    pub fn find_subtable(
        &self,
        platform_id: PlatformId,
        encoding_id: EncodingId,
    ) -> Option<EncodingRecord> {
        self.encoding_records.iter().find(|record| {
            record.platform_id == platform_id && record.encoding_id == encoding_id
        })
    }

    /// Read the subtable referenced by `record`.
    pub fn subtable(&self, record: &EncodingRecord) -> Result<CmapSubtable<'a>, ParseError> {
        self.scope
            .offset(usize::try_from(record.offset)?)
            .read::<CmapSubtable<'_>>()
    }

    /// Find the most suitable Unicode subtable.
    ///
    /// Subtables in a format that cannot be read are passed over in favour of the next
    /// candidate.
    pub fn find_best_unicode_subtable(
        &self,
    ) -> Result<Option<(EncodingRecord, CmapSubtable<'a>)>, ParseError> {
        for (platform_id, encoding_id) in UNICODE_PREFERENCE {
            let Some(record) = self.find_subtable(platform_id, encoding_id) else {
                continue;
            };
            match self.subtable(&record) {
                Ok(subtable) => return Ok(Some((record, subtable))),
                Err(ParseError::NotImplemented) => {
                    log::debug!(
                        "skipping unsupported cmap subtable ({}, {})",
                        platform_id.0,
                        encoding_id.0
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}

impl<'a> CmapSubtable<'a> {
    pub fn format(&self) -> u16 {
        match self {
            CmapSubtable::Format0 { .. } => 0,
            CmapSubtable::Format4 { .. } => 4,
            CmapSubtable::Format6 { .. } => 6,
            CmapSubtable::Format12 { .. } => 12,
        }
    }

    pub fn language(&self) -> u32 {
        match *self {
            CmapSubtable::Format0 { language, .. }
            | CmapSubtable::Format4 { language, .. }
            | CmapSubtable::Format6 { language, .. } => u32::from(language),
            CmapSubtable::Format12 { language, .. } => language,
        }
    }

    pub fn map_glyph(&self, ch: u32) -> Result<Option<u16>, ParseError> {
        match *self {
            CmapSubtable::Format0 {
                ref glyph_id_array, ..
            } => {
                let index = usize::try_from(ch)?;
                Ok(glyph_id_array.get_item(index).map(u16::from))
            }
            CmapSubtable::Format4 {
                ref end_codes,
                ref start_codes,
                ref id_deltas,
                ref id_range_offsets,
                ref glyph_id_array,
                ..
            } => {
                for i in 0..end_codes.len() {
                    let end_code = u32::from(end_codes.read_item(i)?);
                    let start_code = u32::from(start_codes.read_item(i)?);
                    if start_code <= ch && ch <= end_code {
                        let id_delta = id_deltas.read_item(i)?;
                        let id_range_offset = usize::from(id_range_offsets.read_item(i)?);
                        // Truncation is fine: ch is at most end_code, a u16
                        let ch = ch as u16;
                        if id_range_offset == 0 {
                            // The idDelta arithmetic is modulo 65536.
                            return Ok(Some(ch.wrapping_add(id_delta as u16)));
                        }

                        // The id range offset is relative to its own position in the
                        // id_range_offsets array, which is followed by glyph_id_array.
                        let glyph_id_offset =
                            id_range_offset + i * 2 + usize::from(ch - start_code as u16) * 2;
                        let index = (glyph_id_offset >> 1)
                            .checked_sub(id_range_offsets.len())
                            .ok_or(ParseError::BadIndex)?;
                        let glyph_id = glyph_id_array.read_item(index)?;
                        if glyph_id == 0 {
                            return Ok(Some(0));
                        }
                        return Ok(Some(glyph_id.wrapping_add(id_delta as u16)));
                    }
                }
                Ok(None)
            }
            CmapSubtable::Format6 {
                first_code,
                ref glyph_id_array,
                ..
            } => {
                let first_code = u32::from(first_code);
                match ch.checked_sub(first_code) {
                    Some(index) => Ok(glyph_id_array.get_item(usize::try_from(index)?)),
                    None => Ok(None),
                }
            }
            CmapSubtable::Format12 { ref groups, .. } => {
                for group in groups {
                    if group.start_char_code <= ch && ch <= group.end_char_code {
                        let glyph_id = group.start_glyph_id + (ch - group.start_char_code);
                        return Ok(Some(u16::try_from(glyph_id)?));
                    }
                }
                Ok(None)
            }
        }
    }

    /// All codepoints mapped to a glyph other than `.notdef`.
    pub fn mappings(&self) -> Result<BTreeMap<u32, u16>, ParseError> {
        let mut mappings = BTreeMap::new();
        let mut add = |ch: u32| -> Result<(), ParseError> {
            if let Some(glyph_id) = self.map_glyph(ch)? {
                if glyph_id != 0 {
                    mappings.insert(ch, glyph_id);
                }
            }
            Ok(())
        };

        match self {
            CmapSubtable::Format0 { .. } => (0..256).try_for_each(&mut add)?,
            CmapSubtable::Format4 {
                start_codes,
                end_codes,
                ..
            } => {
                for (start, end) in start_codes.iter().zip(end_codes.iter()) {
                    (u32::from(start)..=u32::from(end)).try_for_each(&mut add)?;
                }
            }
            CmapSubtable::Format6 {
                first_code,
                glyph_id_array,
                ..
            } => {
                let first = u32::from(*first_code);
                let count = u32::try_from(glyph_id_array.len())?;
                (first..first + count).try_for_each(&mut add)?;
            }
            CmapSubtable::Format12 { groups, .. } => {
                for group in groups {
                    (group.start_char_code..=group.end_char_code).try_for_each(&mut add)?;
                }
            }
        }

        Ok(mappings)
    }
}

impl fmt::Display for EncodingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.platform_id.0, self.encoding_id.0)
    }
}

pub mod owned {
    use std::collections::BTreeMap;
    use std::convert::TryFrom;

    use super::{
        EncodingId, Format4Calculator, I16Be, PlatformId, SequentialMapGroup, U16Be, U32Be,
        WriteBinary, WriteContext, WriteError,
    };

    #[derive(Debug, Clone, PartialEq)]
    pub struct Cmap {
        pub encoding_records: Vec<EncodingRecord>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct EncodingRecord {
        pub platform_id: PlatformId,
        pub encoding_id: EncodingId,
        pub sub_table: CmapSubtable,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum CmapSubtable {
        Format4(CmapSubtableFormat4),
        Format12(CmapSubtableFormat12),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CmapSubtableFormat4 {
        pub language: u16,
        pub end_codes: Vec<u16>,
        pub start_codes: Vec<u16>,
        pub id_deltas: Vec<i16>,
        pub id_range_offsets: Vec<u16>,
        pub glyph_id_array: Vec<u16>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CmapSubtableFormat12 {
        pub language: u32,
        pub groups: Vec<SequentialMapGroup>,
    }

    struct Format4Segment<'a> {
        start: u32,
        end: u32,
        glyph_ids: &'a mut Vec<u16>,
        consecutive_glyph_ids: bool,
    }

    impl<'a> Format4Segment<'a> {
        fn new(start: u32, gid: u16, glyph_ids: &'a mut Vec<u16>) -> Self {
            glyph_ids.clear();
            glyph_ids.push(gid);
            Format4Segment {
                start,
                end: start,
                glyph_ids,
                consecutive_glyph_ids: true,
            }
        }

        fn add(&mut self, ch: u32, gid: u16) -> bool {
            let gap = ch - self.end - 1;
            let should_remain_compact = self.consecutive_glyph_ids && self.glyph_ids.len() >= 4;

            if gap > 0 && should_remain_compact {
                // A new segment costs 8 bytes, cheaper than giving up the id delta form.
                false
            } else if gap < 4 {
                // Each gap entry is two bytes in the glyph id array, so small gaps are
                // cheaper to fill with .notdef than to start a new segment.
                if gap == 0 {
                    let prev = self.glyph_ids.last().copied().unwrap_or(0);
                    self.consecutive_glyph_ids &= prev.checked_add(1) == Some(gid);
                } else {
                    self.glyph_ids
                        .extend(std::iter::repeat(0).take(gap as usize));
                    self.consecutive_glyph_ids = false;
                }
                self.glyph_ids.push(gid);
                self.end = ch;
                true
            } else {
                false
            }
        }
    }

    impl CmapSubtableFormat4 {
        /// Build a segment-compressed subtable from `mappings`.
        ///
        /// Every codepoint must lie in the Basic Multilingual Plane and must not be U+FFFF,
        /// which is reserved for the terminating segment.
        pub fn from_mappings(mappings: &BTreeMap<u32, u16>) -> Result<Self, WriteError> {
            let mut table = CmapSubtableFormat4 {
                language: 0,
                end_codes: Vec::new(),
                start_codes: Vec::new(),
                id_deltas: Vec::new(),
                id_range_offsets: Vec::new(),
                glyph_id_array: Vec::new(),
            };
            if mappings.keys().any(|&ch| ch >= 0xFFFF) {
                return Err(WriteError::BadValue);
            }

            // group the mappings into contiguous ranges, there can be holes in the ranges
            let mut glyph_ids = Vec::new();
            let mut id_range_offset_fixups = Vec::new();
            let mut iter = mappings.iter();
            if let Some((&start, &gid)) = iter.next() {
                let mut segment = Format4Segment::new(start, gid, &mut glyph_ids);
                for (&ch, &gid) in iter {
                    if !segment.add(ch, gid) {
                        table.add_segment(segment, &mut id_range_offset_fixups)?;
                        segment = Format4Segment::new(ch, gid, &mut glyph_ids);
                    }
                }
                table.add_segment(segment, &mut id_range_offset_fixups)?;
            }

            // The final segment must map 0xFFFF, it need not map it to anything useful.
            let segment = Format4Segment::new(0xFFFF, 0, &mut glyph_ids);
            table.add_segment(segment, &mut id_range_offset_fixups)?;

            // Offsets are relative to each entry's own position in id_range_offsets
            let seg_count = table.end_codes.len();
            for index in id_range_offset_fixups {
                let id_range_offset = &mut table.id_range_offsets[index];
                let words = seg_count + usize::from(*id_range_offset) - index;
                *id_range_offset = u16::try_from(2 * words)?;
            }

            Ok(table)
        }

        fn add_segment(
            &mut self,
            segment: Format4Segment<'_>,
            id_range_offset_fixups: &mut Vec<usize>,
        ) -> Result<(), WriteError> {
            let start = u16::try_from(segment.start)?;
            self.start_codes.push(start);
            self.end_codes.push(u16::try_from(segment.end)?);

            // Consecutive glyph ids are covered by a single id delta.
            if segment.consecutive_glyph_ids {
                let first_glyph_id = segment.glyph_ids.first().copied().unwrap_or(0);
                self.id_deltas
                    .push(first_glyph_id.wrapping_sub(start) as i16);
                self.id_range_offsets.push(0);
            } else {
                self.id_deltas.push(0);
                // Fixed up once all segments are known
                id_range_offset_fixups.push(self.id_range_offsets.len());
                self.id_range_offsets
                    .push(u16::try_from(self.glyph_id_array.len())?);
                self.glyph_id_array.extend_from_slice(segment.glyph_ids);
            }
            Ok(())
        }
    }

    impl CmapSubtableFormat12 {
        pub fn from_mappings(mappings: &BTreeMap<u32, u16>) -> Self {
            let mut groups: Vec<SequentialMapGroup> = Vec::new();
            for (&ch, &gid) in mappings {
                let gid = u32::from(gid);
                match groups.last_mut() {
                    Some(group)
                        if ch == group.end_char_code + 1
                            && gid
                                == group.start_glyph_id
                                    + (group.end_char_code - group.start_char_code)
                                    + 1 =>
                    {
                        group.end_char_code = ch;
                    }
                    _ => groups.push(SequentialMapGroup {
                        start_char_code: ch,
                        end_char_code: ch,
                        start_glyph_id: gid,
                    }),
                }
            }

            CmapSubtableFormat12 {
                language: 0,
                groups,
            }
        }
    }

    impl WriteBinary<Self> for Cmap {
        type Output = ();

        fn write<C: WriteContext>(ctxt: &mut C, table: Cmap) -> Result<(), WriteError> {
            let start = ctxt.bytes_written();
            U16Be::write(ctxt, 0u16)?; // version
            U16Be::write(ctxt, u16::try_from(table.encoding_records.len())?)?;

            let mut offsets = Vec::with_capacity(table.encoding_records.len());
            for record in &table.encoding_records {
                U16Be::write(ctxt, record.platform_id.0)?;
                U16Be::write(ctxt, record.encoding_id.0)?;
                let offset = ctxt.placeholder::<U32Be, _>()?;
                offsets.push(offset);
            }

            for (record, placeholder) in table.encoding_records.into_iter().zip(offsets) {
                let offset = u32::try_from(ctxt.bytes_written() - start)?;
                CmapSubtable::write(ctxt, record.sub_table)?;
                ctxt.write_placeholder(placeholder, offset)?;
            }

            Ok(())
        }
    }

    impl WriteBinary<Self> for CmapSubtable {
        type Output = ();

        fn write<C: WriteContext>(ctxt: &mut C, table: CmapSubtable) -> Result<(), WriteError> {
            match table {
                CmapSubtable::Format4(CmapSubtableFormat4 {
                    language,
                    end_codes,
                    start_codes,
                    id_deltas,
                    id_range_offsets,
                    glyph_id_array,
                }) => {
                    let start = ctxt.bytes_written();
                    let calc = Format4Calculator {
                        seg_count: u16::try_from(start_codes.len())?,
                    };

                    U16Be::write(ctxt, 4u16)?; // format
                    let length = ctxt.placeholder::<U16Be, _>()?;
                    U16Be::write(ctxt, language)?;
                    U16Be::write(ctxt, calc.seg_count_x2())?;
                    U16Be::write(ctxt, calc.search_range())?;
                    U16Be::write(ctxt, calc.entry_selector())?;
                    U16Be::write(ctxt, calc.range_shift())?;
                    ctxt.write_vec::<U16Be, _>(end_codes)?;
                    U16Be::write(ctxt, 0u16)?; // reserved_pad
                    ctxt.write_vec::<U16Be, _>(start_codes)?;
                    ctxt.write_vec::<I16Be, _>(id_deltas)?;
                    ctxt.write_vec::<U16Be, _>(id_range_offsets)?;
                    ctxt.write_vec::<U16Be, _>(glyph_id_array)?;
                    let written = u16::try_from(ctxt.bytes_written() - start)?;
                    ctxt.write_placeholder(length, written)?;
                }
                CmapSubtable::Format12(CmapSubtableFormat12 { language, groups }) => {
                    let start = ctxt.bytes_written();

                    U16Be::write(ctxt, 12u16)?; // format
                    U16Be::write(ctxt, 0u16)?; // reserved
                    let length = ctxt.placeholder::<U32Be, _>()?;
                    U32Be::write(ctxt, language)?;
                    U32Be::write(ctxt, u32::try_from(groups.len())?)?;
                    ctxt.write_vec::<SequentialMapGroup, _>(groups)?;
                    let written = u32::try_from(ctxt.bytes_written() - start)?;
                    ctxt.write_placeholder(length, written)?;
                }
            }

            Ok(())
        }
    }

    impl Cmap {
        /// Windows Unicode subtables for `mappings`.
        ///
        /// BMP codepoints go into a (3, 1) format 4 subtable. When any codepoint lies beyond
        /// the BMP a (3, 10) format 12 subtable holding every mapping is added as well.
        pub fn unicode_from_mappings(mappings: &BTreeMap<u32, u16>) -> Result<Self, WriteError> {
            let bmp = mappings
                .range(..0xFFFF)
                .map(|(&ch, &gid)| (ch, gid))
                .collect::<BTreeMap<_, _>>();
            let mut encoding_records = vec![EncodingRecord {
                platform_id: PlatformId::WINDOWS,
                encoding_id: EncodingId::WINDOWS_UNICODE_BMP_UCS2,
                sub_table: CmapSubtable::Format4(CmapSubtableFormat4::from_mappings(&bmp)?),
            }];
            if bmp.len() < mappings.len() {
                encoding_records.push(EncodingRecord {
                    platform_id: PlatformId::WINDOWS,
                    encoding_id: EncodingId::WINDOWS_UNICODE_UCS4,
                    sub_table: CmapSubtable::Format12(CmapSubtableFormat12::from_mappings(
                        mappings,
                    )),
                });
            }
            Ok(Cmap { encoding_records })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::owned::{self, CmapSubtableFormat12, CmapSubtableFormat4};
    use super::*;
    use crate::binary::write::WriteBuffer;

    fn mappings(pairs: &[(u32, u16)]) -> BTreeMap<u32, u16> {
        pairs.iter().copied().collect()
    }

    fn write_cmap(cmap: owned::Cmap) -> Vec<u8> {
        let mut buffer = WriteBuffer::new();
        owned::Cmap::write(&mut buffer, cmap).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_calculator() {
        let calc = Format4Calculator { seg_count: 39 };
        assert_eq!(calc.seg_count_x2(), 78);
        assert_eq!(calc.search_range(), 64);
        assert_eq!(calc.entry_selector(), 5);
        assert_eq!(calc.range_shift(), 14);

        let calc = Format4Calculator { seg_count: 1 };
        assert_eq!(calc.search_range(), 2);
        assert_eq!(calc.entry_selector(), 0);
        assert_eq!(calc.range_shift(), 0);
    }

    #[test]
    fn test_format4_subtable() {
        let mappings = mappings(&[(0x61, 1), (0x62, 2), (0x69, 4), (0x6A, 3)]);
        let sub_table = CmapSubtableFormat4::from_mappings(&mappings).unwrap();
        let expected = CmapSubtableFormat4 {
            language: 0,
            start_codes: vec![97, 105, 0xFFFF],
            end_codes: vec![98, 106, 0xFFFF],
            id_deltas: vec![-96, 0, 1],
            id_range_offsets: vec![0, 4, 0],
            glyph_id_array: vec![4, 3],
        };
        assert_eq!(sub_table, expected);
    }

    #[test]
    fn test_format4_rejects_astral() {
        let mappings = mappings(&[(0x1F600, 1)]);
        assert_eq!(
            CmapSubtableFormat4::from_mappings(&mappings),
            Err(WriteError::BadValue)
        );
    }

    #[test]
    fn test_format12_subtable() {
        let mappings = mappings(&[(0x61, 1), (0x62, 2), (0x1F980, 3), (0x1F981, 4)]);
        let sub_table = CmapSubtableFormat12::from_mappings(&mappings);
        let expected = CmapSubtableFormat12 {
            language: 0,
            groups: vec![
                SequentialMapGroup {
                    start_char_code: 97,
                    end_char_code: 98,
                    start_glyph_id: 1,
                },
                SequentialMapGroup {
                    start_char_code: 129408,
                    end_char_code: 129409,
                    start_glyph_id: 3,
                },
            ],
        };
        assert_eq!(sub_table, expected);
    }

    #[test]
    fn format4_lookup_after_write() {
        // PUA style mapping: dense codepoints, scattered glyph ids
        let pua = mappings(&[(0xE000, 7), (0xE001, 3), (0xE002, 9), (0xE003, 1)]);
        let record = owned::EncodingRecord {
            platform_id: PlatformId::WINDOWS,
            encoding_id: EncodingId::WINDOWS_UNICODE_BMP_UCS2,
            sub_table: owned::CmapSubtable::Format4(
                CmapSubtableFormat4::from_mappings(&pua).unwrap(),
            ),
        };
        let data = write_cmap(owned::Cmap {
            encoding_records: vec![record],
        });

        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        let (record, subtable) = cmap.find_best_unicode_subtable().unwrap().unwrap();
        assert_eq!(record.platform_id, PlatformId::WINDOWS);
        assert_eq!(subtable.format(), 4);
        assert_eq!(subtable.map_glyph(0xE002), Ok(Some(9)));
        assert_eq!(subtable.map_glyph(0xE004), Ok(None));
        assert_eq!(subtable.mappings().unwrap(), pua);
    }

    #[test]
    fn best_subtable_prefers_full_unicode() {
        let full = mappings(&[(0x2600, 5), (0x1F600, 6)]);
        let cmap = owned::Cmap::unicode_from_mappings(&full).unwrap();
        assert_eq!(cmap.encoding_records.len(), 2);
        let data = write_cmap(cmap);

        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        let bmp = cmap
            .find_subtable(PlatformId::WINDOWS, EncodingId::WINDOWS_UNICODE_BMP_UCS2)
            .unwrap();
        assert_eq!(cmap.subtable(&bmp).unwrap().map_glyph(0x1F600), Ok(None));

        let (record, subtable) = cmap.find_best_unicode_subtable().unwrap().unwrap();
        assert_eq!(record.encoding_id, EncodingId::WINDOWS_UNICODE_UCS4);
        assert_eq!(subtable.map_glyph(0x1F600), Ok(Some(6)));
        assert_eq!(subtable.mappings().unwrap(), full);
    }

    #[test]
    fn bmp_only_mappings_use_format4() {
        let bmp = mappings(&[(0x2600, 5), (0x2601, 6)]);
        let cmap = owned::Cmap::unicode_from_mappings(&bmp).unwrap();
        assert_eq!(cmap.encoding_records.len(), 1);
        assert!(matches!(
            cmap.encoding_records[0].sub_table,
            owned::CmapSubtable::Format4(_)
        ));
    }

    #[test]
    fn unsupported_format_is_skipped() {
        // (3,10) subtable in format 13 followed by a usable (0,3) format 4 subtable
        let mut data = vec![0, 0, 0, 2];
        data.extend_from_slice(&[0, 3, 0, 10, 0, 0, 0, 20]);
        data.extend_from_slice(&[0, 0, 0, 3, 0, 0, 0, 22]);
        data.extend_from_slice(&[0, 13]);
        let bmp = mappings(&[(0x2600, 5)]);
        let mut buffer = WriteBuffer::new();
        owned::CmapSubtable::write(
            &mut buffer,
            owned::CmapSubtable::Format4(CmapSubtableFormat4::from_mappings(&bmp).unwrap()),
        )
        .unwrap();
        data.extend_from_slice(buffer.bytes());

        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        let (record, subtable) = cmap.find_best_unicode_subtable().unwrap().unwrap();
        assert_eq!(record.encoding_id, EncodingId::UNICODE_BMP);
        assert_eq!(subtable.map_glyph(0x2600), Ok(Some(5)));
    }

    #[test]
    fn format0_subtable() {
        let mut data = vec![0, 0, 0x01, 0x06, 0, 0];
        let mut glyph_ids = [0u8; 256];
        glyph_ids[0x41] = 3;
        glyph_ids[0x42] = 5;
        data.extend_from_slice(&glyph_ids);

        let subtable = ReadScope::new(&data).read::<CmapSubtable<'_>>().unwrap();
        assert_eq!(subtable.format(), 0);
        assert_eq!(subtable.map_glyph(0x41), Ok(Some(3)));
        assert_eq!(subtable.map_glyph(0x43), Ok(Some(0)));
        assert_eq!(subtable.map_glyph(0x100), Ok(None));
        assert_eq!(
            subtable.mappings().unwrap(),
            mappings(&[(0x41, 3), (0x42, 5)])
        );

        // length too short for 256 glyph ids
        let short = [0, 0, 0, 6, 0, 0];
        assert!(ReadScope::new(&short).read::<CmapSubtable<'_>>().is_err());
    }

    #[test]
    fn format6_subtable() {
        // (0,3) subtable in format 6: U+2600 -> 7, U+2601 -> .notdef, U+2602 -> 9
        let mut data = vec![0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, 12];
        data.extend_from_slice(&[0, 6, 0, 16, 0, 0, 0x26, 0x00, 0, 3, 0, 7, 0, 0, 0, 9]);

        let cmap = ReadScope::new(&data).read::<Cmap<'_>>().unwrap();
        let (record, subtable) = cmap.find_best_unicode_subtable().unwrap().unwrap();
        assert_eq!(record.encoding_id, EncodingId::UNICODE_BMP);
        assert_eq!(subtable.format(), 6);
        assert_eq!(subtable.language(), 0);
        assert_eq!(subtable.map_glyph(0x2602), Ok(Some(9)));
        assert_eq!(subtable.map_glyph(0x25FF), Ok(None));
        assert_eq!(subtable.map_glyph(0x2603), Ok(None));
        assert_eq!(
            subtable.mappings().unwrap(),
            mappings(&[(0x2600, 7), (0x2602, 9)])
        );
    }
}
