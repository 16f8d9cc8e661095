//! An editable, owned set of font tables and its serialisation.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::num::Wrapping;

use log::debug;

use crate::binary::long_align;
use crate::binary::read::ReadScope;
use crate::binary::write::{self, WriteBinary, WriteBinaryDep, WriteBuffer, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::checksum;
use crate::error::{ParseError, ReadWriteError, WriteError};
use crate::tables::cmap::{Cmap, EncodingRecord};
use crate::tables::{FontTableProvider, HeadTable, MaxpTable, OpenTypeFont, TableRecord};
use crate::tag::{self, DisplayTag};

/// A font held as a map from table tag to raw table data.
///
/// Tables can be replaced and removed freely. `to_bytes` lays the font out again,
/// recomputing table checksums and `head.checkSumAdjustment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontTables {
    sfnt_version: u32,
    tables: BTreeMap<u32, Vec<u8>>,
}

struct TaggedBuffer {
    tag: u32,
    buffer: WriteBuffer,
}

struct OrderedTables {
    tables: Vec<TaggedBuffer>,
    checksum: Wrapping<u32>,
}

impl FontTables {
    pub fn new(sfnt_version: u32) -> Self {
        FontTables {
            sfnt_version,
            tables: BTreeMap::new(),
        }
    }

    /// Parse a font file. For collections the first font is used.
    pub fn read(data: &[u8]) -> Result<Self, ParseError> {
        let font_file = ReadScope::new(data).read::<OpenTypeFont<'_>>()?;
        let provider = font_file.table_provider(0)?;
        let mut font = FontTables::new(provider.sfnt_version());
        for tag in provider.table_tags() {
            let data = provider.read_table_data(tag)?;
            font.insert(tag, data.into_owned());
        }
        Ok(font)
    }

    pub fn sfnt_version(&self) -> u32 {
        self.sfnt_version
    }

    pub fn get(&self, tag: u32) -> Option<&[u8]> {
        self.tables.get(&tag).map(Vec::as_slice)
    }

    /// Add or replace a table with raw data.
    pub fn insert(&mut self, tag: u32, data: Vec<u8>) {
        self.tables.insert(tag, data);
    }

    /// Serialise `table` and add or replace it under `tag`.
    pub fn insert_table<HostType, T: WriteBinaryDep<HostType>>(
        &mut self,
        tag: u32,
        table: HostType,
        args: T::Args,
    ) -> Result<T::Output, WriteError> {
        let (output, buffer) = write::buffer::<HostType, T>(table, args)?;
        self.tables.insert(tag, buffer.into_inner());

        Ok(output)
    }

    pub fn remove(&mut self, tag: u32) -> Option<Vec<u8>> {
        self.tables.remove(&tag)
    }

    /// Remove every table in `tags` that is present, returning the tags removed.
    pub fn strip(&mut self, tags: &[u32]) -> Vec<u32> {
        let mut removed = Vec::new();
        for &tag in tags {
            if self.tables.remove(&tag).is_some() {
                debug!("removed '{}' table", DisplayTag(tag));
                removed.push(tag);
            }
        }
        removed
    }

    pub fn num_glyphs(&self) -> Result<u16, ParseError> {
        let maxp = self.read_table_data(tag::MAXP)?;
        let maxp = ReadScope::new(&maxp).read::<MaxpTable>()?;
        Ok(maxp.num_glyphs)
    }

    /// Lay out the font as an OpenType file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReadWriteError> {
        let head_data = self.read_table_data(tag::HEAD)?;
        let head = ReadScope::new(&head_data).read::<HeadTable>()?;

        // Re-serialise head to get a handle on its checkSumAdjustment, zeroed for now.
        let mut head_buffer = WriteBuffer::new();
        let check_sum_adjustment = HeadTable::write(&mut head_buffer, &head)?;

        let mut font = WriteBuffer::new();
        self.write_offset_table(&mut font)?;
        let table_offset = long_align(self.tables.len() * TableRecord::SIZE + font.bytes_written());

        let mut ordered_tables = self.write_table_directory(&mut font, head_buffer)?;

        let length = font.bytes_written();
        let padded_length = long_align(length);
        if padded_length != table_offset {
            return Err(ReadWriteError::Write(WriteError::BadValue));
        }
        font.write_zeros(padded_length - length)?;

        // The magic number comes from the OpenType spec.
        let headers_checksum = checksum::table_checksum(font.bytes())?;
        let adjustment = Wrapping(0xB1B0AFBA) - (headers_checksum + ordered_tables.checksum);

        let mut placeholder = Some(check_sum_adjustment);
        for TaggedBuffer { tag, buffer } in ordered_tables.tables.iter_mut() {
            if *tag == tag::HEAD {
                if let Some(placeholder) = placeholder.take() {
                    buffer.write_placeholder(placeholder, adjustment.0)?;
                }
            }
            font.write_bytes(buffer.bytes())?;
        }

        Ok(font.into_inner())
    }

    fn write_offset_table(&self, font: &mut WriteBuffer) -> Result<(), WriteError> {
        let num_tables = u16::try_from(self.tables.len())?;
        let n = max_power_of_2(num_tables);
        let search_range = (1 << n) * 16;
        let entry_selector = n;
        let range_shift = num_tables * 16 - search_range;

        U32Be::write(font, self.sfnt_version)?;
        U16Be::write(font, num_tables)?;
        U16Be::write(font, search_range)?;
        U16Be::write(font, entry_selector)?;
        U16Be::write(font, range_shift)?;

        Ok(())
    }

    fn write_table_directory(
        &self,
        font: &mut WriteBuffer,
        head: WriteBuffer,
    ) -> Result<OrderedTables, ReadWriteError> {
        let mut tables = Vec::with_capacity(self.tables.len());
        let mut checksum = Wrapping(0);
        let mut table_offset =
            long_align(self.tables.len() * TableRecord::SIZE + font.bytes_written());
        let mut head = Some(head);

        for (&tag, data) in &self.tables {
            let mut table = match head.take_if(|_| tag == tag::HEAD) {
                Some(head) => head,
                None => WriteBuffer::from(data.clone()),
            };
            let length = table.len();
            let padded_length = long_align(length);
            table.write_zeros(padded_length - length)?;

            let table_checksum = checksum::table_checksum(table.bytes())?;
            checksum += table_checksum;

            let record = TableRecord {
                table_tag: tag,
                checksum: table_checksum.0,
                offset: u32::try_from(table_offset).map_err(WriteError::from)?,
                length: u32::try_from(length).map_err(WriteError::from)?,
            };

            table_offset += padded_length;
            TableRecord::write(font, &record)?;
            tables.push(TaggedBuffer { tag, buffer: table });
        }

        Ok(OrderedTables { tables, checksum })
    }
}

impl FontTableProvider for FontTables {
    fn table_data(&self, tag: u32) -> Result<Option<Cow<'_, [u8]>>, ParseError> {
        Ok(self.get(tag).map(Cow::Borrowed))
    }

    fn has_table(&self, tag: u32) -> bool {
        self.tables.contains_key(&tag)
    }

    fn table_tags(&self) -> Vec<u32> {
        self.tables.keys().copied().collect()
    }
}

/// The codepoint to glyph mappings of the font's preferred Unicode cmap subtable.
pub fn best_cmap_mappings(
    provider: &impl FontTableProvider,
) -> Result<(EncodingRecord, BTreeMap<u32, u16>), ParseError> {
    let cmap_data = provider.read_table_data(tag::CMAP)?;
    let cmap = ReadScope::new(&cmap_data).read::<Cmap<'_>>()?;
    let (record, subtable) = cmap
        .find_best_unicode_subtable()?
        .ok_or(ParseError::UnsuitableCmap)?;
    Ok((record, subtable.mappings()?))
}

/// Calculate the maximum power of 2 that is <= num
fn max_power_of_2(num: u16) -> u16 {
    15u16.saturating_sub(num.leading_zeros() as u16)
}
