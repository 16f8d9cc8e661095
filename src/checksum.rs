#![deny(missing_docs)]

use std::num::Wrapping;

use crate::binary::read::ReadScope;
use crate::binary::U32Be;
use crate::error::ParseError;

/// Calculate a checksum of `data` according to the OpenType table checksum algorithm
///
/// `data` is treated as though it were padded with zeros to a multiple of four bytes.
///
/// <https://docs.microsoft.com/en-us/typography/opentype/spec/otff#calculating-checksums>
pub fn table_checksum(data: &[u8]) -> Result<Wrapping<u32>, ParseError> {
    let whole = data.len() / 4 * 4;
    let mut ctxt = ReadScope::new(&data[..whole]).ctxt();
    let array = ctxt.read_array::<U32Be>(whole / 4)?;
    let mut sum: Wrapping<u32> = array.iter().map(Wrapping).sum();

    let tail = &data[whole..];
    if !tail.is_empty() {
        let mut last = [0; 4];
        last[..tail.len()].copy_from_slice(tail);
        sum += Wrapping(u32::from_be_bytes(last));
    }

    Ok(sum)
}
