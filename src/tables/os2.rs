//! Targeted access to the `OS/2` table.
//!
//! <https://docs.microsoft.com/en-us/typography/opentype/spec/os2>
//!
//! Only the character index range is interpreted; everything else is carried through
//! untouched.

use crate::binary::read::ReadScope;
use crate::error::ParseError;

/// Byte offset of `usFirstCharIndex`, `usLastCharIndex` follows it.
const FIRST_CHAR_INDEX_OFFSET: usize = 64;

/// The minimum and maximum BMP codepoints recorded in an `OS/2` table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CharIndexRange {
    pub first: u16,
    pub last: u16,
}

impl CharIndexRange {
    /// The range covering `codepoints`, clamped to the BMP. `None` when empty.
    pub fn from_codepoints(codepoints: impl IntoIterator<Item = u32>) -> Option<Self> {
        let clamp = |ch: u32| u16::try_from(ch).unwrap_or(u16::MAX);
        codepoints.into_iter().fold(None, |range, ch| {
            let ch = clamp(ch);
            Some(match range {
                None => CharIndexRange { first: ch, last: ch },
                Some(CharIndexRange { first, last }) => CharIndexRange {
                    first: first.min(ch),
                    last: last.max(ch),
                },
            })
        })
    }

    /// Read the range from raw `OS/2` table data.
    ///
    /// The range sits at the same offset in every version, so any table at least 68 bytes
    /// long is accepted.
    pub fn read(os2: &[u8]) -> Result<Self, ParseError> {
        let mut ctxt = ReadScope::new(os2).offset(FIRST_CHAR_INDEX_OFFSET).ctxt();
        let first = ctxt.read_u16be()?;
        let last = ctxt.read_u16be()?;
        Ok(CharIndexRange { first, last })
    }

    /// Return a copy of `os2` with the character index range replaced.
    pub fn apply(self, os2: &[u8]) -> Result<Vec<u8>, ParseError> {
        // Validates the length
        CharIndexRange::read(os2)?;
        let mut data = os2.to_vec();
        data[FIRST_CHAR_INDEX_OFFSET..FIRST_CHAR_INDEX_OFFSET + 2]
            .copy_from_slice(&self.first.to_be_bytes());
        data[FIRST_CHAR_INDEX_OFFSET + 2..FIRST_CHAR_INDEX_OFFSET + 4]
            .copy_from_slice(&self.last.to_be_bytes());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os2(version: u16, len: usize) -> Vec<u8> {
        let mut data = vec![0xAA; len];
        data[0..2].copy_from_slice(&version.to_be_bytes());
        data
    }

    #[test]
    fn range_from_codepoints() {
        assert_eq!(CharIndexRange::from_codepoints(Vec::new()), None);
        assert_eq!(
            CharIndexRange::from_codepoints(vec![0xE005, 0xE000, 0xE002]),
            Some(CharIndexRange {
                first: 0xE000,
                last: 0xE005
            })
        );
        assert_eq!(
            CharIndexRange::from_codepoints(vec![0x20, 0x1F600]),
            Some(CharIndexRange {
                first: 0x20,
                last: 0xFFFF
            })
        );
    }

    #[test]
    fn apply_only_touches_char_indices() {
        let data = os2(4, 96);
        let range = CharIndexRange {
            first: 0xE000,
            last: 0xE0F9,
        };
        let patched = range.apply(&data).unwrap();
        assert_eq!(patched.len(), data.len());
        assert_eq!(CharIndexRange::read(&patched), Ok(range));
        assert_eq!(&patched[..64], &data[..64]);
        assert_eq!(&patched[68..], &data[68..]);
    }

    #[test]
    fn short_table_is_rejected() {
        assert_eq!(
            CharIndexRange {
                first: 0,
                last: 1
            }
            .apply(&os2(0, 60)),
            Err(ParseError::BadEof)
        );
        assert_eq!(CharIndexRange::read(&os2(9, 66)), Err(ParseError::BadEof));
    }

    #[test]
    fn unknown_version_is_patched() {
        let data = os2(9, 100);
        let range = CharIndexRange {
            first: 0xE000,
            last: 0xE001,
        };
        let patched = range.apply(&data).unwrap();
        assert_eq!(&patched[..2], &[0, 9]);
        assert_eq!(CharIndexRange::read(&patched), Ok(range));
    }
}
