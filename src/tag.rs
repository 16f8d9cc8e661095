//! Font table tags.

use crate::error::ParseError;
use std::fmt;

/// Generate a 4-byte font table tag from byte string
///
/// Example:
///
/// ```ignore
/// assert_eq!(tag!(b"glyf"), 0x676C7966);
/// ```
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

/// Wrapper that formats a tag as its four characters, or hex if they are not printable.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

const fn tag(chars: [u8; 4]) -> u32 {
    u32::from_be_bytes(chars)
}

/// Parse a tag from a string of up to four printable ASCII characters.
///
/// Short tags are padded with spaces, so `"cvt"` is the same tag as `"cvt "`.
pub fn from_string(s: &str) -> Result<u32, ParseError> {
    if s.is_empty() || s.len() > 4 {
        return Err(ParseError::BadValue);
    }

    let mut tag: u32 = 0;
    let mut count = 0;

    for c in s.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(ParseError::BadValue);
        }

        tag = (tag << 8) | (c as u32);
        count += 1;
    }

    while count < 4 {
        tag = (tag << 8) | (' ' as u32);
        count += 1;
    }

    Ok(tag)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        if bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            let s: String = bytes.iter().map(|&b| char::from(b)).collect();
            f.pad(&s)
        } else {
            write!(f, "0x{:08x}", self.0)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

pub const CFF: u32 = tag!(b"CFF ");
pub const CFF2: u32 = tag!(b"CFF2");
pub const CMAP: u32 = tag!(b"cmap");
pub const CVT: u32 = tag!(b"cvt ");
pub const FPGM: u32 = tag!(b"fpgm");
pub const FVAR: u32 = tag!(b"fvar");
pub const GASP: u32 = tag!(b"gasp");
pub const GDEF: u32 = tag!(b"GDEF");
pub const GLYF: u32 = tag!(b"glyf");
pub const GPOS: u32 = tag!(b"GPOS");
pub const GSUB: u32 = tag!(b"GSUB");
pub const GVAR: u32 = tag!(b"gvar");
pub const HEAD: u32 = tag!(b"head");
pub const HHEA: u32 = tag!(b"hhea");
pub const HMTX: u32 = tag!(b"hmtx");
pub const HVAR: u32 = tag!(b"HVAR");
pub const LOCA: u32 = tag!(b"loca");
pub const MAXP: u32 = tag!(b"maxp");
pub const NAME: u32 = tag!(b"name");
pub const OS_2: u32 = tag!(b"OS/2");
pub const OTTO: u32 = tag!(b"OTTO");
pub const POST: u32 = tag!(b"post");
pub const PREP: u32 = tag!(b"prep");
pub const STAT: u32 = tag!(b"STAT");
pub const TTCF: u32 = tag!(b"ttcf");
pub const VVAR: u32 = tag!(b"VVAR");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_values() {
        assert_eq!(GLYF, 0x676C7966);
        assert_eq!(OS_2, 0x4F532F32);
    }

    #[test]
    fn parse_tags() {
        assert_eq!(from_string("GSUB"), Ok(GSUB));
        assert_eq!(from_string("cvt"), Ok(CVT));
        assert_eq!(from_string(""), Err(ParseError::BadValue));
        assert_eq!(from_string("toolong"), Err(ParseError::BadValue));
        assert_eq!(from_string("a\tb"), Err(ParseError::BadValue));
    }

    #[test]
    fn display_tags() {
        assert_eq!(DisplayTag(HVAR).to_string(), "HVAR");
        assert_eq!(DisplayTag(CVT).to_string(), "cvt ");
        assert_eq!(DisplayTag(0x00010000).to_string(), "0x00010000");
    }
}
