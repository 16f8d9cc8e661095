//! Error types

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::binary::read::ReadEof;
use crate::tag::DisplayTag;

/// Errors that originate when parsing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ParseError {
    BadEof,
    BadValue,
    BadVersion,
    BadOffset,
    BadIndex,
    LimitExceeded,
    MissingValue,
    MissingTable(u32),
    UnsuitableCmap,
    NotImplemented,
}

impl From<ReadEof> for ParseError {
    fn from(_error: ReadEof) -> Self {
        ParseError::BadEof
    }
}

impl From<std::num::TryFromIntError> for ParseError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        ParseError::BadValue
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BadEof => write!(f, "end of data reached unexpectedly"),
            ParseError::BadValue => write!(f, "invalid value"),
            ParseError::BadVersion => write!(f, "unexpected data version"),
            ParseError::BadOffset => write!(f, "invalid data offset"),
            ParseError::BadIndex => write!(f, "invalid data index"),
            ParseError::LimitExceeded => write!(f, "limit exceeded"),
            ParseError::MissingValue => write!(f, "an expected data value was missing"),
            ParseError::MissingTable(tag) => {
                write!(f, "font is missing '{}' table", DisplayTag(*tag))
            }
            ParseError::UnsuitableCmap => write!(f, "no suitable cmap subtable"),
            ParseError::NotImplemented => write!(f, "feature not implemented"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors that originate when writing binary data
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    NotImplemented,
    PlaceholderMismatch,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::NotImplemented => write!(f, "writing in this format is not implemented"),
            WriteError::PlaceholderMismatch => {
                write!(f, "data written to placeholder did not match expected size")
            }
        }
    }
}

impl std::error::Error for WriteError {}

/// Enum that can hold read (`ParseError`) and write errors
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ReadWriteError {
    Read(ParseError),
    Write(WriteError),
}

impl From<ParseError> for ReadWriteError {
    fn from(error: ParseError) -> Self {
        ReadWriteError::Read(error)
    }
}

impl From<WriteError> for ReadWriteError {
    fn from(error: WriteError) -> Self {
        ReadWriteError::Write(error)
    }
}

impl From<ReadEof> for ReadWriteError {
    fn from(error: ReadEof) -> Self {
        ReadWriteError::Read(ParseError::from(error))
    }
}

impl fmt::Display for ReadWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadWriteError::Read(err) => write!(f, "read error: {}", err),
            ReadWriteError::Write(err) => write!(f, "write error: {}", err),
        }
    }
}

impl std::error::Error for ReadWriteError {}

/// Errors that stop the emoji font build
#[derive(Debug)]
pub enum BuildError {
    /// Reading or writing a file failed
    Io { path: PathBuf, source: io::Error },
    /// The font data could not be parsed or serialised
    Font(ReadWriteError),
    /// The configuration file or command line was invalid
    Config(String),
    /// The source font has no TrueType outlines, e.g. CFF or colour bitmap fonts
    UnsupportedOutlines,
    /// More glyphs were resolved than fit in the Private Use Area
    PuaOverflow { start: u32, count: usize },
    /// None of the requested codepoints could be found in the source font
    NoGlyphs,
    /// Codepoints that resolved in the source font but not in the subset font
    Unresolved(Vec<u32>),
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<ReadWriteError> for BuildError {
    fn from(error: ReadWriteError) -> Self {
        BuildError::Font(error)
    }
}

impl From<ParseError> for BuildError {
    fn from(error: ParseError) -> Self {
        BuildError::Font(ReadWriteError::Read(error))
    }
}

impl From<WriteError> for BuildError {
    fn from(error: WriteError) -> Self {
        BuildError::Font(ReadWriteError::Write(error))
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            BuildError::Font(err) => write!(f, "font {}", err),
            BuildError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            BuildError::UnsupportedOutlines => {
                write!(
                    f,
                    "source font has no TrueType 'glyf' outlines \
                     (CFF, CFF2 and bitmap-only fonts such as CBDT are not supported)"
                )
            }
            BuildError::PuaOverflow { start, count } => write!(
                f,
                "{} glyphs starting at U+{:04X} do not fit in the Private Use Area",
                count, start
            ),
            BuildError::NoGlyphs => write!(f, "none of the requested codepoints are in the font"),
            BuildError::Unresolved(codepoints) => {
                write!(f, "codepoints missing from the subset font:")?;
                for cp in codepoints {
                    write!(f, " U+{:04X}", cp)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io { source, .. } => Some(source),
            BuildError::Font(err) => Some(err),
            _ => None,
        }
    }
}
