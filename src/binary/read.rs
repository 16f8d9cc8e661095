#![allow(missing_docs)]

//! Parse binary data
//!
//! Reading is organised around two types. A `ReadScope` is an immutable view of a region of
//! bytes (a font file, a table, a subtable), and a `ReadCtxt` is a cursor over a scope. Types
//! describe how they are read by implementing `ReadBinary`, `ReadBinaryDep` (when reading needs
//! values from elsewhere in the font, such as the glyph count), or `ReadFrom` for small fixed
//! size records that can be stored in a `ReadArray`.

use std::fmt;
use std::marker::PhantomData;

use crate::binary::{I16Be, I32Be, I64Be, U16Be, U32Be, U8};
use crate::error::ParseError;

#[derive(Debug, Copy, Clone)]
pub struct ReadEof {}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReadScope<'a> {
    base: usize,
    data: &'a [u8],
}

#[derive(Clone)]
pub struct ReadCtxt<'a> {
    scope: ReadScope<'a>,
    offset: usize,
}

pub trait ReadBinary {
    type HostType<'a>: Sized; // default = Self

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError>;
}

pub trait ReadBinaryDep {
    type Args<'a>: Copy;
    type HostType<'a>: Sized; // default = Self

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        args: Self::Args<'a>,
    ) -> Result<Self::HostType<'a>, ParseError>;
}

/// A record that always occupies `SIZE` bytes.
pub trait ReadFixedSize {
    type HostType: Sized; // default = Self

    /// The number of bytes consumed by `read_fixed`.
    const SIZE: usize;

    /// Must read exactly `SIZE` bytes.
    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<Self::HostType, ReadEof>;
}

pub trait ReadFrom {
    type ReadType: ReadFixedSize;
    fn read_from(value: <Self::ReadType as ReadFixedSize>::HostType) -> Self;
}

impl<T> ReadFixedSize for T
where
    T: ReadFrom,
{
    type HostType = T;

    const SIZE: usize = T::ReadType::SIZE;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<Self::HostType, ReadEof> {
        T::ReadType::read_fixed(ctxt).map(T::read_from)
    }
}

impl<T> ReadBinary for T
where
    T: ReadFixedSize,
{
    type HostType<'a> = T::HostType;

    fn read<'a>(ctxt: &mut ReadCtxt<'a>) -> Result<Self::HostType<'a>, ParseError> {
        ctxt.check_avail(T::SIZE)?;
        Ok(T::read_fixed(ctxt)?)
    }
}

impl<T> ReadBinaryDep for T
where
    T: ReadBinary,
{
    type Args<'a> = ();
    type HostType<'a> = T::HostType<'a>;

    fn read_dep<'a>(
        ctxt: &mut ReadCtxt<'a>,
        (): Self::Args<'_>,
    ) -> Result<Self::HostType<'a>, ParseError> {
        T::read(ctxt)
    }
}

/// A lazily read array of fixed size records.
pub struct ReadArray<'a, T: ReadFixedSize> {
    scope: ReadScope<'a>,
    length: usize,
    phantom: PhantomData<T>,
}

pub struct ReadArrayIter<'a, T: ReadFixedSize> {
    array: ReadArray<'a, T>,
    index: usize,
}

impl<'a> ReadScope<'a> {
    pub fn new(data: &'a [u8]) -> ReadScope<'a> {
        let base = 0;
        ReadScope { base, data }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The absolute position of this scope within the data it was created from.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn offset(&self, offset: usize) -> ReadScope<'a> {
        let base = self.base + offset;
        let data = self.data.get(offset..).unwrap_or(&[]);
        ReadScope { base, data }
    }

    pub fn offset_length(&self, offset: usize, length: usize) -> Result<ReadScope<'a>, ParseError> {
        if offset < self.data.len() || length == 0 {
            let data = self.data.get(offset..).unwrap_or(&[]);
            match data.get(..length) {
                Some(data) => Ok(ReadScope {
                    base: self.base + offset,
                    data,
                }),
                None => Err(ParseError::BadEof),
            }
        } else {
            Err(ParseError::BadOffset)
        }
    }

    pub fn ctxt(&self) -> ReadCtxt<'a> {
        ReadCtxt::new(*self)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&self) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read::<T>()
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        self.ctxt().read_dep::<T>(args)
    }
}

impl<'a> ReadCtxt<'a> {
    /// ReadCtxt is constructed by calling `ReadScope::ctxt`.
    fn new(scope: ReadScope<'a>) -> ReadCtxt<'a> {
        ReadCtxt { scope, offset: 0 }
    }

    pub fn check(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadValue),
        }
    }

    /// Check a condition, returning `ParseError::BadIndex` if `false`.
    pub fn check_index(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadIndex),
        }
    }

    /// Check a condition, returning `ParseError::BadVersion` if `false`.
    ///
    /// Intended for use in checking versions read from data. Example:
    ///
    /// ```
    /// use emoji_pua_font::binary::read::ReadScope;
    /// use emoji_pua_font::error::ParseError;
    ///
    /// let scope = ReadScope::new(&[0, 2]);
    /// let mut ctxt = scope.ctxt();
    /// let major_version = ctxt.read_u16be().expect("unable to read version");
    ///
    /// assert!(ctxt.check_version(major_version == 2).is_ok());
    /// assert_eq!(ctxt.check_version(major_version == 1), Err(ParseError::BadVersion));
    /// ```
    pub fn check_version(&self, cond: bool) -> Result<(), ParseError> {
        match cond {
            true => Ok(()),
            false => Err(ParseError::BadVersion),
        }
    }

    pub fn scope(&self) -> ReadScope<'a> {
        self.scope.offset(self.offset)
    }

    pub fn read<T: ReadBinaryDep<Args<'a> = ()>>(&mut self) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, ())
    }

    pub fn read_dep<T: ReadBinaryDep>(
        &mut self,
        args: T::Args<'a>,
    ) -> Result<T::HostType<'a>, ParseError> {
        T::read_dep(self, args)
    }

    fn check_avail(&self, length: usize) -> Result<(), ReadEof> {
        match self.offset.checked_add(length) {
            Some(endpos) if endpos <= self.scope.data.len() => Ok(()),
            _ => Err(ReadEof {}),
        }
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ReadEof> {
        let slice = self.read_slice(N)?;
        let mut bytes = [0; N];
        bytes.copy_from_slice(slice);
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadEof> {
        self.read_bytes::<1>().map(|[byte]| byte)
    }

    pub fn read_u16be(&mut self) -> Result<u16, ReadEof> {
        self.read_bytes().map(u16::from_be_bytes)
    }

    pub fn read_i16be(&mut self) -> Result<i16, ReadEof> {
        self.read_bytes().map(i16::from_be_bytes)
    }

    pub fn read_u32be(&mut self) -> Result<u32, ReadEof> {
        self.read_bytes().map(u32::from_be_bytes)
    }

    pub fn read_i32be(&mut self) -> Result<i32, ReadEof> {
        self.read_bytes().map(i32::from_be_bytes)
    }

    pub fn read_i64be(&mut self) -> Result<i64, ReadEof> {
        self.read_bytes().map(i64::from_be_bytes)
    }

    pub fn read_array<T: ReadFixedSize>(
        &mut self,
        length: usize,
    ) -> Result<ReadArray<'a, T>, ParseError> {
        let size = length.checked_mul(T::SIZE).ok_or(ParseError::LimitExceeded)?;
        let scope = self.read_scope(size)?;
        Ok(ReadArray {
            scope,
            length,
            phantom: PhantomData,
        })
    }

    pub fn read_scope(&mut self, length: usize) -> Result<ReadScope<'a>, ReadEof> {
        if let Ok(scope) = self.scope.offset_length(self.offset, length) {
            self.offset += length;
            Ok(scope)
        } else {
            Err(ReadEof {})
        }
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], ReadEof> {
        let scope = self.read_scope(length)?;
        Ok(scope.data)
    }
}

impl<'a, T: ReadFixedSize> ReadArray<'a, T> {
    pub fn empty() -> Self {
        ReadArray {
            scope: ReadScope::new(&[]),
            length: 0,
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn get_item(&self, index: usize) -> Option<T::HostType> {
        if index < self.length {
            let mut ctxt = self.scope.offset(index * T::SIZE).ctxt();
            T::read_fixed(&mut ctxt).ok()
        } else {
            None
        }
    }

    pub fn read_item(&self, index: usize) -> Result<T::HostType, ParseError> {
        self.get_item(index).ok_or(ParseError::BadIndex)
    }

    pub fn last(&self) -> Option<T::HostType> {
        let index = self.length.checked_sub(1)?;
        self.get_item(index)
    }

    pub fn iter(&self) -> ReadArrayIter<'a, T> {
        ReadArrayIter {
            array: self.clone(),
            index: 0,
        }
    }

    pub fn to_vec(&self) -> Vec<T::HostType> {
        self.iter().collect()
    }
}

impl<'a, T: ReadFixedSize> Clone for ReadArray<'a, T> {
    fn clone(&self) -> Self {
        ReadArray {
            scope: self.scope,
            length: self.length,
            phantom: PhantomData,
        }
    }
}

impl<'a, T: ReadFixedSize> fmt::Debug for ReadArray<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadArray")
            .field("base", &self.scope.base)
            .field("length", &self.length)
            .finish()
    }
}

impl<'a, T: ReadFixedSize> Iterator for ReadArrayIter<'a, T> {
    type Item = T::HostType;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.array.get_item(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a, 'b, T: ReadFixedSize> IntoIterator for &'b ReadArray<'a, T> {
    type Item = T::HostType;
    type IntoIter = ReadArrayIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl ReadFixedSize for U8 {
    type HostType = u8;

    const SIZE: usize = 1;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<u8, ReadEof> {
        ctxt.read_u8()
    }
}

impl ReadFixedSize for U16Be {
    type HostType = u16;

    const SIZE: usize = 2;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<u16, ReadEof> {
        ctxt.read_u16be()
    }
}

impl ReadFixedSize for I16Be {
    type HostType = i16;

    const SIZE: usize = 2;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<i16, ReadEof> {
        ctxt.read_i16be()
    }
}

impl ReadFixedSize for U32Be {
    type HostType = u32;

    const SIZE: usize = 4;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<u32, ReadEof> {
        ctxt.read_u32be()
    }
}

impl ReadFixedSize for I32Be {
    type HostType = i32;

    const SIZE: usize = 4;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<i32, ReadEof> {
        ctxt.read_i32be()
    }
}

impl ReadFixedSize for I64Be {
    type HostType = i64;

    const SIZE: usize = 8;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<i64, ReadEof> {
        ctxt.read_i64be()
    }
}

impl<T1, T2> ReadFixedSize for (T1, T2)
where
    T1: ReadFixedSize,
    T2: ReadFixedSize,
{
    type HostType = (T1::HostType, T2::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<Self::HostType, ReadEof> {
        let t1 = T1::read_fixed(ctxt)?;
        let t2 = T2::read_fixed(ctxt)?;
        Ok((t1, t2))
    }
}

impl<T1, T2, T3> ReadFixedSize for (T1, T2, T3)
where
    T1: ReadFixedSize,
    T2: ReadFixedSize,
    T3: ReadFixedSize,
{
    type HostType = (T1::HostType, T2::HostType, T3::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE + T3::SIZE;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<Self::HostType, ReadEof> {
        let t1 = T1::read_fixed(ctxt)?;
        let t2 = T2::read_fixed(ctxt)?;
        let t3 = T3::read_fixed(ctxt)?;
        Ok((t1, t2, t3))
    }
}

impl<T1, T2, T3, T4> ReadFixedSize for (T1, T2, T3, T4)
where
    T1: ReadFixedSize,
    T2: ReadFixedSize,
    T3: ReadFixedSize,
    T4: ReadFixedSize,
{
    type HostType = (T1::HostType, T2::HostType, T3::HostType, T4::HostType);

    const SIZE: usize = T1::SIZE + T2::SIZE + T3::SIZE + T4::SIZE;

    fn read_fixed(ctxt: &mut ReadCtxt<'_>) -> Result<Self::HostType, ReadEof> {
        let t1 = T1::read_fixed(ctxt)?;
        let t2 = T2::read_fixed(ctxt)?;
        let t3 = T3::read_fixed(ctxt)?;
        let t4 = T4::read_fixed(ctxt)?;
        Ok((t1, t2, t3, t4))
    }
}
