use crate::types::*;
use bytes::{Buf, BufMut};
use std::io::Cursor;
use std::mem::size_of;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Endian {
    Little,
    Big,
}

/// Byte order used by a file family. Collision, mesh, prop, facade and
/// portal files are little-endian; the material database is big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub endian: Endian,
}

impl Layout {
    pub fn little() -> Layout {
        Layout {
            endian: Endian::Little,
        }
    }

    pub fn big() -> Layout {
        Layout {
            endian: Endian::Big,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::little()
    }
}

pub trait Readable<T> {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<T>;
}

pub trait Writable<T> {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()>;
}

/// Decode a whole record from a byte slice. No partial record is ever returned.
pub fn decode<T>(bytes: &[u8], layout: &Layout) -> MmResult<T>
where
    T: Readable<T>,
{
    let mut cursor = Cursor::new(bytes);
    T::read(&mut cursor, layout)
}

pub fn encode<T>(value: &T, layout: &Layout) -> MmResult<Vec<u8>>
where
    T: Writable<T>,
{
    let mut buf = vec![];
    value.write(&mut buf, layout)?;
    Ok(buf)
}

/// Reads `count` items that are not preceded by their own length; the count
/// lives in a header field read earlier.
pub fn read_counted<T>(from: &mut dyn Buf, layout: &Layout, count: usize) -> MmResult<Vec<T>>
where
    T: Readable<T>,
{
    let mut result: Vec<T> = Vec::with_capacity(count.min(from.remaining()));

    for _ in 0..count {
        result.push(T::read(from, layout)?);
    }

    Ok(result)
}

pub fn write_counted<T>(items: &[T], to: &mut dyn BufMut, layout: &Layout) -> MmResult<()>
where
    T: Writable<T>,
{
    for item in items {
        item.write(to, layout)?;
    }

    Ok(())
}

/// Fails encoding when a header count disagrees with the array it describes.
pub fn check_count(field: &str, declared: usize, actual: usize) -> MmResult<()> {
    if declared != actual {
        return Err(MmError::format(format!(
            "{} declares {} entries but {} are present",
            field, declared, actual
        )));
    }
    Ok(())
}

/// Converts a length into an on-disk count field, failing when it does not fit.
pub fn count_field<C>(field: &str, len: usize) -> MmResult<C>
where
    C: TryFrom<usize>,
{
    C::try_from(len).map_err(|_| {
        MmError::format(format!("{} has {} entries, too many for its count field", field, len))
    })
}

impl<T> Readable<Vec<T>> for Vec<T>
where
    T: Readable<T>,
{
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Vec<T>> {
        let length = u32::read(from, layout)?;
        read_counted(from, layout, length as usize)
    }
}

impl<T> Writable<Vec<T>> for Vec<T>
where
    T: Writable<T>,
{
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        count_field::<u32>("array", self.len())?.write(to, layout)?;
        write_counted(self, to, layout)
    }
}

impl<T, const N: usize> Readable<[T; N]> for [T; N]
where
    T: Readable<T>,
{
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<[T; N]> {
        let items = read_counted::<T>(from, layout, N)?;
        items
            .try_into()
            .map_err(|_| MmError::from("fixed array length mismatch"))
    }
}

impl<T, const N: usize> Writable<[T; N]> for [T; N]
where
    T: Writable<T>,
{
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        write_counted(self, to, layout)
    }
}

/// A fixed-width text field: truncated or zero-padded to `N` bytes on disk,
/// cut at the first NUL when read. Characters map to single latin-1 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixedStr<const N: usize>(pub String);

impl<const N: usize> FixedStr<N> {
    pub fn new(value: &str) -> Self {
        FixedStr(value.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> Readable<FixedStr<N>> for FixedStr<N> {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        let raw = <[u8; N]>::read(from, layout)?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(N);
        Ok(FixedStr(raw[..end].iter().map(|b| *b as char).collect()))
    }
}

impl<const N: usize> Writable<FixedStr<N>> for FixedStr<N> {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        let mut raw = [0u8; N];
        for (slot, c) in raw.iter_mut().zip(self.0.chars()) {
            *slot = u8::try_from(c as u32).map_err(|_| {
                MmError::format(format!("'{}' cannot be stored in a latin-1 field", c))
            })?;
        }
        raw.write(to, layout)
    }
}

/// A variable-length name terminated by a single NUL byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NulString(pub String);

impl NulString {
    pub fn new(value: &str) -> Self {
        NulString(value.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Readable<NulString> for NulString {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        let mut bytes = vec![];
        loop {
            match u8::read(from, layout) {
                Ok(0) => break,
                Ok(b) => bytes.push(b),
                Err(_) => return Err(MmError::from("unterminated name")),
            }
        }
        Ok(NulString(String::from_utf8(bytes)?))
    }
}

impl Writable<NulString> for NulString {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        if self.0.contains('\0') {
            return Err(MmError::format(format!(
                "name {:?} contains an embedded NUL",
                self.0
            )));
        }
        for byte in self.0.bytes() {
            byte.write(to, layout)?;
        }
        0u8.write(to, layout)
    }
}

/// `N` reserved bytes, written as zeros and skipped when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pad<const N: usize>;

impl<const N: usize> Readable<Pad<N>> for Pad<N> {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        <[u8; N]>::read(from, layout)?;
        Ok(Pad)
    }
}

impl<const N: usize> Writable<Pad<N>> for Pad<N> {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        [0u8; N].write(to, layout)
    }
}

macro_rules! primitive_readable {
    ($ty: ty, $read_le: ident, $read_be: ident) => {
        impl Readable<$ty> for $ty {
            fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
                if from.remaining() < size_of::<Self>() {
                    return Err(MmError::from("unexpected end of stream"));
                }
                Ok(match layout.endian {
                    Endian::Little => from.$read_le(),
                    Endian::Big => from.$read_be(),
                })
            }
        }
    };
}

macro_rules! primitive_writable {
    ($ty: ty, $write_le: ident, $write_be: ident) => {
        impl Writable<$ty> for $ty {
            fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
                match layout.endian {
                    Endian::Little => to.$write_le(*self),
                    Endian::Big => to.$write_be(*self),
                }
                Ok(())
            }
        }
    };
}

primitive_readable!(u8, get_u8, get_u8);
primitive_readable!(u16, get_u16_le, get_u16_be);
primitive_readable!(u32, get_u32_le, get_u32_be);

primitive_readable!(i8, get_i8, get_i8);
primitive_readable!(i16, get_i16_le, get_i16_be);
primitive_readable!(i32, get_i32_le, get_i32_be);

primitive_readable!(f32, get_f32_le, get_f32_be);

primitive_writable!(u8, put_u8, put_u8);
primitive_writable!(u16, put_u16_le, put_u16_be);
primitive_writable!(u32, put_u32_le, put_u32_be);

primitive_writable!(i8, put_i8, put_i8);
primitive_writable!(i16, put_i16_le, put_i16_be);
primitive_writable!(i32, put_i32_le, put_i32_be);

primitive_writable!(f32, put_f32_le, put_f32_be);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endianness_is_respected() {
        let le = encode(&0x0102_0304u32, &Layout::little()).unwrap();
        let be = encode(&0x0102_0304u32, &Layout::big()).unwrap();
        assert_eq!(le, vec![4, 3, 2, 1]);
        assert_eq!(be, vec![1, 2, 3, 4]);
        assert_eq!(decode::<u32>(&be, &Layout::big()).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_truncated_primitive() {
        let err = decode::<u32>(&[1, 2], &Layout::little()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }

    #[test]
    fn test_fixed_str_pads_and_truncates() {
        let short = encode(&FixedStr::<8>::new("abc"), &Layout::little()).unwrap();
        assert_eq!(short, b"abc\0\0\0\0\0".to_vec());

        let long = encode(&FixedStr::<4>::new("abcdefg"), &Layout::little()).unwrap();
        assert_eq!(long, b"abcd".to_vec());

        let read: FixedStr<8> = decode(&short, &Layout::little()).unwrap();
        assert_eq!(read.as_str(), "abc");
    }

    #[test]
    fn test_nul_string() {
        let bytes = encode(&NulString::new("tpbench"), &Layout::little()).unwrap();
        assert_eq!(bytes, b"tpbench\0".to_vec());
        let back: NulString = decode(&bytes, &Layout::little()).unwrap();
        assert_eq!(back.as_str(), "tpbench");

        assert!(encode(&NulString::new("bad\0name"), &Layout::little()).is_err());
        assert!(decode::<NulString>(b"no terminator", &Layout::little()).is_err());
    }

    #[test]
    fn test_vec_is_count_prefixed() {
        let bytes = encode(&vec![7u16, 8u16], &Layout::little()).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 7, 0, 8, 0]);
        let back: Vec<u16> = decode(&bytes, &Layout::little()).unwrap();
        assert_eq!(back, vec![7, 8]);
    }

    #[test]
    fn test_check_count() {
        assert!(check_count("indices", 4, 4).is_ok());
        assert_eq!(
            check_count("indices", 4, 3).unwrap_err().kind,
            ErrorKind::Format
        );
    }
}
