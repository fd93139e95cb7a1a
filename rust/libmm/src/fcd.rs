use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

/// Every facade is stored in room 1.
pub const FACADE_ROOM: u16 = 1;

/// A decorative building front placed against a wall.
#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct Facade {
    pub room: u16,
    pub flags: u16,
    pub start: Point3F,
    pub end: Point3F,
    pub sides: Point3F,
    pub scale: f32,
    pub name: NulString,
}

#[derive(Debug, Readable, Writable, Clone, PartialEq, Default)]
pub struct Fcd {
    pub facades: Vec<Facade>,
}

impl Fcd {
    pub fn from_bytes<T>(from: T) -> MmResult<Self>
    where
        T: AsRef<[u8]>,
    {
        decode(from.as_ref(), &Layout::little())
    }

    pub fn to_bytes(&self) -> MmResult<Vec<u8>> {
        encode(self, &Layout::little())
    }
}
