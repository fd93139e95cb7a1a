use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

pub const DEFAULT_ROOM: u16 = 4;
pub const DEFAULT_FLAGS: u16 = 0x800;

/// A placed prop. `end` is only used to orient the object.
#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct StaticObject {
    pub room: u16,
    pub flags: u16,
    pub start: Point3F,
    pub end: Point3F,
    pub name: NulString,
}

impl StaticObject {
    pub fn new(start: Point3F, end: Point3F, name: &str) -> Self {
        StaticObject {
            room: DEFAULT_ROOM,
            flags: DEFAULT_FLAGS,
            start,
            end,
            name: NulString::new(name),
        }
    }
}

#[derive(Debug, Readable, Writable, Clone, PartialEq, Default)]
pub struct Bng {
    pub objects: Vec<StaticObject>,
}

impl Bng {
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
