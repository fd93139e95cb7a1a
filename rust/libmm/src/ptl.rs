use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

pub const PORTAL_FLAGS: u8 = 0x2;
pub const PORTAL_EDGE_COUNT: u8 = 2;
const PORTAL_RESERVED: u16 = 101;

/// One visibility opening between two cells.
#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct PortalRecord {
    pub flags: u8,
    pub edge_count: u8,
    pub reserved: u16,
    pub higher_cell: u16,
    pub lower_cell: u16,
    pub height: f32,
    pub p1: Point3F,
    pub p2: Point3F,
}

impl PortalRecord {
    /// Builds a record from a boundary segment in the XZ plane. The points are
    /// lifted to y = 0; the vertical extent is carried by `height` alone.
    pub fn new(lower_cell: u16, higher_cell: u16, height: f32, p1: Point2F, p2: Point2F) -> Self {
        PortalRecord {
            flags: PORTAL_FLAGS,
            edge_count: PORTAL_EDGE_COUNT,
            reserved: PORTAL_RESERVED,
            higher_cell,
            lower_cell,
            height,
            p1: Point3F::new(p1.x, 0.0, p1.y),
            p2: Point3F::new(p2.x, 0.0, p2.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ptl {
    pub portals: Vec<PortalRecord>,
}

impl Ptl {
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

impl Readable<Ptl> for Ptl {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        let reserved = u32::read(from, layout)?;
        if reserved != 0 {
            return Err(MmError::format(format!(
                "PTL header word is {} instead of 0",
                reserved
            )));
        }
        Ok(Ptl {
            portals: Vec::<PortalRecord>::read(from, layout)?,
        })
    }
}

impl Writable<Ptl> for Ptl {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        0u32.write(to, layout)?;
        self.portals.write(to, layout)
    }
}
