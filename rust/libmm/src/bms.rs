use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

pub const BMS_MAGIC: &str = "3HSM";

/// Each surface always takes four index slots; triangles repeat a zero.
pub const INDICES_PER_SURFACE: usize = 4;

pub const DEFAULT_FLAGS: i8 = 3;
pub const DEFAULT_DARKNESS: i8 = 2;

#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct TextureName {
    pub name: FixedStr<32>,
    pub reserved: Pad<16>,
}

impl TextureName {
    pub fn new(name: &str) -> Self {
        TextureName {
            name: FixedStr::new(name),
            reserved: Pad,
        }
    }
}

/// A visible-surface mesh for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Bms {
    pub radius: f32,
    pub radius_sq: f32,
    pub bounding_box_radius: f32,
    pub flags: i8,
    pub textures: Vec<TextureName>,
    pub coordinates: Vec<Point3F>,
    /// Per adjunct.
    pub texture_darkness: Vec<i8>,
    /// Two floats per adjunct.
    pub tex_coords: Vec<f32>,
    /// Per adjunct.
    pub enclosed_shape: Vec<u16>,
    /// 1-based texture slot per surface.
    pub surface_sides: Vec<i8>,
    /// `INDICES_PER_SURFACE` entries per surface.
    pub indices: Vec<u16>,
}

impl Bms {
    pub fn from_bytes<T>(from: T) -> MmResult<Self>
    where
        T: AsRef<[u8]>,
    {
        decode(from.as_ref(), &Layout::little())
    }

    pub fn to_bytes(&self) -> MmResult<Vec<u8>> {
        encode(self, &Layout::little())
    }

    pub fn adjunct_count(&self) -> usize {
        self.texture_darkness.len()
    }

    pub fn surface_indices(&self, surface: usize) -> Option<&[u16]> {
        let start = surface * INDICES_PER_SURFACE;
        self.indices.get(start..start + INDICES_PER_SURFACE)
    }
}

impl Readable<Bms> for Bms {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        let magic = FixedStr::<16>::read(from, layout)?;
        if magic.as_str() != BMS_MAGIC {
            return Err(MmError::from("Bad BMS magic"));
        }

        let vertex_count = u32::read(from, layout)? as usize;
        let adjunct_count = u32::read(from, layout)? as usize;
        let surface_count = u32::read(from, layout)? as usize;
        let indices_count = u32::read(from, layout)? as usize;

        let radius = f32::read(from, layout)?;
        let radius_sq = f32::read(from, layout)?;
        let bounding_box_radius = f32::read(from, layout)?;

        let texture_count = i8::read(from, layout)?;
        if texture_count < 0 {
            return Err(MmError::format(format!(
                "texture count is negative ({})",
                texture_count
            )));
        }
        let flags = i8::read(from, layout)?;
        Pad::<6>::read(from, layout)?;

        let textures = read_counted(from, layout, texture_count as usize)?;
        let coordinates = read_counted(from, layout, vertex_count)?;
        let texture_darkness = read_counted(from, layout, adjunct_count)?;
        let tex_coords = read_counted(from, layout, adjunct_count * 2)?;
        let enclosed_shape = read_counted(from, layout, adjunct_count)?;
        let surface_sides = read_counted(from, layout, surface_count)?;
        let indices = read_counted(from, layout, indices_count)?;

        Ok(Bms {
            radius,
            radius_sq,
            bounding_box_radius,
            flags,
            textures,
            coordinates,
            texture_darkness,
            tex_coords,
            enclosed_shape,
            surface_sides,
            indices,
        })
    }
}

impl Writable<Bms> for Bms {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        let adjunct_count = self.adjunct_count();
        check_count("tex_coords", adjunct_count * 2, self.tex_coords.len())?;
        check_count("enclosed_shape", adjunct_count, self.enclosed_shape.len())?;
        check_count(
            "indices",
            self.surface_sides.len() * INDICES_PER_SURFACE,
            self.indices.len(),
        )?;

        FixedStr::<16>::new(BMS_MAGIC).write(to, layout)?;
        count_field::<u32>("coordinates", self.coordinates.len())?.write(to, layout)?;
        count_field::<u32>("adjuncts", adjunct_count)?.write(to, layout)?;
        count_field::<u32>("surfaces", self.surface_sides.len())?.write(to, layout)?;
        count_field::<u32>("indices", self.indices.len())?.write(to, layout)?;

        self.radius.write(to, layout)?;
        self.radius_sq.write(to, layout)?;
        self.bounding_box_radius.write(to, layout)?;

        count_field::<i8>("textures", self.textures.len())?.write(to, layout)?;
        self.flags.write(to, layout)?;
        Pad::<6>.write(to, layout)?;

        write_counted(&self.textures, to, layout)?;
        write_counted(&self.coordinates, to, layout)?;
        write_counted(&self.texture_darkness, to, layout)?;
        write_counted(&self.tex_coords, to, layout)?;
        write_counted(&self.enclosed_shape, to, layout)?;
        write_counted(&self.surface_sides, to, layout)?;
        write_counted(&self.indices, to, layout)?;

        Ok(())
    }
}
