use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

pub const BND_MAGIC: [u8; 4] = *b"2DNB";

bitflags! {
    pub struct PolygonFlags: u8 {
        const EDGE_A = 0b1;
        const EDGE_B = 0b10;
        const QUAD = 0b100;

        const TRIANGLE_DEFAULT = Self::EDGE_A.bits | Self::EDGE_B.bits;
        const QUAD_DEFAULT = Self::EDGE_B.bits | Self::QUAD.bits;
    }
}

/// One collision polygon. Triangles still occupy four index slots and four
/// plane edges on disk; the unused slot is zero.
#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct Polygon {
    pub cell_id: u16,
    pub material_index: u8,
    pub flags: u8,
    pub vertex_indices: [u16; 4],
    pub plane_edges: [Point3F; 4],
    pub plane: PlaneF,
}

impl Polygon {
    /// The zeroed record stored in slot 0 of every collision file.
    pub fn reserved() -> Polygon {
        let zero = Point3F::new(0.0, 0.0, 0.0);
        Polygon {
            cell_id: 0,
            material_index: 0,
            flags: 0,
            vertex_indices: [0; 4],
            plane_edges: [zero; 4],
            plane: PlaneF {
                normal: zero,
                distance: 0.0,
            },
        }
    }

    pub fn is_quad(&self) -> bool {
        PolygonFlags::from_bits_truncate(self.flags).contains(PolygonFlags::QUAD)
    }

    pub fn num_verts(&self) -> usize {
        if self.is_quad() {
            4
        } else {
            3
        }
    }

    pub fn indices(&self) -> &[u16] {
        &self.vertex_indices[..self.num_verts()]
    }
}

/// Spatial acceleration rows, only present when the x and y grid dimensions
/// are both nonzero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BndGrid {
    pub row_offsets: Vec<u32>,
    pub row_shorts: Vec<u16>,
    pub row_indices: Vec<u16>,
    pub row_heights: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bnd {
    pub offset: Point3F,
    pub x_dim: i32,
    pub y_dim: i32,
    pub z_dim: i32,
    pub center: Point3F,
    pub radius: f32,
    pub radius_sqr: f32,
    pub bb_min: Point3F,
    pub bb_max: Point3F,
    pub num_hot_verts1: i32,
    pub x_scale: f32,
    pub z_scale: f32,
    pub height_scale: i32,
    pub cache_size: i32,

    pub vertices: Vec<Point3F>,
    /// Every polygon after the reserved slot 0.
    pub polygons: Vec<Polygon>,

    pub hot_verts: Vec<Point3F>,
    pub edges_0: Vec<u32>,
    pub edges_1: Vec<u32>,
    pub edge_normals: Vec<Point3F>,
    pub edge_floats: Vec<f32>,

    pub grid: Option<BndGrid>,
}

impl Bnd {
    pub fn from_bytes<T>(from: T) -> MmResult<Self>
    where
        T: AsRef<[u8]>,
    {
        decode(from.as_ref(), &Layout::little())
    }

    pub fn to_bytes(&self) -> MmResult<Vec<u8>> {
        encode(self, &Layout::little())
    }

    fn has_grid(&self) -> bool {
        self.x_dim != 0 && self.y_dim != 0
    }

    fn grid_len(dim_a: i32, dim_b: i32) -> MmResult<usize> {
        if dim_a < 0 || dim_b < 0 {
            return Err(MmError::format("negative grid dimension"));
        }
        Ok(dim_a as usize * dim_b as usize)
    }
}

fn read_count(from: &mut dyn Buf, layout: &Layout, field: &str) -> MmResult<usize> {
    let count = i32::read(from, layout)?;
    if count < 0 {
        return Err(MmError::format(format!("{} is negative ({})", field, count)));
    }
    Ok(count as usize)
}

impl Readable<Bnd> for Bnd {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        let magic = <[u8; 4]>::read(from, layout)?;
        if magic != BND_MAGIC {
            return Err(MmError::from("Bad BND magic"));
        }

        let offset = Point3F::read(from, layout)?;
        let x_dim = i32::read(from, layout)?;
        let y_dim = i32::read(from, layout)?;
        let z_dim = i32::read(from, layout)?;
        let center = Point3F::read(from, layout)?;
        let radius = f32::read(from, layout)?;
        let radius_sqr = f32::read(from, layout)?;
        let bb_min = Point3F::read(from, layout)?;
        let bb_max = Point3F::read(from, layout)?;

        let num_verts = read_count(from, layout, "num_verts")?;
        let num_polys = read_count(from, layout, "num_polys")?;
        let num_hot_verts1 = i32::read(from, layout)?;
        let num_hot_verts2 = read_count(from, layout, "num_hot_verts2")?;
        let num_edges = read_count(from, layout, "num_edges")?;

        let x_scale = f32::read(from, layout)?;
        let z_scale = f32::read(from, layout)?;
        let num_indices = read_count(from, layout, "num_indices")?;
        let height_scale = i32::read(from, layout)?;
        let cache_size = i32::read(from, layout)?;

        let vertices = read_counted::<Point3F>(from, layout, num_verts)?;
        let mut polygons = read_counted::<Polygon>(from, layout, num_polys + 1)?;
        polygons.remove(0);

        let hot_verts = read_counted::<Point3F>(from, layout, num_hot_verts2)?;
        let edges_0 = read_counted::<u32>(from, layout, num_edges)?;
        let edges_1 = read_counted::<u32>(from, layout, num_edges)?;
        let edge_normals = read_counted::<Point3F>(from, layout, num_edges)?;
        let edge_floats = read_counted::<f32>(from, layout, num_edges)?;

        let grid = if x_dim != 0 && y_dim != 0 {
            let rows = Bnd::grid_len(z_dim, 1)?;
            let shorts = Bnd::grid_len(x_dim, z_dim)?;
            let heights = Bnd::grid_len(x_dim, x_dim)?;
            Some(BndGrid {
                row_offsets: read_counted(from, layout, rows)?,
                row_shorts: read_counted(from, layout, shorts)?,
                row_indices: read_counted(from, layout, num_indices)?,
                row_heights: read_counted(from, layout, heights)?,
            })
        } else {
            None
        };

        Ok(Bnd {
            offset,
            x_dim,
            y_dim,
            z_dim,
            center,
            radius,
            radius_sqr,
            bb_min,
            bb_max,
            num_hot_verts1,
            x_scale,
            z_scale,
            height_scale,
            cache_size,
            vertices,
            polygons,
            hot_verts,
            edges_0,
            edges_1,
            edge_normals,
            edge_floats,
            grid,
        })
    }
}

impl Writable<Bnd> for Bnd {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        let num_edges = self.edges_0.len();
        check_count("edges_1", num_edges, self.edges_1.len())?;
        check_count("edge_normals", num_edges, self.edge_normals.len())?;
        check_count("edge_floats", num_edges, self.edge_floats.len())?;

        let num_indices = match (&self.grid, self.has_grid()) {
            (Some(grid), true) => {
                check_count("row_offsets", Bnd::grid_len(self.z_dim, 1)?, grid.row_offsets.len())?;
                check_count(
                    "row_shorts",
                    Bnd::grid_len(self.x_dim, self.z_dim)?,
                    grid.row_shorts.len(),
                )?;
                check_count(
                    "row_heights",
                    Bnd::grid_len(self.x_dim, self.x_dim)?,
                    grid.row_heights.len(),
                )?;
                grid.row_indices.len()
            }
            (None, false) => 0,
            (Some(_), false) => {
                return Err(MmError::format(
                    "grid rows present but the grid dimensions are zero",
                ))
            }
            (None, true) => {
                return Err(MmError::format(
                    "grid dimensions are set but no grid rows are present",
                ))
            }
        };

        BND_MAGIC.write(to, layout)?;
        self.offset.write(to, layout)?;
        self.x_dim.write(to, layout)?;
        self.y_dim.write(to, layout)?;
        self.z_dim.write(to, layout)?;
        self.center.write(to, layout)?;
        self.radius.write(to, layout)?;
        self.radius_sqr.write(to, layout)?;
        self.bb_min.write(to, layout)?;
        self.bb_max.write(to, layout)?;

        count_field::<i32>("vertices", self.vertices.len())?.write(to, layout)?;
        count_field::<i32>("polygons", self.polygons.len())?.write(to, layout)?;
        self.num_hot_verts1.write(to, layout)?;
        count_field::<i32>("hot_verts", self.hot_verts.len())?.write(to, layout)?;
        count_field::<i32>("edges", num_edges)?.write(to, layout)?;

        self.x_scale.write(to, layout)?;
        self.z_scale.write(to, layout)?;
        count_field::<i32>("row_indices", num_indices)?.write(to, layout)?;
        self.height_scale.write(to, layout)?;
        self.cache_size.write(to, layout)?;

        write_counted(&self.vertices, to, layout)?;
        Polygon::reserved().write(to, layout)?;
        write_counted(&self.polygons, to, layout)?;

        write_counted(&self.hot_verts, to, layout)?;
        write_counted(&self.edges_0, to, layout)?;
        write_counted(&self.edges_1, to, layout)?;
        write_counted(&self.edge_normals, to, layout)?;
        write_counted(&self.edge_floats, to, layout)?;

        if let Some(grid) = &self.grid {
            write_counted(&grid.row_offsets, to, layout)?;
            write_counted(&grid.row_shorts, to, layout)?;
            write_counted(&grid.row_indices, to, layout)?;
            write_counted(&grid.row_heights, to, layout)?;
        }

        Ok(())
    }
}
