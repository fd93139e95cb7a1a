use std::collections::BTreeMap;

use mm::bms::{Bms, TextureName, DEFAULT_DARKNESS, DEFAULT_FLAGS, INDICES_PER_SURFACE};
use mm::types::*;

use crate::geometry::{CellId, GeometryArena};
use crate::texcoords::TexCoordMode;

/// Cells below this id are landmarks and get their own mesh folder.
pub const LANDMARK_CELL_LIMIT: u16 = 200;

const WATER_TEXTURE_PREFIX: &str = "T_WATER";

/// What a polygon looks like on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub texture: String,
    /// Per-vertex shading, `DEFAULT_DARKNESS` when absent.
    pub darkness: Option<Vec<i8>>,
    pub tex_coords: Option<TexCoordMode>,
}

impl Surface {
    pub fn new(texture: &str) -> Self {
        Surface {
            texture: texture.to_owned(),
            darkness: None,
            tex_coords: None,
        }
    }

    pub fn is_water(&self) -> bool {
        self.texture.starts_with(WATER_TEXTURE_PREFIX)
    }
}

/// The visible mesh of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMesh {
    pub cell: CellId,
    pub water: bool,
    pub bms: Bms,
}

impl CellMesh {
    pub fn file_name(&self) -> String {
        let suffix = if self.water { "A2" } else { "H" };
        format!("CULL{:02}_{}.bms", self.cell.get(), suffix)
    }

    pub fn folder(&self, city: &str) -> String {
        if self.cell.get() < LANDMARK_CELL_LIMIT {
            format!("{}LM", city)
        } else {
            format!("{}CITY", city)
        }
    }
}

/// Groups every textured polygon by cell and emits one mesh per cell.
/// `surfaces` runs parallel to the arena's polygon list.
pub fn build_meshes(arena: &GeometryArena, surfaces: &[Option<Surface>]) -> MmResult<Vec<CellMesh>> {
    let mut by_cell: BTreeMap<u16, Vec<(usize, &Surface)>> = BTreeMap::new();
    for (index, surface) in surfaces.iter().enumerate() {
        if let Some(surface) = surface {
            let polygon = arena
                .polygons()
                .get(index)
                .ok_or_else(|| MmError::config(format!("surface {} has no polygon", index)))?;
            by_cell.entry(polygon.cell_id).or_default().push((index, surface));
        }
    }

    by_cell
        .into_iter()
        .map(|(cell_id, polygons)| {
            build_cell_mesh(arena, CellId::new(cell_id as u32)?, &polygons)
                .map_err(|e| e.context(format!("mesh of cell {}", cell_id)))
        })
        .collect()
}

fn build_cell_mesh(arena: &GeometryArena, cell: CellId, polygons: &[(usize, &Surface)]) -> MmResult<CellMesh> {
    let mut textures: Vec<String> = vec![];
    let mut coordinates = vec![];
    let mut texture_darkness = vec![];
    let mut tex_coords = vec![];
    let mut surface_sides = vec![];
    let mut indices = vec![];

    for (index, surface) in polygons {
        let points = arena.polygon_points(&arena.polygons()[*index]);
        let base = coordinates.len();

        let slot = match textures.iter().position(|t| *t == surface.texture) {
            Some(slot) => slot,
            None => {
                textures.push(surface.texture.clone());
                textures.len() - 1
            }
        };
        surface_sides.push(i8::try_from(slot + 1).map_err(|_| {
            MmError::format(format!("cell uses more than {} textures", i8::MAX))
        })?);

        match &surface.darkness {
            Some(darkness) if darkness.len() != points.len() => {
                return Err(MmError::config(format!(
                    "polygon {} has {} vertices but {} darkness values",
                    index,
                    points.len(),
                    darkness.len()
                )))
            }
            Some(darkness) => texture_darkness.extend_from_slice(darkness),
            None => texture_darkness.extend(std::iter::repeat(DEFAULT_DARKNESS).take(points.len())),
        }

        match &surface.tex_coords {
            Some(mode) => tex_coords.extend(mode.coords_for(points.len())),
            None => tex_coords.extend(std::iter::repeat(0.0).take(points.len() * 2)),
        }

        for i in 0..INDICES_PER_SURFACE {
            let index = if i < points.len() { base + i } else { 0 };
            indices.push(u16::try_from(index).map_err(|_| {
                MmError::format(format!("mesh index {} does not fit 16 bits", index))
            })?);
        }
        coordinates.extend(points);
    }

    let enclosed_shape = enclosed_shape(coordinates.len())?;
    let water = textures.iter().any(|t| t.starts_with(WATER_TEXTURE_PREFIX));
    Ok(CellMesh {
        cell,
        water,
        bms: Bms {
            radius: 0.0,
            radius_sq: 0.0,
            bounding_box_radius: 0.0,
            flags: DEFAULT_FLAGS,
            textures: textures.iter().map(|t| TextureName::new(t)).collect(),
            coordinates,
            texture_darkness,
            tex_coords,
            enclosed_shape,
            surface_sides,
            indices,
        },
    })
}

/// One adjunct per mesh vertex, numbered in order.
fn enclosed_shape(adjunct_count: usize) -> MmResult<Vec<u16>> {
    let count = u16::try_from(adjunct_count).map_err(|_| {
        MmError::format(format!("{} mesh vertices do not fit 16 bits", adjunct_count))
    })?;
    Ok((0..count).collect())
}
