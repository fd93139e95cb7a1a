use std::fmt::Write;
use std::str::FromStr;

use mm::types::*;

/// Row kind for ordinary mesh cells in the CELLS file.
pub const CELL_FLAGS_DEFAULT: u32 = 8;
/// Row kind for cells whose mesh carries water textures.
pub const CELL_FLAGS_WATER: u32 = 32;

const BRIDGE_FILLER: &str = "tpcrossgate06,0,-999.99,0.00,-999.99,-999.99,0.00,-999.99";
const BRIDGE_FILLER_LINES: usize = 5;
const BRIDGE_FACING_DISTANCE: f32 = 10.0;

/// One row of the CELLS file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRow {
    pub id: u16,
    pub water: bool,
    pub cell_type: u32,
}

/// Floats print with at least one decimal, integers-valued ones as `10.0`.
fn number(value: f32) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn cells_file(rows: &[CellRow]) -> MmResult<String> {
    let max_id = rows
        .iter()
        .map(|r| r.id as u32)
        .max()
        .ok_or_else(|| MmError::config("CELLS needs at least one mesh cell"))?;

    let mut rows = rows.to_vec();
    rows.sort_by_key(|r| r.id);

    let mut out = format!("{}\n{}\n", rows.len(), max_id + 1000);
    for row in rows {
        let flags = if row.water {
            CELL_FLAGS_WATER
        } else {
            CELL_FLAGS_DEFAULT
        };
        let _ = writeln!(out, "{},{},{},1,1", row.id, flags, row.cell_type);
    }
    Ok(out)
}

/// Map extent as `min_x min_z max_x max_z`, no trailing newline.
pub fn ext_file(vertices: &[Point3F]) -> MmResult<String> {
    let bounds = BoxF::from_points(vertices.iter())
        .ok_or_else(|| MmError::config("EXT needs at least one vertex"))?;
    Ok(format!(
        "{} {} {} {}",
        number(bounds.min.x),
        number(bounds.min.z),
        number(bounds.max.x),
        number(bounds.max.z)
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOrientation {
    Vertical,
    VerticalFlipped,
    HorizontalEast,
    HorizontalWest,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl BridgeOrientation {
    /// Unit steps on x and z toward the point the bridge faces.
    fn direction(&self) -> (f32, f32) {
        match self {
            BridgeOrientation::Vertical => (-1.0, 0.0),
            BridgeOrientation::VerticalFlipped => (1.0, 0.0),
            BridgeOrientation::HorizontalEast => (0.0, 1.0),
            BridgeOrientation::HorizontalWest => (0.0, -1.0),
            BridgeOrientation::NorthEast => (1.0, 1.0),
            BridgeOrientation::NorthWest => (1.0, -1.0),
            BridgeOrientation::SouthEast => (-1.0, 1.0),
            BridgeOrientation::SouthWest => (-1.0, -1.0),
        }
    }
}

impl FromStr for BridgeOrientation {
    type Err = MmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V" => Ok(BridgeOrientation::Vertical),
            "V.F" => Ok(BridgeOrientation::VerticalFlipped),
            "H.E" => Ok(BridgeOrientation::HorizontalEast),
            "H.W" => Ok(BridgeOrientation::HorizontalWest),
            "N.E" => Ok(BridgeOrientation::NorthEast),
            "N.W" => Ok(BridgeOrientation::NorthWest),
            "S.E" => Ok(BridgeOrientation::SouthEast),
            "S.W" => Ok(BridgeOrientation::SouthWest),
            other => Err(MmError::config(format!(
                "unknown bridge orientation '{}', expected V, V.F, H.E, H.W, N.E, N.W, S.E or S.W",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bridge {
    pub offset: Point3F,
    pub orientation: BridgeOrientation,
    pub number: u32,
    pub object: String,
}

impl Bridge {
    pub fn facing(&self) -> Point3F {
        let (dx, dz) = self.orientation.direction();
        Point3F::new(
            self.offset.x + dx * BRIDGE_FACING_DISTANCE,
            self.offset.y,
            self.offset.z + dz * BRIDGE_FACING_DISTANCE,
        )
    }

    pub fn gizmo_block(&self) -> String {
        let facing = self.facing();
        let mut out = format!("DrawBridge{}\n", self.number);
        // Object line ends with a space; five tab-indented filler lines follow.
        let _ = writeln!(
            out,
            "\t{},0,{},{},{},{},{},{} ",
            self.object,
            number(self.offset.x),
            number(self.offset.y),
            number(self.offset.z),
            number(facing.x),
            number(facing.y),
            number(facing.z)
        );
        for _ in 0..BRIDGE_FILLER_LINES {
            let _ = writeln!(out, "\t{}", BRIDGE_FILLER);
        }
        let _ = write!(out, "DrawBridge{}", self.number);
        out
    }
}

pub fn gizmo_file(bridges: &[Bridge]) -> String {
    bridges
        .iter()
        .map(Bridge::gizmo_block)
        .collect::<Vec<_>>()
        .join("\n")
}
