use mm::types::*;

/// Numeric inputs shared by the parametrised texture-coordinate modes.
#[derive(Debug, Clone, PartialEq)]
pub struct TexCoordParams {
    pub repeat_x: f32,
    pub repeat_y: f32,
    pub tilt: f32,
    /// Rotation of the first two and the last two corners, in degrees.
    pub angles: (f32, f32),
    pub custom: Option<Vec<f32>>,
}

impl Default for TexCoordParams {
    fn default() -> Self {
        TexCoordParams {
            repeat_x: 1.0,
            repeat_y: 1.0,
            tilt: 0.0,
            angles: (45.0, 45.0),
            custom: None,
        }
    }
}

/// How a quad's UVs are laid out. Each mode resolves to four (u, v) pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum TexCoordMode {
    Horizontal,
    HorizontalFlipped,
    Vertical,
    VerticalFlipped,
    RepeatingHorizontal { repeat_x: f32, repeat_y: f32 },
    RepeatingHorizontalFlipped { repeat_x: f32, repeat_y: f32 },
    RepeatingVertical { repeat_x: f32, repeat_y: f32 },
    RepeatingVerticalFlipped { repeat_x: f32, repeat_y: f32 },
    RotatingRepeating {
        repeat_x: f32,
        repeat_y: f32,
        angles: (f32, f32),
    },
    Custom([f32; 8]),
    Combined { tilt: f32 },
}

pub const MODE_NAMES: [&str; 20] = [
    "H",
    "horizontal",
    "H.f",
    "horizontal_flipped",
    "V",
    "vertical",
    "V.f",
    "vertical_flipped",
    "r.H",
    "repeating_horizontal",
    "r.H.f",
    "repeating_horizontal_flipped",
    "r.V",
    "repeating_vertical",
    "r.V.f",
    "repeating_vertical_flipped",
    "r.r",
    "rotating_repeating",
    "custom",
    "combined",
];

impl TexCoordMode {
    /// Resolves a mode tag and its parameters. Unknown tags and a `custom` mode
    /// without exactly eight values are rejected here, before any geometry.
    pub fn parse(name: &str, params: &TexCoordParams) -> MmResult<TexCoordMode> {
        let (repeat_x, repeat_y) = (params.repeat_x, params.repeat_y);
        let mode = match name {
            "H" | "horizontal" => TexCoordMode::Horizontal,
            "H.f" | "horizontal_flipped" => TexCoordMode::HorizontalFlipped,
            "V" | "vertical" => TexCoordMode::Vertical,
            "V.f" | "vertical_flipped" => TexCoordMode::VerticalFlipped,
            "r.H" | "repeating_horizontal" => TexCoordMode::RepeatingHorizontal { repeat_x, repeat_y },
            "r.H.f" | "repeating_horizontal_flipped" => {
                TexCoordMode::RepeatingHorizontalFlipped { repeat_x, repeat_y }
            }
            "r.V" | "repeating_vertical" => TexCoordMode::RepeatingVertical { repeat_x, repeat_y },
            "r.V.f" | "repeating_vertical_flipped" => {
                TexCoordMode::RepeatingVerticalFlipped { repeat_x, repeat_y }
            }
            "r.r" | "rotating_repeating" => TexCoordMode::RotatingRepeating {
                repeat_x,
                repeat_y,
                angles: params.angles,
            },
            "custom" => {
                let values = params
                    .custom
                    .as_ref()
                    .ok_or_else(|| MmError::config("texture mode 'custom' needs explicit values"))?;
                let values: [f32; 8] = values.as_slice().try_into().map_err(|_| {
                    MmError::config(format!(
                        "texture mode 'custom' needs 8 values, got {}",
                        values.len()
                    ))
                })?;
                TexCoordMode::Custom(values)
            }
            "combined" => TexCoordMode::Combined { tilt: params.tilt },
            other => {
                return Err(MmError::config(format!(
                    "unknown texture mode '{}', expected one of: {}",
                    other,
                    MODE_NAMES.join(", ")
                )))
            }
        };
        Ok(mode)
    }

    /// The four (u, v) pairs, flattened.
    pub fn coords(&self) -> [f32; 8] {
        match *self {
            TexCoordMode::Vertical => [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            TexCoordMode::VerticalFlipped => [0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
            TexCoordMode::Horizontal => [0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            TexCoordMode::HorizontalFlipped => [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            TexCoordMode::RepeatingVertical { repeat_x: x, repeat_y: y } => {
                [0.0, 0.0, 0.0, x, y, x, y, 0.0]
            }
            TexCoordMode::RepeatingVerticalFlipped { repeat_x: x, repeat_y: y } => {
                [0.0, x, 0.0, 0.0, y, 0.0, y, x]
            }
            TexCoordMode::RepeatingHorizontal { repeat_x: x, repeat_y: y } => {
                [0.0, 0.0, x, 0.0, x, y, 0.0, y]
            }
            TexCoordMode::RepeatingHorizontalFlipped { repeat_x: x, repeat_y: y } => {
                [x, 0.0, 0.0, 0.0, 0.0, y, x, y]
            }
            TexCoordMode::RotatingRepeating {
                repeat_x: x,
                repeat_y: y,
                angles: (first, second),
            } => {
                let corners = [(0.0, 0.0, first), (x, 0.0, first), (x, y, second), (0.0, y, second)];
                let mut out = [0.0; 8];
                for (i, (u, v, degrees)) in corners.iter().enumerate() {
                    let (sin, cos) = degrees.to_radians().sin_cos();
                    out[i * 2] = u * cos - v * sin;
                    out[i * 2 + 1] = u * sin + v * cos;
                }
                out
            }
            TexCoordMode::Custom(values) => values,
            TexCoordMode::Combined { tilt } => [0.0, 0.0, 1.0, 0.0, 1.0, 1.0 + tilt, 0.0, 2.0],
        }
    }

    /// UVs for a loop of `vertex_count` points; triangles drop the last pair.
    pub fn coords_for(&self, vertex_count: usize) -> Vec<f32> {
        let coords = self.coords();
        coords[..(vertex_count * 2).min(coords.len())].to_vec()
    }
}
