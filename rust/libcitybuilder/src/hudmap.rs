use image::codecs::jpeg::JpegEncoder;
use image::{ImageEncoder, Rgb, RgbImage};
use mm::types::*;

pub const HUD_WIDTHS: [u32; 2] = [640, 320];
pub const JPEG_QUALITY: u8 = 90;

/// Parses `#rrggbb`.
pub fn parse_color(text: &str) -> MmResult<Rgb<u8>> {
    let hex = text
        .strip_prefix('#')
        .filter(|h| h.len() == 6 && h.is_ascii())
        .ok_or_else(|| MmError::config(format!("colour '{}' is not #rrggbb", text)))?;
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| MmError::config(format!("colour '{}' is not #rrggbb", text)))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudShape {
    /// Outline in world XZ.
    pub points: Vec<Point2F>,
    pub fill: Option<Rgb<u8>>,
}

#[derive(Debug, Clone)]
pub struct HudMap {
    pub shapes: Vec<HudShape>,
    pub outline: Option<Rgb<u8>>,
    pub background: Rgb<u8>,
}

impl HudMap {
    pub fn new(outline: Option<Rgb<u8>>) -> Self {
        HudMap {
            shapes: vec![],
            outline,
            background: Rgb([0, 0, 0]),
        }
    }

    pub fn add_shape(&mut self, points: &[Point3F], fill: Option<Rgb<u8>>) {
        self.shapes.push(HudShape {
            points: points.iter().map(|p| Point2F::new(p.x, p.z)).collect(),
            fill,
        });
    }

    fn extent(&self) -> Option<(Point2F, Point2F)> {
        let mut points = self.shapes.iter().flat_map(|s| s.points.iter());
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point2F::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2F::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Draws the map `width` pixels wide, keeping the aspect of the XZ extent.
    /// World +z points down the image.
    pub fn render(&self, width: u32) -> MmResult<RgbImage> {
        let (lo, hi) = self
            .extent()
            .ok_or_else(|| MmError::config("minimap has no shapes"))?;
        let span = hi - lo;
        if !(span.x > 0.0) || !(span.y > 0.0) || width == 0 {
            return Err(MmError::degenerate("minimap extent is empty"));
        }
        let scale = (width - 1) as f32 / span.x;
        let height = (span.y * scale).round() as u32 + 1;

        let mut img = RgbImage::from_pixel(width, height, self.background);
        let to_pixel = |p: &Point2F| Point2F::new((p.x - lo.x) * scale, (p.y - lo.y) * scale);

        for shape in &self.shapes {
            let pixels: Vec<Point2F> = shape.points.iter().map(to_pixel).collect();
            if let Some(fill) = shape.fill {
                fill_polygon(&mut img, &pixels, fill);
            }
        }
        if let Some(outline) = self.outline {
            for shape in &self.shapes {
                let pixels: Vec<Point2F> = shape.points.iter().map(to_pixel).collect();
                for i in 0..pixels.len() {
                    draw_line(&mut img, pixels[i], pixels[(i + 1) % pixels.len()], outline);
                }
            }
        }
        Ok(img)
    }

    pub fn to_jpeg(&self, width: u32) -> MmResult<Vec<u8>> {
        let img = self.render(width)?;
        let mut v = Vec::new();
        JpegEncoder::new_with_quality(&mut v, JPEG_QUALITY)
            .write_image(&img, img.width(), img.height(), image::ExtendedColorType::Rgb8)
            .map_err(|e| MmError::format(format!("minimap encoding failed: {}", e)))?;
        Ok(v)
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_line(img: &mut RgbImage, a: Point2F, b: Point2F, color: Rgb<u8>) {
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put(img, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Even-odd scanline fill sampled at pixel centres.
fn fill_polygon(img: &mut RgbImage, points: &[Point2F], color: Rgb<u8>) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_y = points
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
        .ceil()
        .min((img.height() - 1) as f32) as u32;

    let mut crossings = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        let sample = y as f32 + 0.5;
        crossings.clear();
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            if (a.y <= sample) != (b.y <= sample) {
                crossings.push(a.x + (sample - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));
        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0) as i64;
            let end = (pair[1] - 0.5).floor() as i64;
            for x in start..=end {
                put(img, x, y as i64, color);
            }
        }
    }
}
