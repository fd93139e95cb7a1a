use std::fmt::{Display, Formatter};
use std::str::FromStr;

use arrayvec::ArrayVec;
use cgmath::InnerSpace;
use mm::bnd::{Bnd, Polygon, PolygonFlags};
use mm::types::*;

/// Smallest cross-product magnitude accepted as a plane normal.
pub const NORMAL_EPSILON: f32 = 1e-6;

/// Smallest squared distance between consecutive loop points.
pub const COINCIDENT_EPSILON: f32 = 1e-10;

pub type VertexLoop = ArrayVec<Point3F, 4>;

/// A cell ("bound") identifier. Zero is reserved and ids must fit the 16-bit
/// on-disk field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u16);

impl CellId {
    pub fn new(id: u32) -> MmResult<CellId> {
        if id == 0 {
            return Err(MmError::config("cell id 0 is reserved"));
        }
        u16::try_from(id)
            .map(CellId)
            .map_err(|_| MmError::config(format!("cell id {} does not fit in 16 bits", id)))
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Inside,
    Outside,
}

impl FromStr for WallSide {
    type Err = MmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inside" => Ok(WallSide::Inside),
            "outside" => Ok(WallSide::Outside),
            other => Err(MmError::config(format!(
                "unknown wall side '{}', expected 'inside' or 'outside'",
                other
            ))),
        }
    }
}

/// A world axis, used to lay out repeated props and facades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub fn get(&self, point: &Point3F) -> f32 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
            Axis::Z => point.z,
        }
    }

    pub fn with(&self, point: Point3F, value: f32) -> Point3F {
        let mut point = point;
        match self {
            Axis::X => point.x = value,
            Axis::Y => point.y = value,
            Axis::Z => point.z = value,
        }
        point
    }
}

impl FromStr for Axis {
    type Err = MmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            other => Err(MmError::config(format!(
                "unknown axis '{}', expected x, y or z",
                other
            ))),
        }
    }
}

/// Extents used to recognise an axis-aligned wall: one horizontal extent must
/// stay within `flat` while the other two exceed `spanning`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallTolerance {
    pub flat: f32,
    pub spanning: f32,
}

impl Default for WallTolerance {
    fn default() -> Self {
        WallTolerance {
            flat: 0.15,
            spanning: 0.1,
        }
    }
}

/// Authoring input for one polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSpec {
    pub cell_id: CellId,
    pub vertices: VertexLoop,
    pub material_index: u8,
    pub flags: Option<u8>,
    pub plane_edges: Option<[Point3F; 4]>,
    pub wall_side: Option<WallSide>,
    pub sort_vertices: bool,
}

impl PolygonSpec {
    pub fn new(cell_id: CellId, vertices: &[Point3F]) -> MmResult<Self> {
        if vertices.len() != 3 && vertices.len() != 4 {
            return Err(MmError::config(format!(
                "a polygon needs 3 or 4 vertices, got {}",
                vertices.len()
            ))
            .context(format!("cell {}", cell_id)));
        }
        Ok(PolygonSpec {
            cell_id,
            vertices: vertices.iter().copied().collect(),
            material_index: 0,
            flags: None,
            plane_edges: None,
            wall_side: None,
            sort_vertices: false,
        })
    }

    pub fn with_material(mut self, material_index: u8) -> Self {
        self.material_index = material_index;
        self
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_plane_edges(mut self, plane_edges: [Point3F; 4]) -> Self {
        self.plane_edges = Some(plane_edges);
        self
    }

    pub fn with_wall_side(mut self, side: WallSide) -> Self {
        self.wall_side = Some(side);
        self
    }

    pub fn sorted(mut self) -> Self {
        self.sort_vertices = true;
        self
    }

    pub fn default_flags(&self) -> u8 {
        if self.vertices.len() == 4 {
            PolygonFlags::QUAD_DEFAULT.bits()
        } else {
            PolygonFlags::TRIANGLE_DEFAULT.bits()
        }
    }
}

/// Where a freshly added polygon landed.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedPolygon {
    pub polygon: usize,
    pub indices: ArrayVec<u16, 4>,
}

/// Append-only vertex and polygon tables shared by every exporter.
#[derive(Debug, Clone, Default)]
pub struct GeometryArena {
    vertices: Vec<Point3F>,
    polygons: Vec<Polygon>,
    wall_tolerance: WallTolerance,
}

impl GeometryArena {
    pub fn new() -> GeometryArena {
        GeometryArena::default()
    }

    pub fn with_wall_tolerance(wall_tolerance: WallTolerance) -> GeometryArena {
        GeometryArena {
            wall_tolerance,
            ..GeometryArena::default()
        }
    }

    pub fn vertices(&self) -> &[Point3F] {
        &self.vertices
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// The loop of a stored polygon, in winding order.
    pub fn polygon_points(&self, polygon: &Polygon) -> VertexLoop {
        polygon
            .indices()
            .iter()
            .filter_map(|i| self.vertices.get(*i as usize).copied())
            .collect()
    }

    pub fn add_polygon(&mut self, spec: &PolygonSpec) -> MmResult<AddedPolygon> {
        let polygon_index = self.polygons.len();
        self.build_polygon(spec).map_err(|e| {
            e.context(format!("cell {}, polygon {}", spec.cell_id, polygon_index))
        })
    }

    fn build_polygon(&mut self, spec: &PolygonSpec) -> MmResult<AddedPolygon> {
        let points = if spec.sort_vertices {
            sort_vertices(&spec.vertices)?
        } else {
            spec.vertices.clone()
        };
        check_loop(&points)?;

        let flags = spec.flags.unwrap_or_else(|| spec.default_flags());
        let quad = PolygonFlags::from_bits_truncate(flags).contains(PolygonFlags::QUAD);
        if quad != (points.len() == 4) {
            return Err(MmError::config(format!(
                "flags {:#x} mark a {} but the loop has {} vertices",
                flags,
                if quad { "quad" } else { "triangle" },
                points.len()
            )));
        }

        let plane = match spec.wall_side {
            Some(side) => wall_plane(&points, side, &self.wall_tolerance)?,
            None => compute_plane(points[0], points[1], points[2])?,
        };
        let plane_edges = match spec.plane_edges {
            Some(edges) => edges,
            None => compute_plane_edges(&points, plane.normal)?,
        };

        let base = self.vertices.len();
        let mut indices = ArrayVec::<u16, 4>::new();
        for i in 0..points.len() {
            let index = u16::try_from(base + i).map_err(|_| {
                MmError::format(format!(
                    "vertex index {} does not fit the 16-bit polygon field",
                    base + i
                ))
            })?;
            indices.push(index);
        }

        let mut vertex_indices = [0u16; 4];
        vertex_indices[..indices.len()].copy_from_slice(&indices);

        self.vertices.extend(points.iter().copied());
        self.polygons.push(Polygon {
            cell_id: spec.cell_id.get(),
            material_index: spec.material_index,
            flags,
            vertex_indices,
            plane_edges,
            plane,
        });

        Ok(AddedPolygon {
            polygon: self.polygons.len() - 1,
            indices,
        })
    }

    /// Collision bounds for the whole map: centroid, enclosing radius and box
    /// over every vertex, no acceleration grid.
    pub fn to_bnd(&self) -> MmResult<Bnd> {
        let bounds = BoxF::from_points(self.vertices.iter())
            .ok_or_else(|| MmError::config("cannot build collision bounds without polygons"))?;

        let center =
            self.vertices.iter().fold(Point3F::new(0.0, 0.0, 0.0), |acc, v| acc + *v)
                / self.vertices.len() as f32;
        let radius_sqr = self
            .vertices
            .iter()
            .map(|v| (*v - center).magnitude2())
            .fold(0.0f32, f32::max);

        Ok(Bnd {
            offset: Point3F::new(0.0, 0.0, 0.0),
            x_dim: 0,
            y_dim: 0,
            z_dim: 0,
            center,
            radius: radius_sqr.sqrt(),
            radius_sqr,
            bb_min: bounds.min,
            bb_max: bounds.max,
            num_hot_verts1: 0,
            x_scale: 0.0,
            z_scale: 0.0,
            height_scale: 0,
            cache_size: 0,
            vertices: self.vertices.clone(),
            polygons: self.polygons.clone(),
            hot_verts: vec![],
            edges_0: vec![],
            edges_1: vec![],
            edge_normals: vec![],
            edge_floats: vec![],
            grid: None,
        })
    }
}

fn check_loop(points: &[Point3F]) -> MmResult<()> {
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        if (b - a).magnitude2() < COINCIDENT_EPSILON {
            return Err(MmError::degenerate(format!(
                "loop points {} and {} coincide",
                i,
                (i + 1) % points.len()
            )));
        }
    }
    Ok(())
}

/// Unit normal from `(p2 - p1) x (p3 - p1)` and `d = -n . p1`.
pub fn compute_plane(p1: Point3F, p2: Point3F, p3: Point3F) -> MmResult<PlaneF> {
    let cross = (p2 - p1).cross(p3 - p1);
    let length = cross.magnitude();
    if !(length > NORMAL_EPSILON) {
        return Err(MmError::degenerate(
            "plane points are collinear, no normal can be computed",
        ));
    }
    let normal = cross / length;
    Ok(PlaneF {
        normal,
        distance: -normal.dot(p1),
    })
}

/// Axis-aligned plane for a vertical quad. A wall spanning X and Y gets a Z
/// facing plane, a wall spanning Z and Y gets an X facing plane.
pub fn wall_plane(points: &[Point3F], side: WallSide, tolerance: &WallTolerance) -> MmResult<PlaneF> {
    let bounds = BoxF::from_points(points.iter())
        .ok_or_else(|| MmError::config("wall has no vertices"))?;
    let extent = bounds.extent();

    let spans_xy = extent.x > tolerance.spanning
        && extent.y > tolerance.spanning
        && extent.z.abs() <= tolerance.flat;
    let spans_zy = extent.x.abs() <= tolerance.flat
        && extent.y > tolerance.spanning
        && extent.z > tolerance.spanning;

    let (normal, distance) = if spans_xy {
        match side {
            WallSide::Outside => (Point3F::new(0.0, 0.0, -1.0), bounds.max.z),
            WallSide::Inside => (Point3F::new(0.0, 0.0, 1.0), -bounds.max.z),
        }
    } else if spans_zy {
        match side {
            WallSide::Outside => (Point3F::new(-1.0, 0.0, 0.0), bounds.min.x),
            WallSide::Inside => (Point3F::new(1.0, 0.0, 0.0), -bounds.min.x),
        }
    } else {
        return Err(MmError::config(format!(
            "wall-side polygon is not an axis-aligned wall (extent {:.3} x {:.3} x {:.3})",
            extent.x, extent.y, extent.z
        )));
    };

    Ok(PlaneF { normal, distance })
}

/// Picks the 2D coordinate pair the edge equations live in, and the sign that
/// makes them face outward.
fn edge_projection(normal: Point3F) -> (usize, usize, f32) {
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());

    if ax < ay || ax < az {
        if ay < ax || ay < az {
            (0, 1, if normal.z < 0.0 { -1.0 } else { 1.0 })
        } else {
            (0, 2, if normal.y > 0.0 { -1.0 } else { 1.0 })
        }
    } else {
        (1, 2, if normal.x < 0.0 { -1.0 } else { 1.0 })
    }
}

/// One normalized 2D line equation per consecutive vertex pair. Triangles get
/// a zero fourth entry.
pub fn compute_plane_edges(points: &[Point3F], normal: Point3F) -> MmResult<[Point3F; 4]> {
    let (a, b, negate) = edge_projection(normal);
    let mut edges = [Point3F::new(0.0, 0.0, 0.0); 4];

    for i in 0..points.len().min(4) {
        let start = points[i];
        let delta = points[(i + 1) % points.len()] - start;
        let (da, db) = (delta[a], delta[b]);

        let edge = Point3F::new(
            -db * negate,
            da * negate,
            -(-db * start[a] + da * start[b]),
        );
        let norm = (edge.x * edge.x + edge.y * edge.y).sqrt();
        if !(norm > NORMAL_EPSILON) {
            return Err(MmError::degenerate(format!(
                "edge {} has no extent in the projection plane",
                i
            )));
        }
        edges[i] = edge / norm;
    }

    Ok(edges)
}

fn extreme_z(points: &[Point3F], x: f32, highest: bool) -> Option<Point3F> {
    points
        .iter()
        .filter(|p| p.x == x)
        .copied()
        .reduce(|best, p| {
            if (highest && p.z > best.z) || (!highest && p.z < best.z) {
                p
            } else {
                best
            }
        })
}

/// Reorders a quad as `[max-z of max-x, min-z of max-x, min-z of min-x,
/// max-z of min-x]`.
pub fn sort_vertices(points: &[Point3F]) -> MmResult<VertexLoop> {
    if points.len() != 4 {
        return Err(MmError::config("only quads can have their vertices sorted"));
    }
    let max_x = points.iter().map(|p| p.x).fold(f32::MIN, f32::max);
    let min_x = points.iter().map(|p| p.x).fold(f32::MAX, f32::min);

    [
        extreme_z(points, max_x, true),
        extreme_z(points, max_x, false),
        extreme_z(points, min_x, false),
        extreme_z(points, min_x, true),
    ]
    .into_iter()
    .map(|p| p.ok_or_else(|| MmError::config("quad has no extreme corner")))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, z: f32, size: f32) -> Vec<Point3F> {
        vec![
            Point3F::new(x, 0.0, z),
            Point3F::new(x + size, 0.0, z),
            Point3F::new(x + size, 0.0, z + size),
            Point3F::new(x, 0.0, z + size),
        ]
    }

    fn cell(id: u32) -> CellId {
        CellId::new(id).unwrap()
    }

    #[test]
    fn test_cell_id_domain() {
        assert_eq!(CellId::new(0).unwrap_err().kind, ErrorKind::Config);
        assert!(CellId::new(70000).is_err());
        assert_eq!(CellId::new(860).unwrap().get(), 860);
    }

    #[test]
    fn test_axis() {
        let p = Point3F::new(1.0, 2.0, 3.0);
        assert_eq!("z".parse::<Axis>().unwrap().get(&p), 3.0);
        assert_eq!(Axis::Y.with(p, 9.0), Point3F::new(1.0, 9.0, 3.0));
        assert_eq!("w".parse::<Axis>().unwrap_err().kind, ErrorKind::Config);
    }

    #[test]
    fn test_plane_normal_is_unit() {
        let triples = [
            (
                Point3F::new(0.0, 0.0, 0.0),
                Point3F::new(1.0, 0.0, 0.0),
                Point3F::new(0.0, 0.0, 1.0),
            ),
            (
                Point3F::new(-350.0, 12.0, 80.0),
                Point3F::new(-310.5, 14.0, 80.0),
                Point3F::new(-310.5, 20.0, 140.25),
            ),
            (
                Point3F::new(0.1, 0.2, 0.3),
                Point3F::new(5.0, -3.0, 2.0),
                Point3F::new(-4.0, 8.0, 1.0),
            ),
        ];
        for (p1, p2, p3) in triples.iter() {
            let plane = compute_plane(*p1, *p2, *p3).unwrap();
            assert!((plane.normal.magnitude() - 1.0).abs() < 1e-6);
            assert!(plane.distance_to(*p1).abs() < 1e-3);
            assert!(plane.distance_to(*p3).abs() < 1e-3);
        }
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let err = compute_plane(
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(1.0, 1.0, 1.0),
            Point3F::new(2.0, 2.0, 2.0),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Degenerate);
    }

    #[test]
    fn test_vertex_count_is_checked() {
        let points = square(0.0, 0.0, 10.0);
        assert_eq!(
            PolygonSpec::new(cell(1), &points[..2]).unwrap_err().kind,
            ErrorKind::Config
        );
        let mut five = points.clone();
        five.push(Point3F::new(5.0, 0.0, 15.0));
        assert!(PolygonSpec::new(cell(1), &five).is_err());
    }

    #[test]
    fn test_floor_plane_edges() {
        let mut arena = GeometryArena::new();
        let spec = PolygonSpec::new(cell(1), &square(0.0, 0.0, 10.0)).unwrap();
        let added = arena.add_polygon(&spec).unwrap();
        let polygon = &arena.polygons()[added.polygon];

        assert_eq!(polygon.flags, 6);
        assert_eq!(polygon.plane.normal, Point3F::new(0.0, -1.0, 0.0));
        let expected = [
            Point3F::new(0.0, 1.0, 0.0),
            Point3F::new(-1.0, 0.0, 10.0),
            Point3F::new(0.0, -1.0, 10.0),
            Point3F::new(1.0, 0.0, 0.0),
        ];
        for (edge, want) in polygon.plane_edges.iter().zip(expected.iter()) {
            assert!((*edge - *want).magnitude() < 1e-5, "{:?} != {:?}", edge, want);
        }
    }

    #[test]
    fn test_triangle_is_padded() {
        let mut arena = GeometryArena::new();
        arena
            .add_polygon(&PolygonSpec::new(cell(1), &square(0.0, 0.0, 10.0)).unwrap())
            .unwrap();
        let triangle = [
            Point3F::new(20.0, 0.0, 0.0),
            Point3F::new(30.0, 0.0, 0.0),
            Point3F::new(30.0, 0.0, 10.0),
        ];
        let added = arena
            .add_polygon(&PolygonSpec::new(cell(2), &triangle).unwrap())
            .unwrap();
        assert_eq!(added.indices.as_slice(), &[4, 5, 6]);

        let polygon = &arena.polygons()[added.polygon];
        assert_eq!(polygon.flags, 3);
        assert!(!polygon.is_quad());
        assert_eq!(polygon.vertex_indices, [4, 5, 6, 0]);
        assert_eq!(polygon.plane_edges.len(), 4);
        assert_eq!(polygon.plane_edges[3], Point3F::new(0.0, 0.0, 0.0));
        assert_eq!(arena.vertices().len(), 7);
    }

    #[test]
    fn test_flags_must_match_vertex_count() {
        let mut arena = GeometryArena::new();
        arena
            .add_polygon(&PolygonSpec::new(cell(1), &square(100.0, 100.0, 10.0)).unwrap())
            .unwrap();
        let triangle = [
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(10.0, 0.0, 0.0),
            Point3F::new(10.0, 0.0, 10.0),
        ];

        let quad_flags = PolygonSpec::new(cell(2), &triangle).unwrap().with_flags(6);
        let err = arena.add_polygon(&quad_flags).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.starts_with("cell 2"));
        assert_eq!(arena.polygons().len(), 1);
        assert_eq!(arena.vertices().len(), 4);

        let triangle_flags = PolygonSpec::new(cell(2), &square(0.0, 0.0, 10.0)).unwrap().with_flags(3);
        assert!(arena.add_polygon(&triangle_flags).is_err());

        let edge_flags = PolygonSpec::new(cell(2), &triangle).unwrap().with_flags(1);
        let added = arena.add_polygon(&edge_flags).unwrap();
        let points = arena.polygon_points(&arena.polygons()[added.polygon]);
        assert_eq!(points.as_slice(), &triangle);
    }

    #[test]
    fn test_wall_planes() {
        let tolerance = WallTolerance::default();
        let z_wall = [
            Point3F::new(0.0, 0.0, 5.0),
            Point3F::new(10.0, 0.0, 5.0),
            Point3F::new(10.0, 8.0, 5.0),
            Point3F::new(0.0, 8.0, 5.0),
        ];
        let outside = wall_plane(&z_wall, WallSide::Outside, &tolerance).unwrap();
        assert_eq!(outside.normal, Point3F::new(0.0, 0.0, -1.0));
        assert_eq!(outside.distance, 5.0);
        let inside = wall_plane(&z_wall, WallSide::Inside, &tolerance).unwrap();
        assert_eq!(inside.normal, Point3F::new(0.0, 0.0, 1.0));
        assert_eq!(inside.distance, -5.0);

        let x_wall = [
            Point3F::new(3.0, 0.0, 0.0),
            Point3F::new(3.0, 0.0, 10.0),
            Point3F::new(3.0, 8.0, 10.0),
            Point3F::new(3.0, 8.0, 0.0),
        ];
        let outside = wall_plane(&x_wall, WallSide::Outside, &tolerance).unwrap();
        assert_eq!(outside.normal, Point3F::new(-1.0, 0.0, 0.0));
        assert_eq!(outside.distance, 3.0);

        let floor = square(0.0, 0.0, 10.0);
        let err = wall_plane(&floor, WallSide::Inside, &tolerance).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn test_wall_polygon_gets_edges() {
        let mut arena = GeometryArena::new();
        let wall = [
            Point3F::new(0.0, 0.0, 5.0),
            Point3F::new(10.0, 0.0, 5.0),
            Point3F::new(10.0, 8.0, 5.0),
            Point3F::new(0.0, 8.0, 5.0),
        ];
        let spec = PolygonSpec::new(cell(3), &wall)
            .unwrap()
            .with_wall_side(WallSide::Outside);
        let added = arena.add_polygon(&spec).unwrap();
        let polygon = &arena.polygons()[added.polygon];
        assert!(polygon
            .plane_edges
            .iter()
            .all(|e| e.x.is_finite() && e.y.is_finite() && e.z.is_finite()));
        assert!(polygon
            .plane_edges
            .iter()
            .all(|e| ((e.x * e.x + e.y * e.y).sqrt() - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_error_names_the_cell() {
        let mut arena = GeometryArena::new();
        let points = [
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(1.0, 0.0, 1.0),
        ];
        let err = arena
            .add_polygon(&PolygonSpec::new(cell(42), &points).unwrap())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Degenerate);
        assert!(err.message.starts_with("cell 42, polygon 0"));
        assert!(arena.is_empty());
        assert!(arena.vertices().is_empty());
    }

    #[test]
    fn test_sort_vertices() {
        let scrambled = [
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(10.0, 0.0, 10.0),
            Point3F::new(0.0, 0.0, 10.0),
            Point3F::new(10.0, 0.0, 0.0),
        ];
        let sorted = sort_vertices(&scrambled).unwrap();
        assert_eq!(
            sorted.as_slice(),
            &[
                Point3F::new(10.0, 0.0, 10.0),
                Point3F::new(10.0, 0.0, 0.0),
                Point3F::new(0.0, 0.0, 0.0),
                Point3F::new(0.0, 0.0, 10.0),
            ]
        );
    }

    #[test]
    fn test_to_bnd() {
        let mut arena = GeometryArena::new();
        assert_eq!(arena.to_bnd().unwrap_err().kind, ErrorKind::Config);

        arena
            .add_polygon(&PolygonSpec::new(cell(1), &square(-10.0, -10.0, 20.0)).unwrap())
            .unwrap();
        let bnd = arena.to_bnd().unwrap();
        assert_eq!(bnd.center, Point3F::new(0.0, 0.0, 0.0));
        assert!((bnd.radius - 200.0f32.sqrt()).abs() < 1e-4);
        assert!((bnd.radius_sqr - 200.0).abs() < 1e-3);
        assert_eq!(bnd.bb_min, Point3F::new(-10.0, 0.0, -10.0));
        assert_eq!(bnd.polygons.len(), 1);
        assert!(bnd.to_bytes().is_ok());
    }
}
