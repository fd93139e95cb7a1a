use std::collections::BTreeMap;

use cgmath::InnerSpace;
use mm::types::*;
use rayon::prelude::*;

use crate::geometry::{CellId, GeometryArena};
use crate::portal::PortalConfig;

/// A boundary segment in the XZ plane, stored as a unit line equation
/// `(nx, nz, offset)` plus the range `[v1p, v2p]` it covers along that line.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub v1: Point2F,
    pub v2: Point2F,
    pub line: Point3F,
    pub v1p: f32,
    pub v2p: f32,
    pub length: f32,
}

impl Edge {
    pub fn new(v1: Point2F, v2: Point2F) -> MmResult<Edge> {
        let a = Point2F::new(v1.y - v2.y, v2.x - v1.x);
        let c = a.dot(v1);
        let d = a.magnitude2();
        if !(d > 0.0) || !d.is_finite() {
            return Err(MmError::degenerate(format!(
                "edge ({}, {}) -> ({}, {}) has no length",
                v1.x, v1.y, v2.x, v2.y
            )));
        }

        let line = Point3F::new(a.x, a.y, -c) / d.sqrt();
        let mut edge = Edge {
            v1,
            v2,
            line,
            v1p: 0.0,
            v2p: 0.0,
            length: d.sqrt(),
        };
        edge.v1p = edge.line_pos(v1, 0.0);
        edge.v2p = edge.line_pos(v2, 0.0);
        Ok(edge)
    }

    /// Signed distance of `point` from the line.
    pub fn tangent_dist(&self, point: Point2F) -> f32 {
        point.x * self.line.x + point.y * self.line.y + self.line.z
    }

    /// Position of `point` along the line.
    pub fn line_pos(&self, point: Point2F, dist: f32) -> f32 {
        let x = point.x + self.line.x * dist;
        let y = point.y + self.line.y * dist;
        x * self.line.y - y * self.line.x
    }

    pub fn pos_to_point(&self, pos: f32) -> Point2F {
        Point2F::new(
            self.line.y * pos - self.line.x * self.line.z,
            -(self.line.x * pos) - self.line.y * self.line.z,
        )
    }

    /// Cosine between the two line normals.
    pub fn direction_dot(&self, other: &Edge) -> f32 {
        self.line.x * other.line.x + self.line.y * other.line.y
    }

    pub fn is_parallel(&self, other: &Edge, cos_tolerance: f32) -> bool {
        self.direction_dot(other).abs() >= cos_tolerance
    }

    /// Range covered by `other` on this line, provided both of its endpoints lie
    /// within `max_offset` of the line and the range overlaps this edge by more
    /// than `corner` at either end.
    pub fn overlap(&self, other: &Edge, max_offset: f32, corner: f32) -> Option<(f32, f32)> {
        let d1 = self.tangent_dist(other.v1);
        if d1.abs() > max_offset {
            return None;
        }
        let d2 = self.tangent_dist(other.v2);
        if d2.abs() > max_offset {
            return None;
        }

        let p1 = self.line_pos(other.v1, d1);
        let p2 = self.line_pos(other.v2, d2);
        let (lo, hi) = (p1.min(p2), p1.max(p2));

        if hi < self.v1p + corner || lo > self.v2p - corner {
            return None;
        }
        Some((lo, hi))
    }

    fn set_range(&mut self, v1p: f32, v2p: f32) {
        self.v1p = v1p;
        self.v2p = v2p;
        self.v1 = self.pos_to_point(v1p);
        self.v2 = self.pos_to_point(v2p);
        self.length = v2p - v1p;
    }
}

/// The boundary of every polygon sharing one cell id, flattened to XZ.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: CellId,
    pub edges: Vec<Edge>,
    pub bb_min: Point2F,
    pub bb_max: Point2F,
    pub center: Point2F,
    pub radius: f32,
}

impl Cell {
    pub fn new(id: CellId) -> Cell {
        let zero = Point2F::new(0.0, 0.0);
        Cell {
            id,
            edges: vec![],
            bb_min: zero,
            bb_max: zero,
            center: zero,
            radius: 0.0,
        }
    }

    /// Adds the segment `v1 -> v2` with its height dropped. Segments shorter
    /// than the configured tolerance are ignored.
    pub fn add_edge(&mut self, v1: Point3F, v2: Point3F, config: &PortalConfig) -> MmResult<()> {
        let v1 = Point2F::new(v1.x, v1.z);
        let v2 = Point2F::new(v2.x, v2.z);

        if (v2 - v1).magnitude2() < config.degenerate_edge_dist2 {
            return Ok(());
        }

        self.edges.push(Edge::new(v1, v2)?);
        Ok(())
    }

    /// Folds parallel, touching edges into one until no pair can be merged.
    /// Returns the number of merges performed.
    pub fn merge_colinear(&mut self, config: &PortalConfig) -> usize {
        let mut total = 0;
        loop {
            let merged = self.merge_pass(config);
            if merged == 0 {
                return total;
            }
            total += merged;
        }
    }

    fn merge_pass(&mut self, config: &PortalConfig) -> usize {
        let mut merges = 0;
        let mut i = 0;

        while i < self.edges.len() {
            let mut j = i + 1;

            while j < self.edges.len() {
                let edge1 = &self.edges[i];
                let edge2 = &self.edges[j];

                let range = if edge1.is_parallel(edge2, config.tangent_angle_fudge) {
                    edge1.overlap(edge2, config.colinear_fudge, config.corner_fudge)
                } else {
                    None
                };

                match range {
                    Some((lo, hi)) => {
                        let edge1 = &mut self.edges[i];
                        let (v1p, v2p) = (edge1.v1p.min(lo), edge1.v2p.max(hi));
                        edge1.set_range(v1p, v2p);
                        self.edges.remove(j);
                        merges += 1;
                        j = i + 1;
                    }
                    None => j += 1,
                }
            }

            i += 1;
        }

        merges
    }

    pub fn process(&mut self, config: &PortalConfig) {
        if config.merge_colinear {
            self.merge_colinear(config);
        }

        let mut points = self.edges.iter().flat_map(|e| [e.v1, e.v2]);
        let first = match points.next() {
            Some(p) => p,
            None => return,
        };
        let (bb_min, bb_max) = points.fold((first, first), |(lo, hi), p| {
            (
                Point2F::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2F::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });

        self.bb_min = bb_min;
        self.bb_max = bb_max;
        self.center = (bb_min + bb_max) * 0.5;
        self.radius = (bb_max - bb_min).magnitude() * 0.5;
    }

    /// Cheap rejection test: do the two bounding circles come within `fudge`?
    pub fn check_radius(&self, other: &Cell, fudge: f32) -> bool {
        let reach = self.radius + other.radius + fudge;
        (self.center - other.center).magnitude2() < reach * reach
    }
}

/// Groups the arena's polygons into cells by id and processes each cell.
/// The result is ordered by cell id.
pub fn build_cells(arena: &GeometryArena, config: &PortalConfig) -> MmResult<Vec<Cell>> {
    let mut cells: BTreeMap<CellId, Cell> = BTreeMap::new();

    for (index, polygon) in arena.polygons().iter().enumerate() {
        let id = CellId::new(polygon.cell_id as u32)
            .map_err(|e| e.context(format!("polygon {}", index)))?;
        let cell = cells.entry(id).or_insert_with(|| Cell::new(id));

        let points = arena.polygon_points(polygon);
        for i in 0..points.len() {
            cell.add_edge(points[i], points[(i + 1) % points.len()], config)
                .map_err(|e| e.context(format!("cell {}, polygon {}", id, index)))?;
        }
    }

    let mut cells: Vec<Cell> = cells.into_values().collect();
    cells.par_iter_mut().for_each(|cell| cell.process(config));
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point2F {
        Point2F::new(x, y)
    }

    fn cell_from_segments(segments: &[(Point2F, Point2F)]) -> Cell {
        let config = PortalConfig::default();
        let mut cell = Cell::new(CellId::new(1).unwrap());
        for (a, b) in segments {
            cell.add_edge(
                Point3F::new(a.x, 3.0, a.y),
                Point3F::new(b.x, -3.0, b.y),
                &config,
            )
            .unwrap();
        }
        cell
    }

    #[test]
    fn test_edge_invariants() {
        let pairs = [
            (p(0.0, 0.0), p(10.0, 0.0)),
            (p(10.0, 0.0), p(0.0, 0.0)),
            (p(-3.5, 7.25), p(12.0, -40.0)),
            (p(100.0, 100.0), p(100.0, 100.5)),
            (p(-250.0, 12.0), p(-251.0, 13.0)),
        ];
        for (a, b) in pairs.iter() {
            let edge = Edge::new(*a, *b).unwrap();
            assert!(edge.v1p < edge.v2p);
            assert!((edge.length - (*b - *a).magnitude()).abs() < 1e-4);
            assert!((edge.v1p + edge.length - edge.v2p).abs() < 1e-3);
            assert!(edge.tangent_dist(*a).abs() < 1e-3);
            assert!(edge.tangent_dist(*b).abs() < 1e-3);

            let back = edge.pos_to_point(edge.v1p);
            assert!((back - *a).magnitude() < 1e-3);
        }
        assert_eq!(
            Edge::new(p(1.0, 1.0), p(1.0, 1.0)).unwrap_err().kind,
            ErrorKind::Degenerate
        );
    }

    #[test]
    fn test_short_edges_are_dropped() {
        let cell = cell_from_segments(&[(p(0.0, 0.0), p(0.001, 0.0)), (p(0.0, 0.0), p(5.0, 0.0))]);
        assert_eq!(cell.edges.len(), 1);
    }

    #[test]
    fn test_merge_colinear_joins_touching_edges() {
        let mut cell = cell_from_segments(&[
            (p(0.0, 0.0), p(10.0, 0.0)),
            (p(5.0, 0.0), p(15.0, 0.0)),
            (p(20.0, 0.0), p(12.0, 0.0)),
            (p(0.0, 5.0), p(10.0, 5.0)),
        ]);
        let merges = cell.merge_colinear(&PortalConfig::default());
        assert_eq!(merges, 2);
        assert_eq!(cell.edges.len(), 2);

        let long = &cell.edges[0];
        assert!((long.length - 20.0).abs() < 1e-4);
        assert!((long.v1 - p(0.0, 0.0)).magnitude() < 1e-4);
        assert!((long.v2 - p(20.0, 0.0)).magnitude() < 1e-4);
    }

    #[test]
    fn test_merge_colinear_is_idempotent() {
        let mut cell = cell_from_segments(&[
            (p(0.0, 0.0), p(10.0, 0.0)),
            (p(8.0, 0.0), p(30.0, 0.0)),
            (p(30.0, 0.0), p(30.0, 10.0)),
            (p(30.0, 4.0), p(30.0, 20.0)),
            (p(0.0, 0.0), p(0.0, 10.0)),
            (p(25.0, 0.0), p(40.0, 0.0)),
            (p(0.0, 10.0), p(10.0, 20.0)),
        ]);
        let config = PortalConfig::default();
        cell.merge_colinear(&config);
        let once = cell.edges.clone();
        assert_eq!(cell.merge_colinear(&config), 0);
        assert_eq!(cell.edges, once);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn test_corner_contact_is_not_merged() {
        let mut cell = cell_from_segments(&[(p(0.0, 0.0), p(10.0, 0.0)), (p(10.0, 0.0), p(20.0, 0.0))]);
        assert_eq!(cell.merge_colinear(&PortalConfig::default()), 0);
        assert_eq!(cell.edges.len(), 2);
    }

    #[test]
    fn test_process_bounds() {
        let mut cell = cell_from_segments(&[
            (p(0.0, 0.0), p(20.0, 0.0)),
            (p(20.0, 0.0), p(20.0, 20.0)),
            (p(20.0, 20.0), p(0.0, 20.0)),
            (p(0.0, 20.0), p(0.0, 0.0)),
        ]);
        cell.process(&PortalConfig::default());
        assert_eq!(cell.edges.len(), 4);
        assert!((cell.center - p(10.0, 10.0)).magnitude() < 1e-4);
        assert!((cell.radius - 800.0f32.sqrt() / 2.0).abs() < 1e-4);

        let mut other = cell.clone();
        other.center = p(38.0, 10.0);
        assert!(cell.check_radius(&other, 1.0));
        other.center = p(60.0, 10.0);
        assert!(!cell.check_radius(&other, 1.0));
    }
}
