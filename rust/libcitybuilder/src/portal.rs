use std::cmp::Ordering;
use std::collections::BTreeSet;

use cgmath::InnerSpace;
use itertools::Itertools;
use mm::ptl::{PortalRecord, Ptl};
use mm::types::*;
use rayon::prelude::*;

use crate::cell::Cell;
use crate::geometry::CellId;

/// Tolerances for edge extraction, colinear merging and portal matching.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    /// Vertical span written for every portal.
    pub min_y: f32,
    pub max_y: f32,
    /// Squared length below which a boundary segment is dropped.
    pub degenerate_edge_dist2: f32,
    /// Off-line distance allowed when merging edges of the same cell.
    pub colinear_fudge: f32,
    pub merge_colinear: bool,
    /// Slack added to both bounding radii before cells are compared.
    pub radius_fudge: f32,
    /// Minimum |cos| between two line normals for them to count as parallel.
    pub tangent_angle_fudge: f32,
    /// Off-line distance allowed between edges of neighbouring cells.
    pub tangent_dist_fudge: f32,
    pub corner_fudge: f32,
    pub length_fudge: f32,
    /// Only accept edge pairs whose end points match within `corner_fudge`.
    pub strict_edges: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            min_y: -20.0,
            max_y: 50.0,
            degenerate_edge_dist2: 1e-5,
            colinear_fudge: 1e-5,
            merge_colinear: true,
            radius_fudge: 1.0,
            tangent_angle_fudge: 0.999,
            tangent_dist_fudge: 0.1,
            corner_fudge: 0.1,
            length_fudge: 1.0,
            strict_edges: false,
        }
    }
}

impl PortalConfig {
    pub fn validate(&self) -> MmResult<()> {
        let positive = [
            ("degenerate_edge_dist2", self.degenerate_edge_dist2),
            ("colinear_fudge", self.colinear_fudge),
            ("tangent_dist_fudge", self.tangent_dist_fudge),
            ("corner_fudge", self.corner_fudge),
            ("length_fudge", self.length_fudge),
        ];
        for (name, value) in positive.iter() {
            if !(*value > 0.0) || !value.is_finite() {
                return Err(MmError::config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !(self.radius_fudge >= 0.0) || !self.radius_fudge.is_finite() {
            return Err(MmError::config("radius_fudge must not be negative"));
        }
        if !(self.tangent_angle_fudge > 0.0 && self.tangent_angle_fudge <= 1.0) {
            return Err(MmError::config("tangent_angle_fudge must be in (0, 1]"));
        }
        if !(self.max_y > self.min_y) {
            return Err(MmError::config("max_y must be above min_y"));
        }
        if self.merge_colinear && self.strict_edges {
            return Err(MmError::config(
                "strict edge matching needs unmerged edges, disable merge_colinear",
            ));
        }
        Ok(())
    }

    pub fn portal_height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// A shared boundary segment between two cells, `lower < higher`.
#[derive(Debug, Clone, Copy)]
pub struct Portal {
    pub lower: CellId,
    pub higher: CellId,
    pub p1: Point2F,
    pub p2: Point2F,
}

impl Portal {
    pub fn length(&self) -> f32 {
        (self.p2 - self.p1).magnitude()
    }

    pub fn to_record(&self, height: f32) -> PortalRecord {
        PortalRecord::new(self.lower.get(), self.higher.get(), height, self.p1, self.p2)
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        (self.lower, self.higher)
            .cmp(&(other.lower, other.higher))
            .then_with(|| self.p1.x.total_cmp(&other.p1.x))
            .then_with(|| self.p1.y.total_cmp(&other.p1.y))
            .then_with(|| self.p2.x.total_cmp(&other.p2.x))
            .then_with(|| self.p2.y.total_cmp(&other.p2.y))
    }
}

impl PartialEq for Portal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_key(other) == Ordering::Equal
    }
}

impl Eq for Portal {}

impl PartialOrd for Portal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Portal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_key(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortalStats {
    pub cell_pairs: usize,
    pub edge_pairs: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PortalSet {
    pub portals: BTreeSet<Portal>,
    pub stats: PortalStats,
}

impl PortalSet {
    pub fn len(&self) -> usize {
        self.portals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    pub fn to_ptl(&self, config: &PortalConfig) -> Ptl {
        let height = config.portal_height();
        Ptl {
            portals: self.portals.iter().map(|p| p.to_record(height)).collect(),
        }
    }
}

/// Tests every edge of `a` against every edge of `b`. Points are taken along
/// `a`'s edges; the cell pair is always stored lowest id first.
pub fn portals_between(a: &Cell, b: &Cell, config: &PortalConfig) -> Vec<Portal> {
    scan_pair(a, b, config).0
}

fn scan_pair(a: &Cell, b: &Cell, config: &PortalConfig) -> (Vec<Portal>, usize) {
    let (lower, higher) = if a.id <= b.id { (a.id, b.id) } else { (b.id, a.id) };
    let mut portals = vec![];
    let mut tests = 0;

    for edge1 in a.edges.iter() {
        for edge2 in b.edges.iter() {
            tests += 1;

            if !edge1.is_parallel(edge2, config.tangent_angle_fudge) {
                continue;
            }
            let (lo, hi) =
                match edge1.overlap(edge2, config.tangent_dist_fudge, config.corner_fudge) {
                    Some(range) => range,
                    None => continue,
                };

            if config.strict_edges
                && ((lo - edge1.v1p).abs() > config.corner_fudge
                    || (hi - edge1.v2p).abs() > config.corner_fudge)
            {
                continue;
            }

            let v1p = edge1.v1p.max(lo);
            let v2p = edge1.v2p.min(hi);
            if !config.strict_edges && v2p - v1p < config.length_fudge {
                continue;
            }
            if !(v1p < v2p) {
                continue;
            }

            portals.push(Portal {
                lower,
                higher,
                p1: edge1.pos_to_point(v1p),
                p2: edge1.pos_to_point(v2p),
            });
        }
    }

    (portals, tests)
}

/// Finds every portal between distinct cells whose bounding circles overlap.
pub fn resolve_portals(cells: &[Cell], config: &PortalConfig) -> MmResult<PortalSet> {
    config.validate()?;

    let pairs: Vec<(&Cell, &Cell)> = cells
        .iter()
        .sorted_by_key(|c| c.id)
        .tuple_combinations()
        .filter(|(a, b)| a.id < b.id && !a.edges.is_empty() && !b.edges.is_empty())
        .collect();

    let scanned: Vec<(Vec<Portal>, usize)> = pairs
        .par_iter()
        .filter(|(a, b)| a.check_radius(b, config.radius_fudge))
        .map(|(a, b)| scan_pair(a, b, config))
        .collect();

    let mut set = PortalSet::default();
    set.stats.cell_pairs = scanned.len();
    for (portals, tests) in scanned {
        set.stats.edge_pairs += tests;
        set.portals.extend(portals);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::build_cells;
    use crate::geometry::{GeometryArena, PolygonSpec};

    fn square(x: f32, z: f32, size: f32) -> Vec<Point3F> {
        vec![
            Point3F::new(x, 0.0, z),
            Point3F::new(x + size, 0.0, z),
            Point3F::new(x + size, 0.0, z + size),
            Point3F::new(x, 0.0, z + size),
        ]
    }

    fn cells_for(squares: &[(u32, Vec<Point3F>)], config: &PortalConfig) -> Vec<Cell> {
        let mut arena = GeometryArena::new();
        for (id, points) in squares {
            let spec = PolygonSpec::new(CellId::new(*id).unwrap(), points).unwrap();
            arena.add_polygon(&spec).unwrap();
        }
        build_cells(&arena, config).unwrap()
    }

    fn unordered(portal: &Portal) -> [(f32, f32); 2] {
        let mut pts = [(portal.p1.x, portal.p1.y), (portal.p2.x, portal.p2.y)];
        pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        pts
    }

    #[test]
    fn test_adjacent_squares_share_one_portal() {
        let config = PortalConfig::default();
        let cells = cells_for(
            &[(1, square(0.0, 0.0, 20.0)), (2, square(20.0, 0.0, 20.0))],
            &config,
        );
        let set = resolve_portals(&cells, &config).unwrap();
        assert_eq!(set.len(), 1);

        let portal = set.portals.iter().next().unwrap();
        assert_eq!(portal.lower.get(), 1);
        assert_eq!(portal.higher.get(), 2);
        assert!((portal.length() - 20.0).abs() < 1e-3);
        assert!((portal.p1.x - 20.0).abs() < 1e-4);
        assert!((portal.p2.x - 20.0).abs() < 1e-4);
        assert_eq!(set.stats.cell_pairs, 1);
        assert_eq!(set.stats.edge_pairs, 16);
    }

    #[test]
    fn test_portal_symmetry() {
        let config = PortalConfig::default();
        let layouts = vec![
            vec![(1, square(0.0, 0.0, 20.0)), (2, square(20.0, 0.0, 20.0))],
            vec![(3, square(0.0, 0.0, 20.0)), (9, square(5.0, 20.0, 30.0))],
            vec![(4, square(-40.0, -10.0, 40.0)), (5, square(0.0, 0.0, 10.0))],
        ];
        for layout in layouts {
            let cells = cells_for(&layout, &config);
            let forward = portals_between(&cells[0], &cells[1], &config);
            let backward = portals_between(&cells[1], &cells[0], &config);
            assert_eq!(forward.len(), backward.len());
            assert!(!forward.is_empty());

            for (f, b) in forward.iter().zip(backward.iter()) {
                assert_eq!((f.lower, f.higher), (b.lower, b.higher));
                for (pf, pb) in unordered(f).iter().zip(unordered(b).iter()) {
                    assert!((pf.0 - pb.0).abs() < 1e-3);
                    assert!((pf.1 - pb.1).abs() < 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_partial_overlap_is_clamped() {
        let config = PortalConfig::default();
        let cells = cells_for(
            &[(3, square(0.0, 0.0, 20.0)), (9, square(5.0, 20.0, 30.0))],
            &config,
        );
        let set = resolve_portals(&cells, &config).unwrap();
        assert_eq!(set.len(), 1);
        let portal = set.portals.iter().next().unwrap();
        assert!((portal.length() - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_corner_touch_and_distant_cells() {
        let config = PortalConfig::default();
        let cells = cells_for(
            &[
                (1, square(0.0, 0.0, 10.0)),
                (2, square(10.0, 10.0, 10.0)),
                (3, square(500.0, 500.0, 10.0)),
            ],
            &config,
        );
        let set = resolve_portals(&cells, &config).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.stats.cell_pairs, 1);
    }

    #[test]
    fn test_strict_edges_requires_matching_ends() {
        let config = PortalConfig {
            merge_colinear: false,
            strict_edges: true,
            ..PortalConfig::default()
        };
        let matching = cells_for(
            &[(1, square(0.0, 0.0, 20.0)), (2, square(20.0, 0.0, 20.0))],
            &config,
        );
        assert_eq!(resolve_portals(&matching, &config).unwrap().len(), 1);

        let offset = cells_for(
            &[(3, square(0.0, 0.0, 20.0)), (9, square(5.0, 20.0, 30.0))],
            &config,
        );
        assert!(resolve_portals(&offset, &config).unwrap().is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(PortalConfig::default().validate().is_ok());

        let both = PortalConfig {
            strict_edges: true,
            ..PortalConfig::default()
        };
        assert_eq!(both.validate().unwrap_err().kind, ErrorKind::Config);

        let nan = PortalConfig {
            corner_fudge: f32::NAN,
            ..PortalConfig::default()
        };
        assert!(nan.validate().is_err());
        assert!(resolve_portals(&[], &nan).is_err());
    }

    #[test]
    fn test_ptl_records() {
        let config = PortalConfig::default();
        let cells = cells_for(
            &[(1, square(0.0, 0.0, 20.0)), (2, square(20.0, 0.0, 20.0))],
            &config,
        );
        let ptl = resolve_portals(&cells, &config).unwrap().to_ptl(&config);
        assert_eq!(ptl.portals.len(), 1);
        let record = &ptl.portals[0];
        assert_eq!(record.higher_cell, 2);
        assert_eq!(record.lower_cell, 1);
        assert_eq!(record.height, 70.0);
        assert_eq!(record.p1.y, 0.0);
    }
}
