use std::fs;
use std::path::Path;

use image::Rgb;
use mm::bnd::Bnd;
use mm::bng::Bng;
use mm::fcd::Fcd;
use mm::physics::{MaterialEdit, PhysicsDb};
use mm::ptl::Ptl;
use mm::types::*;

use crate::cell::build_cells;
use crate::facade::{facades_to_fcd, FacadeRequest, FacadeScales};
use crate::geometry::{AddedPolygon, GeometryArena, PolygonSpec, WallTolerance};
use crate::hudmap::{HudMap, HUD_WIDTHS};
use crate::mesh::{build_meshes, CellMesh, Surface};
use crate::portal::{resolve_portals, PortalConfig};
use crate::props::{props_to_bng, PropDimensions, PropRequest};
use crate::text::{cells_file, ext_file, gizmo_file, Bridge, CellRow};

pub trait ProgressEventListener {
    fn progress(&mut self, current: u32, total: u32, status: String, finish_status: String);
}

/// Swallows every progress event.
pub struct NullProgress;

impl ProgressEventListener for NullProgress {
    fn progress(&mut self, _current: u32, _total: u32, _status: String, _finish_status: String) {}
}

/// One polygon and everything that hangs off it besides collision.
#[derive(Debug, Clone)]
pub struct PolygonInput {
    pub spec: PolygonSpec,
    pub cell_type: u32,
    pub surface: Option<Surface>,
    pub hud_color: Option<Rgb<u8>>,
}

impl PolygonInput {
    pub fn new(spec: PolygonSpec) -> Self {
        PolygonInput {
            spec,
            cell_type: 0,
            surface: None,
            hud_color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    pub cells: usize,
    pub polygons: usize,
    pub vertices: usize,
    pub edges: usize,
    pub meshes: usize,
    pub portals: usize,
    pub cell_pairs: usize,
    pub edge_pairs: usize,
    pub props: usize,
    pub facades: usize,
}

/// Everything a build produced, ready to be written out.
#[derive(Debug, Clone)]
pub struct CityOutput {
    pub city: String,
    pub bnd: Bnd,
    pub meshes: Vec<CellMesh>,
    pub ptl: Ptl,
    pub bng: Bng,
    pub fcd: Fcd,
    pub cells: Option<String>,
    pub ext: String,
    pub gizmo: Option<String>,
    /// JPEG bytes keyed by image width.
    pub minimaps: Vec<(u32, Vec<u8>)>,
    pub physics: Option<PhysicsDb>,
    pub stats: BuildStats,
}

impl CityOutput {
    /// Lays the output out as the game's SHOP tree under `root`.
    pub fn write_shop(&self, root: &Path) -> MmResult<()> {
        let city = &self.city;
        let city_dir = root.join("CITY");
        create_dir(&city_dir)?;

        write_file(&root.join("BND").join(format!("{}_HITID.BND", city)), &self.bnd.to_bytes()?)?;
        for mesh in &self.meshes {
            let path = root.join("BMS").join(mesh.folder(city)).join(mesh.file_name());
            let bytes = mesh
                .bms
                .to_bytes()
                .map_err(|e| e.context(mesh.file_name()))?;
            write_file(&path, &bytes)?;
        }

        write_file(&city_dir.join(format!("{}.PTL", city)), &self.ptl.to_bytes()?)?;
        write_file(&city_dir.join(format!("{}.BNG", city)), &self.bng.to_bytes()?)?;
        write_file(&city_dir.join(format!("{}.FCD", city)), &self.fcd.to_bytes()?)?;
        if let Some(cells) = &self.cells {
            write_file(&city_dir.join(format!("{}.CELLS", city)), cells.as_bytes())?;
        }
        write_file(&city_dir.join(format!("{}.EXT", city)), self.ext.as_bytes())?;
        if let Some(gizmo) = &self.gizmo {
            write_file(&city_dir.join(format!("{}.GIZMO", city)), gizmo.as_bytes())?;
        }

        for (width, jpeg) in &self.minimaps {
            write_file(&root.join("BMP16").join(format!("{}{}.JPG", city, width)), jpeg)?;
        }
        if let Some(physics) = &self.physics {
            write_file(&root.join("MTL").join("PHYSICS.DB"), &physics.to_bytes()?)?;
        }
        Ok(())
    }
}

fn create_dir(path: &Path) -> MmResult<()> {
    fs::create_dir_all(path).map_err(|e| MmError::from(e).context(path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> MmResult<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, bytes).map_err(|e| MmError::from(e).context(path.display()))
}

pub struct CityBuilder {
    city: String,
    arena: GeometryArena,
    cell_types: Vec<u32>,
    surfaces: Vec<Option<Surface>>,
    hud: HudMap,
    minimap: bool,
    props: Vec<PropRequest>,
    prop_dimensions: PropDimensions,
    facades: Vec<FacadeRequest>,
    facade_scales: FacadeScales,
    bridges: Vec<Bridge>,
    physics_db: Option<PhysicsDb>,
    material_edits: Vec<MaterialEdit>,
    portal_config: PortalConfig,
}

impl CityBuilder {
    pub fn new(city: &str) -> CityBuilder {
        CityBuilder {
            city: city.to_owned(),
            arena: GeometryArena::new(),
            cell_types: vec![],
            surfaces: vec![],
            hud: HudMap::new(Some(Rgb([255, 255, 255]))),
            minimap: true,
            props: vec![],
            prop_dimensions: PropDimensions::default(),
            facades: vec![],
            facade_scales: FacadeScales::default(),
            bridges: vec![],
            physics_db: None,
            material_edits: vec![],
            portal_config: PortalConfig::default(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn arena(&self) -> &GeometryArena {
        &self.arena
    }

    pub fn set_portal_config(&mut self, config: PortalConfig) -> MmResult<()> {
        config.validate()?;
        self.portal_config = config;
        Ok(())
    }

    /// Only valid before any polygon has been added.
    pub fn set_wall_tolerance(&mut self, tolerance: WallTolerance) -> MmResult<()> {
        if !self.arena.is_empty() {
            return Err(MmError::config("wall tolerance must be set before adding polygons"));
        }
        self.arena = GeometryArena::with_wall_tolerance(tolerance);
        Ok(())
    }

    pub fn set_prop_dimensions(&mut self, dims: PropDimensions) {
        self.prop_dimensions = dims;
    }

    pub fn set_facade_scales(&mut self, scales: FacadeScales) {
        self.facade_scales = scales;
    }

    pub fn set_physics_db(&mut self, db: PhysicsDb) {
        self.physics_db = Some(db);
    }

    pub fn set_minimap(&mut self, enabled: bool) {
        self.minimap = enabled;
    }

    pub fn set_hud_outline(&mut self, outline: Option<Rgb<u8>>) {
        self.hud.outline = outline;
    }

    pub fn add_polygon(&mut self, input: PolygonInput) -> MmResult<AddedPolygon> {
        let added = self.arena.add_polygon(&input.spec)?;
        let points = self.arena.polygon_points(&self.arena.polygons()[added.polygon]);
        self.hud.add_shape(&points, input.hud_color);
        self.cell_types.push(input.cell_type);
        self.surfaces.push(input.surface);
        Ok(added)
    }

    pub fn add_prop(&mut self, prop: PropRequest) {
        self.props.push(prop);
    }

    pub fn add_facade(&mut self, facade: FacadeRequest) {
        self.facades.push(facade);
    }

    pub fn add_bridge(&mut self, bridge: Bridge) {
        self.bridges.push(bridge);
    }

    pub fn edit_material(&mut self, edit: MaterialEdit) {
        self.material_edits.push(edit);
    }

    pub fn build(self, progress: &mut dyn ProgressEventListener) -> MmResult<CityOutput> {
        self.portal_config.validate()?;
        let total = 7;
        let mut step = 0;
        let mut report = |step: &mut u32, status: &str| {
            *step += 1;
            progress.progress(*step, total, status.to_owned(), "Finished building city".to_owned());
        };

        report(&mut step, "Building collision bounds");
        let bnd = self.arena.to_bnd()?;

        report(&mut step, "Building meshes");
        let meshes = build_meshes(&self.arena, &self.surfaces)?;

        report(&mut step, "Extracting cells");
        let cells = build_cells(&self.arena, &self.portal_config)?;

        report(&mut step, "Resolving portals");
        let portals = resolve_portals(&cells, &self.portal_config)?;
        let ptl = portals.to_ptl(&self.portal_config);

        report(&mut step, "Placing props and facades");
        let bng = props_to_bng(&self.props, &self.prop_dimensions)?;
        let fcd = facades_to_fcd(&self.facades, &self.facade_scales)?;

        report(&mut step, "Writing side files");
        let cell_rows: Vec<CellRow> = meshes
            .iter()
            .map(|mesh| CellRow {
                id: mesh.cell.get(),
                water: mesh.water,
                cell_type: self.first_cell_type(mesh.cell.get()),
            })
            .collect();
        let cells_text = if cell_rows.is_empty() {
            None
        } else {
            Some(cells_file(&cell_rows)?)
        };
        let ext = ext_file(self.arena.vertices())?;
        let gizmo = if self.bridges.is_empty() {
            None
        } else {
            Some(gizmo_file(&self.bridges))
        };
        let physics = match (self.physics_db.clone(), self.material_edits.is_empty()) {
            (_, true) => None,
            (None, false) => {
                return Err(MmError::config("material edits need a physics database to edit"))
            }
            (Some(mut db), false) => {
                for (i, edit) in self.material_edits.iter().enumerate() {
                    db.apply(edit)
                        .map_err(|e| e.context(format!("material edit {}", i)))?;
                }
                Some(db)
            }
        };

        report(&mut step, "Rendering minimap");
        let minimaps = if self.minimap {
            HUD_WIDTHS
                .iter()
                .map(|w| self.hud.to_jpeg(*w).map(|jpeg| (*w, jpeg)))
                .collect::<MmResult<Vec<_>>>()?
        } else {
            vec![]
        };

        let stats = BuildStats {
            cells: cells.len(),
            polygons: self.arena.polygons().len(),
            vertices: self.arena.vertices().len(),
            edges: cells.iter().map(|c| c.edges.len()).sum(),
            meshes: meshes.len(),
            portals: portals.len(),
            cell_pairs: portals.stats.cell_pairs,
            edge_pairs: portals.stats.edge_pairs,
            props: bng.objects.len(),
            facades: fcd.facades.len(),
        };

        Ok(CityOutput {
            city: self.city,
            bnd,
            meshes,
            ptl,
            bng,
            fcd,
            cells: cells_text,
            ext,
            gizmo,
            minimaps,
            physics,
            stats,
        })
    }

    fn first_cell_type(&self, cell_id: u16) -> u32 {
        self.arena
            .polygons()
            .iter()
            .position(|p| p.cell_id == cell_id)
            .and_then(|i| self.cell_types.get(i).copied())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Axis, CellId};
    use crate::props::Separator;
    use crate::text::BridgeOrientation;
    use mm::bms::Bms;
    use mm::physics::Material;

    fn square(x: f32, z: f32, size: f32) -> Vec<Point3F> {
        vec![
            Point3F::new(x, 0.0, z),
            Point3F::new(x + size, 0.0, z),
            Point3F::new(x + size, 0.0, z + size),
            Point3F::new(x, 0.0, z + size),
        ]
    }

    fn input(cell: u32, points: &[Point3F], texture: &str) -> PolygonInput {
        let spec = PolygonSpec::new(CellId::new(cell).unwrap(), points).unwrap();
        PolygonInput {
            cell_type: 3,
            surface: Some(Surface::new(texture)),
            hud_color: Some(Rgb([0x41, 0x44, 0x41])),
            ..PolygonInput::new(spec)
        }
    }

    fn two_cell_city() -> CityBuilder {
        let mut builder = CityBuilder::new("testcity");
        builder.add_polygon(input(1, &square(0.0, 0.0, 20.0), "R6")).unwrap();
        builder.add_polygon(input(202, &square(20.0, 0.0, 20.0), "T_WATER")).unwrap();
        builder
    }

    #[test]
    fn test_build_two_cells() {
        let mut builder = two_cell_city();
        builder.add_prop(
            PropRequest::new(Point3F::new(5.0, 0.0, 5.0), Point3F::new(5.0, 0.0, 50.0), "tpbench")
                .repeated(Axis::X, 5.0, Separator::Distance(10.0)),
        );
        builder.add_facade(FacadeRequest {
            name: "ofbldg02".into(),
            flags: 1025,
            start: Point3F::new(-10.0, 0.0, 0.0),
            end: Point3F::new(10.0, 0.0, 0.0),
            sides: Point3F::new(27.84, 0.0, 0.0),
            axis: Axis::X,
            separator: 10.0,
            scale: Some(1.0),
        });

        let output = builder.build(&mut NullProgress).unwrap();
        assert_eq!(output.stats.cells, 2);
        assert_eq!(output.stats.polygons, 2);
        assert_eq!(output.stats.portals, 1);
        assert_eq!(output.ptl.portals.len(), 1);
        assert_eq!(output.meshes.len(), 2);
        assert_eq!(output.bng.objects.len(), 1);
        assert_eq!(output.fcd.facades.len(), 2);
        assert_eq!(output.cells.as_deref(), Some("2\n1202\n1,8,3,1,1\n202,32,3,1,1\n"));
        assert_eq!(output.ext, "0.0 0.0 40.0 20.0");
        assert!(output.gizmo.is_none());
        assert_eq!(output.minimaps.len(), 2);
        assert!(output.physics.is_none());
    }

    #[test]
    fn test_write_shop() {
        let mut builder = two_cell_city();
        builder.add_bridge(Bridge {
            offset: Point3F::new(10.0, 0.0, 10.0),
            orientation: BridgeOrientation::HorizontalEast,
            number: 1,
            object: "tpdrawbridge04".into(),
        });
        let output = builder.build(&mut NullProgress).unwrap();

        let dir = tempfile::tempdir().unwrap();
        output.write_shop(dir.path()).unwrap();

        let root = dir.path();
        let bnd = fs::read(root.join("BND/testcity_HITID.BND")).unwrap();
        assert_eq!(Bnd::from_bytes(&bnd).unwrap().polygons.len(), 2);
        let bms = fs::read(root.join("BMS/testcityLM/CULL01_H.bms")).unwrap();
        assert_eq!(Bms::from_bytes(&bms).unwrap().coordinates.len(), 4);
        assert!(root.join("BMS/testcityCITY/CULL202_A2.bms").exists());
        assert!(root.join("CITY/testcity.PTL").exists());
        assert!(root.join("CITY/testcity.BNG").exists());
        assert!(root.join("CITY/testcity.FCD").exists());
        assert!(root.join("CITY/testcity.CELLS").exists());
        let gizmo = fs::read_to_string(root.join("CITY/testcity.GIZMO")).unwrap();
        assert!(gizmo.starts_with("DrawBridge1\n"));
        let ext = fs::read_to_string(root.join("CITY/testcity.EXT")).unwrap();
        assert_eq!(ext, "0.0 0.0 40.0 20.0");
        assert!(root.join("BMP16/testcity640.JPG").exists());
        assert!(root.join("BMP16/testcity320.JPG").exists());
        assert!(!root.join("MTL").exists());
    }

    #[test]
    fn test_material_edits() {
        let material = Material {
            name: mm::io::FixedStr::new("mtl_default"),
            friction: 1.0,
            elasticity: 0.5,
            drag: 0.0,
            bump_height: 0.0,
            bump_width: 0.0,
            bump_depth: 0.0,
            sink_depth: 0.0,
            material_type: 0,
            sound: 0,
            velocity: Point2F::new(0.0, 0.0),
            ptx_color: Point3F::new(0.0, 0.0, 0.0),
        };
        let edit = MaterialEdit {
            index: 1,
            friction: 0.1,
            elasticity: 0.2,
            drag: 0.3,
        };

        let mut builder = two_cell_city();
        builder.edit_material(edit);
        assert_eq!(builder.build(&mut NullProgress).unwrap_err().kind, ErrorKind::Config);

        let mut builder = two_cell_city();
        builder.set_minimap(false);
        builder.set_physics_db(PhysicsDb {
            materials: vec![material],
        });
        builder.edit_material(edit);
        let output = builder.build(&mut NullProgress).unwrap();
        assert!(output.minimaps.is_empty());
        let db = output.physics.unwrap();
        assert_eq!(db.materials[0].friction, 0.1);
        assert_eq!(db.materials[0].drag, 0.3);
    }

    #[test]
    fn test_progress_events() {
        struct Recorder(Vec<(u32, u32, String)>);
        impl ProgressEventListener for Recorder {
            fn progress(&mut self, current: u32, total: u32, status: String, _finish_status: String) {
                self.0.push((current, total, status));
            }
        }

        let mut recorder = Recorder(vec![]);
        two_cell_city().build(&mut recorder).unwrap();
        assert_eq!(recorder.0.len(), 7);
        assert_eq!(recorder.0[0], (1, 7, "Building collision bounds".to_owned()));
        assert_eq!(recorder.0[6].0, 7);
    }

    #[test]
    fn test_bad_polygon_is_reported_with_cell() {
        let mut builder = CityBuilder::new("testcity");
        let line = [
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(1.0, 0.0, 0.0),
            Point3F::new(2.0, 0.0, 0.0),
        ];
        let err = builder.add_polygon(input(7, &line, "R6")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Degenerate);
        assert!(err.message.contains("cell 7"));
        assert!(builder.arena().is_empty());
    }

    #[test]
    fn test_rejects_strict_with_merge() {
        let mut builder = CityBuilder::new("testcity");
        let config = PortalConfig {
            strict_edges: true,
            ..PortalConfig::default()
        };
        assert!(builder.set_portal_config(config).is_err());
    }
}
