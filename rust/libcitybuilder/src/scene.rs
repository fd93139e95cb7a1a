//! Declarative city description read from XML.
//!
//! ```xml
//! <city name="mycity">
//!   <portals merge_colinear="true" />
//!   <polygon cell="1" cell_type="0" hud_color="#414441">
//!     <v x="0" y="0" z="0"/> <v x="20" y="0" z="0"/> ...
//!     <surface texture="R6" mode="r.H" repeat_x="2"/>
//!   </polygon>
//!   <prop name="tpbench" axis="x" end="50" separator="10">
//!     <offset x="0" y="0" z="5"/> <face x="0" y="0" z="100"/>
//!   </prop>
//!   <facade name="ofbldg02" flags="1025" axis="x" separator="10">
//!     <start .../> <end .../> <sides .../>
//!   </facade>
//!   <bridge number="1" object="tpdrawbridge04" orientation="H.E"><offset .../></bridge>
//!   <material index="1" friction="0.1" elasticity="0.2" drag="0.3"/>
//! </city>
//! ```
//!
//! Elements of one kind must be listed together.

use std::str::FromStr;

use mm::physics::MaterialEdit;
use mm::types::*;
use quick_xml::de::Deserializer;
use serde::Deserialize;

use crate::builder::{CityBuilder, PolygonInput};
use crate::facade::FacadeRequest;
use crate::geometry::{Axis, CellId, PolygonSpec, WallSide};
use crate::hudmap::parse_color;
use crate::mesh::Surface;
use crate::portal::PortalConfig;
use crate::props::{PropRequest, Separator};
use crate::texcoords::{TexCoordMode, TexCoordParams};
use crate::text::{Bridge, BridgeOrientation};

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Vec3Xml {
    #[serde(rename = "@x")]
    pub x: f32,
    #[serde(rename = "@y")]
    pub y: f32,
    #[serde(rename = "@z")]
    pub z: f32,
}

impl From<Vec3Xml> for Point3F {
    fn from(v: Vec3Xml) -> Self {
        Point3F::new(v.x, v.y, v.z)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalsXml {
    #[serde(rename = "@min_y")]
    pub min_y: Option<f32>,
    #[serde(rename = "@max_y")]
    pub max_y: Option<f32>,
    #[serde(rename = "@merge_colinear")]
    pub merge_colinear: Option<bool>,
    #[serde(rename = "@strict_edges")]
    pub strict_edges: Option<bool>,
    #[serde(rename = "@radius_fudge")]
    pub radius_fudge: Option<f32>,
    #[serde(rename = "@tangent_dist_fudge")]
    pub tangent_dist_fudge: Option<f32>,
    #[serde(rename = "@corner_fudge")]
    pub corner_fudge: Option<f32>,
    #[serde(rename = "@length_fudge")]
    pub length_fudge: Option<f32>,
    #[serde(rename = "@degenerate_edge_dist2")]
    pub degenerate_edge_dist2: Option<f32>,
    #[serde(rename = "@colinear_fudge")]
    pub colinear_fudge: Option<f32>,
    #[serde(rename = "@tangent_angle_fudge")]
    pub tangent_angle_fudge: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceXml {
    #[serde(rename = "@texture")]
    pub texture: String,
    #[serde(rename = "@darkness")]
    pub darkness: Option<String>,
    #[serde(rename = "@mode")]
    pub mode: Option<String>,
    #[serde(rename = "@repeat_x")]
    pub repeat_x: Option<f32>,
    #[serde(rename = "@repeat_y")]
    pub repeat_y: Option<f32>,
    #[serde(rename = "@tilt")]
    pub tilt: Option<f32>,
    #[serde(rename = "@angle1")]
    pub angle1: Option<f32>,
    #[serde(rename = "@angle2")]
    pub angle2: Option<f32>,
    #[serde(rename = "@custom")]
    pub custom: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolygonXml {
    #[serde(rename = "@cell")]
    pub cell: u32,
    #[serde(rename = "@material")]
    pub material: Option<u8>,
    #[serde(rename = "@cell_type")]
    pub cell_type: Option<u32>,
    #[serde(rename = "@flags")]
    pub flags: Option<u8>,
    #[serde(rename = "@wall_side")]
    pub wall_side: Option<String>,
    #[serde(rename = "@sort")]
    pub sort: Option<bool>,
    #[serde(rename = "@hud_color")]
    pub hud_color: Option<String>,
    #[serde(rename = "v", default)]
    pub vertices: Vec<Vec3Xml>,
    pub surface: Option<SurfaceXml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@axis")]
    pub axis: Option<String>,
    #[serde(rename = "@end")]
    pub end: Option<f32>,
    /// A distance, or the name of a prop whose size is used.
    #[serde(rename = "@separator")]
    pub separator: Option<String>,
    pub offset: Vec3Xml,
    pub face: Vec3Xml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacadeXml {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@flags")]
    pub flags: u16,
    #[serde(rename = "@axis")]
    pub axis: String,
    #[serde(rename = "@separator")]
    pub separator: f32,
    #[serde(rename = "@scale")]
    pub scale: Option<f32>,
    pub start: Vec3Xml,
    pub end: Vec3Xml,
    pub sides: Vec3Xml,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeXml {
    #[serde(rename = "@number")]
    pub number: u32,
    #[serde(rename = "@object")]
    pub object: String,
    #[serde(rename = "@orientation")]
    pub orientation: String,
    pub offset: Vec3Xml,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MaterialXml {
    #[serde(rename = "@index")]
    pub index: usize,
    #[serde(rename = "@friction")]
    pub friction: f32,
    #[serde(rename = "@elasticity")]
    pub elasticity: f32,
    #[serde(rename = "@drag")]
    pub drag: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    #[serde(rename = "@name")]
    pub name: String,
    pub portals: Option<PortalsXml>,
    #[serde(rename = "polygon", default)]
    pub polygons: Vec<PolygonXml>,
    #[serde(rename = "prop", default)]
    pub props: Vec<PropXml>,
    #[serde(rename = "facade", default)]
    pub facades: Vec<FacadeXml>,
    #[serde(rename = "bridge", default)]
    pub bridges: Vec<BridgeXml>,
    #[serde(rename = "material", default)]
    pub materials: Vec<MaterialXml>,
}

fn parse_list<T: FromStr>(text: &str, what: &str) -> MmResult<Vec<T>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| MmError::config(format!("bad {} value '{}'", what, s)))
        })
        .collect()
}

impl SurfaceXml {
    fn to_surface(&self) -> MmResult<Surface> {
        let tex_coords = match &self.mode {
            Some(mode) => {
                let defaults = TexCoordParams::default();
                let params = TexCoordParams {
                    repeat_x: self.repeat_x.unwrap_or(defaults.repeat_x),
                    repeat_y: self.repeat_y.unwrap_or(defaults.repeat_y),
                    tilt: self.tilt.unwrap_or(defaults.tilt),
                    angles: (
                        self.angle1.unwrap_or(defaults.angles.0),
                        self.angle2.unwrap_or(defaults.angles.1),
                    ),
                    custom: self
                        .custom
                        .as_deref()
                        .map(|c| parse_list(c, "custom"))
                        .transpose()?,
                };
                Some(TexCoordMode::parse(mode, &params)?)
            }
            None => None,
        };
        Ok(Surface {
            texture: self.texture.clone(),
            darkness: self
                .darkness
                .as_deref()
                .map(|d| parse_list(d, "darkness"))
                .transpose()?,
            tex_coords,
        })
    }
}

impl PolygonXml {
    fn to_input(&self) -> MmResult<PolygonInput> {
        let points: Vec<Point3F> = self.vertices.iter().map(|v| (*v).into()).collect();
        let mut spec = PolygonSpec::new(CellId::new(self.cell)?, &points)?
            .with_material(self.material.unwrap_or(0));
        if let Some(flags) = self.flags {
            spec = spec.with_flags(flags);
        }
        if let Some(side) = &self.wall_side {
            spec = spec.with_wall_side(side.parse::<WallSide>()?);
        }
        if self.sort.unwrap_or(false) {
            spec = spec.sorted();
        }
        Ok(PolygonInput {
            spec,
            cell_type: self.cell_type.unwrap_or(0),
            surface: self.surface.as_ref().map(|s| s.to_surface()).transpose()?,
            hud_color: self.hud_color.as_deref().map(parse_color).transpose()?,
        })
    }
}

impl PropXml {
    fn to_request(&self) -> MmResult<PropRequest> {
        let mut request = PropRequest::new(self.offset.into(), self.face.into(), &self.name);
        if let Some(axis) = &self.axis {
            request.axis = axis.parse::<Axis>()?;
        }
        if let Some(separator) = &self.separator {
            request.separator = match separator.parse::<f32>() {
                Ok(distance) => Separator::Distance(distance),
                Err(_) => Separator::Prop(separator.clone()),
            };
        }
        request.end_offset = self.end;
        Ok(request)
    }
}

impl FacadeXml {
    fn to_request(&self) -> MmResult<FacadeRequest> {
        Ok(FacadeRequest {
            name: self.name.clone(),
            flags: self.flags,
            start: self.start.into(),
            end: self.end.into(),
            sides: self.sides.into(),
            axis: self.axis.parse::<Axis>()?,
            separator: self.separator,
            scale: self.scale,
        })
    }
}

impl BridgeXml {
    fn to_bridge(&self) -> MmResult<Bridge> {
        Ok(Bridge {
            offset: self.offset.into(),
            orientation: self.orientation.parse::<BridgeOrientation>()?,
            number: self.number,
            object: self.object.clone(),
        })
    }
}

impl PortalsXml {
    fn apply(&self, config: &mut PortalConfig) {
        let floats = [
            (&mut config.min_y, self.min_y),
            (&mut config.max_y, self.max_y),
            (&mut config.radius_fudge, self.radius_fudge),
            (&mut config.tangent_dist_fudge, self.tangent_dist_fudge),
            (&mut config.corner_fudge, self.corner_fudge),
            (&mut config.length_fudge, self.length_fudge),
            (&mut config.degenerate_edge_dist2, self.degenerate_edge_dist2),
            (&mut config.colinear_fudge, self.colinear_fudge),
            (&mut config.tangent_angle_fudge, self.tangent_angle_fudge),
        ];
        for (field, value) in floats {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(merge) = self.merge_colinear {
            config.merge_colinear = merge;
        }
        if let Some(strict) = self.strict_edges {
            config.strict_edges = strict;
        }
    }
}

fn indexed<T, U, F>(items: &[T], kind: &str, convert: F) -> MmResult<Vec<U>>
where
    F: Fn(&T) -> MmResult<U>,
{
    items
        .iter()
        .enumerate()
        .map(|(i, item)| convert(item).map_err(|e| e.context(format!("{} {}", kind, i))))
        .collect()
}

impl Scene {
    pub fn parse(text: &str) -> MmResult<Scene> {
        let mut des = Deserializer::from_str(text);
        Scene::deserialize(&mut des).map_err(|e| MmError::config(format!("scene: {}", e)))
    }

    pub fn portal_config(&self) -> PortalConfig {
        let mut config = PortalConfig::default();
        if let Some(portals) = &self.portals {
            portals.apply(&mut config);
        }
        config
    }

    /// Converts and validates every record first, then feeds the polygons to
    /// a fresh builder. Nothing is built if any record is malformed.
    pub fn to_builder(&self) -> MmResult<CityBuilder> {
        let polygons = indexed(&self.polygons, "polygon", PolygonXml::to_input)?;
        let props = indexed(&self.props, "prop", PropXml::to_request)?;
        let facades = indexed(&self.facades, "facade", FacadeXml::to_request)?;
        let bridges = indexed(&self.bridges, "bridge", BridgeXml::to_bridge)?;

        let mut builder = CityBuilder::new(&self.name);
        builder.set_portal_config(self.portal_config())?;
        for polygon in polygons {
            builder.add_polygon(polygon)?;
        }
        props.into_iter().for_each(|p| builder.add_prop(p));
        facades.into_iter().for_each(|f| builder.add_facade(f));
        bridges.into_iter().for_each(|b| builder.add_bridge(b));
        for m in &self.materials {
            builder.edit_material(MaterialEdit {
                index: m.index,
                friction: m.friction,
                elasticity: m.elasticity,
                drag: m.drag,
            });
        }
        Ok(builder)
    }
}
