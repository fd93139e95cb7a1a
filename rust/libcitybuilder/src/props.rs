use std::collections::HashMap;

use mm::bng::{Bng, StaticObject};
use mm::types::*;

use crate::geometry::Axis;

pub const DEFAULT_SEPARATOR: f32 = 10.0;

/// Bounding dimensions of every known prop, read from `name x y z` lines.
#[derive(Debug, Clone, Default)]
pub struct PropDimensions {
    dims: HashMap<String, Point3F>,
}

impl PropDimensions {
    pub fn parse(text: &str) -> MmResult<PropDimensions> {
        let mut dims = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let parsed = match fields.as_slice() {
                [name, x, y, z] => x
                    .parse::<f32>()
                    .and_then(|x| Ok((x, y.parse::<f32>()?, z.parse::<f32>()?)))
                    .ok()
                    .map(|(x, y, z)| (name.to_string(), Point3F::new(x, y, z))),
                _ => None,
            };
            let (name, size) = parsed.ok_or_else(|| {
                MmError::config(format!(
                    "prop dimensions line {}: expected 'name x y z', got '{}'",
                    number + 1,
                    line.trim()
                ))
            })?;
            dims.insert(name, size);
        }
        Ok(PropDimensions { dims })
    }

    pub fn insert(&mut self, name: &str, size: Point3F) {
        self.dims.insert(name.to_owned(), size);
    }

    pub fn get(&self, name: &str) -> Option<Point3F> {
        self.dims.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dims.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.dims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }
}

/// Spacing between repeated props: a distance, or the size of a named prop.
#[derive(Debug, Clone, PartialEq)]
pub enum Separator {
    Distance(f32),
    Prop(String),
}

impl Default for Separator {
    fn default() -> Self {
        Separator::Distance(DEFAULT_SEPARATOR)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropRequest {
    pub offset: Point3F,
    pub face: Point3F,
    pub name: String,
    pub separator: Separator,
    pub axis: Axis,
    /// Where a row of props ends on `axis`. Ignored for props without known dimensions.
    pub end_offset: Option<f32>,
}

impl PropRequest {
    pub fn new(offset: Point3F, face: Point3F, name: &str) -> Self {
        PropRequest {
            offset,
            face,
            name: name.to_owned(),
            separator: Separator::default(),
            axis: Axis::default(),
            end_offset: None,
        }
    }

    pub fn repeated(mut self, axis: Axis, end_offset: f32, separator: Separator) -> Self {
        self.axis = axis;
        self.end_offset = Some(end_offset);
        self.separator = separator;
        self
    }

    fn separator_value(&self, dims: &PropDimensions) -> MmResult<f32> {
        match &self.separator {
            Separator::Distance(d) => Ok(*d),
            Separator::Prop(name) => dims
                .get(name)
                .map(|size| self.axis.get(&size))
                .ok_or_else(|| MmError::config(format!("separator prop '{}' has no dimensions", name))),
        }
    }
}

/// Places the props of every request. A request yields one object, or a row of
/// `trunc(|end - offset| / separator)` objects when the prop has known
/// dimensions and an end offset.
pub fn expand_props(requests: &[PropRequest], dims: &PropDimensions) -> MmResult<Vec<StaticObject>> {
    let mut objects = vec![];
    for (index, request) in requests.iter().enumerate() {
        let separator = request
            .separator_value(dims)
            .map_err(|e| e.context(format!("prop {} ({})", index, request.name)))?;

        objects.push(StaticObject::new(request.offset, request.face, &request.name));

        let end = match request.end_offset {
            Some(end) if dims.contains(&request.name) => end,
            _ => continue,
        };
        if !(separator > 0.0) {
            return Err(MmError::config(format!("prop separator must be positive, got {}", separator))
                .context(format!("prop {} ({})", index, request.name)));
        }

        let start = request.axis.get(&request.offset);
        let count = ((end - start).abs() / separator) as usize;
        for i in 1..count {
            let position = request.axis.with(request.offset, start + i as f32 * separator);
            objects.push(StaticObject::new(position, request.face, &request.name));
        }
    }
    Ok(objects)
}

pub fn props_to_bng(requests: &[PropRequest], dims: &PropDimensions) -> MmResult<Bng> {
    Ok(Bng {
        objects: expand_props(requests, dims)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> PropDimensions {
        PropDimensions::parse("tpbench 4.5 1.2 2.0\n\ntpsltb 1.0 6.0 0.5\n").unwrap()
    }

    #[test]
    fn test_parse_dimensions() {
        let dims = dims();
        assert_eq!(dims.len(), 2);
        assert_eq!(dims.get("tpsltb"), Some(Point3F::new(1.0, 6.0, 0.5)));

        let err = PropDimensions::parse("tpbench 1 2\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("line 1"));
        assert!(PropDimensions::parse("tpbench 1 two 3").is_err());
    }

    #[test]
    fn test_single_prop() {
        let request = PropRequest::new(Point3F::new(60.0, 0.0, 70.0), Point3F::new(1e4, 0.0, 70.0), "tpbench");
        let objects = expand_props(&[request], &dims()).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].room, mm::bng::DEFAULT_ROOM);
        assert_eq!(objects[0].flags, mm::bng::DEFAULT_FLAGS);
        assert_eq!(objects[0].name.as_str(), "tpbench");
    }

    #[test]
    fn test_row_of_props() {
        let request = PropRequest::new(Point3F::new(0.0, 0.0, 5.0), Point3F::new(0.0, 0.0, 100.0), "tpbench")
            .repeated(Axis::X, 50.0, Separator::Distance(10.0));
        let objects = expand_props(&[request], &dims()).unwrap();
        assert_eq!(objects.len(), 5);
        for (i, object) in objects.iter().enumerate() {
            assert!((object.start.x - 10.0 * i as f32).abs() < 1e-5);
            assert_eq!(object.start.z, 5.0);
            assert_eq!(object.end, Point3F::new(0.0, 0.0, 100.0));
        }
    }

    #[test]
    fn test_separator_from_prop_size() {
        let request = PropRequest::new(Point3F::new(0.0, 0.0, 0.0), Point3F::new(0.0, 0.0, 0.0), "tpsltb")
            .repeated(Axis::Z, -2.0, Separator::Prop("tpsltb".into()));
        let objects = expand_props(&[request], &dims()).unwrap();
        assert_eq!(objects.len(), 4);
        assert!((objects[3].start.z - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_unknown_prop_is_not_repeated() {
        let request = PropRequest::new(Point3F::new(0.0, 0.0, 0.0), Point3F::new(0.0, 0.0, 0.0), "vpcop")
            .repeated(Axis::X, 100.0, Separator::Distance(10.0));
        assert_eq!(expand_props(&[request], &dims()).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_separator_prop() {
        let mut request = PropRequest::new(Point3F::new(0.0, 0.0, 0.0), Point3F::new(0.0, 0.0, 0.0), "tpbench");
        request.separator = Separator::Prop("nothing".into());
        let err = expand_props(&[request], &dims()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert!(err.message.contains("prop 0"));
    }
}
