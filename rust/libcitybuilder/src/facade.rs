use std::collections::HashMap;

use mm::fcd::{Facade, Fcd, FACADE_ROOM};
use mm::io::NulString;
use mm::types::*;

use crate::geometry::Axis;

/// Per-facade scale factors, read from `name: scale` lines.
#[derive(Debug, Clone, Default)]
pub struct FacadeScales {
    scales: HashMap<String, f32>,
}

impl FacadeScales {
    pub fn parse(text: &str) -> MmResult<FacadeScales> {
        let mut scales = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry = line
                .split_once(": ")
                .and_then(|(name, scale)| scale.trim().parse::<f32>().ok().map(|s| (name.trim(), s)));
            let (name, scale) = entry.ok_or_else(|| {
                MmError::config(format!(
                    "facade scales line {}: expected 'name: scale', got '{}'",
                    number + 1,
                    line
                ))
            })?;
            scales.insert(name.to_owned(), scale);
        }
        Ok(FacadeScales { scales })
    }

    pub fn insert(&mut self, name: &str, scale: f32) {
        self.scales.insert(name.to_owned(), scale);
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.scales.get(name).copied()
    }
}

/// A wall span to cover with copies of one facade.
#[derive(Debug, Clone, PartialEq)]
pub struct FacadeRequest {
    pub name: String,
    pub flags: u16,
    pub start: Point3F,
    pub end: Point3F,
    pub sides: Point3F,
    pub axis: Axis,
    pub separator: f32,
    /// Used when the scale table has no entry for `name`.
    pub scale: Option<f32>,
}

impl FacadeRequest {
    pub fn instance_count(&self) -> usize {
        let span = (self.axis.get(&self.end) - self.axis.get(&self.start)).abs();
        (span / self.separator).ceil() as usize
    }

    /// Splits the span into `ceil(|span| / separator)` facades, each one
    /// separator long. Instance `i` starts at `start + separator * i` along
    /// the axis whichever way the span runs.
    pub fn expand(&self, scales: &FacadeScales) -> MmResult<Vec<Facade>> {
        if !(self.separator > 0.0) {
            return Err(MmError::config(format!(
                "separator must be positive, got {}",
                self.separator
            )));
        }
        let scale = scales.get(&self.name).or(self.scale).ok_or_else(|| {
            MmError::config(format!("no scale known for facade '{}'", self.name))
        })?;

        let origin = self.axis.get(&self.start);

        Ok((0..self.instance_count())
            .map(|i| {
                let position = origin + self.separator * i as f32;
                Facade {
                    room: FACADE_ROOM,
                    flags: self.flags,
                    start: self.axis.with(self.start, position),
                    end: self.axis.with(self.end, position + self.separator),
                    sides: self.sides,
                    scale,
                    name: NulString::new(&self.name),
                }
            })
            .collect())
    }
}

pub fn facades_to_fcd(requests: &[FacadeRequest], scales: &FacadeScales) -> MmResult<Fcd> {
    let mut facades = vec![];
    for (index, request) in requests.iter().enumerate() {
        let expanded = request
            .expand(scales)
            .map_err(|e| e.context(format!("facade {} ({})", index, request.name)))?;
        facades.extend(expanded);
    }
    Ok(Fcd { facades })
}
