use crate::io::*;
use crate::io::{Readable, Writable};
use bytes::{Buf, BufMut};
use cgmath::{InnerSpace, Vector2, Vector3};
use mm_derive::{Readable, Writable};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;

pub type Point2F = Vector2<f32>;

pub type Point3F = Vector3<f32>;

#[derive(Debug, Readable, Writable, Clone, Copy, PartialEq)]
pub struct PlaneF {
    pub normal: Point3F,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxF {
    pub min: Point3F,
    pub max: Point3F,
}

pub type MmResult<T> = Result<T, MmError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad authoring input: wrong vertex count, unknown mode tag, missing table entry.
    Config,
    /// Malformed or inconsistent binary data.
    Format,
    /// Geometry that cannot produce a plane or edge.
    Degenerate,
    Io,
}

#[derive(Debug)]
pub struct MmError {
    pub kind: ErrorKind,
    pub message: String,
}

impl MmError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        MmError {
            kind,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        MmError::new(ErrorKind::Config, message)
    }

    pub fn format<S: Into<String>>(message: S) -> Self {
        MmError::new(ErrorKind::Format, message)
    }

    pub fn degenerate<S: Into<String>>(message: S) -> Self {
        MmError::new(ErrorKind::Degenerate, message)
    }

    /// Prefix the message with where the failure happened, e.g. `cell 12`.
    pub fn context<C: Display>(self, context: C) -> Self {
        MmError {
            kind: self.kind,
            message: format!("{}: {}", context, self.message),
        }
    }
}

impl BoxF {
    pub fn from_points<'a, I>(points: I) -> Option<BoxF>
    where
        I: IntoIterator<Item = &'a Point3F>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            BoxF {
                min: first,
                max: first,
            },
            |b, p| b.union_point(p),
        ))
    }

    pub fn union_point(&self, point: &Point3F) -> BoxF {
        BoxF {
            min: Vector3::new(
                self.min.x.min(point.x),
                self.min.y.min(point.y),
                self.min.z.min(point.z),
            ),
            max: Vector3::new(
                self.max.x.max(point.x),
                self.max.y.max(point.y),
                self.max.z.max(point.z),
            ),
        }
    }

    pub fn center(&self) -> Point3F {
        (self.min + self.max) / 2.0
    }

    pub fn extent(&self) -> Point3F {
        self.max - self.min
    }
}

impl PlaneF {
    /// Signed distance of `point` from the plane.
    pub fn distance_to(&self, point: Point3F) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

impl From<&'static str> for MmError {
    fn from(message: &'static str) -> Self {
        MmError::format(message)
    }
}

impl From<String> for MmError {
    fn from(message: String) -> Self {
        MmError::format(message)
    }
}

impl From<FromUtf8Error> for MmError {
    fn from(err: FromUtf8Error) -> Self {
        MmError::format(format!("UTF-8 Error: {}", err))
    }
}

impl From<std::io::Error> for MmError {
    fn from(err: std::io::Error) -> Self {
        MmError::new(ErrorKind::Io, err.to_string())
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Config => "configuration",
            ErrorKind::Format => "format",
            ErrorKind::Degenerate => "degenerate geometry",
            ErrorKind::Io => "I/O",
        };
        f.write_str(name)
    }
}

impl Display for MmError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl Error for MmError {}

impl Readable<Point2F> for Point2F {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        Ok(Point2F {
            x: f32::read(from, layout)?,
            y: f32::read(from, layout)?,
        })
    }
}

impl Writable<Point2F> for Point2F {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        self.x.write(to, layout)?;
        self.y.write(to, layout)?;
        Ok(())
    }
}

impl Readable<Point3F> for Point3F {
    fn read(from: &mut dyn Buf, layout: &Layout) -> MmResult<Self> {
        Ok(Point3F {
            x: f32::read(from, layout)?,
            y: f32::read(from, layout)?,
            z: f32::read(from, layout)?,
        })
    }
}

impl Writable<Point3F> for Point3F {
    fn write(&self, to: &mut dyn BufMut, layout: &Layout) -> MmResult<()> {
        self.x.write(to, layout)?;
        self.y.write(to, layout)?;
        self.z.write(to, layout)?;
        Ok(())
    }
}
