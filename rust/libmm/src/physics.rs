use crate::io::*;
use crate::io::{Readable, Writable};
use crate::types::*;
use bytes::{Buf, BufMut};
use mm_derive::{Readable, Writable};

/// Surface physics parameters for one material. The whole database is stored
/// big-endian.
#[derive(Debug, Readable, Writable, Clone, PartialEq)]
pub struct Material {
    pub name: FixedStr<32>,
    pub friction: f32,
    pub elasticity: f32,
    pub drag: f32,
    pub bump_height: f32,
    pub bump_width: f32,
    pub bump_depth: f32,
    pub sink_depth: f32,
    pub material_type: u32,
    pub sound: u32,
    pub velocity: Point2F,
    pub ptx_color: Point3F,
}

/// Replacement friction/elasticity/drag for the material at a 1-based index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialEdit {
    pub index: usize,
    pub friction: f32,
    pub elasticity: f32,
    pub drag: f32,
}

#[derive(Debug, Readable, Writable, Clone, PartialEq, Default)]
pub struct PhysicsDb {
    pub materials: Vec<Material>,
}

impl PhysicsDb {
    pub fn from_bytes<T>(from: T) -> MmResult<Self>
    where
        T: AsRef<[u8]>,
    {
        decode(from.as_ref(), &Layout::big())
    }

    pub fn to_bytes(&self) -> MmResult<Vec<u8>> {
        encode(self, &Layout::big())
    }

    pub fn edit(&mut self, index: usize, friction: f32, elasticity: f32, drag: f32) -> MmResult<()> {
        let count = self.materials.len();
        let material = index
            .checked_sub(1)
            .and_then(|i| self.materials.get_mut(i))
            .ok_or_else(|| {
                MmError::config(format!(
                    "material index {} is outside 1..={}",
                    index, count
                ))
            })?;
        material.friction = friction;
        material.elasticity = elasticity;
        material.drag = drag;
        Ok(())
    }

    pub fn apply(&mut self, edit: &MaterialEdit) -> MmResult<()> {
        self.edit(edit.index, edit.friction, edit.elasticity, edit.drag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(name: &str) -> Material {
        Material {
            name: FixedStr::new(name),
            friction: 1.0,
            elasticity: 0.5,
            drag: 0.0,
            bump_height: 0.0,
            bump_width: 0.0,
            bump_depth: 0.0,
            sink_depth: 0.0,
            material_type: 0,
            sound: 3,
            velocity: Point2F::new(0.0, 0.0),
            ptx_color: Point3F::new(0.25, 0.5, 1.0),
        }
    }

    #[test]
    fn test_physics_db_is_big_endian() {
        let db = PhysicsDb {
            materials: vec![material("default"), material("grass")],
        };
        let bytes = db.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..11], b"default");
        // 1.0f32 big-endian right after the name
        assert_eq!(&bytes[36..40], &[0x3f, 0x80, 0, 0]);
        assert_eq!(bytes.len(), 4 + 2 * (32 + 28 + 8 + 8 + 12));
        assert_eq!(PhysicsDb::from_bytes(&bytes).unwrap(), db);
    }

    #[test]
    fn test_edit_is_one_based() {
        let mut db = PhysicsDb {
            materials: vec![material("default"), material("grass")],
        };
        db.edit(2, 0.1, 0.2, 0.3).unwrap();
        assert_eq!(db.materials[0], material("default"));
        assert_eq!(db.materials[1].friction, 0.1);
        assert_eq!(db.materials[1].elasticity, 0.2);
        assert_eq!(db.materials[1].drag, 0.3);
        assert_eq!(db.materials[1].sound, 3);

        assert_eq!(db.edit(0, 0.0, 0.0, 0.0).unwrap_err().kind, ErrorKind::Config);
        assert!(db.edit(3, 0.0, 0.0, 0.0).is_err());
    }
}
