pub mod builder;
pub mod cell;
pub mod facade;
pub mod geometry;
pub mod hudmap;
pub mod mesh;
pub mod portal;
pub mod props;
pub mod scene;
pub mod texcoords;
pub mod text;

pub use builder::{CityBuilder, CityOutput, NullProgress, ProgressEventListener};
pub use portal::PortalConfig;
pub use scene::Scene;
