#[macro_use]
extern crate bitflags;

pub mod bms;
pub mod bnd;
pub mod bng;
pub mod fcd;
pub mod io;
pub mod physics;
pub mod ptl;
pub mod types;
