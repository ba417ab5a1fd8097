#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera ray model.
pub mod camera;

/// Error types for the 3d module.
pub mod error;

/// Triangle meshes and ray intersection.
pub mod mesh;

/// Point cloud container.
pub mod pointcloud;

pub use crate::error::GeometryError;
