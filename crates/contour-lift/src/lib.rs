#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Point cloud assembly with linear colors and soft alpha.
pub mod assemble;

/// Per-pixel ray-cast cascade.
pub mod cascade;

/// Reconstruction parameters.
pub mod config;

/// Contour pixel selection.
pub mod contour;

/// Error types for the reconstruction.
pub mod error;

/// Host buffer validation and field decoding.
pub mod fields;

/// Depth fill-in from reconstructed neighbors.
pub mod fill;

/// The reconstruction pipeline.
pub mod pipeline;

pub use crate::cascade::PixelOutcome;
pub use crate::config::{ExecutionStrategy, FieldEncoding, ReconstructionConfig};
pub use crate::error::ReconstructionError;
pub use crate::fields::FrameInputs;
pub use crate::pipeline::{reconstruct, Reconstruction, ReconstructionStats};

/// Image types, re-exported from `contour-lift-image`.
pub use contour_lift_image as image;

/// Geometry types, re-exported from `contour-lift-3d`.
pub use contour_lift_3d as k3d;
