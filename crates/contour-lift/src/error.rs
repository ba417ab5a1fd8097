use contour_lift_3d::GeometryError;
use contour_lift_image::{ImageError, ImageSize};

use crate::config::ConfigError;

/// An error type for the reconstruction.
#[derive(thiserror::Error, Debug)]
pub enum ReconstructionError {
    /// Error from the image buffers.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Error from the camera or the surface.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Error in the reconstruction parameters.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input buffer does not share the size of the color buffer.
    #[error("The {name} buffer is {found} but the color buffer is {expected}")]
    DimensionMismatch {
        /// Which buffer mismatched.
        name: &'static str,
        /// The size of the color buffer.
        expected: ImageSize,
        /// The size of the mismatching buffer.
        found: ImageSize,
    },

    /// No ray reached the surface for a contour pixel and none of its
    /// neighbors was reconstructed either.
    ///
    /// The SDF and displacement fields are inconsistent with the surface.
    #[error("Depth for pixel (col {col}, row {row}) could not be set: no ray hit and no reconstructed neighbor")]
    UnreachableDepth {
        /// Column of the pixel.
        col: usize,
        /// Row of the pixel, counted from the bottom.
        row: usize,
    },
}
