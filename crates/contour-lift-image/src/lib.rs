#![deny(missing_docs)]
//! Image types, pixel buffer loading and color space conversions

/// Flat host pixel buffers.
pub mod buffer;

/// sRGB <-> linear color space conversions.
pub mod color;

/// Error types for the image module.
pub mod error;

/// image representation for reconstruction purposes.
pub mod image;

/// Row-parallel pixel iteration helpers.
pub mod parallel;

pub use crate::buffer::PixelBuffer;
pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
