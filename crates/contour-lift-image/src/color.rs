use num_traits::Float;

use crate::error::ImageError;
use crate::image::Image;
use crate::parallel;

// sRGB transfer function constants.
const SRGB_DECODE_BREAK: f64 = 0.04045;
const LINEAR_ENCODE_BREAK: f64 = 0.0031308;
const LINEAR_SLOPE: f64 = 12.92;
const GAMMA: f64 = 2.4;
const A: f64 = 0.055;

/// Convert a stored (perceptual) sRGB intensity in `[0, 1]` to linear intensity.
///
/// `v / 12.92` below `0.04045`, `((v + 0.055) / 1.055)^2.4` otherwise.
///
/// # Example
///
/// ```
/// use contour_lift_image::color::linear_from_srgb;
///
/// assert_eq!(linear_from_srgb(0.0f64), 0.0);
/// assert!((linear_from_srgb(1.0f64) - 1.0).abs() < 1e-12);
/// ```
pub fn linear_from_srgb<T: Float>(v: T) -> T {
    // the constants are representable by every float type
    let c = |x: f64| T::from(x).unwrap_or_else(T::nan);
    if v < c(SRGB_DECODE_BREAK) {
        v / c(LINEAR_SLOPE)
    } else {
        ((v + c(A)) / c(1.0 + A)).powf(c(GAMMA))
    }
}

/// Convert a linear intensity in `[0, 1]` back to the stored (perceptual) sRGB encoding.
///
/// `v * 12.92` up to `0.0031308`, `v^(1/2.4) * 1.055 - 0.055` otherwise.
pub fn srgb_from_linear<T: Float>(v: T) -> T {
    let c = |x: f64| T::from(x).unwrap_or_else(T::nan);
    if v <= c(LINEAR_ENCODE_BREAK) {
        v * c(LINEAR_SLOPE)
    } else {
        v.powf(c(1.0 / GAMMA)) * c(1.0 + A) - c(A)
    }
}

fn map_color_channels<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    f: fn(T) -> T,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    // NOTE: a fourth channel is alpha, which carries no transfer function
    let color_channels = C.min(3);
    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        for (ch, (s, d)) in src_pixel.iter().zip(dst_pixel.iter_mut()).enumerate() {
            *d = if ch < color_channels { f(*s) } else { *s };
        }
    });

    Ok(())
}

/// Convert an sRGB(A) image to linear intensity.
///
/// The first three channels are converted; any further channel (alpha) is copied as is.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use contour_lift_image::{color::linear_from_srgb_image, Image, ImageSize};
///
/// let size = ImageSize { width: 2, height: 1 };
/// let image = Image::<f32, 4>::new(size, vec![1.0, 1.0, 1.0, 0.5, 0.0, 0.0, 0.0, 1.0]).unwrap();
/// let mut linear = Image::<f32, 4>::from_size_val(size, 0.0).unwrap();
///
/// linear_from_srgb_image(&image, &mut linear).unwrap();
/// assert_eq!(linear.get([0, 0, 3]), Some(&0.5));
/// ```
pub fn linear_from_srgb_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    map_color_channels(src, dst, linear_from_srgb)
}

/// Convert a linear RGB(A) image back to sRGB encoding.
///
/// The first three channels are converted; any further channel (alpha) is copied as is.
///
/// Precondition: the input and output images must have the same size.
pub fn srgb_from_linear_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: Float + Send + Sync,
{
    map_color_channels(src, dst, srgb_from_linear)
}
