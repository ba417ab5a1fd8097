use std::f32::consts::{FRAC_1_PI, FRAC_PI_2};

use contour_lift_3d::pointcloud::PointCloud;
use contour_lift_image::color::linear_from_srgb_image;
use contour_lift_image::Image;

use crate::error::ReconstructionError;
use crate::fields::DecodedFields;
use crate::fill::FilledPass;

/// A smooth step from 0 to 1 centered on `x = 0`.
///
/// `smoothed_step(x) = (atan(slope * x) + pi / 2) / pi`
///
/// # Example
///
/// ```
/// use contour_lift::assemble::smoothed_step;
///
/// assert_eq!(smoothed_step(0.0, 1.2), 0.5);
/// assert!(smoothed_step(-100.0, 1.2) < 0.01);
/// assert!(smoothed_step(100.0, 1.2) > 0.99);
/// ```
#[inline]
pub fn smoothed_step(x: f32, slope: f32) -> f32 {
    FRAC_1_PI * ((slope * x).atan() + FRAC_PI_2)
}

/// Build the colored point cloud of the contour pixels.
///
/// Colors are the linear RGB of the color buffer. Alpha is the smoothed step
/// of the ground-truth SDF when one was supplied, the color buffer's alpha
/// otherwise.
pub fn assemble_cloud(
    fields: &DecodedFields,
    filled: &FilledPass,
    alpha_slope: f32,
) -> Result<PointCloud, ReconstructionError> {
    let mut linear = Image::<f32, 4>::from_size_val(fields.color.size(), 0.0)?;
    linear_from_srgb_image(&fields.color, &mut linear)?;

    let colors = filled
        .pixels
        .iter()
        .map(|&[col, row]| {
            let channel = |ch| *linear.get_unchecked([row, col, ch]);
            let alpha = match &fields.ground_truth_sdf {
                Some(sdf) => smoothed_step(*sdf.get_unchecked([row, col, 0]), alpha_slope),
                None => channel(3),
            };
            [channel(0), channel(1), channel(2), alpha]
        })
        .collect();

    Ok(PointCloud::new(filled.points.clone(), Some(colors))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::PixelOutcome;
    use approx::assert_relative_eq;
    use contour_lift_image::color::linear_from_srgb;
    use contour_lift_image::ImageSize;

    fn fields(ground_truth_sdf: Option<Image<f32, 1>>) -> DecodedFields {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        DecodedFields {
            color: Image::from_fn(size, |_, col| {
                if col == 0 {
                    [0.5, 0.02, 1.0, 0.25]
                } else {
                    [0.0, 0.0, 0.0, 1.0]
                }
            }),
            sdf: Image::from_fn(size, |_, _| [0.0]),
            displacement: Image::from_fn(size, |_, _| [0.0, 0.0]),
            ground_truth_sdf,
        }
    }

    fn filled() -> FilledPass {
        FilledPass {
            pixels: vec![[0, 0]],
            points: vec![[1.0, 2.0, 3.0]],
            outcomes: vec![PixelOutcome::DirectHit],
        }
    }

    #[test]
    fn smoothed_step_is_monotonic() {
        assert_relative_eq!(smoothed_step(0.0, 1.2), 0.5);
        assert!(smoothed_step(-1.0, 1.2) < smoothed_step(1.0, 1.2));
        assert_relative_eq!(
            smoothed_step(2.0, 1.2) + smoothed_step(-2.0, 1.2),
            1.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn colors_are_linear_with_buffer_alpha() -> Result<(), ReconstructionError> {
        let cloud = assemble_cloud(&fields(None), &filled(), 1.2)?;
        assert_eq!(cloud.points(), &[[1.0, 2.0, 3.0]]);

        let colors = cloud.colors().unwrap_or_default();
        assert_eq!(colors.len(), 1);
        assert_relative_eq!(colors[0][0], linear_from_srgb(0.5f32), epsilon = 1e-6);
        assert_relative_eq!(colors[0][1], 0.02 / 12.92, epsilon = 1e-6);
        assert_relative_eq!(colors[0][2], 1.0, epsilon = 1e-6);
        assert_eq!(colors[0][3], 0.25);

        Ok(())
    }

    #[test]
    fn ground_truth_sdf_drives_alpha() -> Result<(), ReconstructionError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let gt = Image::from_fn(size, |_, col| [col as f32 - 1.0]);
        let cloud = assemble_cloud(&fields(Some(gt)), &filled(), 2.0)?;

        let colors = cloud.colors().unwrap_or_default();
        assert_relative_eq!(colors[0][3], smoothed_step(-1.0, 2.0), epsilon = 1e-6);

        Ok(())
    }
}
