use std::time::Instant;

use contour_lift_3d::camera::PinholeRayCamera;
use contour_lift_3d::mesh::RaySurface;
use contour_lift_3d::pointcloud::PointCloud;

use crate::assemble::assemble_cloud;
use crate::cascade::{Cascade, PixelOutcome};
use crate::config::ReconstructionConfig;
use crate::contour::{contour_mask, contour_pixels};
use crate::error::ReconstructionError;
use crate::fields::{decode_fields, FrameInputs};
use crate::fill::fill_unreachable;

/// Counts of the pixel outcomes of a reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructionStats {
    /// Number of contour pixels.
    pub contour_pixels: usize,
    /// Pixels reconstructed from their own ray.
    pub direct_hits: usize,
    /// Pixels reconstructed from the ray through the displaced pixel.
    pub displacement_hits: usize,
    /// Pixels reconstructed from the ray through the extended displacement.
    pub extended_displacement_hits: usize,
    /// Pixels whose depth was borrowed from a neighbor.
    pub neighbor_filled: usize,
}

impl ReconstructionStats {
    fn from_outcomes(outcomes: &[PixelOutcome]) -> Self {
        let mut stats = Self {
            contour_pixels: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                PixelOutcome::DirectHit => stats.direct_hits += 1,
                PixelOutcome::DisplacementHit => stats.displacement_hits += 1,
                PixelOutcome::ExtendedDisplacementHit => stats.extended_displacement_hits += 1,
                PixelOutcome::NeighborFilled => stats.neighbor_filled += 1,
                // every unreachable pixel is filled or the run fails
                PixelOutcome::Unreachable => {}
            }
        }
        stats
    }
}

/// The result of reconstructing one frame.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// The colored points, one per contour pixel in scan order.
    pub cloud: PointCloud,
    /// The `[col, row]` of each point, row 0 at the bottom.
    pub pixels: Vec<[usize; 2]>,
    /// How each point was obtained.
    pub outcomes: Vec<PixelOutcome>,
    /// Outcome counts.
    pub stats: ReconstructionStats,
}

/// Lift the silhouette contour of a rendered frame onto a surface.
///
/// Decodes the frame buffers, selects the pixels near the silhouette contour,
/// casts camera rays against `surface` to give each of them a depth, fills the
/// pixels no ray reached from their neighbors, and returns the colored points.
///
/// # Arguments
///
/// * `inputs` - The frame buffers.
/// * `surface` - The surface the rays are cast against, in camera space.
/// * `camera` - The pinhole camera of the frame, at the world origin.
/// * `config` - The reconstruction parameters.
///
/// # Errors
///
/// * [`ReconstructionError::DimensionMismatch`] if the buffers differ in size.
/// * [`ReconstructionError::UnreachableDepth`] if a pixel gets no depth.
/// * Image, geometry or config errors for malformed inputs.
///
/// # Example
///
/// ```
/// use contour_lift::image::{ImageSize, PixelBuffer};
/// use contour_lift::k3d::camera::PinholeRayCamera;
/// use contour_lift::k3d::mesh::TriangleMesh;
/// use contour_lift::{reconstruct, FrameInputs, ReconstructionConfig};
///
/// let size = ImageSize { width: 2, height: 2 };
/// let color = vec![1.0f32; 2 * 2 * 4];
/// // every pixel is on the silhouette with no displacement
/// let fields = vec![8.0f32 / 255.0; 2 * 2 * 4];
///
/// let inputs = FrameInputs::new(
///     PixelBuffer::new(size, 4, &color).unwrap(),
///     PixelBuffer::new(size, 4, &fields).unwrap(),
///     PixelBuffer::new(size, 4, &fields).unwrap(),
/// );
/// let plane = TriangleMesh::quad([
///     [-100.0, -100.0, 10.0],
///     [100.0, -100.0, 10.0],
///     [100.0, 100.0, 10.0],
///     [-100.0, 100.0, 10.0],
/// ]);
/// let camera = PinholeRayCamera::new([1.0, 1.0], 2.0).unwrap();
///
/// let res = reconstruct(&inputs, &plane, &camera, &ReconstructionConfig::default()).unwrap();
/// assert_eq!(res.cloud.len(), 4);
/// assert!(res.cloud.points().iter().all(|p| (p[2] - 10.0).abs() < 1e-9));
/// ```
pub fn reconstruct<S: RaySurface + ?Sized>(
    inputs: &FrameInputs,
    surface: &S,
    camera: &PinholeRayCamera,
    config: &ReconstructionConfig,
) -> Result<Reconstruction, ReconstructionError> {
    config.validate()?;
    camera.validate()?;

    let t0 = Instant::now();
    let fields = decode_fields(inputs, &config.encoding)?;
    log::debug!("decoded fields in {:?}", t0.elapsed());

    let t0 = Instant::now();
    let mask = contour_mask(&fields.sdf, config.contour_tolerance);
    let pixels = contour_pixels(&mask);
    log::debug!(
        "selected {} contour pixels in {:?}",
        pixels.len(),
        t0.elapsed()
    );

    let t0 = Instant::now();
    let pass = Cascade::new(surface, camera, &fields, config).run(pixels);
    let unreachable = pass.num_unreachable();
    log::debug!("ray cascade in {:?}", t0.elapsed());

    let t0 = Instant::now();
    let filled = fill_unreachable(pass, camera)?;
    log::debug!("depth fill-in in {:?}", t0.elapsed());

    let cloud = assemble_cloud(&fields, &filled, config.alpha_slope)?;
    let stats = ReconstructionStats::from_outcomes(&filled.outcomes);

    log::info!(
        "reconstructed {} points: {} direct, {} displaced, {} extended, {} of {} unreachable filled",
        stats.contour_pixels,
        stats.direct_hits,
        stats.displacement_hits,
        stats.extended_displacement_hits,
        stats.neighbor_filled,
        unreachable
    );

    Ok(Reconstruction {
        cloud,
        pixels: filled.pixels,
        outcomes: filled.outcomes,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_outcomes() {
        let stats = ReconstructionStats::from_outcomes(&[
            PixelOutcome::DirectHit,
            PixelOutcome::DirectHit,
            PixelOutcome::DisplacementHit,
            PixelOutcome::ExtendedDisplacementHit,
            PixelOutcome::NeighborFilled,
        ]);
        assert_eq!(
            stats,
            ReconstructionStats {
                contour_pixels: 5,
                direct_hits: 2,
                displacement_hits: 1,
                extended_displacement_hits: 1,
                neighbor_filled: 1,
            }
        );
    }
}
