use rayon::prelude::*;

use contour_lift_3d::camera::PinholeRayCamera;
use contour_lift_3d::mesh::{RayHit, RaySurface};
use contour_lift_image::{Image, ImageSize};

use crate::config::{ExecutionStrategy, ReconstructionConfig};
use crate::fields::DecodedFields;

/// All camera rays start at the world origin of the surface.
const RAY_ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];

/// How the point of a contour pixel was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelOutcome {
    /// The ray through the pixel itself hit the surface.
    DirectHit,
    /// The ray through the displaced pixel hit the surface.
    DisplacementHit,
    /// The ray through the pixel displaced one step further hit the surface.
    ExtendedDisplacementHit,
    /// The depth was borrowed from a neighbor after every ray missed.
    NeighborFilled,
    /// Every ray missed; the point is a placeholder until the fill-in pass.
    Unreachable,
}

impl PixelOutcome {
    /// Whether the point came from one of the pixel's own ray casts.
    ///
    /// Only these pixels are trusted as depth sources by the fill-in pass.
    pub fn is_ray_hit(&self) -> bool {
        matches!(
            self,
            PixelOutcome::DirectHit
                | PixelOutcome::DisplacementHit
                | PixelOutcome::ExtendedDisplacementHit
        )
    }
}

/// The point and outcome of one pixel after the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCast {
    /// The reconstructed point, or the placeholder if unreachable.
    pub point: [f64; 3],
    /// How the point was obtained.
    pub outcome: PixelOutcome,
}

/// The ray-cast cascade over the contour pixels of one frame.
///
/// For each pixel the cascade tries, in order:
///
/// 1. the ray through the pixel, when the pixel is on or inside the silhouette;
/// 2. the ray through the pixel moved by its displacement vector;
/// 3. the ray through the pixel moved by its displacement vector extended by
///    [`ReconstructionConfig::extension`] pixels.
///
/// A hit from step 2 or 3 only provides the depth: the point is placed on the
/// ray of the pixel itself at that depth.
pub struct Cascade<'a, S: RaySurface + ?Sized> {
    surface: &'a S,
    camera: &'a PinholeRayCamera,
    fields: &'a DecodedFields,
    config: &'a ReconstructionConfig,
}

impl<'a, S: RaySurface + ?Sized> Cascade<'a, S> {
    /// Bind the cascade to a surface, camera and decoded frame.
    pub fn new(
        surface: &'a S,
        camera: &'a PinholeRayCamera,
        fields: &'a DecodedFields,
        config: &'a ReconstructionConfig,
    ) -> Self {
        Self {
            surface,
            camera,
            fields,
            config,
        }
    }

    fn image_height(&self) -> usize {
        self.fields.size().height
    }

    fn cast(&self, pixel: [f64; 2]) -> Option<RayHit> {
        let direction = self.camera.ray_direction(pixel, self.image_height());
        self.surface.ray_cast(&RAY_ORIGIN, &direction)
    }

    /// Cast through `through` and place the hit depth on the ray of `pixel`.
    fn cast_borrowing_depth(&self, through: [f64; 2], pixel: [f64; 2]) -> Option<[f64; 3]> {
        self.cast(through).map(|hit| {
            self.camera
                .point_at_depth(pixel, self.image_height(), hit.point[2])
        })
    }

    /// Run the cascade for the pixel at `[col, row]`.
    ///
    /// PRECONDITION: the pixel is inside the decoded fields.
    pub fn cast_pixel(&self, pixel: [usize; 2]) -> PixelCast {
        let [col, row] = pixel;
        let p = [col as f64, row as f64];

        let sdf = *self.fields.sdf.get_unchecked([row, col, 0]);
        if sdf <= self.config.direct_max_sdf {
            if let Some(hit) = self.cast(p) {
                return PixelCast {
                    point: hit.point,
                    outcome: PixelOutcome::DirectHit,
                };
            }
        }

        let delta = [
            *self.fields.displacement.get_unchecked([row, col, 0]) as f64,
            *self.fields.displacement.get_unchecked([row, col, 1]) as f64,
        ];

        let near = [p[0] + delta[0], p[1] + delta[1]];
        if let Some(point) = self.cast_borrowing_depth(near, p) {
            return PixelCast {
                point,
                outcome: PixelOutcome::DisplacementHit,
            };
        }

        // a zero displacement has no direction to extend along
        let norm = delta[0].hypot(delta[1]);
        if norm > 0.0 {
            let scale = (norm + self.config.extension) / norm;
            let far = [p[0] + delta[0] * scale, p[1] + delta[1] * scale];
            if let Some(point) = self.cast_borrowing_depth(far, p) {
                return PixelCast {
                    point,
                    outcome: PixelOutcome::ExtendedDisplacementHit,
                };
            }
        }

        log::warn!(
            "no surface hit for pixel (col {}, row {}) with displacement ({}, {})",
            col,
            row,
            delta[0],
            delta[1]
        );

        PixelCast {
            point: [0.0, 0.0, self.config.placeholder_depth],
            outcome: PixelOutcome::Unreachable,
        }
    }

    /// Run the cascade for every pixel, in the given order.
    ///
    /// The result holds one entry per pixel, in the input order, whatever the
    /// execution strategy.
    pub fn run(&self, pixels: Vec<[usize; 2]>) -> CascadePass {
        let casts: Vec<PixelCast> = match self.config.execution {
            ExecutionStrategy::Serial => pixels.iter().map(|&p| self.cast_pixel(p)).collect(),
            ExecutionStrategy::Parallel => {
                pixels.par_iter().map(|&p| self.cast_pixel(p)).collect()
            }
        };

        CascadePass::new(self.fields.size(), pixels, casts)
    }
}

/// The state of a frame after the cascade, before the fill-in pass.
///
/// Holds every contour pixel's point and outcome, plus two grids indexed by
/// pixel: the slot of the pixel in the lists and the depth it ended with
/// (the placeholder depth for unreachable pixels).
#[derive(Debug, Clone)]
pub struct CascadePass {
    pub(crate) pixels: Vec<[usize; 2]>,
    pub(crate) points: Vec<[f64; 3]>,
    pub(crate) outcomes: Vec<PixelOutcome>,
    pub(crate) slots: Image<Option<usize>, 1>,
    pub(crate) depth: Image<f64, 1>,
}

impl CascadePass {
    fn new(size: ImageSize, pixels: Vec<[usize; 2]>, casts: Vec<PixelCast>) -> Self {
        let mut slots = Image::from_fn(size, |_, _| [None]);
        let mut depth = Image::from_fn(size, |_, _| [0.0]);

        for (i, (&[col, row], cast)) in pixels.iter().zip(&casts).enumerate() {
            if let Some(slot) = slots.get_mut([row, col, 0]) {
                *slot = Some(i);
            }
            if let Some(z) = depth.get_mut([row, col, 0]) {
                *z = cast.point[2];
            }
        }

        let (points, outcomes) = casts.into_iter().map(|c| (c.point, c.outcome)).unzip();

        Self {
            pixels,
            points,
            outcomes,
            slots,
            depth,
        }
    }

    /// The `[col, row]` of each contour pixel, in scan order.
    pub fn pixels(&self) -> &[[usize; 2]] {
        &self.pixels
    }

    /// The point of each contour pixel.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// The outcome of each contour pixel.
    pub fn outcomes(&self) -> &[PixelOutcome] {
        &self.outcomes
    }

    /// The depth a pixel ended the cascade with, `None` for non-contour pixels.
    pub fn depth_at(&self, col: usize, row: usize) -> Option<f64> {
        self.outcome_at(col, row)?;
        self.depth.get([row, col, 0]).copied()
    }

    /// The outcome of a pixel, `None` for non-contour or out of bounds pixels.
    pub fn outcome_at(&self, col: usize, row: usize) -> Option<PixelOutcome> {
        let slot = (*self.slots.get([row, col, 0])?)?;
        self.outcomes.get(slot).copied()
    }

    /// Number of pixels every ray missed.
    pub fn num_unreachable(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| **o == PixelOutcome::Unreachable)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DecodedFields;
    use approx::assert_relative_eq;
    use contour_lift_3d::mesh::TriangleMesh;
    use contour_lift_image::ImageSize;

    const HEIGHT: usize = 10;

    /// Hits only the rays through the listed pixels, each at its own depth.
    struct PixelSurface {
        camera: PinholeRayCamera,
        hits: Vec<([f64; 2], f64)>,
    }

    impl RaySurface for PixelSurface {
        fn ray_cast(&self, origin: &[f64; 3], direction: &[f64; 3]) -> Option<RayHit> {
            self.hits.iter().find_map(|&(pixel, depth)| {
                let expected = self.camera.ray_direction(pixel, HEIGHT);
                let same = expected
                    .iter()
                    .zip(direction)
                    .all(|(a, b)| (a - b).abs() < 1e-9);
                same.then(|| {
                    let t = depth / direction[2];
                    RayHit {
                        point: [
                            origin[0] + t * direction[0],
                            origin[1] + t * direction[1],
                            depth,
                        ],
                        normal: [0.0, 0.0, -1.0],
                        face_index: 0,
                        distance: t,
                    }
                })
            })
        }
    }

    fn camera() -> PinholeRayCamera {
        PinholeRayCamera {
            principal_point: [4.5, 5.5],
            focal_length: 20.0,
            pixel_center_offset: 0.0,
        }
    }

    fn fields(sdf: f32, displacement: [f32; 2]) -> DecodedFields {
        let size = ImageSize {
            width: 10,
            height: HEIGHT,
        };
        DecodedFields {
            color: Image::from_fn(size, |_, _| [0.5, 0.5, 0.5, 1.0]),
            sdf: Image::from_fn(size, |_, _| [sdf]),
            displacement: Image::from_fn(size, |_, _| displacement),
            ground_truth_sdf: None,
        }
    }

    #[test]
    fn direct_hit_keeps_point() {
        let camera = camera();
        let mesh = TriangleMesh::quad([
            [-100.0, -100.0, 50.0],
            [100.0, -100.0, 50.0],
            [100.0, 100.0, 50.0],
            [-100.0, 100.0, 50.0],
        ]);
        let fields = fields(-1.0, [2.0, 0.0]);
        let config = ReconstructionConfig::default();
        let cascade = Cascade::new(&mesh, &camera, &fields, &config);

        let cast = cascade.cast_pixel([3, 4]);
        assert_eq!(cast.outcome, PixelOutcome::DirectHit);
        let dir = camera.ray_direction([3.0, 4.0], HEIGHT);
        assert_relative_eq!(cast.point[0], dir[0] * 50.0 / 20.0, epsilon = 1e-9);
        assert_relative_eq!(cast.point[1], dir[1] * 50.0 / 20.0, epsilon = 1e-9);
        assert_relative_eq!(cast.point[2], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn displacement_hit_uses_own_ray() {
        let camera = camera();
        let depth = 37.0;
        // only the displaced pixel (5, 2) is on the surface
        let surface = PixelSurface {
            camera,
            hits: vec![([5.0, 2.0], depth)],
        };
        let fields = fields(0.0, [2.0, -2.0]);
        let config = ReconstructionConfig::default();
        let cascade = Cascade::new(&surface, &camera, &fields, &config);

        let cast = cascade.cast_pixel([3, 4]);
        assert_eq!(cast.outcome, PixelOutcome::DisplacementHit);

        let own = camera.ray_direction([3.0, 4.0], HEIGHT);
        assert_eq!(cast.point[2], depth);
        assert_relative_eq!(cast.point[0], own[0] * depth / 20.0, epsilon = 1e-12);
        assert_relative_eq!(cast.point[1], own[1] * depth / 20.0, epsilon = 1e-12);

        // not the x, y of the displaced ray
        let displaced = camera.ray_direction([5.0, 2.0], HEIGHT);
        assert!((cast.point[0] - displaced[0] * depth / 20.0).abs() > 1e-3);
    }

    #[test]
    fn outside_pixels_skip_the_direct_ray() {
        let camera = camera();
        // the pixel itself is on the surface but lies outside the silhouette
        let surface = PixelSurface {
            camera,
            hits: vec![([3.0, 4.0], 10.0), ([3.0, 6.0], 30.0)],
        };
        let fields = fields(2.0, [0.0, 2.0]);
        let config = ReconstructionConfig::default();
        let cascade = Cascade::new(&surface, &camera, &fields, &config);

        let cast = cascade.cast_pixel([3, 4]);
        assert_eq!(cast.outcome, PixelOutcome::DisplacementHit);
        assert_eq!(cast.point[2], 30.0);
    }

    #[test]
    fn extended_displacement_pushes_one_pixel_further() {
        let camera = camera();
        // displacement (3, 4) has norm 5, extended to norm 6: (3.6, 4.8)
        let surface = PixelSurface {
            camera,
            hits: vec![([1.0 + 3.6, 1.0 + 4.8], 12.0)],
        };
        let fields = fields(5.0, [3.0, 4.0]);
        let config = ReconstructionConfig::default();
        let cascade = Cascade::new(&surface, &camera, &fields, &config);

        let cast = cascade.cast_pixel([1, 1]);
        assert_eq!(cast.outcome, PixelOutcome::ExtendedDisplacementHit);
        let own = camera.ray_direction([1.0, 1.0], HEIGHT);
        assert_relative_eq!(cast.point[0], own[0] * 12.0 / 20.0, epsilon = 1e-12);
        assert_eq!(cast.point[2], 12.0);
    }

    #[test]
    fn total_miss_records_placeholder() {
        let camera = camera();
        let surface = PixelSurface {
            camera,
            hits: vec![],
        };
        let fields = fields(0.0, [0.0, 0.0]);
        let config = ReconstructionConfig {
            placeholder_depth: 123.0,
            ..Default::default()
        };
        let cascade = Cascade::new(&surface, &camera, &fields, &config);

        let cast = cascade.cast_pixel([2, 2]);
        assert_eq!(cast.outcome, PixelOutcome::Unreachable);
        assert_eq!(cast.point, [0.0, 0.0, 123.0]);
    }

    #[test]
    fn run_fills_grids_in_order() {
        let camera = camera();
        let surface = PixelSurface {
            camera,
            hits: vec![([1.0, 0.0], 5.0), ([0.0, 1.0], 6.0)],
        };
        let fields = fields(0.0, [0.0, 0.0]);
        let pixels = vec![[1, 0], [0, 1], [2, 2]];

        for execution in [ExecutionStrategy::Serial, ExecutionStrategy::Parallel] {
            let config = ReconstructionConfig {
                execution,
                ..Default::default()
            };
            let pass = Cascade::new(&surface, &camera, &fields, &config).run(pixels.clone());

            assert_eq!(pass.pixels(), &pixels[..]);
            assert_eq!(
                pass.outcomes(),
                &[
                    PixelOutcome::DirectHit,
                    PixelOutcome::DirectHit,
                    PixelOutcome::Unreachable
                ]
            );
            assert_eq!(pass.depth_at(1, 0), Some(5.0));
            assert_eq!(pass.depth_at(0, 1), Some(6.0));
            assert_eq!(pass.depth_at(2, 2), Some(100.0));
            assert_eq!(pass.depth_at(5, 5), None);
            assert_eq!(pass.outcome_at(2, 2), Some(PixelOutcome::Unreachable));
            assert_eq!(pass.outcome_at(50, 2), None);
            assert_eq!(pass.num_unreachable(), 1);
        }
    }
}
