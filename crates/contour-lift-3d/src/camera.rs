use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Full-resolution focal length of the reference dataset camera.
pub const REFERENCE_FOCAL_LENGTH: f64 = 650.0;

/// Full-resolution principal point of the reference dataset camera.
pub const REFERENCE_PRINCIPAL_POINT: [f64; 2] = [324.328, 257.323];

/// Downsampling factor between the reference calibration and its field images.
pub const REFERENCE_DOWNSAMPLING: f64 = 4.0;

/// A pinhole camera that turns image pixels into rays from the world origin.
///
/// Pixel coordinates are `[col, row]` with rows counted from the bottom of the
/// image, as stored by the host buffers. The camera poses the surface is
/// rendered with count rows from the top, so the row is flipped against the
/// image height before the principal point is subtracted.
///
/// The principal point and focal length must be expressed at the resolution
/// of the images the rays are cast for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeRayCamera {
    /// The principal point in pixels (cx, cy).
    pub principal_point: [f64; 2],
    /// The focal length in pixels.
    pub focal_length: f64,
    /// Offset added to pixel coordinates before projection, `0.5` samples pixel centers.
    #[serde(default)]
    pub pixel_center_offset: f64,
}

impl PinholeRayCamera {
    /// Creates a new camera from intrinsics already scaled to the image resolution.
    ///
    /// # Errors
    ///
    /// If the focal length is not finite and positive, or the principal point is not finite.
    pub fn new(principal_point: [f64; 2], focal_length: f64) -> Result<Self, GeometryError> {
        let camera = Self {
            principal_point,
            focal_length,
            pixel_center_offset: 0.0,
        };
        camera.validate()?;
        Ok(camera)
    }

    /// Creates a camera from a full-resolution calibration used on images
    /// downsampled by `factor`.
    ///
    /// # Example
    ///
    /// ```
    /// use contour_lift_3d::camera::PinholeRayCamera;
    ///
    /// let camera = PinholeRayCamera::from_full_resolution([324.328, 257.323], 650.0, 4.0).unwrap();
    /// assert_eq!(camera.focal_length, 162.5);
    /// ```
    pub fn from_full_resolution(
        principal_point: [f64; 2],
        focal_length: f64,
        factor: f64,
    ) -> Result<Self, GeometryError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(GeometryError::InvalidScale(factor));
        }
        Self::new(
            [principal_point[0] / factor, principal_point[1] / factor],
            focal_length / factor,
        )
    }

    /// The camera the reference dataset field images were produced with.
    pub fn reference_downsampled() -> Self {
        Self {
            principal_point: [
                REFERENCE_PRINCIPAL_POINT[0] / REFERENCE_DOWNSAMPLING,
                REFERENCE_PRINCIPAL_POINT[1] / REFERENCE_DOWNSAMPLING,
            ],
            focal_length: REFERENCE_FOCAL_LENGTH / REFERENCE_DOWNSAMPLING,
            pixel_center_offset: 0.0,
        }
    }

    /// Set the offset added to pixel coordinates before projection.
    pub fn with_pixel_center_offset(mut self, offset: f64) -> Self {
        self.pixel_center_offset = offset;
        self
    }

    /// Check the intrinsics, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.focal_length.is_finite() || self.focal_length <= 0.0 {
            return Err(GeometryError::InvalidFocalLength(self.focal_length));
        }
        let [cx, cy] = self.principal_point;
        if !cx.is_finite() || !cy.is_finite() || !self.pixel_center_offset.is_finite() {
            return Err(GeometryError::InvalidPrincipalPoint(cx, cy));
        }
        Ok(())
    }

    /// The x, y components of the ray through `pixel`.
    ///
    /// # Arguments
    ///
    /// * `pixel` - The `[col, row]` pixel coordinate, row 0 at the bottom.
    /// * `image_height` - The height of the image in pixels.
    pub fn ray_xy(&self, pixel: [f64; 2], image_height: usize) -> [f64; 2] {
        let col = pixel[0] + self.pixel_center_offset;
        let flipped_row = image_height as f64 - (pixel[1] + self.pixel_center_offset);
        [
            col - self.principal_point[0],
            flipped_row - self.principal_point[1],
        ]
    }

    /// The direction of the ray from the world origin through `pixel`.
    ///
    /// # Example
    ///
    /// ```
    /// use contour_lift_3d::camera::PinholeRayCamera;
    ///
    /// let camera = PinholeRayCamera::new([81.082, 64.33], 162.5).unwrap();
    /// let dir = camera.ray_direction([50.0, 50.0], 100);
    /// assert!((dir[0] + 31.082).abs() < 1e-9);
    /// assert!((dir[1] + 14.33).abs() < 1e-9);
    /// assert_eq!(dir[2], 162.5);
    /// ```
    pub fn ray_direction(&self, pixel: [f64; 2], image_height: usize) -> [f64; 3] {
        let [x, y] = self.ray_xy(pixel, image_height);
        [x, y, self.focal_length]
    }

    /// The x, y of the point at `depth` on the ray through `pixel`.
    ///
    /// Used to keep the depth sampled on another ray while placing the point
    /// on the ray of `pixel`.
    pub fn borrow_depth(&self, pixel: [f64; 2], image_height: usize, depth: f64) -> [f64; 2] {
        let [x, y] = self.ray_xy(pixel, image_height);
        let scale = depth / self.focal_length;
        [x * scale, y * scale]
    }

    /// The point at `depth` on the ray through `pixel`.
    pub fn point_at_depth(&self, pixel: [f64; 2], image_height: usize, depth: f64) -> [f64; 3] {
        let [x, y] = self.borrow_depth(pixel, image_height, depth);
        [x, y, depth]
    }
}

impl Default for PinholeRayCamera {
    fn default() -> Self {
        Self::reference_downsampled()
    }
}
