use crate::error::GeometryError;

/// A point cloud with points and optional RGBA colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points, index-aligned with the points.
    colors: Option<Vec<[f32; 4]>>,
}

impl PointCloud {
    /// Create a new point cloud from points and optional colors.
    ///
    /// # Errors
    ///
    /// If the colors are not index-aligned with the points.
    pub fn new(points: Vec<[f64; 3]>, colors: Option<Vec<[f32; 4]>>) -> Result<Self, GeometryError> {
        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err(GeometryError::MismatchedColors(points.len(), colors.len()));
            }
        }
        Ok(Self { points, colors })
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[f32; 4]]> {
        self.colors.as_deref()
    }

    /// Split the cloud into its points and colors.
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Option<Vec<[f32; 4]>>) {
        (self.points, self.colors)
    }

    /// Get the minimum bound of the point cloud.
    pub fn get_min_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::min)
    }

    /// Get the maximum bound of the point cloud.
    pub fn get_max_bound(&self) -> Option<[f64; 3]> {
        self.fold_bound(f64::max)
    }

    fn fold_bound(&self, f: fn(f64, f64) -> f64) -> Option<[f64; 3]> {
        let first = *self.points.first()?;
        Some(self.points.iter().fold(first, |acc, p| {
            [f(acc[0], p[0]), f(acc[1], p[1]), f(acc[2], p[2])]
        }))
    }
}
