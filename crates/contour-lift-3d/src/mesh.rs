use glam::DVec3;

use crate::error::GeometryError;

// Rays closer than this to a triangle's plane are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;
// Hits closer than this to the ray origin are ignored.
const MIN_DISTANCE: f64 = 1e-9;

/// The result of a successful ray cast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The intersection point in world space.
    pub point: [f64; 3],
    /// The unit normal of the face that was hit.
    pub normal: [f64; 3],
    /// The index of the face that was hit.
    pub face_index: usize,
    /// The ray parameter of the hit, `point = origin + distance * direction`.
    pub distance: f64,
}

/// A surface that can be queried with rays.
///
/// The surface is only read while casting, so one instance can be shared by
/// all pixel workers.
pub trait RaySurface: Sync {
    /// Cast a ray and return the closest hit in front of the origin, if any.
    ///
    /// The direction does not need to be normalized.
    fn ray_cast(&self, origin: &[f64; 3], direction: &[f64; 3]) -> Option<RayHit>;
}

/// A triangle mesh in world space.
///
/// Ray casts reject rays missing the mesh bounds, then test every triangle:
/// a cast costs O(triangles), which suits the low-poly reference surfaces.
/// Dense scanned meshes need an acceleration structure in front of it.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[usize; 3]>,
    bounds: Option<(DVec3, DVec3)>,
}

impl TriangleMesh {
    /// Create a mesh from vertices and triangles indexing into them.
    ///
    /// # Errors
    ///
    /// If a triangle references a vertex that does not exist.
    pub fn new(vertices: Vec<[f64; 3]>, triangles: Vec<[usize; 3]>) -> Result<Self, GeometryError> {
        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&index| index >= vertices.len()) {
                return Err(GeometryError::TriangleIndexOutOfBounds(
                    i,
                    index,
                    vertices.len(),
                ));
            }
        }

        let bounds = vertices.first().map(|&first| {
            let first = DVec3::from_array(first);
            vertices.iter().fold((first, first), |(lo, hi), &v| {
                let v = DVec3::from_array(v);
                (lo.min(v), hi.max(v))
            })
        });

        Ok(Self {
            vertices,
            triangles,
            bounds,
        })
    }

    /// Create a mesh made of a single quad `p0 p1 p2 p3`, split along `p0 p2`.
    ///
    /// # Example
    ///
    /// ```
    /// use contour_lift_3d::mesh::{RaySurface, TriangleMesh};
    ///
    /// let plane = TriangleMesh::quad([
    ///     [-1.0, -1.0, 5.0],
    ///     [1.0, -1.0, 5.0],
    ///     [1.0, 1.0, 5.0],
    ///     [-1.0, 1.0, 5.0],
    /// ]);
    /// let hit = plane.ray_cast(&[0.0, 0.0, 0.0], &[0.0, 0.0, 1.0]).unwrap();
    /// assert_eq!(hit.point, [0.0, 0.0, 5.0]);
    /// ```
    pub fn quad(corners: [[f64; 3]; 4]) -> Self {
        let vertices = corners.to_vec();
        let triangles = vec![[0, 1, 2], [0, 2, 3]];
        // indices are in range by construction
        Self::new(vertices, triangles).unwrap_or_default()
    }

    /// Get as reference the vertices of the mesh.
    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        self.bounds.map(|(lo, hi)| (lo.to_array(), hi.to_array()))
    }

    fn corners(&self, face_index: usize) -> [DVec3; 3] {
        self.triangles[face_index].map(|index| DVec3::from_array(self.vertices[index]))
    }

    /// Slab test of the ray against the mesh bounds.
    fn ray_hits_bounds(&self, origin: DVec3, direction: DVec3) -> bool {
        let Some((lo, hi)) = self.bounds else {
            return false;
        };
        let mut t_min = 0.0f64;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            if direction[axis].abs() < PARALLEL_EPSILON {
                if origin[axis] < lo[axis] || origin[axis] > hi[axis] {
                    return false;
                }
                continue;
            }
            let inv = direction[axis].recip();
            let t0 = (lo[axis] - origin[axis]) * inv;
            let t1 = (hi[axis] - origin[axis]) * inv;
            t_min = t_min.max(t0.min(t1));
            t_max = t_max.min(t0.max(t1));
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}

/// Möller–Trumbore ray/triangle intersection, returning the ray parameter.
///
/// Both faces of the triangle are hit.
pub fn ray_triangle_intersect(
    origin: DVec3,
    direction: DVec3,
    [v0, v1, v2]: [DVec3; 3],
) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = direction.cross(edge2);
    let det = edge1.dot(h);

    // ray is parallel to the triangle
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let inv_det = det.recip();
    let s = origin - v0;
    let u = inv_det * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = inv_det * direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * edge2.dot(q);
    (t > MIN_DISTANCE).then_some(t)
}

impl RaySurface for TriangleMesh {
    fn ray_cast(&self, origin: &[f64; 3], direction: &[f64; 3]) -> Option<RayHit> {
        let origin = DVec3::from_array(*origin);
        let direction = DVec3::from_array(*direction);
        if !self.ray_hits_bounds(origin, direction) {
            return None;
        }

        let (face_index, distance) = (0..self.triangles.len())
            .filter_map(|i| {
                ray_triangle_intersect(origin, direction, self.corners(i)).map(|t| (i, t))
            })
            // closest hit, first face wins ties
            .fold(None, |best: Option<(usize, f64)>, (i, t)| match best {
                Some((_, best_t)) if best_t <= t => best,
                _ => Some((i, t)),
            })?;

        let [a, b, c] = self.corners(face_index);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        let point = origin + distance * direction;

        Some(RayHit {
            point: point.to_array(),
            normal: normal.to_array(),
            face_index,
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane_at(z: f64) -> TriangleMesh {
        TriangleMesh::quad([
            [-10.0, -10.0, z],
            [10.0, -10.0, z],
            [10.0, 10.0, z],
            [-10.0, 10.0, z],
        ])
    }

    #[test]
    fn test_ray_triangle_intersect() {
        let tri = [
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(0.0, 1.0, 2.0),
        ];
        let up = DVec3::Z;
        let t = ray_triangle_intersect(DVec3::new(0.2, 0.2, 0.0), up, tri);
        assert_eq!(t, Some(2.0));

        // outside the triangle
        let t = ray_triangle_intersect(DVec3::new(0.8, 0.8, 0.0), up, tri);
        assert_eq!(t, None);

        // behind the origin
        let t = ray_triangle_intersect(DVec3::new(0.2, 0.2, 3.0), up, tri);
        assert_eq!(t, None);

        // parallel
        let t = ray_triangle_intersect(DVec3::new(0.2, 0.2, 0.0), DVec3::X, tri);
        assert_eq!(t, None);
    }

    #[test]
    fn test_ray_cast_plane() {
        let mesh = plane_at(4.0);
        let hit = mesh.ray_cast(&[0.0, 0.0, 0.0], &[1.0, -0.5, 2.0]);
        let Some(hit) = hit else {
            panic!("expected a hit");
        };
        assert_relative_eq!(hit.point[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point[2], 4.0, epsilon = 1e-12);
        assert_relative_eq!(hit.normal[2].abs(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-12);

        // outside the quad
        assert!(mesh.ray_cast(&[0.0, 0.0, 0.0], &[4.0, 0.0, 1.0]).is_none());
        // pointing away
        assert!(mesh.ray_cast(&[0.0, 0.0, 0.0], &[0.0, 0.0, -1.0]).is_none());
    }

    #[test]
    fn test_ray_cast_closest_face() -> Result<(), GeometryError> {
        let near = plane_at(3.0);
        let far = plane_at(7.0);
        let mut vertices = far.vertices().to_vec();
        vertices.extend_from_slice(near.vertices());
        let mesh = TriangleMesh::new(vertices, vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]])?;

        let hit = mesh.ray_cast(&[0.5, 0.5, 0.0], &[0.0, 0.0, 1.0]);
        assert_eq!(hit.map(|h| h.point[2]), Some(3.0));
        assert!(hit.map(|h| h.face_index >= 2).unwrap_or(false));

        Ok(())
    }

    #[test]
    fn test_ray_cast_tilted_plane() {
        // z = 10 + x
        let mesh = TriangleMesh::quad([
            [-5.0, -5.0, 5.0],
            [5.0, -5.0, 15.0],
            [5.0, 5.0, 15.0],
            [-5.0, 5.0, 5.0],
        ]);
        assert_eq!(mesh.bounds(), Some(([-5.0, -5.0, 5.0], [5.0, 5.0, 15.0])));

        let Some(hit) = mesh.ray_cast(&[0.0, 0.0, 0.0], &[0.0, 0.0, 2.0]) else {
            panic!("expected a hit");
        };
        assert_relative_eq!(hit.point[2], 10.0, epsilon = 1e-12);
        assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-12);

        let n = DVec3::from_array(hit.normal);
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.dot(DVec3::new(1.0, 0.0, -1.0)).abs(), 2f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(n.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_triangle() {
        let res = TriangleMesh::new(vec![[0.0; 3]; 3], vec![[0, 1, 3]]);
        assert!(matches!(
            res,
            Err(GeometryError::TriangleIndexOutOfBounds(0, 3, 3))
        ));
    }

    #[test]
    fn test_empty_mesh() -> Result<(), GeometryError> {
        let mesh = TriangleMesh::new(vec![], vec![])?;
        assert!(mesh.bounds().is_none());
        assert!(mesh.ray_cast(&[0.0; 3], &[0.0, 0.0, 1.0]).is_none());
        Ok(())
    }
}
