/// An error type for the 3d module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GeometryError {
    /// The focal length must be finite and strictly positive.
    #[error("Invalid focal length: {0}")]
    InvalidFocalLength(f64),

    /// The principal point must be finite.
    #[error("Invalid principal point: ({0}, {1})")]
    InvalidPrincipalPoint(f64, f64),

    /// The downsampling factor must be finite and strictly positive.
    #[error("Invalid downsampling factor: {0}")]
    InvalidScale(f64),

    /// A triangle references a vertex that does not exist.
    #[error("Triangle {0} references vertex {1} but the mesh has {2} vertices")]
    TriangleIndexOutOfBounds(usize, usize, usize),

    /// Colors and points of a point cloud must be index-aligned.
    #[error("Point cloud has {0} points but {1} colors")]
    MismatchedColors(usize, usize),
}
