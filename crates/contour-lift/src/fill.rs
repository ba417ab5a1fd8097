use contour_lift_3d::camera::PinholeRayCamera;

use crate::cascade::{CascadePass, PixelOutcome};
use crate::error::ReconstructionError;

/// Neighbor offsets `[dcol, drow]` in the order they are tried.
const NEIGHBORS: [[isize; 2]; 8] = [
    [-1, -1],
    [0, -1],
    [1, -1],
    [-1, 0],
    [1, 0],
    [-1, 1],
    [0, 1],
    [1, 1],
];

/// The points and outcomes of a frame once every pixel has a depth.
#[derive(Debug, Clone)]
pub struct FilledPass {
    /// The `[col, row]` of each contour pixel, in scan order.
    pub pixels: Vec<[usize; 2]>,
    /// The point of each contour pixel.
    pub points: Vec<[f64; 3]>,
    /// The outcome of each contour pixel.
    pub outcomes: Vec<PixelOutcome>,
}

/// Give every unreachable pixel the depth of a reconstructed neighbor.
///
/// Neighbors in the 3x3 window are tried row by row, starting from the row
/// below. Only contour pixels whose own ray hit the surface are sources:
/// depths filled in this pass are never borrowed again. The point is placed
/// on the ray of the unreachable pixel at the borrowed depth.
///
/// # Errors
///
/// [`ReconstructionError::UnreachableDepth`] for the first unreachable pixel
/// without a source neighbor.
pub fn fill_unreachable(
    mut pass: CascadePass,
    camera: &PinholeRayCamera,
) -> Result<FilledPass, ReconstructionError> {
    let image_height = pass.depth.height();
    let mut points = std::mem::take(&mut pass.points);
    let mut filled = Vec::new();

    for (i, &[col, row]) in pass.pixels.iter().enumerate() {
        if pass.outcomes[i] != PixelOutcome::Unreachable {
            continue;
        }

        let depth = source_depth(&pass, col, row)
            .ok_or(ReconstructionError::UnreachableDepth { col, row })?;

        points[i] = camera.point_at_depth([col as f64, row as f64], image_height, depth);
        filled.push(i);
    }

    // outcomes stay untouched during the scan so filled pixels are never sources
    let mut outcomes = pass.outcomes;
    for &i in &filled {
        outcomes[i] = PixelOutcome::NeighborFilled;
    }

    if !filled.is_empty() {
        log::debug!(
            "filled {} unreachable pixels from their neighbors",
            filled.len()
        );
    }

    Ok(FilledPass {
        pixels: pass.pixels,
        points,
        outcomes,
    })
}

fn source_depth(pass: &CascadePass, col: usize, row: usize) -> Option<f64> {
    NEIGHBORS.iter().find_map(|&[dc, dr]| {
        let nc = col.checked_add_signed(dc)?;
        let nr = row.checked_add_signed(dr)?;
        if !pass.outcome_at(nc, nr)?.is_ray_hit() {
            return None;
        }
        pass.depth_at(nc, nr)
    })
}
