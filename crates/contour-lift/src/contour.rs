use contour_lift_image::Image;

/// Select the pixels within `tolerance` of the silhouette contour.
///
/// `mask[p] = |sdf[p]| < tolerance`; pixels exactly at the tolerance are excluded.
///
/// # Example
///
/// ```
/// use contour_lift::contour::contour_mask;
/// use contour_lift::image::{Image, ImageSize};
///
/// let sdf = Image::<f32, 1>::new(ImageSize { width: 3, height: 1 }, vec![-8.0, 0.0, 7.9]).unwrap();
/// let mask = contour_mask(&sdf, 8.0);
/// assert_eq!(mask.as_slice(), &[false, true, true]);
/// ```
pub fn contour_mask(sdf: &Image<f32, 1>, tolerance: f32) -> Image<bool, 1> {
    Image::from_fn(sdf.size(), |row, col| {
        [sdf.get_unchecked([row, col, 0]).abs() < tolerance]
    })
}

/// List the `[col, row]` coordinates of the masked pixels in row-major scan order.
///
/// Rows are counted from the bottom, so the bottom row comes first.
pub fn contour_pixels(mask: &Image<bool, 1>) -> Vec<[usize; 2]> {
    let width = mask.width();
    mask.as_slice()
        .iter()
        .enumerate()
        .filter(|(_, &selected)| selected)
        .map(|(i, _)| [i % width, i / width])
        .collect()
}
