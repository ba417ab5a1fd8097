use contour_lift_image::{Image, ImageError, ImageSize, PixelBuffer};

use crate::config::FieldEncoding;
use crate::error::ReconstructionError;

/// The host buffers of one frame.
///
/// All buffers are row-major with the bottom-left pixel first and must share
/// the size of the color buffer.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    /// The rendered sRGB(A) image, at least 3 channels.
    pub color: PixelBuffer<'a>,
    /// The encoded signed distance field, distance in the first channel.
    pub sdf: PixelBuffer<'a>,
    /// The encoded nearest-contour displacement, in channels 1 and 2.
    pub displacement: PixelBuffer<'a>,
    /// An optional encoded ground-truth SDF used to shade the alpha channel.
    pub ground_truth_sdf: Option<PixelBuffer<'a>>,
}

impl<'a> FrameInputs<'a> {
    /// Bundle the three required buffers of a frame.
    pub fn new(
        color: PixelBuffer<'a>,
        sdf: PixelBuffer<'a>,
        displacement: PixelBuffer<'a>,
    ) -> Self {
        Self {
            color,
            sdf,
            displacement,
            ground_truth_sdf: None,
        }
    }

    /// Attach a ground-truth SDF for alpha shading.
    pub fn with_ground_truth_sdf(mut self, ground_truth_sdf: PixelBuffer<'a>) -> Self {
        self.ground_truth_sdf = Some(ground_truth_sdf);
        self
    }

    /// The size shared by all buffers.
    pub fn size(&self) -> ImageSize {
        self.color.size()
    }

    /// Check that every buffer has the size of the color buffer.
    pub fn validate_dimensions(&self) -> Result<(), ReconstructionError> {
        let expected = self.color.size();
        let others = [
            ("sdf", Some(self.sdf)),
            ("displacement", Some(self.displacement)),
            ("ground-truth sdf", self.ground_truth_sdf),
        ];
        for (name, buffer) in others {
            let Some(buffer) = buffer else {
                continue;
            };
            if buffer.size() != expected {
                return Err(ReconstructionError::DimensionMismatch {
                    name,
                    expected,
                    found: buffer.size(),
                });
            }
        }
        Ok(())
    }
}

/// The decoded per-pixel fields of a frame, indexed `[row, col]` with row 0 at the bottom.
#[derive(Debug, Clone)]
pub struct DecodedFields {
    /// The sRGB color with alpha; alpha is 1 when the buffer has no fourth channel.
    pub color: Image<f32, 4>,
    /// Signed distance to the silhouette in pixels, `<= 0` on or inside.
    pub sdf: Image<f32, 1>,
    /// Displacement `[dcol, drow]` toward the nearest contour pixel.
    pub displacement: Image<f32, 2>,
    /// Decoded ground-truth SDF, if supplied.
    pub ground_truth_sdf: Option<Image<f32, 1>>,
}

impl DecodedFields {
    /// The size of the fields.
    pub fn size(&self) -> ImageSize {
        self.sdf.size()
    }
}

/// Decode an SDF buffer from its first channel.
pub fn decode_sdf(buffer: &PixelBuffer, encoding: &FieldEncoding) -> Image<f32, 1> {
    buffer.map_pixels(|p| [encoding.decode(p[0])])
}

/// Decode a displacement buffer into `[dcol, drow]` in the SDF convention.
///
/// The buffer is written with a top-left origin and BGR channel order: channel
/// 2 holds the column offset and channel 1 the row offset counted downwards.
/// Offsets are whole pixels, so decoded values are rounded.
///
/// # Errors
///
/// If the buffer has fewer than 3 channels.
pub fn decode_displacement(
    buffer: &PixelBuffer,
    encoding: &FieldEncoding,
) -> Result<Image<f32, 2>, ImageError> {
    if buffer.channels() < 3 {
        return Err(ImageError::InvalidChannelCount(3, buffer.channels()));
    }
    Ok(buffer.map_pixels(|p| {
        let down = encoding.decode(p[1]).round();
        let right = encoding.decode(p[2]).round();
        [right, -down]
    }))
}

/// Load the color buffer as RGBA.
///
/// # Errors
///
/// If the buffer has fewer than 3 channels.
pub fn load_color(buffer: &PixelBuffer) -> Result<Image<f32, 4>, ImageError> {
    if buffer.channels() < 3 {
        return Err(ImageError::InvalidChannelCount(3, buffer.channels()));
    }
    Ok(buffer.map_pixels(|p| [p[0], p[1], p[2], p.get(3).copied().unwrap_or(1.0)]))
}

/// Validate and decode all the buffers of a frame.
///
/// Logs the buffer shapes and the decoded value ranges.
pub fn decode_fields(
    inputs: &FrameInputs,
    encoding: &FieldEncoding,
) -> Result<DecodedFields, ReconstructionError> {
    for (name, buffer) in [
        ("color", Some(inputs.color)),
        ("sdf", Some(inputs.sdf)),
        ("displacement", Some(inputs.displacement)),
        ("ground-truth sdf", inputs.ground_truth_sdf),
    ] {
        if let Some(buffer) = buffer {
            log::info!(
                "{} buffer: {} samples, {}, {} channels",
                name,
                buffer.as_slice().len(),
                buffer.size(),
                buffer.channels()
            );
        }
    }

    inputs.validate_dimensions()?;

    let color = load_color(&inputs.color)?;
    let sdf = decode_sdf(&inputs.sdf, encoding);
    let displacement = decode_displacement(&inputs.displacement, encoding)?;
    let ground_truth_sdf = inputs
        .ground_truth_sdf
        .map(|buffer| decode_sdf(&buffer, encoding));

    if let Some((lo, hi)) = sdf.channel_range(0) {
        log::info!("sdf range: [{}, {}]", lo, hi);
    }
    if let (Some((col_lo, col_hi)), Some((row_lo, row_hi))) =
        (displacement.channel_range(0), displacement.channel_range(1))
    {
        log::info!(
            "displacement range: col [{}, {}], row [{}, {}]",
            col_lo,
            col_hi,
            row_lo,
            row_hi
        );
    }

    Ok(DecodedFields {
        color,
        sdf,
        displacement,
        ground_truth_sdf,
    })
}
