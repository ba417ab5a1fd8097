use crate::error::ImageError;
use crate::image::{Image, ImageSize};

/// A flat pixel buffer as handed over by the host application.
///
/// Samples are normalized to `[0, 1]`, stored row-major with a fixed channel
/// stride and the origin at the bottom-left pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    size: ImageSize,
    channels: usize,
    data: &'a [f32],
}

impl<'a> PixelBuffer<'a> {
    /// Wrap a flat buffer.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `channels` - The channel stride of the buffer.
    /// * `data` - The flat samples.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match `width * height * channels`.
    ///
    /// # Examples
    ///
    /// ```
    /// use contour_lift_image::{ImageSize, PixelBuffer};
    ///
    /// let data = vec![0.0f32; 4 * 3 * 4];
    /// let buffer = PixelBuffer::new(ImageSize { width: 4, height: 3 }, 4, &data).unwrap();
    /// assert_eq!(buffer.channels(), 4);
    /// ```
    pub fn new(size: ImageSize, channels: usize, data: &'a [f32]) -> Result<Self, ImageError> {
        if channels == 0 {
            return Err(ImageError::InvalidChannelCount(1, 0));
        }
        if data.len() != size.num_pixels() * channels {
            return Err(ImageError::InvalidChannelShape(
                data.len(),
                size.num_pixels() * channels,
            ));
        }
        Ok(Self {
            size,
            channels,
            data,
        })
    }

    /// Get the size of the buffer in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the channel stride of the buffer.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Get the raw samples.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Map every pixel of the buffer through `f` into a typed image.
    pub fn map_pixels<T, const C: usize>(&self, f: impl Fn(&[f32]) -> [T; C]) -> Image<T, C> {
        Image::from_fn(self.size, |row, col| {
            let start = (row * self.size.width + col) * self.channels;
            f(&self.data[start..start + self.channels])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::PixelBuffer;
    use crate::{ImageError, ImageSize};

    #[test]
    fn buffer_length_checked() {
        let data = vec![0.0f32; 10];
        let res = PixelBuffer::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            4,
            &data,
        );
        assert!(matches!(res, Err(ImageError::InvalidChannelShape(10, 16))));

        let res = PixelBuffer::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
            &data,
        );
        assert!(matches!(res, Err(ImageError::InvalidChannelCount(1, 0))));
    }

    #[test]
    fn buffer_keeps_row_order() -> Result<(), ImageError> {
        // bottom row first: values encode the row index
        let data = vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let buffer = PixelBuffer::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            1,
            &data,
        )?;
        let image = buffer.map_pixels(|p| [p[0] * 10.0]);
        assert_eq!(image.get([0, 1, 0]), Some(&0.0));
        assert_eq!(image.get([2, 0, 0]), Some(&20.0));

        Ok(())
    }
}
