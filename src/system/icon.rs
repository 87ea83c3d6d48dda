use crate::limits::MAX_ICON_DIMENSION;

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error(
        "Icon dimensions must be positive and at most {} pixels per side.",
        MAX_ICON_DIMENSION
    )]
    InvalidDimensions,

    #[error("The pixel buffer holds {actual} bytes, but {expected} were expected.")]
    BufferSize { expected: usize, actual: usize },

    #[error("The icon could not be loaded due to an IO error.")]
    Io(#[from] std::io::Error),

    #[error("The image could not be decoded.")]
    Decode,

    #[error("The image format was not recognized or is not supported.")]
    UnknownFormat,

    #[error("Only 8-bit RGBA images can be used as icons.")]
    UnsupportedLayout,
}

/// A window icon as tightly packed 8-bit RGBA pixels, row-major, top-left
/// first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Icon {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Icon {
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, IconError> {
        let ok = |v: u32| v > 0 && v <= MAX_ICON_DIMENSION;
        if !ok(width) || !ok(height) {
            return Err(IconError::InvalidDimensions);
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(IconError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Decodes an icon from an in-memory PNG or JPEG file.
    #[cfg(any(feature = "png", feature = "jpeg"))]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IconError> {
        use image::{guess_format, ImageDecoder, ImageFormat};

        let format = guess_format(bytes).map_err(|_| IconError::UnknownFormat)?;

        let (size, layout, buffer) = match format {
            #[cfg(feature = "png")]
            ImageFormat::Png => {
                let decoder =
                    image::codecs::png::PngDecoder::new(bytes).map_err(|_| IconError::Decode)?;

                let (width, height) = decoder.dimensions();
                let layout = decoder.color_type();

                let buffer_size = decoder.total_bytes();
                if buffer_size > isize::MAX as u64 {
                    return Err(IconError::InvalidDimensions);
                }

                let mut buffer = vec![0; buffer_size as usize];
                decoder
                    .read_image(&mut buffer)
                    .map_err(|_| IconError::Decode)?;

                ((width, height), layout, buffer)
            }
            #[cfg(feature = "jpeg")]
            ImageFormat::Jpeg => {
                let decoder =
                    image::codecs::jpeg::JpegDecoder::new(bytes).map_err(|_| IconError::Decode)?;

                let (width, height) = decoder.dimensions();
                let layout = decoder.color_type();

                let buffer_size = decoder.total_bytes();
                if buffer_size > isize::MAX as u64 {
                    return Err(IconError::InvalidDimensions);
                }

                let mut buffer = vec![0; buffer_size as usize];
                decoder
                    .read_image(&mut buffer)
                    .map_err(|_| IconError::Decode)?;

                ((width, height), layout, buffer)
            }
            _ => return Err(IconError::UnknownFormat),
        };

        if layout != image::ColorType::Rgba8 {
            return Err(IconError::UnsupportedLayout);
        }

        Self::from_rgba(buffer, size.0, size.1)
    }

    /// Reads and decodes an icon file.
    #[cfg(any(feature = "png", feature = "jpeg"))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, IconError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The longest edge, used to pick the best candidate from an icon set.
    pub(crate) fn edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rgba_validates_buffer() {
        assert!(Icon::from_rgba(vec![0; 16 * 16 * 4], 16, 16).is_ok());

        assert!(matches!(
            Icon::from_rgba(vec![0; 16 * 16 * 3], 16, 16),
            Err(IconError::BufferSize {
                expected: 1024,
                actual: 768
            })
        ));
    }

    #[test]
    fn from_rgba_validates_dimensions() {
        assert!(matches!(
            Icon::from_rgba(Vec::new(), 0, 16),
            Err(IconError::InvalidDimensions)
        ));

        let side = MAX_ICON_DIMENSION + 1;
        assert!(matches!(
            Icon::from_rgba(vec![0; (side * side * 4) as usize], side, side),
            Err(IconError::InvalidDimensions)
        ));
    }

    #[test]
    fn edge_is_longest_side() {
        let icon = Icon::from_rgba(vec![0; 32 * 16 * 4], 32, 16).unwrap();
        assert_eq!(icon.edge(), 32);
    }
}
