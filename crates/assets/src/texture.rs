use crate::AssetError;
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::Path;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    /// Decode an image file into RGBA8.
    ///
    /// `flip_vertically` puts the last row first, matching APIs whose texture
    /// origin is the bottom-left corner.
    pub fn load(path: impl AsRef<Path>, flip_vertically: bool) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(io) => AssetError::Io {
                path: path.to_path_buf(),
                source: io,
            },
            source => AssetError::Image {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let decoded = if flip_vertically {
            decoded.flipv()
        } else {
            decoded
        };
        let rgba = decoded.into_rgba8();
        tracing::debug!(
            "loaded image {} ({}x{})",
            path.display(),
            rgba.width(),
            rgba.height()
        );
        Ok(Self::from_rgba(rgba))
    }

    /// A 1x1 image of a single colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }

    fn from_rgba(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * 4
    }

    /// Number of levels in a full mip chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// The full mip chain, level 0 first. Each level halves both dimensions
    /// (clamped at 1) using a triangle filter.
    pub fn mip_chain(&self) -> Vec<ImageData> {
        let mut levels = vec![self.clone()];
        let Some(base) = RgbaImage::from_raw(self.width, self.height, self.pixels.clone()) else {
            return levels;
        };

        let (mut w, mut h) = (self.width, self.height);
        for _ in 1..self.mip_level_count() {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            let level = image::imageops::resize(&base, w, h, FilterType::Triangle);
            levels.push(Self::from_rgba(level));
        }
        levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn solid_is_one_pixel() {
        let img = ImageData::solid([1, 2, 3, 4]);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.pixels, vec![1, 2, 3, 4]);
        assert_eq!(img.mip_level_count(), 1);
        assert_eq!(img.mip_chain().len(), 1);
    }

    #[test]
    fn mip_chain_halves_to_one() {
        let img = ImageData {
            width: 8,
            height: 2,
            pixels: vec![255; 8 * 2 * 4],
        };
        let chain = img.mip_chain();
        let dims: Vec<_> = chain.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(chain[3].pixels.len(), 4);
    }

    #[test]
    fn load_png_with_and_without_flip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripe.png");
        let mut img = RgbaImage::new(1, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        img.save(&path).unwrap();

        let upright = ImageData::load(&path, false).unwrap();
        assert_eq!(&upright.pixels[..4], &[255, 0, 0, 255]);

        let flipped = ImageData::load(&path, true).unwrap();
        assert_eq!(&flipped.pixels[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ImageData::load("/nonexistent/texture.png", false).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
