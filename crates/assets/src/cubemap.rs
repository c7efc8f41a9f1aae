use crate::texture::ImageData;
use crate::AssetError;
use std::path::{Path, PathBuf};

/// Face file stems in cube layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const CUBEMAP_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

const FACE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Six square-ish faces of equal size.
#[derive(Debug, Clone)]
pub struct CubemapData {
    pub width: u32,
    pub height: u32,
    pub faces: [ImageData; 6],
}

impl CubemapData {
    /// Load `right`, `left`, `top`, `bottom`, `front`, `back` from a directory.
    ///
    /// Faces are not flipped: cube faces start at the top-left pixel.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        let mut faces = Vec::with_capacity(6);
        for face in CUBEMAP_FACES {
            let path = find_face(dir, face).ok_or_else(|| AssetError::MissingCubemapFace {
                dir: dir.to_path_buf(),
                face,
            })?;
            faces.push(ImageData::load(&path, false)?);
        }

        let (width, height) = (faces[0].width, faces[0].height);
        for (face, img) in CUBEMAP_FACES.into_iter().zip(&faces) {
            if (img.width, img.height) != (width, height) {
                return Err(AssetError::CubemapFaceSize {
                    face,
                    expected: (width, height),
                    actual: (img.width, img.height),
                });
            }
        }

        let faces: [ImageData; 6] = faces
            .try_into()
            .map_err(|_| AssetError::MissingCubemapFace {
                dir: dir.to_path_buf(),
                face: CUBEMAP_FACES[0],
            })?;
        tracing::info!("loaded skybox {} ({width}x{height})", dir.display());
        Ok(Self {
            width,
            height,
            faces,
        })
    }

    /// A 1x1 cubemap of one colour on every face.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            faces: std::array::from_fn(|_| ImageData::solid(rgba)),
        }
    }
}

fn find_face(dir: &Path, stem: &str) -> Option<PathBuf> {
    FACE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_faces(dir: &Path, size: u32) {
        for (i, face) in CUBEMAP_FACES.iter().enumerate() {
            let img = RgbaImage::from_pixel(size, size, Rgba([i as u8 * 40, 0, 0, 255]));
            img.save(dir.join(format!("{face}.png"))).unwrap();
        }
    }

    #[test]
    fn loads_faces_in_layer_order() {
        let dir = tempfile::tempdir().unwrap();
        write_faces(dir.path(), 4);

        let cube = CubemapData::load(dir.path()).unwrap();
        assert_eq!((cube.width, cube.height), (4, 4));
        assert_eq!(cube.faces[0].pixels[0], 0);
        assert_eq!(cube.faces[5].pixels[0], 200);
    }

    #[test]
    fn missing_face_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_faces(dir.path(), 2);
        std::fs::remove_file(dir.path().join("top.png")).unwrap();

        let err = CubemapData::load(dir.path()).unwrap_err();
        assert!(matches!(err, AssetError::MissingCubemapFace { face: "top", .. }));
    }

    #[test]
    fn mismatched_face_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_faces(dir.path(), 2);
        RgbaImage::new(4, 4).save(dir.path().join("back.png")).unwrap();

        let err = CubemapData::load(dir.path()).unwrap_err();
        assert!(matches!(err, AssetError::CubemapFaceSize { face: "back", .. }));
    }

    #[test]
    fn solid_has_six_faces() {
        let cube = CubemapData::solid([110, 150, 220, 255]);
        assert!(cube.faces.iter().all(|f| f.pixels == vec![110, 150, 220, 255]));
    }
}
