//! OBJ model import.
//!
//! One [`MeshData`] is produced per OBJ group (groups split on `g`/`usemtl`),
//! so each mesh carries exactly one material. Polygons are fan-triangulated,
//! identical position/uv/normal corners are shared, V is flipped so that row 0
//! of a texture maps to v = 0, and tangent space is computed for every mesh.

use crate::mesh::{MeshData, TextureKind, TextureRef, Vertex};
use crate::texture::ImageData;
use crate::AssetError;
use glam::{Vec2, Vec3};
use obj::{IndexTuple, Obj, ObjMaterial};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Import flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOptions {
    /// Store colour textures sRGB-encoded so sampling yields linear values.
    pub gamma_correction: bool,
    /// Flip the V texture coordinate (`v' = 1 - v`).
    pub flip_uvs: bool,
    /// Flip texture images vertically on load.
    pub flip_textures: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            gamma_correction: true,
            flip_uvs: true,
            flip_textures: false,
        }
    }
}

/// A texture decoded once per model, shared by every mesh that references it.
#[derive(Debug, Clone)]
pub struct LoadedTexture {
    pub kind: TextureKind,
    pub path: PathBuf,
    pub image: ImageData,
    /// Set when the file could not be loaded and a 1x1 placeholder was used.
    pub fallback: bool,
}

/// A model file's meshes plus the textures they reference.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub meshes: Vec<MeshData>,
    pub textures_loaded: Vec<LoadedTexture>,
    pub directory: PathBuf,
    pub gamma_correction: bool,
}

impl ModelData {
    pub fn load(path: impl AsRef<Path>, options: ModelOptions) -> Result<Self, AssetError> {
        let path = path.as_ref();
        std::fs::metadata(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut obj = Obj::load(path).map_err(|e| AssetError::Obj {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Err(e) = obj.load_mtls() {
            tracing::warn!("material libraries for {} failed to load: {e:?}", path.display());
        }

        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let mut model = ModelData {
            meshes: Vec::new(),
            textures_loaded: Vec::new(),
            directory,
            gamma_correction: options.gamma_correction,
        };
        let mut texture_ids: HashMap<PathBuf, usize> = HashMap::new();

        for object in &obj.data.objects {
            for group in &object.groups {
                let Some(mut mesh) = build_mesh(&obj, &object.name, group, options, path)? else {
                    continue;
                };
                if let Some(ObjMaterial::Mtl(material)) = &group.material {
                    for (kind, file) in material_maps(material) {
                        let index = model.texture_index(&mut texture_ids, kind, &file, options);
                        mesh.textures.push(TextureRef { kind, index });
                    }
                }
                model.meshes.push(mesh);
            }
        }

        tracing::info!(
            "loaded model {}: {} meshes, {} vertices, {} textures",
            path.display(),
            model.meshes.len(),
            model.vertex_count(),
            model.textures_loaded.len()
        );
        Ok(model)
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn index_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len()).sum()
    }

    /// Look up a texture by path, decoding it on first use.
    fn texture_index(
        &mut self,
        ids: &mut HashMap<PathBuf, usize>,
        kind: TextureKind,
        file: &str,
        options: ModelOptions,
    ) -> usize {
        let path = self.directory.join(file.replace('\\', "/"));
        if let Some(&index) = ids.get(&path) {
            return index;
        }

        let (image, fallback) = match ImageData::load(&path, options.flip_textures) {
            Ok(image) => (image, false),
            Err(e) => {
                tracing::warn!("texture failed to load: {e}");
                (ImageData::solid(kind.fallback_rgba()), true)
            }
        };
        let index = self.textures_loaded.len();
        self.textures_loaded.push(LoadedTexture {
            kind,
            path: path.clone(),
            image,
            fallback,
        });
        ids.insert(path, index);
        index
    }
}

fn material_maps(material: &obj::Material) -> Vec<(TextureKind, String)> {
    [
        (TextureKind::Diffuse, &material.map_kd),
        (TextureKind::Specular, &material.map_ks),
        (TextureKind::Normal, &material.map_bump),
        (TextureKind::Height, &material.map_ka),
    ]
    .into_iter()
    .filter_map(|(kind, file)| file.clone().map(|f| (kind, f)))
    .collect()
}

fn build_mesh(
    obj: &Obj,
    object_name: &str,
    group: &obj::Group,
    options: ModelOptions,
    path: &Path,
) -> Result<Option<MeshData>, AssetError> {
    let data = &obj.data;
    let mut mesh = MeshData {
        name: format!("{object_name}/{}", group.name),
        ..MeshData::default()
    };
    let mut corners: HashMap<(usize, Option<usize>, Option<usize>), u32> = HashMap::new();
    let mut missing_normals = false;
    let out_of_range = |what: &str, index: usize| AssetError::Obj {
        path: path.to_path_buf(),
        message: format!("{what} index {index} out of range in group '{}'", group.name),
    };

    for poly in &group.polys {
        if poly.0.len() < 3 {
            continue;
        }
        let mut ids = Vec::with_capacity(poly.0.len());
        for &IndexTuple(p, t, n) in &poly.0 {
            if let Some(&id) = corners.get(&(p, t, n)) {
                ids.push(id);
                continue;
            }
            let position = data.position.get(p).ok_or_else(|| out_of_range("position", p))?;
            let uv = match t {
                Some(t) => {
                    let [u, v] = *data.texture.get(t).ok_or_else(|| out_of_range("uv", t))?;
                    if options.flip_uvs {
                        Vec2::new(u, 1.0 - v)
                    } else {
                        Vec2::new(u, v)
                    }
                }
                None => Vec2::ZERO,
            };
            let normal = match n {
                Some(n) => Vec3::from(*data.normal.get(n).ok_or_else(|| out_of_range("normal", n))?),
                None => {
                    missing_normals = true;
                    Vec3::ZERO
                }
            };

            let id = mesh.vertices.len() as u32;
            mesh.vertices.push(Vertex::new(Vec3::from(*position), normal, uv));
            corners.insert((p, t, n), id);
            ids.push(id);
        }
        for i in 1..ids.len() - 1 {
            mesh.indices.extend_from_slice(&[ids[0], ids[i], ids[i + 1]]);
        }
    }

    if mesh.indices.is_empty() {
        return Ok(None);
    }
    if missing_normals {
        mesh.generate_smooth_normals();
    }
    mesh.compute_tangents();
    Ok(Some(mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const QUAD_OBJ: &str = "\
mtllib scene.mtl
o Plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
g first
usemtl brick
f 1/1 2/2 3/3 4/4
g second
usemtl trim
f 1/1 2/2 3/3
";

    const SCENE_MTL: &str = "\
newmtl brick
map_Kd brick.png
map_Ks spec.png
newmtl trim
map_Kd brick.png
";

    fn write_fixture(dir: &Path) -> PathBuf {
        let obj = dir.join("scene.obj");
        std::fs::write(&obj, QUAD_OBJ).unwrap();
        std::fs::write(dir.join("scene.mtl"), SCENE_MTL).unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([200, 10, 10, 255]))
            .save(dir.join("brick.png"))
            .unwrap();
        obj
    }

    #[test]
    fn groups_become_meshes() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelData::load(write_fixture(dir.path()), ModelOptions::default()).unwrap();

        assert_eq!(model.meshes.len(), 2);
        let quad = &model.meshes[0];
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(model.meshes[1].triangle_count(), 1);
        assert_eq!(model.index_count(), 9);
        assert!(model.gamma_correction);
    }

    #[test]
    fn missing_normals_are_generated_and_uvs_flipped() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelData::load(write_fixture(dir.path()), ModelOptions::default()).unwrap();

        let v0 = model.meshes[0].vertices[0];
        assert_eq!(v0.normal, [0.0, 0.0, 1.0]);
        assert_eq!(v0.tex_coords, [0.0, 1.0]);

        let unflipped = ModelData::load(
            dir.path().join("scene.obj"),
            ModelOptions {
                flip_uvs: false,
                ..ModelOptions::default()
            },
        )
        .unwrap();
        assert_eq!(unflipped.meshes[0].vertices[0].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn textures_load_once_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelData::load(write_fixture(dir.path()), ModelOptions::default()).unwrap();

        assert_eq!(model.textures_loaded.len(), 2);
        let brick = model.meshes[0].texture(TextureKind::Diffuse).unwrap();
        let trim = model.meshes[1].texture(TextureKind::Diffuse).unwrap();
        assert_eq!(brick.index, trim.index);
        assert!(!model.textures_loaded[brick.index].fallback);
        assert_eq!(model.textures_loaded[brick.index].image.width, 2);
    }

    #[test]
    fn missing_texture_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let model = ModelData::load(write_fixture(dir.path()), ModelOptions::default()).unwrap();

        let spec = model.meshes[0].texture(TextureKind::Specular).unwrap();
        let loaded = &model.textures_loaded[spec.index];
        assert!(loaded.fallback);
        assert_eq!(loaded.image, ImageData::solid(TextureKind::Specular.fallback_rgba()));
    }

    #[test]
    fn missing_model_is_io_error() {
        let err = ModelData::load("/nonexistent/model.obj", ModelOptions::default()).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
