use crate::bindings::{BindLayouts, MaterialDefaults};
use crate::mesh::GpuMesh;
use crate::texture::GpuTexture;
use crate::RenderError;
use lumi_assets::{ModelData, ModelOptions};
use std::path::Path;

/// A loaded model: its meshes and the textures they share.
pub struct GpuModel {
    pub meshes: Vec<GpuMesh>,
    textures: Vec<GpuTexture>,
}

impl GpuModel {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        defaults: &MaterialDefaults,
        path: &Path,
        gamma_correction: bool,
    ) -> Result<Self, RenderError> {
        let data = ModelData::load(
            path,
            ModelOptions {
                gamma_correction,
                ..ModelOptions::default()
            },
        )?;
        Ok(Self::upload(device, queue, layouts, defaults, &data))
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        defaults: &MaterialDefaults,
        data: &ModelData,
    ) -> Self {
        let textures: Vec<GpuTexture> = data
            .textures_loaded
            .iter()
            .map(|t| {
                let label = t.path.display().to_string();
                let srgb = data.gamma_correction && t.kind.is_color();
                GpuTexture::from_image(device, queue, &label, &t.image, srgb)
            })
            .collect();

        let meshes = data
            .meshes
            .iter()
            .map(|mesh| {
                let material = defaults.bind_group(device, layouts, &mesh.name, |kind| {
                    mesh.texture(kind)
                        .and_then(|r| textures.get(r.index))
                        .map(|t| &t.view)
                });
                GpuMesh::new(device, mesh, material)
            })
            .collect();

        Self { meshes, textures }
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Draw every mesh once with the currently bound pipeline.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, bind_material: bool) {
        for mesh in &self.meshes {
            mesh.draw(pass, bind_material, 0..1);
        }
    }
}
