use crate::bindings::{BindLayouts, MaterialDefaults};
use crate::model::GpuModel;
use crate::RenderError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use lumi_assets::{ModelData, ModelOptions, TextureKind, TextureRef};
use std::path::Path;
use wgpu::util::DeviceExt;

/// Per-instance model matrix, one column per attribute.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    model: [[f32; 4]; 4],
}

impl From<&Mat4> for InstanceData {
    fn from(m: &Mat4) -> Self {
        Self {
            model: m.to_cols_array_2d(),
        }
    }
}

pub(crate) const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
];

pub(crate) fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceData>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

/// A model drawn many times from a buffer of transforms.
///
/// Every mesh samples the model's first loaded texture as its diffuse map.
pub struct Prefab {
    model: GpuModel,
    instance_buffer: wgpu::Buffer,
    amount: u32,
}

impl Prefab {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &BindLayouts,
        defaults: &MaterialDefaults,
        path: &Path,
        transforms: &[Mat4],
    ) -> Result<Self, RenderError> {
        let mut data = ModelData::load(path, ModelOptions::default())?;
        if let Some(first) = data.textures_loaded.first() {
            if first.kind != TextureKind::Diffuse {
                tracing::debug!("prefab {} uses a {:?} map as diffuse", path.display(), first.kind);
            }
            for mesh in &mut data.meshes {
                mesh.textures.retain(|t| t.kind != TextureKind::Diffuse);
                mesh.textures.push(TextureRef {
                    kind: TextureKind::Diffuse,
                    index: 0,
                });
            }
        }
        let model = GpuModel::upload(device, queue, layouts, defaults, &data);

        let instances: Vec<InstanceData> = transforms.iter().map(InstanceData::from).collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prefab_instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });
        tracing::info!(
            "prefab {}: {} meshes x {} instances",
            path.display(),
            model.meshes.len(),
            instances.len()
        );

        Ok(Self {
            model,
            instance_buffer,
            amount: instances.len() as u32,
        })
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// One instanced draw per mesh.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.amount == 0 {
            return;
        }
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        for mesh in &self.model.meshes {
            mesh.draw(pass, true, 0..self.amount);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn instance_data_is_column_major() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let data = InstanceData::from(&m);
        assert_eq!(data.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(bytemuck::bytes_of(&data).len(), 64);
    }

    #[test]
    fn instance_attributes_follow_mesh_attributes() {
        let locations: Vec<_> = INSTANCE_ATTRIBUTES.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![5, 6, 7, 8]);
        assert_eq!(INSTANCE_ATTRIBUTES[3].offset, 48);
        assert_eq!(instance_layout().array_stride, 64);
    }
}
