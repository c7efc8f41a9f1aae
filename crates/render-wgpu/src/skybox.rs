use crate::bindings::BindLayouts;
use crate::texture::{GpuTexture, cubemap_sampler};
use lumi_assets::CubemapData;
use std::path::Path;
use wgpu::util::DeviceExt;

/// Sky colour used when the cubemap faces cannot be loaded.
const FALLBACK_SKY: [u8; 4] = [110, 150, 220, 255];

pub(crate) const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];

/// Cube of half-size 1 as 36 unindexed positions, two triangles per face.
pub(crate) fn cube_positions() -> Vec<[f32; 3]> {
    let p = 1.0_f32;
    #[rustfmt::skip]
    let corners = [
        [-p, -p, -p], [ p, -p, -p], [ p,  p, -p], [-p,  p, -p],
        [-p, -p,  p], [ p, -p,  p], [ p,  p,  p], [-p,  p,  p],
    ];
    #[rustfmt::skip]
    let faces: [[usize; 4]; 6] = [
        [1, 5, 6, 2], // +X
        [4, 0, 3, 7], // -X
        [3, 2, 6, 7], // +Y
        [4, 5, 1, 0], // -Y
        [5, 4, 7, 6], // +Z
        [0, 1, 2, 3], // -Z
    ];
    faces
        .iter()
        .flat_map(|[a, b, c, d]| [a, b, c, c, d, a])
        .map(|&i| corners[i])
        .collect()
}

pub struct Skybox {
    _cubemap: GpuTexture,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, layouts: &BindLayouts, dir: &Path) -> Self {
        let data = CubemapData::load(dir).unwrap_or_else(|e| {
            tracing::warn!("skybox unavailable, using a flat sky: {e}");
            CubemapData::solid(FALLBACK_SKY)
        });
        let cubemap = GpuTexture::cubemap(device, queue, "skybox", &data);
        let sampler = cubemap_sampler(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("skybox_bind_group"),
            layout: &layouts.cubemap,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&cubemap.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let positions = cube_positions();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("skybox_vertices"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            _cubemap: cubemap,
            vertex_buffer,
            vertex_count: positions.len() as u32,
            bind_group,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles_on_the_unit_shell() {
        let positions = cube_positions();
        assert_eq!(positions.len(), 36);
        for p in &positions {
            assert!(p.iter().all(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn each_face_lies_on_one_plane() {
        for (face, tri) in cube_positions().chunks(6).enumerate() {
            let axis = face / 2;
            let value = tri[0][axis];
            assert!(tri.iter().all(|p| p[axis] == value), "face {face}");
            assert_eq!(value, if face % 2 == 0 { 1.0 } else { -1.0 });
        }
    }
}
