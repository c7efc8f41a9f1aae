use crate::bindings::BindLayouts;
use crate::texture::{GpuTexture, shadow_sampler};

/// Square depth texture rendered from the light and sampled by the lit pass.
pub struct ShadowMap {
    depth: GpuTexture,
    resolution: u32,
    /// Group 2 of the lit pipeline.
    pub lit_group: wgpu::BindGroup,
    /// Group 1 of the depth debug pipeline.
    pub debug_group: wgpu::BindGroup,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device, layouts: &BindLayouts, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        let depth = GpuTexture::depth(device, "shadow_map", resolution, resolution, 1, true);
        let sampler = shadow_sampler(device);
        let lit_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_lit_group"),
            layout: &layouts.shadow,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });
        let debug_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_debug_group"),
            layout: &layouts.depth_view,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&depth.view),
            }],
        });
        tracing::debug!("shadow map {resolution}x{resolution}");
        Self {
            depth,
            resolution,
            lit_group,
            debug_group,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}
