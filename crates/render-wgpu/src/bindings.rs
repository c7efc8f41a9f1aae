//! Bind group layouts shared by every pipeline.
//!
//! Group 0 is always the program's uniform block, bound with a dynamic
//! offset so that each draw can use its own copy. The remaining groups depend
//! on the program (see [`BindLayouts::for_program`]).

use crate::texture::{GpuTexture, material_sampler};
use lumi_assets::{ImageData, TextureKind};
use lumi_render::ProgramId;
use std::num::NonZeroU64;

pub struct BindLayouts {
    pub uniforms: wgpu::BindGroupLayout,
    /// Four 2D textures in [`TextureKind::slot`] order plus a sampler at 4.
    pub material: wgpu::BindGroupLayout,
    pub cubemap: wgpu::BindGroupLayout,
    /// Unfiltered depth read with `textureLoad`.
    pub depth_view: wgpu::BindGroupLayout,
    /// Depth texture plus comparison sampler.
    pub shadow: wgpu::BindGroupLayout,
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniforms_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let mut material_entries: Vec<_> = TextureKind::ALL
            .iter()
            .map(|kind| texture_entry(kind.slot(), wgpu::TextureSampleType::Float { filterable: true }))
            .collect();
        material_entries.push(sampler_entry(4, wgpu::SamplerBindingType::Filtering));
        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &material_entries,
        });

        let cubemap = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("cubemap_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                sampler_entry(1, wgpu::SamplerBindingType::Filtering),
            ],
        });

        let depth_view = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("depth_view_layout"),
            entries: &[texture_entry(0, wgpu::TextureSampleType::Depth)],
        });

        let shadow = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureSampleType::Depth),
                sampler_entry(1, wgpu::SamplerBindingType::Comparison),
            ],
        });

        Self {
            uniforms,
            material,
            cubemap,
            depth_view,
            shadow,
        }
    }

    /// Bind group layouts in group order for a program's pipeline.
    pub fn for_program(&self, program: ProgramId) -> Vec<&wgpu::BindGroupLayout> {
        match program {
            ProgramId::Lit => vec![&self.uniforms, &self.material, &self.shadow],
            ProgramId::Unlit | ProgramId::ShadowDepth => vec![&self.uniforms],
            ProgramId::DepthDebug => vec![&self.uniforms, &self.depth_view],
            ProgramId::Skybox => vec![&self.uniforms, &self.cubemap],
            ProgramId::Pbr | ProgramId::Instanced => vec![&self.uniforms, &self.material],
        }
    }

    /// Bind group over a program's uniform buffer, one block wide.
    pub fn uniform_group(&self, device: &wgpu::Device, label: &str, buffer: &wgpu::Buffer, block_size: u32) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.uniforms,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: NonZeroU64::new(u64::from(block_size)),
                }),
            }],
        })
    }
}

/// Whether the program reads the material group at index 1.
pub fn uses_material(program: ProgramId) -> bool {
    matches!(program, ProgramId::Lit | ProgramId::Pbr | ProgramId::Instanced)
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

/// 1x1 stand-ins for texture slots a mesh leaves empty, plus the shared sampler.
pub struct MaterialDefaults {
    fallbacks: Vec<GpuTexture>,
    pub sampler: wgpu::Sampler,
}

impl MaterialDefaults {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let fallbacks = TextureKind::ALL
            .iter()
            .map(|kind| {
                GpuTexture::from_image(
                    device,
                    queue,
                    kind.uniform_prefix(),
                    &ImageData::solid(kind.fallback_rgba()),
                    kind.is_color(),
                )
            })
            .collect();
        Self {
            fallbacks,
            sampler: material_sampler(device),
        }
    }

    pub fn fallback(&self, kind: TextureKind) -> &wgpu::TextureView {
        &self.fallbacks[kind.slot() as usize].view
    }

    /// Build a material group, filling each slot from `pick` or the fallback.
    pub fn bind_group<'a>(
        &'a self,
        device: &wgpu::Device,
        layouts: &BindLayouts,
        label: &str,
        mut pick: impl FnMut(TextureKind) -> Option<&'a wgpu::TextureView>,
    ) -> wgpu::BindGroup {
        let mut entries: Vec<_> = TextureKind::ALL
            .iter()
            .map(|&kind| wgpu::BindGroupEntry {
                binding: kind.slot(),
                resource: wgpu::BindingResource::TextureView(
                    pick(kind).unwrap_or_else(|| self.fallback(kind)),
                ),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: 4,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.material,
            entries: &entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_programs_are_exactly_the_textured_ones() {
        let textured: Vec<_> = ProgramId::ALL.into_iter().filter(|p| uses_material(*p)).collect();
        assert_eq!(textured, vec![ProgramId::Lit, ProgramId::Pbr, ProgramId::Instanced]);
    }

    #[test]
    fn texture_slots_precede_sampler() {
        let slots: Vec<_> = TextureKind::ALL.iter().map(|k| k.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
    }
}
