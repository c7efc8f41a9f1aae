use crate::RenderError;
use crate::bindings::{BindLayouts, MaterialDefaults, uses_material};
use crate::model::GpuModel;
use crate::prefab::Prefab;
use crate::quad::ScreenQuad;
use crate::shader::{PipelineTargets, ShaderProgram};
use crate::shadow::ShadowMap;
use crate::skybox::Skybox;
use crate::texture::GpuTexture;
use lumi_common::Settings;
use lumi_render::{
    FramePlan, Geometry, LoadedGeometry, PassPlan, PassTarget, ProgramId, Renderer, SceneManifest,
};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Surface and shader configuration for [`WgpuRenderer::new`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub surface_format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    /// 1 disables multisampling; 4 is the only other count every backend supports.
    pub sample_count: u32,
    /// Directory searched for `<program>.wgsl` overrides.
    pub shader_dir: Option<PathBuf>,
}

impl RendererConfig {
    pub fn from_settings(settings: &Settings, surface_format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let shader_dir = settings.resolve(&settings.assets.shader_dir);
        Self {
            surface_format,
            width,
            height,
            sample_count: settings.window.msaa_samples,
            shader_dir: shader_dir.is_dir().then_some(shader_dir),
        }
    }
}

/// What one call to [`WgpuRenderer::render`] submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub passes: usize,
    pub draws: usize,
    /// Draws whose geometry was not loaded or does not fit the program.
    pub skipped: usize,
}

/// Executes frame plans against the GPU resources a scene's manifest named.
pub struct WgpuRenderer {
    layouts: BindLayouts,
    programs: BTreeMap<ProgramId, ShaderProgram>,
    models: Vec<Option<GpuModel>>,
    prefabs: Vec<Prefab>,
    skybox: Option<Skybox>,
    loaded: LoadedGeometry,
    shadow_map: ShadowMap,
    quad: ScreenQuad,
    depth: GpuTexture,
    msaa_color: Option<GpuTexture>,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &RendererConfig,
        manifest: &SceneManifest,
    ) -> Result<Self, RenderError> {
        if !matches!(config.sample_count, 1 | 4) {
            return Err(RenderError::SampleCount(config.sample_count));
        }
        let layouts = BindLayouts::new(device);
        let defaults = MaterialDefaults::new(device, queue);
        let targets = PipelineTargets {
            color_format: config.surface_format,
            sample_count: config.sample_count,
        };

        let mut programs = BTreeMap::new();
        for program in ProgramId::ALL {
            let shader = ShaderProgram::new(device, &layouts, program, config.shader_dir.as_deref(), targets)?;
            programs.insert(program, shader);
        }
        for (program, name, value) in &manifest.initial_uniforms {
            if let Some(shader) = programs.get_mut(program) {
                shader.set(name, *value);
            }
        }

        let mut models = Vec::with_capacity(manifest.models.len());
        for request in &manifest.models {
            match GpuModel::load(device, queue, &layouts, &defaults, &request.path, request.gamma_correction) {
                Ok(model) => {
                    tracing::debug!(
                        "model#{}: {} meshes, {} indices, {} textures",
                        models.len(),
                        model.meshes.len(),
                        model.meshes.iter().map(|m| m.index_count()).sum::<u32>(),
                        model.texture_count()
                    );
                    models.push(Some(model));
                }
                Err(e) if request.optional => {
                    tracing::warn!("optional model skipped: {e}");
                    models.push(None);
                }
                Err(e) => return Err(e),
            }
        }

        let prefabs = manifest
            .prefabs
            .iter()
            .map(|request| Prefab::load(device, queue, &layouts, &defaults, &request.path, &request.transforms))
            .collect::<Result<Vec<_>, _>>()?;

        let skybox = manifest
            .skybox
            .as_deref()
            .map(|dir| Skybox::load(device, queue, &layouts, dir));

        // Lit and depth-debug pipelines bind a shadow map even in scenes without one.
        let shadow_map = ShadowMap::new(device, &layouts, manifest.shadow_map_resolution.unwrap_or(1));

        let (width, height) = (config.width, config.height);
        let depth = GpuTexture::depth(device, "depth_texture", width, height, config.sample_count, false);
        let msaa_color = (config.sample_count > 1)
            .then(|| GpuTexture::msaa_color(device, config.surface_format, width, height, config.sample_count));

        tracing::info!(
            "renderer ready: {} models, {} prefab instances, skybox {}, {}x msaa",
            models.iter().flatten().count(),
            prefabs.iter().map(Prefab::amount).sum::<u32>(),
            if skybox.is_some() { "on" } else { "off" },
            config.sample_count
        );

        let loaded = LoadedGeometry {
            models: models.iter().map(Option::is_some).collect(),
            prefabs: prefabs.len(),
            skybox: skybox.is_some(),
        };

        Ok(Self {
            layouts,
            programs,
            models,
            prefabs,
            skybox,
            loaded,
            shadow_map,
            quad: ScreenQuad::new(device),
            depth,
            msaa_color,
            surface_format: config.surface_format,
            sample_count: config.sample_count,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth = GpuTexture::depth(device, "depth_texture", width, height, self.sample_count, false);
        if self.msaa_color.is_some() {
            self.msaa_color = Some(GpuTexture::msaa_color(
                device,
                self.surface_format,
                width,
                height,
                self.sample_count,
            ));
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn shadow_map_resolution(&self) -> u32 {
        self.shadow_map.resolution()
    }

    pub fn program(&self, id: ProgramId) -> Option<&ShaderProgram> {
        self.programs.get(&id)
    }

    /// Borrow the renderer for one frame as a [`Renderer`].
    pub fn frame<'a>(
        &'a mut self,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        view: &'a wgpu::TextureView,
    ) -> GpuFrame<'a> {
        GpuFrame {
            renderer: self,
            device,
            queue,
            view,
        }
    }

    /// Render one frame into `view` and submit it.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        plan: &FramePlan,
    ) -> FrameStats {
        let offsets = self.stage(plan);
        for program in self.programs.values_mut() {
            program.upload(device, queue, &self.layouts);
        }

        let mut stats = FrameStats {
            passes: plan.passes.len(),
            ..FrameStats::default()
        };
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        for (pass_plan, pass_offsets) in plan.passes.iter().zip(&offsets) {
            let mut pass = self.begin_pass(&mut encoder, pass_plan, view);
            for (draw, offset) in pass_plan.draws.iter().zip(pass_offsets) {
                let (Some(offset), Some(program)) = (offset, self.programs.get(&draw.program)) else {
                    stats.skipped += 1;
                    continue;
                };
                program.bind(&mut pass, *offset);
                self.draw_geometry(&mut pass, draw.program, draw.geometry);
                stats.draws += 1;
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        stats
    }

    /// Apply every draw's uniforms in order and snapshot a block per drawable draw.
    fn stage(&mut self, plan: &FramePlan) -> Vec<Vec<Option<u32>>> {
        for program in self.programs.values_mut() {
            program.begin_frame();
        }
        let mut offsets = Vec::with_capacity(plan.passes.len());
        for pass in &plan.passes {
            let mut pass_offsets = Vec::with_capacity(pass.draws.len());
            for draw in &pass.draws {
                let skip = draw.skip_reason(&self.loaded);
                let Some(program) = self.programs.get_mut(&draw.program) else {
                    pass_offsets.push(None);
                    continue;
                };
                // values persist even when the draw itself is skipped
                for (name, value) in &draw.uniforms {
                    program.set(name, *value);
                }
                match skip {
                    None => pass_offsets.push(Some(program.stage())),
                    Some(reason) => {
                        tracing::trace!("skipping {} draw of {:?}: {reason:?}", draw.program, draw.geometry);
                        pass_offsets.push(None);
                    }
                }
            }
            offsets.push(pass_offsets);
        }
        offsets
    }

    fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        plan: &PassPlan,
        view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'e> {
        let depth_load = if plan.clear_depth {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        match plan.target {
            PassTarget::ShadowMap => encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(plan.label),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.shadow_map.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            }),
            PassTarget::Screen => {
                let load = match plan.clear_color {
                    Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    None => wgpu::LoadOp::Load,
                };
                let (target, resolve_target) = match &self.msaa_color {
                    Some(msaa) => (&msaa.view, Some(view)),
                    None => (view, None),
                };
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(plan.label),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    ..Default::default()
                })
            }
        }
    }

    fn draw_geometry(&self, pass: &mut wgpu::RenderPass<'_>, program: ProgramId, geometry: Geometry) {
        match geometry {
            Geometry::Model(handle) => {
                let Some(Some(model)) = self.models.get(handle.0) else {
                    return;
                };
                if program == ProgramId::Lit {
                    pass.set_bind_group(2, &self.shadow_map.lit_group, &[]);
                }
                model.draw(pass, uses_material(program));
            }
            Geometry::Prefab(handle) => {
                if let Some(prefab) = self.prefabs.get(handle.0) {
                    prefab.draw(pass);
                }
            }
            Geometry::Skybox => {
                if let Some(skybox) = &self.skybox {
                    skybox.draw(pass);
                }
            }
            Geometry::ScreenQuad => {
                pass.set_bind_group(1, &self.shadow_map.debug_group, &[]);
                self.quad.draw(pass);
            }
        }
    }
}

/// A renderer bound to one surface texture.
pub struct GpuFrame<'a> {
    renderer: &'a mut WgpuRenderer,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    view: &'a wgpu::TextureView,
}

impl Renderer for GpuFrame<'_> {
    type Output = FrameStats;

    fn render(&mut self, plan: &FramePlan) -> FrameStats {
        self.renderer.render(self.device, self.queue, self.view, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_follows_window_settings() {
        let mut settings = Settings::default();
        settings.window.msaa_samples = 1;
        settings.assets_dir = PathBuf::from("/nonexistent/assets");
        let config = RendererConfig::from_settings(&settings, wgpu::TextureFormat::Bgra8UnormSrgb, 800, 600);
        assert_eq!(config.sample_count, 1);
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.shader_dir.is_none());
    }

    #[test]
    fn shader_dir_is_used_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("shaders")).unwrap();
        let mut settings = Settings::default();
        settings.assets_dir = dir.path().to_path_buf();
        settings.assets.shader_dir = PathBuf::from("shaders");
        let config = RendererConfig::from_settings(&settings, wgpu::TextureFormat::Rgba8UnormSrgb, 1, 1);
        assert_eq!(config.shader_dir, Some(dir.path().join("shaders")));
    }
}
