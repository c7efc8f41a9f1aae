use super::{FrameContext, ModelRequest, Scene, SceneManifest, skybox_draw};
use crate::light::DirectionalShadow;
use crate::plan::{DrawCommand, FramePlan, Geometry, ModelHandle, PassPlan, PassTarget, ProgramId};
use glam::{Mat4, Vec3};
use lumi_common::{SceneKind, Settings, Transform};
use std::path::PathBuf;

const SCENE_MODEL: ModelHandle = ModelHandle(0);
const LIGHT_CUBE: ModelHandle = ModelHandle(1);
const MARKER_OFFSET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
const MARKER_SCALE: f32 = 0.05;
const SHININESS: f32 = 32.0;

/// Textured scene model lit by one shadow-casting light.
#[derive(Debug, Clone)]
pub struct ShadowsScene {
    light: DirectionalShadow,
    resolution: u32,
    scene_model: PathBuf,
    light_cube: PathBuf,
    skybox: PathBuf,
}

impl ShadowsScene {
    pub fn new(settings: &Settings) -> Self {
        Self {
            light: DirectionalShadow::from_settings(&settings.shadows),
            resolution: settings.shadows.resolution,
            scene_model: settings.resolve(&settings.assets.scene_model),
            light_cube: settings.resolve(&settings.assets.light_cube),
            skybox: settings.resolve(&settings.assets.skybox_dir),
        }
    }
}

impl Scene for ShadowsScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Shadows
    }

    fn manifest(&self) -> SceneManifest {
        SceneManifest {
            models: vec![
                ModelRequest {
                    path: self.scene_model.clone(),
                    gamma_correction: true,
                    optional: false,
                },
                ModelRequest {
                    path: self.light_cube.clone(),
                    gamma_correction: false,
                    optional: true,
                },
            ],
            skybox: Some(self.skybox.clone()),
            shadow_map_resolution: Some(self.resolution),
            ..SceneManifest::default()
        }
        .set(ProgramId::Lit, "shininess", SHININESS)
        .set(ProgramId::Unlit, "color", Vec3::ONE)
    }

    fn build_frame(&self, ctx: &FrameContext<'_>) -> FramePlan {
        let light_space = self.light.light_space_matrix();
        let model = Mat4::IDENTITY;
        let (projection, view) = (ctx.projection(), ctx.view());

        let mut shadow = PassPlan::new("shadow", PassTarget::ShadowMap);
        shadow.draw(
            DrawCommand::new(ProgramId::ShadowDepth, Geometry::Model(SCENE_MODEL))
                .with("light_space_matrix", light_space)
                .with("model", model),
        );

        let mut main = PassPlan::new("main", PassTarget::Screen).clear(ctx.clear_color);
        main.draw(
            DrawCommand::new(ProgramId::Lit, Geometry::Model(SCENE_MODEL))
                .with("projection", projection)
                .with("view", view)
                .with("model", model)
                .with("view_pos", ctx.camera.position)
                .with("light_pos", self.light.position)
                .with("light_space_matrix", light_space),
        );

        if ctx.overlays.light_cube {
            let marker = Transform::from_position(self.light.position + MARKER_OFFSET)
                .with_uniform_scale(MARKER_SCALE)
                .matrix();
            main.draw(
                DrawCommand::new(ProgramId::Unlit, Geometry::Model(LIGHT_CUBE))
                    .with("projection", projection)
                    .with("view", view)
                    .with("model", marker),
            );
        }
        if ctx.overlays.skybox {
            main.draw(skybox_draw(ctx));
        }
        // drawn last: the quad ignores depth and must not be covered by the sky
        if ctx.overlays.depth_debug {
            main.draw(
                DrawCommand::new(ProgramId::DepthDebug, Geometry::ScreenQuad)
                    .with("near_plane", self.light.near)
                    .with("far_plane", self.light.far)
                    .with("linearize", i32::from(self.light.linearize_depth())),
            );
        }

        let mut plan = FramePlan::default();
        plan.push(shadow);
        plan.push(main);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::uniform::UniformValue;
    use lumi_common::OverlaySettings;

    fn frame(overlays: OverlaySettings) -> FramePlan {
        let settings = Settings::default();
        let camera = Camera::default();
        let ctx = FrameContext {
            camera: &camera,
            aspect: settings.aspect_ratio(),
            time: 0.0,
            overlays,
            clear_color: settings.window.clear_color,
        };
        ShadowsScene::new(&settings).build_frame(&ctx)
    }

    #[test]
    fn shadow_pass_precedes_main_pass() {
        let plan = frame(OverlaySettings::default());
        assert_eq!(plan.passes.len(), 2);
        assert_eq!(plan.passes[0].target, PassTarget::ShadowMap);
        assert_eq!(plan.passes[1].target, PassTarget::Screen);
        assert_eq!(plan.passes[1].clear_color, Some([0.1, 0.1, 0.1, 1.0]));

        let depth = &plan.passes[0].draws[0];
        let lit = &plan.passes[1].draws[0];
        assert_eq!(depth.program, ProgramId::ShadowDepth);
        assert_eq!(lit.program, ProgramId::Lit);
        assert_eq!(
            depth.uniform("light_space_matrix"),
            lit.uniform("light_space_matrix")
        );
    }

    #[test]
    fn default_overlays_draw_scene_and_sky() {
        let plan = frame(OverlaySettings::default());
        let programs: Vec<_> = plan.passes[1].draws.iter().map(|d| d.program).collect();
        assert_eq!(programs, vec![ProgramId::Lit, ProgramId::Skybox]);
    }

    #[test]
    fn all_overlays_put_debug_quad_last() {
        let plan = frame(OverlaySettings {
            light_cube: true,
            depth_debug: true,
            ..OverlaySettings::default()
        });
        let draws = &plan.passes[1].draws;
        let programs: Vec<_> = draws.iter().map(|d| d.program).collect();
        assert_eq!(
            programs,
            vec![
                ProgramId::Lit,
                ProgramId::Unlit,
                ProgramId::Skybox,
                ProgramId::DepthDebug
            ]
        );

        let Some(UniformValue::Mat4(marker)) = draws[1].uniform("model") else {
            panic!("marker has no model matrix");
        };
        let expected = Vec3::new(10.7, 12.3, 1.6);
        assert!((marker.w_axis.truncate() - expected).length() < 1e-5);
        assert!((marker.x_axis.x - 0.05).abs() < 1e-6);
    }

    #[test]
    fn depth_view_linearizes_only_perspective_light() {
        let overlays = OverlaySettings {
            depth_debug: true,
            ..OverlaySettings::default()
        };
        let plan = frame(overlays);
        let quad = plan.passes[1].draws.last().unwrap();
        assert_eq!(quad.uniform("linearize"), Some(&UniformValue::Int(0)));

        let mut settings = Settings::default();
        settings.shadows.perspective = true;
        let camera = Camera::default();
        let ctx = FrameContext {
            camera: &camera,
            aspect: settings.aspect_ratio(),
            time: 0.0,
            overlays,
            clear_color: settings.window.clear_color,
        };
        let plan = ShadowsScene::new(&settings).build_frame(&ctx);
        let quad = plan.passes[1].draws.last().unwrap();
        assert_eq!(quad.program, ProgramId::DepthDebug);
        assert_eq!(quad.uniform("linearize"), Some(&UniformValue::Int(1)));
    }

    #[test]
    fn manifest_requests_scene_cube_and_sky() {
        let scene = ShadowsScene::new(&Settings::default());
        let manifest = scene.manifest();
        assert_eq!(manifest.models.len(), 2);
        assert!(!manifest.models[0].optional);
        assert!(manifest.models[1].optional);
        assert_eq!(manifest.shadow_map_resolution, Some(2048));
        assert!(manifest.skybox.unwrap().ends_with("images/skybox"));
    }
}
