use super::{FrameContext, PrefabRequest, Scene, SceneManifest, skybox_draw};
use crate::plan::{DrawCommand, FramePlan, Geometry, PassPlan, PassTarget, PrefabHandle, ProgramId};
use crate::scatter::scatter_instances;
use glam::Vec3;
use lumi_common::{SceneKind, Settings};
use std::path::PathBuf;

const AMBIENT: f32 = 0.3;

/// A single prefab scattered over a disc and drawn instanced.
#[derive(Debug, Clone)]
pub struct InstancingScene {
    prefab: PathBuf,
    skybox: PathBuf,
    amount: u32,
    radius: f32,
    seed: u64,
    light_dir: Vec3,
}

impl InstancingScene {
    pub fn new(settings: &Settings) -> Self {
        let shadows = &settings.shadows;
        Self {
            prefab: settings.resolve(&settings.assets.prefab_model),
            skybox: settings.resolve(&settings.assets.skybox_dir),
            amount: settings.prefab.amount,
            radius: settings.prefab.radius,
            seed: settings.prefab.seed,
            light_dir: (shadows.light_target - shadows.light_position).normalize_or(Vec3::NEG_Y),
        }
    }
}

impl Scene for InstancingScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Instancing
    }

    fn manifest(&self) -> SceneManifest {
        SceneManifest {
            prefabs: vec![PrefabRequest {
                path: self.prefab.clone(),
                transforms: scatter_instances(self.amount, self.radius, self.seed),
            }],
            skybox: Some(self.skybox.clone()),
            ..SceneManifest::default()
        }
        .set(ProgramId::Instanced, "ambient", AMBIENT)
        .set(ProgramId::Instanced, "light_dir", self.light_dir)
    }

    fn build_frame(&self, ctx: &FrameContext<'_>) -> FramePlan {
        let mut main = PassPlan::new("main", PassTarget::Screen).clear(ctx.clear_color);
        main.draw(
            DrawCommand::new(ProgramId::Instanced, Geometry::Prefab(PrefabHandle(0)))
                .with("projection", ctx.projection())
                .with("view", ctx.view()),
        );
        if ctx.overlays.skybox {
            main.draw(skybox_draw(ctx));
        }

        let mut plan = FramePlan::default();
        plan.push(main);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use lumi_common::OverlaySettings;

    #[test]
    fn manifest_scatters_configured_amount() {
        let mut settings = Settings::default();
        settings.prefab.amount = 120;
        let manifest = InstancingScene::new(&settings).manifest();
        assert_eq!(manifest.prefabs.len(), 1);
        assert_eq!(manifest.prefabs[0].transforms.len(), 120);
        assert!(manifest.prefabs[0].path.ends_with("models/grass/grass.obj"));
        assert!(manifest.models.is_empty());
        assert_eq!(manifest.shadow_map_resolution, None);
    }

    #[test]
    fn manifest_is_stable_for_a_seed() {
        let settings = Settings::default();
        let scene = InstancingScene::new(&settings);
        assert_eq!(scene.manifest(), scene.manifest());
    }

    #[test]
    fn frame_is_one_instanced_draw() {
        let settings = Settings::default();
        let camera = Camera::default();
        let ctx = FrameContext {
            camera: &camera,
            aspect: settings.aspect_ratio(),
            time: 0.0,
            overlays: OverlaySettings {
                skybox: false,
                ..OverlaySettings::default()
            },
            clear_color: settings.window.clear_color,
        };
        let plan = InstancingScene::new(&settings).build_frame(&ctx);
        assert_eq!(plan.draw_count(), 1);
        let draw = &plan.passes[0].draws[0];
        assert_eq!(draw.program, ProgramId::Instanced);
        assert_eq!(draw.geometry, Geometry::Prefab(PrefabHandle(0)));
    }
}
