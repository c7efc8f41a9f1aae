use super::{FrameContext, ModelRequest, Scene, SceneManifest, skybox_draw};
use crate::light::PointLight;
use crate::plan::{DrawCommand, FramePlan, Geometry, ModelHandle, PassPlan, PassTarget, ProgramId};
use glam::{Mat3, Mat4, Vec3};
use lumi_common::{SceneKind, Settings};
use std::path::PathBuf;

const GRID_ROWS: u32 = 6;
const GRID_COLUMNS: u32 = 6;
const SPACING: f32 = 2.5;
const MODEL_SCALE: f32 = 1.5;
const MIN_ROUGHNESS: f32 = 0.05;

/// A grid of one model, metallic increasing by row and roughness by column.
#[derive(Debug, Clone)]
pub struct PbrScene {
    model: PathBuf,
    skybox: PathBuf,
    lights: [PointLight; 4],
}

impl PbrScene {
    pub fn new(settings: &Settings) -> Self {
        Self {
            model: settings.resolve(&settings.assets.pbr_model),
            skybox: settings.resolve(&settings.assets.skybox_dir),
            lights: PointLight::pbr_rig(),
        }
    }
}

/// Model matrix, metallic and roughness for one grid cell.
pub(crate) fn grid_cell(row: u32, col: u32) -> (Mat4, f32, f32) {
    let metallic = row as f32 / GRID_ROWS as f32;
    let roughness = (col as f32 / GRID_COLUMNS as f32).clamp(MIN_ROUGHNESS, 1.0);
    let position = Vec3::new(
        (col as f32 - (GRID_COLUMNS / 2) as f32) * SPACING,
        (row as f32 - (GRID_ROWS / 2) as f32) * SPACING,
        0.0,
    );
    let model = Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(MODEL_SCALE));
    (model, metallic, roughness)
}

impl Scene for PbrScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Pbr
    }

    fn manifest(&self) -> SceneManifest {
        SceneManifest {
            models: vec![ModelRequest {
                path: self.model.clone(),
                gamma_correction: true,
                optional: false,
            }],
            skybox: Some(self.skybox.clone()),
            ..SceneManifest::default()
        }
        .set(ProgramId::Pbr, "ao", 1.0_f32)
    }

    fn build_frame(&self, ctx: &FrameContext<'_>) -> FramePlan {
        let mut main = PassPlan::new("main", PassTarget::Screen).clear(ctx.clear_color);

        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLUMNS {
                let (model, metallic, roughness) = grid_cell(row, col);
                let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
                let mut draw = DrawCommand::new(ProgramId::Pbr, Geometry::Model(ModelHandle(0)))
                    .with("model", model)
                    .with("normal_matrix", normal_matrix)
                    .with("metallic", metallic)
                    .with("roughness", roughness);

                // camera and lights persist for the rest of the grid
                if row == 0 && col == 0 {
                    draw = draw
                        .with("projection", ctx.projection())
                        .with("view", ctx.view())
                        .with("cam_pos", ctx.camera.position);
                    for (i, light) in self.lights.iter().enumerate() {
                        let light = if ctx.overlays.animate_lights {
                            light.animated(ctx.time)
                        } else {
                            *light
                        };
                        draw = draw
                            .with(format!("light_positions[{i}]"), light.position)
                            .with(format!("light_colors[{i}]"), light.color);
                    }
                }
                main.draw(draw);
            }
        }

        if ctx.overlays.skybox {
            main.draw(skybox_draw(ctx));
        }

        let mut plan = FramePlan::default();
        plan.push(main);
        plan
    }
}
