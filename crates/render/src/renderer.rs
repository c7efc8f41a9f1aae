use crate::plan::{FramePlan, Geometry};
use crate::uniform::UniformValue;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer executes a frame plan in order and produces output. Plans
/// are built by scenes; renderers never decide what to draw.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, plan: &FramePlan) -> Self::Output;
}

/// Text renderer for frame plans.
///
/// Produces a human-readable listing of passes and draws. Used by the CLI
/// and by tests that check what a scene submits.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also print every uniform value set by each draw.
    pub verbose: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, plan: &FramePlan) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame (passes={}, draws={}) ===",
            plan.passes.len(),
            plan.draw_count()
        );
        for pass in &plan.passes {
            let clear = match pass.clear_color {
                Some([r, g, b, a]) => format!("clear=({r:.2}, {g:.2}, {b:.2}, {a:.2})"),
                None => "load".to_string(),
            };
            let _ = writeln!(out, "pass '{}' -> {:?} {clear}", pass.label, pass.target);
            for draw in &pass.draws {
                let geometry = match draw.geometry {
                    Geometry::Model(h) => format!("model#{}", h.0),
                    Geometry::Prefab(h) => format!("prefab#{}", h.0),
                    Geometry::Skybox => "skybox".to_string(),
                    Geometry::ScreenQuad => "screen-quad".to_string(),
                };
                let _ = writeln!(
                    out,
                    "  {} {geometry} ({} uniforms)",
                    draw.program,
                    draw.uniforms.len()
                );
                if self.verbose {
                    for (name, value) in &draw.uniforms {
                        let _ = writeln!(out, "    {name} = {}", format_value(value));
                    }
                }
            }
        }
        out
    }
}

fn format_value(value: &UniformValue) -> String {
    match value {
        UniformValue::Int(v) => v.to_string(),
        UniformValue::Float(v) => format!("{v:.3}"),
        UniformValue::Vec3(v) => format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z),
        UniformValue::Vec4(v) => format!("({:.3}, {:.3}, {:.3}, {:.3})", v.x, v.y, v.z, v.w),
        UniformValue::Mat3(_) => "mat3".to_string(),
        UniformValue::Mat4(m) => {
            let t = m.w_axis;
            format!("mat4 t=({:.2}, {:.2}, {:.2})", t.x, t.y, t.z)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{DrawCommand, ModelHandle, PassPlan, PassTarget, PrefabHandle, ProgramId};
    use glam::Vec3;

    #[test]
    fn debug_renderer_empty_plan() {
        let output = DebugTextRenderer::new().render(&FramePlan::default());
        assert!(output.contains("passes=0"));
        assert!(output.contains("draws=0"));
    }

    #[test]
    fn debug_renderer_lists_draws() {
        let mut pass = PassPlan::new("main", PassTarget::Screen).clear([0.1, 0.1, 0.1, 1.0]);
        pass.draw(
            DrawCommand::new(ProgramId::Unlit, Geometry::Model(ModelHandle(1)))
                .with("color", Vec3::ONE),
        );
        pass.draw(DrawCommand::new(ProgramId::Instanced, Geometry::Prefab(PrefabHandle(0))));
        let mut plan = FramePlan::default();
        plan.push(pass);

        let output = DebugTextRenderer::new().render(&plan);
        assert!(output.contains("pass 'main' -> Screen clear=(0.10, 0.10, 0.10, 1.00)"));
        assert!(output.contains("unlit model#1 (1 uniforms)"));
        assert!(output.contains("instanced prefab#0"));
        assert!(!output.contains("color ="));

        let verbose = DebugTextRenderer::verbose().render(&plan);
        assert!(verbose.contains("color = (1.000, 1.000, 1.000)"));
    }
}
