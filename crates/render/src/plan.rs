use crate::uniform::{UniformKind, UniformLayout, UniformValue};

/// The shader programs a frame can draw with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramId {
    /// Blinn-Phong with a shadow-map lookup.
    Lit,
    /// Flat colour, used for the light marker.
    Unlit,
    /// Depth-only pass from the light.
    ShadowDepth,
    /// Full-screen view of the shadow map.
    DepthDebug,
    Skybox,
    /// Metallic/roughness shading with four point lights.
    Pbr,
    /// Per-instance model matrices from a vertex buffer.
    Instanced,
}

impl ProgramId {
    pub const ALL: [ProgramId; 7] = [
        ProgramId::Lit,
        ProgramId::Unlit,
        ProgramId::ShadowDepth,
        ProgramId::DepthDebug,
        ProgramId::Skybox,
        ProgramId::Pbr,
        ProgramId::Instanced,
    ];

    /// Shader file stem, also used for overrides on disk.
    pub fn name(self) -> &'static str {
        match self {
            ProgramId::Lit => "lit",
            ProgramId::Unlit => "unlit",
            ProgramId::ShadowDepth => "shadow_depth",
            ProgramId::DepthDebug => "depth_debug",
            ProgramId::Skybox => "skybox",
            ProgramId::Pbr => "pbr",
            ProgramId::Instanced => "instanced",
        }
    }

    /// Whether the program's vertex inputs fit this geometry.
    pub fn accepts(self, geometry: &Geometry) -> bool {
        match geometry {
            Geometry::Model(_) => matches!(
                self,
                ProgramId::Lit | ProgramId::Unlit | ProgramId::ShadowDepth | ProgramId::Pbr
            ),
            Geometry::Prefab(_) => self == ProgramId::Instanced,
            Geometry::Skybox => self == ProgramId::Skybox,
            Geometry::ScreenQuad => self == ProgramId::DepthDebug,
        }
    }

    /// Layout of the program's `Uniforms` struct at `@group(0) @binding(0)`.
    ///
    /// Field order here must match the WGSL declaration.
    pub fn uniform_layout(self) -> UniformLayout {
        use UniformKind::*;
        let b = UniformLayout::builder();
        match self {
            ProgramId::Lit => b
                .field("projection", Mat4)
                .field("view", Mat4)
                .field("model", Mat4)
                .field("light_space_matrix", Mat4)
                .field("view_pos", Vec3)
                .field("light_pos", Vec3)
                .field("shininess", Float),
            ProgramId::Unlit => b
                .field("projection", Mat4)
                .field("view", Mat4)
                .field("model", Mat4)
                .field("color", Vec3),
            ProgramId::ShadowDepth => b
                .field("light_space_matrix", Mat4)
                .field("model", Mat4),
            ProgramId::DepthDebug => b
                .field("near_plane", Float)
                .field("far_plane", Float)
                .field("linearize", Int),
            ProgramId::Skybox => b.field("projection", Mat4).field("view", Mat4),
            ProgramId::Pbr => b
                .field("projection", Mat4)
                .field("view", Mat4)
                .field("model", Mat4)
                .field("normal_matrix", Mat3)
                .field("cam_pos", Vec3)
                .field("metallic", Float)
                .field("roughness", Float)
                .field("ao", Float)
                .array("light_positions", Vec3, 4)
                .array("light_colors", Vec3, 4),
            ProgramId::Instanced => b
                .field("projection", Mat4)
                .field("view", Mat4)
                .field("light_dir", Vec3)
                .field("ambient", Float),
        }
        .build()
    }
}

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Index into the models a scene's manifest requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelHandle(pub usize);

/// Index into the prefabs a scene's manifest requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrefabHandle(pub usize);

/// What a draw command rasterises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Model(ModelHandle),
    Prefab(PrefabHandle),
    Skybox,
    /// Full-screen quad sampling the shadow map.
    ScreenQuad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    /// The light's depth texture.
    ShadowMap,
    /// The window surface (multisampled when enabled).
    Screen,
}

/// One draw: set these uniforms on `program`, then draw `geometry`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub program: ProgramId,
    pub geometry: Geometry,
    pub uniforms: Vec<(String, UniformValue)>,
}

impl DrawCommand {
    pub fn new(program: ProgramId, geometry: Geometry) -> Self {
        Self {
            program,
            geometry,
            uniforms: Vec::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.push((name.into(), value.into()));
        self
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Why this draw cannot run against `loaded`, or `None` when it can.
    pub fn skip_reason(&self, loaded: &LoadedGeometry) -> Option<SkipReason> {
        if !self.program.accepts(&self.geometry) {
            Some(SkipReason::ProgramMismatch)
        } else if !loaded.contains(self.geometry) {
            Some(SkipReason::MissingGeometry)
        } else {
            None
        }
    }
}

/// Why a draw command is left out of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The program's vertex inputs do not fit the geometry.
    ProgramMismatch,
    /// The model, prefab or skybox is not loaded.
    MissingGeometry,
}

/// The geometry a backend holds for the current scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedGeometry {
    /// One entry per requested model; `false` for an optional model that failed to load.
    pub models: Vec<bool>,
    pub prefabs: usize,
    pub skybox: bool,
}

impl LoadedGeometry {
    pub fn contains(&self, geometry: Geometry) -> bool {
        match geometry {
            Geometry::Model(handle) => self.models.get(handle.0).copied().unwrap_or(false),
            Geometry::Prefab(handle) => handle.0 < self.prefabs,
            Geometry::Skybox => self.skybox,
            Geometry::ScreenQuad => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    pub label: &'static str,
    pub target: PassTarget,
    /// Colour to clear to; `None` keeps the previous contents.
    pub clear_color: Option<[f64; 4]>,
    pub clear_depth: bool,
    pub draws: Vec<DrawCommand>,
}

impl PassPlan {
    pub fn new(label: &'static str, target: PassTarget) -> Self {
        Self {
            label,
            target,
            clear_color: None,
            clear_depth: true,
            draws: Vec::new(),
        }
    }

    pub fn clear(mut self, color: [f64; 4]) -> Self {
        self.clear_color = Some(color);
        self
    }

    pub fn draw(&mut self, command: DrawCommand) {
        self.draws.push(command);
    }
}

/// Everything one frame draws, in submission order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FramePlan {
    pub passes: Vec<PassPlan>,
}

impl FramePlan {
    pub fn push(&mut self, pass: PassPlan) {
        self.passes.push(pass);
    }

    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|p| p.draws.len()).sum()
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCommand> {
        self.passes.iter().flat_map(|p| p.draws.iter())
    }

    pub fn pass(&self, target: PassTarget) -> Option<&PassPlan> {
        self.passes.iter().find(|p| p.target == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    #[test]
    fn program_names_are_unique() {
        let mut names: Vec<_> = ProgramId::ALL.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ProgramId::ALL.len());
    }

    #[test]
    fn layouts_match_wgsl_struct_sizes() {
        assert_eq!(ProgramId::Lit.uniform_layout().size(), 288);
        assert_eq!(ProgramId::Unlit.uniform_layout().size(), 208);
        assert_eq!(ProgramId::ShadowDepth.uniform_layout().size(), 128);
        assert_eq!(ProgramId::DepthDebug.uniform_layout().size(), 16);
        assert_eq!(ProgramId::Skybox.uniform_layout().size(), 128);
        assert_eq!(ProgramId::Instanced.uniform_layout().size(), 144);

        let pbr = ProgramId::Pbr.uniform_layout();
        assert_eq!(pbr.offset_of("normal_matrix").unwrap(), 192);
        assert_eq!(pbr.offset_of("metallic").unwrap(), 252);
        assert_eq!(pbr.offset_of("light_positions[0]").unwrap(), 272);
        assert_eq!(pbr.offset_of("light_colors[3]").unwrap(), 384);
        assert_eq!(pbr.size(), 400);
    }

    #[test]
    fn programs_accept_matching_geometry() {
        let model = Geometry::Model(ModelHandle(0));
        assert!(ProgramId::Lit.accepts(&model));
        assert!(ProgramId::ShadowDepth.accepts(&model));
        assert!(!ProgramId::Instanced.accepts(&model));
        assert!(ProgramId::Instanced.accepts(&Geometry::Prefab(PrefabHandle(0))));
        assert!(!ProgramId::Skybox.accepts(&Geometry::ScreenQuad));
        assert!(ProgramId::DepthDebug.accepts(&Geometry::ScreenQuad));
    }

    fn shadows_scene_without_light_cube() -> LoadedGeometry {
        LoadedGeometry {
            models: vec![true, false],
            prefabs: 0,
            skybox: true,
        }
    }

    #[test]
    fn draw_with_loaded_geometry_runs() {
        let loaded = shadows_scene_without_light_cube();
        let lit = DrawCommand::new(ProgramId::Lit, Geometry::Model(ModelHandle(0)));
        assert_eq!(lit.skip_reason(&loaded), None);
        let sky = DrawCommand::new(ProgramId::Skybox, Geometry::Skybox);
        assert_eq!(sky.skip_reason(&loaded), None);
        let quad = DrawCommand::new(ProgramId::DepthDebug, Geometry::ScreenQuad);
        assert_eq!(quad.skip_reason(&loaded), None);
    }

    #[test]
    fn failed_optional_model_is_skipped() {
        let loaded = shadows_scene_without_light_cube();
        let marker = DrawCommand::new(ProgramId::Unlit, Geometry::Model(ModelHandle(1)));
        assert_eq!(marker.skip_reason(&loaded), Some(SkipReason::MissingGeometry));
        let unknown = DrawCommand::new(ProgramId::Unlit, Geometry::Model(ModelHandle(7)));
        assert_eq!(unknown.skip_reason(&loaded), Some(SkipReason::MissingGeometry));
        let grass = DrawCommand::new(ProgramId::Instanced, Geometry::Prefab(PrefabHandle(0)));
        assert_eq!(grass.skip_reason(&loaded), Some(SkipReason::MissingGeometry));
    }

    #[test]
    fn mismatched_program_is_skipped_before_geometry_lookup() {
        let loaded = shadows_scene_without_light_cube();
        let instanced_model = DrawCommand::new(ProgramId::Instanced, Geometry::Model(ModelHandle(0)));
        assert_eq!(
            instanced_model.skip_reason(&loaded),
            Some(SkipReason::ProgramMismatch)
        );
        // geometry is also missing, but the program check wins
        let sky_on_marker = DrawCommand::new(ProgramId::Skybox, Geometry::Model(ModelHandle(1)));
        assert_eq!(sky_on_marker.skip_reason(&loaded), Some(SkipReason::ProgramMismatch));
    }

    #[test]
    fn missing_skybox_is_skipped() {
        let loaded = LoadedGeometry {
            skybox: false,
            ..shadows_scene_without_light_cube()
        };
        let sky = DrawCommand::new(ProgramId::Skybox, Geometry::Skybox);
        assert_eq!(sky.skip_reason(&loaded), Some(SkipReason::MissingGeometry));
    }

    #[test]
    fn draw_command_keeps_latest_value() {
        let cmd = DrawCommand::new(ProgramId::Unlit, Geometry::Model(ModelHandle(0)))
            .with("model", Mat4::IDENTITY)
            .with("model", Mat4::from_scale(glam::Vec3::splat(2.0)));
        assert_eq!(cmd.uniforms.len(), 2);
        assert_eq!(
            cmd.uniform("model"),
            Some(&UniformValue::Mat4(Mat4::from_scale(glam::Vec3::splat(2.0))))
        );
        assert_eq!(cmd.uniform("view"), None);
    }

    #[test]
    fn frame_plan_counts_draws() {
        let mut plan = FramePlan::default();
        let mut shadow = PassPlan::new("shadow", PassTarget::ShadowMap);
        shadow.draw(DrawCommand::new(ProgramId::ShadowDepth, Geometry::Model(ModelHandle(0))));
        let mut screen = PassPlan::new("main", PassTarget::Screen).clear([0.1, 0.1, 0.1, 1.0]);
        screen.draw(DrawCommand::new(ProgramId::Lit, Geometry::Model(ModelHandle(0))));
        screen.draw(DrawCommand::new(ProgramId::Skybox, Geometry::Skybox));
        plan.push(shadow);
        plan.push(screen);

        assert_eq!(plan.draw_count(), 3);
        assert_eq!(plan.pass(PassTarget::Screen).unwrap().draws.len(), 2);
        assert!(plan.pass(PassTarget::ShadowMap).unwrap().clear_color.is_none());
    }
}
