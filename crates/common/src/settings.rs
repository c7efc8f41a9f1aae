//! Runtime configuration.
//!
//! Every field has a default so a partial JSON file only needs to name what it
//! changes. The defaults reproduce the stock demo: a 1600x900 window, a 2048²
//! shadow map and the asset layout `models/`, `images/`, `shaders/`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from reading or writing settings files.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported MSAA sample count {0} (expected 1 or 4)")]
    SampleCount(u32),
}

/// Which demo scene to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SceneKind {
    /// Textured scene model lit by one directional light with a shadow map.
    #[default]
    Shadows,
    /// Grid of PBR-shaded models with varying metallic/roughness.
    Pbr,
    /// Many instances of a single model drawn in one call per mesh.
    Instancing,
}

impl SceneKind {
    pub const ALL: [SceneKind; 3] = [SceneKind::Shadows, SceneKind::Pbr, SceneKind::Instancing];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Shadows => "shadows",
            SceneKind::Pbr => "pbr",
            SceneKind::Instancing => "instancing",
        }
    }
}

impl std::fmt::Display for SceneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown scene '{s}' (expected shadows, pbr or instancing)"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub msaa_samples: u32,
    pub vsync: bool,
    pub clear_color: [f64; 4],
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "LUMI".into(),
            width: 1600,
            height: 900,
            resizable: false,
            msaa_samples: 4,
            vsync: true,
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    /// Multiplier applied while the boost key is held.
    pub boost: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sensitivity: 0.1,
            zoom: 45.0,
            near: 0.1,
            far: 100.0,
            boost: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub resolution: u32,
    pub light_position: Vec3,
    pub light_target: Vec3,
    /// Half-size of the orthographic light frustum.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
    /// Use a perspective light frustum instead of an orthographic one.
    /// The depth debug view then shows linearized depth.
    pub perspective: bool,
    /// Vertical field of view of the perspective frustum, in degrees.
    pub fov_degrees: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            light_position: Vec3::new(10.7, 10.3, 1.6),
            light_target: Vec3::new(-10.6, 0.0, 0.0),
            extent: 10.0,
            near: 0.01,
            far: 9.0,
            perspective: false,
            fov_degrees: 90.0,
        }
    }
}

/// Optional layers that can be toggled at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub skybox: bool,
    pub light_cube: bool,
    pub depth_debug: bool,
    pub animate_lights: bool,
    pub inspector: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            skybox: true,
            light_cube: false,
            depth_debug: false,
            animate_lights: false,
            inspector: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabSettings {
    pub amount: u32,
    pub radius: f32,
    pub seed: u64,
}

impl Default for PrefabSettings {
    fn default() -> Self {
        Self {
            amount: 3000,
            radius: 15.0,
            seed: 42,
        }
    }
}

/// Asset locations, relative to [`Settings::assets_dir`] unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub scene_model: PathBuf,
    pub light_cube: PathBuf,
    pub pbr_model: PathBuf,
    pub prefab_model: PathBuf,
    pub skybox_dir: PathBuf,
    pub shader_dir: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            scene_model: "models/sponza/sponza.obj".into(),
            light_cube: "models/cube.obj".into(),
            pbr_model: "models/pokeball/pokeball.obj".into(),
            prefab_model: "models/grass/grass.obj".into(),
            skybox_dir: "images/skybox".into(),
            shader_dir: "shaders".into(),
        }
    }
}

/// Top-level configuration for a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scene: SceneKind,
    pub assets_dir: PathBuf,
    pub assets: AssetPaths,
    pub window: WindowSettings,
    pub camera: CameraSettings,
    pub shadows: ShadowSettings,
    pub overlays: OverlaySettings,
    pub prefab: PrefabSettings,
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&data).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        match self.window.msaa_samples {
            1 | 4 => Ok(()),
            n => Err(SettingsError::SampleCount(n)),
        }
    }

    /// Resolve an asset path against `assets_dir`.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.assets_dir.join(relative)
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.window.width as f32 / self.window.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_demo() {
        let s = Settings::default();
        assert_eq!(s.window.width, 1600);
        assert_eq!(s.window.height, 900);
        assert_eq!(s.window.msaa_samples, 4);
        assert_eq!(s.shadows.resolution, 2048);
        assert_eq!(s.camera.zoom, 45.0);
        assert_eq!(s.prefab.amount, 3000);
        assert_eq!(s.scene, SceneKind::Shadows);
        assert!(s.overlays.skybox);
        assert!(!s.overlays.depth_debug);
        assert!(!s.shadows.perspective);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "scene": "pbr", "window": { "width": 800 } }"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.scene, SceneKind::Pbr);
        assert_eq!(s.window.width, 800);
        assert_eq!(s.window.height, 900);
        assert_eq!(s.camera, CameraSettings::default());
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut s = Settings::default();
        s.scene = SceneKind::Instancing;
        s.prefab.seed = 7;
        s.save(tmp.path()).unwrap();

        let loaded = Settings::load(tmp.path()).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn load_rejects_bad_sample_count() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{ "window": { "msaa_samples": 3 } }"#).unwrap();
        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, SettingsError::SampleCount(3)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Settings::load("/nonexistent/lumi.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let s = Settings {
            assets_dir: PathBuf::from("/data"),
            ..Settings::default()
        };
        assert_eq!(
            s.resolve("models/cube.obj"),
            PathBuf::from("/data/models/cube.obj")
        );
    }

    #[test]
    fn scene_kind_parses_case_insensitively() {
        assert_eq!("PBR".parse::<SceneKind>().unwrap(), SceneKind::Pbr);
        assert!("sponza".parse::<SceneKind>().is_err());
    }
}
