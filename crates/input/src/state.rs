use crate::action::{Action, Overlay};
use lumi_common::CameraMovement;
use lumi_render::Camera;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum BindingsError {
    #[error("failed to read key bindings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid key bindings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Physical key name to action.
///
/// Key names are winit `KeyCode` variant names (`KeyW`, `ShiftLeft`, `F1`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    keys: BTreeMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = [
            ("KeyW", Action::Move(CameraMovement::Forward)),
            ("KeyS", Action::Move(CameraMovement::Backward)),
            ("KeyA", Action::Move(CameraMovement::Left)),
            ("KeyD", Action::Move(CameraMovement::Right)),
            ("KeyE", Action::Move(CameraMovement::Up)),
            ("KeyQ", Action::Move(CameraMovement::Down)),
            ("ShiftLeft", Action::Boost),
            ("Escape", Action::Quit),
            ("F1", Action::Toggle(Overlay::Inspector)),
            ("F2", Action::Toggle(Overlay::Skybox)),
            ("F3", Action::Toggle(Overlay::DepthDebug)),
            ("F4", Action::Toggle(Overlay::LightCube)),
            ("F5", Action::Toggle(Overlay::AnimatedLights)),
        ]
        .into_iter()
        .map(|(k, a)| (k.to_string(), a))
        .collect();
        Self { keys }
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            keys: BTreeMap::new(),
        }
    }

    /// Load bindings from JSON. The file replaces the defaults entirely.
    ///
    /// Key names that cannot be a `KeyCode` variant (empty or containing
    /// whitespace) are dropped with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindingsError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| BindingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bindings: Self = serde_json::from_str(&data).map_err(|source| BindingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        bindings.keys.retain(|key, action| {
            let valid = !key.is_empty() && !key.contains(char::is_whitespace);
            if !valid {
                tracing::warn!("{}: ignoring binding {key:?} -> {action:?}", path.display());
            }
            valid
        });
        if !bindings.keys.values().any(|a| *a == Action::Quit) {
            tracing::warn!("{}: no key is bound to quit", path.display());
        }
        tracing::info!("loaded {} key bindings from {}", bindings.keys.len(), path.display());
        Ok(bindings)
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) -> Option<Action> {
        self.keys.insert(key.into(), action)
    }

    pub fn action(&self, key: &str) -> Option<Action> {
        self.keys.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Action)> {
        self.keys.iter().map(|(k, a)| (k.as_str(), *a))
    }
}

/// Keys currently held, reduced to camera movement.
#[derive(Debug, Clone)]
pub struct InputState {
    held: BTreeSet<CameraMovement>,
    boost_held: bool,
    boost: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl InputState {
    pub fn new(boost: f32) -> Self {
        Self {
            held: BTreeSet::new(),
            boost_held: false,
            boost,
        }
    }

    /// Feed one key event. Returns the action a fresh press triggers.
    ///
    /// Held actions update state and are also returned on press; auto-repeat
    /// presses return nothing.
    pub fn key_event(
        &mut self,
        bindings: &KeyBindings,
        key: &str,
        pressed: bool,
        repeat: bool,
    ) -> Option<Action> {
        let action = bindings.action(key)?;
        match action {
            Action::Move(dir) if pressed => {
                self.held.insert(dir);
            }
            Action::Move(dir) => {
                self.held.remove(&dir);
            }
            Action::Boost => self.boost_held = pressed,
            _ => {}
        }
        (pressed && !repeat).then_some(action)
    }

    /// Forget held keys, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
        self.boost_held = false;
    }

    pub fn is_moving(&self) -> bool {
        !self.held.is_empty()
    }

    /// Move the camera for every held direction.
    pub fn apply(&self, camera: &mut Camera, dt: f32) {
        let dt = if self.boost_held { dt * self.boost } else { dt };
        for &dir in &self.held {
            camera.process_keyboard(dir, dt);
        }
    }

    /// Convert a raw pointer delta to camera offsets: screen y grows downward,
    /// pitch grows upward.
    pub fn look_offsets(dx: f64, dy: f64) -> (f32, f32) {
        (dx as f32, -dy as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn default_bindings_cover_movement_and_quit() {
        let b = KeyBindings::default();
        assert_eq!(b.action("KeyW"), Some(Action::Move(CameraMovement::Forward)));
        assert_eq!(b.action("KeyQ"), Some(Action::Move(CameraMovement::Down)));
        assert_eq!(b.action("Escape"), Some(Action::Quit));
        assert_eq!(b.action("F3"), Some(Action::Toggle(Overlay::DepthDebug)));
        assert_eq!(b.action("KeyZ"), None);
        let moves = b.iter().filter(|(_, a)| matches!(a, Action::Move(_))).count();
        assert_eq!(moves, CameraMovement::ALL.len());
    }

    #[test]
    fn held_keys_move_until_released() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new(3.0);
        let mut camera = Camera::default();

        assert_eq!(
            input.key_event(&bindings, "KeyW", true, false),
            Some(Action::Move(CameraMovement::Forward))
        );
        input.apply(&mut camera, 0.4);
        assert!((camera.position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);

        input.key_event(&bindings, "KeyW", false, false);
        assert!(!input.is_moving());
        input.apply(&mut camera, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn boost_scales_distance() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new(3.0);
        let mut camera = Camera::default();
        input.key_event(&bindings, "ShiftLeft", true, false);
        input.key_event(&bindings, "KeyE", true, false);
        input.apply(&mut camera, 0.2);
        assert!((camera.position.y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn repeats_and_releases_fire_nothing() {
        let bindings = KeyBindings::default();
        let mut input = InputState::default();
        assert_eq!(
            input.key_event(&bindings, "F2", true, false),
            Some(Action::Toggle(Overlay::Skybox))
        );
        assert_eq!(input.key_event(&bindings, "F2", true, true), None);
        assert_eq!(input.key_event(&bindings, "F2", false, false), None);
        assert_eq!(input.key_event(&bindings, "Unbound", true, false), None);
    }

    #[test]
    fn clear_releases_everything() {
        let bindings = KeyBindings::default();
        let mut input = InputState::default();
        input.key_event(&bindings, "KeyA", true, false);
        input.key_event(&bindings, "KeyD", true, false);
        assert!(input.is_moving());
        input.clear();
        assert!(!input.is_moving());
    }

    #[test]
    fn look_offsets_flip_y() {
        assert_eq!(InputState::look_offsets(4.0, 2.0), (4.0, -2.0));
    }

    #[test]
    fn bindings_load_from_json() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r#"{ "ArrowUp": { "move": "forward" }, "KeyX": "quit" }"#,
        )
        .unwrap();
        let b = KeyBindings::load(tmp.path()).unwrap();
        assert_eq!(b.action("ArrowUp"), Some(Action::Move(CameraMovement::Forward)));
        assert_eq!(b.action("KeyX"), Some(Action::Quit));
        assert_eq!(b.action("KeyW"), None);

        std::fs::write(tmp.path(), "not json").unwrap();
        assert!(matches!(
            KeyBindings::load(tmp.path()),
            Err(BindingsError::Parse { .. })
        ));
    }

    #[test]
    fn malformed_key_names_are_dropped_on_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r#"{ "": "quit", "Key W": { "move": "forward" }, "KeyW": "boost" }"#,
        )
        .unwrap();
        let b = KeyBindings::load(tmp.path()).unwrap();
        assert_eq!(b.iter().count(), 1);
        assert_eq!(b.action("KeyW"), Some(Action::Boost));
        assert_eq!(b.action(""), None);
        assert_eq!(b.action("Key W"), None);
    }
}
