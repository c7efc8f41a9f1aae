use lumi_common::{CameraMovement, OverlaySettings};
use serde::{Deserialize, Serialize};

/// Runtime-toggleable layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overlay {
    Inspector,
    Skybox,
    DepthDebug,
    LightCube,
    AnimatedLights,
}

impl Overlay {
    /// Flip the overlay's flag and return its new state.
    pub fn toggle(self, overlays: &mut OverlaySettings) -> bool {
        let flag = match self {
            Overlay::Inspector => &mut overlays.inspector,
            Overlay::Skybox => &mut overlays.skybox,
            Overlay::DepthDebug => &mut overlays.depth_debug,
            Overlay::LightCube => &mut overlays.light_cube,
            Overlay::AnimatedLights => &mut overlays.animate_lights,
        };
        *flag = !*flag;
        *flag
    }
}

/// A high-level action a key can be bound to.
///
/// The frame loop consumes actions, never raw key events. Movement and boost
/// are held; everything else fires once per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Move(CameraMovement),
    /// Multiply camera speed while held.
    Boost,
    Toggle(Overlay),
    Quit,
}

impl Action {
    pub fn is_held(self) -> bool {
        matches!(self, Action::Move(_) | Action::Boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_one_flag() {
        let mut overlays = OverlaySettings::default();
        assert!(Overlay::DepthDebug.toggle(&mut overlays));
        assert!(overlays.depth_debug);
        assert!(overlays.skybox);

        assert!(!Overlay::Skybox.toggle(&mut overlays));
        assert!(!overlays.skybox);
    }

    #[test]
    fn held_actions() {
        assert!(Action::Move(CameraMovement::Up).is_held());
        assert!(Action::Boost.is_held());
        assert!(!Action::Quit.is_held());
        assert!(!Action::Toggle(Overlay::Inspector).is_held());
    }

    #[test]
    fn actions_serialize_kebab_case() {
        let json = serde_json::to_string(&Action::Toggle(Overlay::LightCube)).unwrap();
        assert_eq!(json, r#"{"toggle":"light-cube"}"#);
        let parsed: Action = serde_json::from_str(r#"{"move":"backward"}"#).unwrap();
        assert_eq!(parsed, Action::Move(CameraMovement::Backward));
    }
}
