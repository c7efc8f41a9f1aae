//! Desktop input mapped to renderer actions.
//!
//! # Invariants
//! - The frame loop reacts to [`Action`]s, never to raw key codes.
//! - Movement is applied from held state once per frame, scaled by delta time.

pub mod action;
mod state;

pub use action::{Action, Overlay};
pub use state::{BindingsError, InputState, KeyBindings};

pub fn crate_info() -> &'static str {
    "lumi-input v0.1.0"
}
