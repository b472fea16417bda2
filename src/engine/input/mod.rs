// Input handling system
//
// Turns raw keyboard and joystick events into a per-frame snapshot of logical
// actions, with runtime remapping and a few reserved meta combinations.
//
// ## Architecture
//
// - `action`: Logical actions, axes, reserved keys and default bindings
// - `config`: Injective binding tables and the TOML settings document
// - `state`: Level/edge state machine and the per-frame snapshot
// - `axis`: Digitizes analog axes into directional presses and releases
// - `meta`: Ctrl+F / Ctrl+Q / Ctrl+S recognition
// - `source`: Raw events, the event source trait, winit and gilrs adapters
// - `manager`: `InputEngine`, the once-per-frame event handler
//
// ## Usage Example
//
// ```rust
// use frame_input::engine::input::{Action, EventQueue, InlineSettings, InputEngine, MetaCommand};
//
// let mut input = InputEngine::from_source(InlineSettings::default())?;
// input.initialize_joysticks();
// let mut queue = EventQueue::new();
//
// // In the window callback
// queue.push_window_event(&window_event);
//
// // Once per frame
// if let Some(MetaCommand::Quit) = input.handle_events(&mut queue) {
//     // leave the game loop
// }
// if input.pressed(Action::Confirm) {
//     // Confirm went down this frame
// }
// ```

pub mod action;
pub mod axis;
pub mod config;
pub mod manager;
pub mod meta;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use action::{Action, Axis, HatDirection, TriState};
pub use config::{
    AxisBinding, BindingTable, InlineSettings, InputSettings, JoyButtonBindings, KeyBindings,
    SettingsFile, SettingsSource,
};
pub use manager::InputEngine;
pub use meta::MetaCommand;
pub use source::{EventQueue, EventSource, GamepadSource, RawEvent};
pub use state::{ActionState, Diagnostics, InputSnapshot};

/// Input configuration and device errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse input settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write input settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid input settings: {0}")]
    InvalidSettings(String),

    #[error("Joystick unavailable: {0}")]
    Joystick(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        let err = InputError::InvalidSettings("KeyA is bound to both Up and Down".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid input settings: KeyA is bound to both Up and Down"
        );
    }
}
