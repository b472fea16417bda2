// Frame input: debounced, remappable keyboard and joystick input for game loops

pub mod engine;
