// Logical action definitions, reserved keys and default mappings

use winit::keyboard::KeyCode;

/// Represents every logical input intent the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    // Directions
    Up,
    Down,
    Left,
    Right,

    // Menu navigation
    Confirm,
    Cancel,
    Menu,
    Minimap,

    // Meta actions
    Pause,
    Quit,
    Help,
}

impl Action {
    /// Number of logical actions
    pub const COUNT: usize = 11;

    /// All actions, in declaration order
    pub const ALL: [Action; Action::COUNT] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Confirm,
        Action::Cancel,
        Action::Menu,
        Action::Minimap,
        Action::Pause,
        Action::Quit,
        Action::Help,
    ];

    /// Actions whose keyboard binding can be changed at runtime.
    /// Quit and Help stay on their reserved keys.
    pub const KEY_REMAPPABLE: [Action; 9] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Confirm,
        Action::Cancel,
        Action::Menu,
        Action::Minimap,
        Action::Pause,
    ];

    /// Actions that can be triggered by a joystick button.
    /// Directions come from the axes and the hat instead.
    pub const JOY_REMAPPABLE: [Action; 7] = [
        Action::Confirm,
        Action::Cancel,
        Action::Menu,
        Action::Minimap,
        Action::Pause,
        Action::Help,
        Action::Quit,
    ];

    /// Dense index of this action, usable for array storage
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the keyboard binding of this action may be changed
    pub fn is_key_remappable(self) -> bool {
        !matches!(self, Action::Quit | Action::Help)
    }

    /// Whether this action may hold a joystick button
    pub fn is_joy_remappable(self) -> bool {
        Self::JOY_REMAPPABLE.contains(&self)
    }

    /// Whether this is one of the four directions
    pub fn is_direction(self) -> bool {
        matches!(self, Action::Up | Action::Down | Action::Left | Action::Right)
    }
}

/// Logical joystick axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Directional actions for the (negative, positive) ends of this axis.
    /// Negative Y is up, matching the usual joystick convention.
    pub fn directions(self) -> (Action, Action) {
        match self {
            Axis::X => (Action::Left, Action::Right),
            Axis::Y => (Action::Up, Action::Down),
        }
    }
}

/// An analog axis reduced to three positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState {
    Negative,
    #[default]
    Neutral,
    Positive,
}

/// Joystick hat (D-pad) direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Up,
    Down,
    Left,
    Right,
}

impl HatDirection {
    /// The directional action driven by this hat direction
    pub fn action(self) -> Action {
        match self {
            HatDirection::Up => Action::Up,
            HatDirection::Down => Action::Down,
            HatDirection::Left => Action::Left,
            HatDirection::Right => Action::Right,
        }
    }
}

/// Key permanently bound to Quit
pub const QUIT_KEY: KeyCode = KeyCode::Escape;

/// Key permanently bound to Help
pub const HELP_KEY: KeyCode = KeyCode::F1;

/// Keys that always trigger Confirm, in addition to its remappable key
pub const CONFIRM_SECONDARY_KEYS: [KeyCode; 2] = [KeyCode::Enter, KeyCode::NumpadEnter];

/// Largest magnitude an analog axis can report
pub const MAX_AXIS_MAGNITUDE: u16 = 32767;

/// Check whether a key code is reserved for a fixed action
pub fn is_reserved_key(code: KeyCode) -> bool {
    code == QUIT_KEY || code == HELP_KEY || CONFIRM_SECONDARY_KEYS.contains(&code)
}

/// Action permanently attached to a reserved key, if any
pub fn reserved_key_action(code: KeyCode) -> Option<Action> {
    if code == QUIT_KEY {
        Some(Action::Quit)
    } else if code == HELP_KEY {
        Some(Action::Help)
    } else if CONFIRM_SECONDARY_KEYS.contains(&code) {
        Some(Action::Confirm)
    } else {
        None
    }
}

/// Default keyboard bindings for the remappable actions
pub fn default_key_bindings() -> Vec<(Action, KeyCode)> {
    vec![
        (Action::Up, KeyCode::ArrowUp),
        (Action::Down, KeyCode::ArrowDown),
        (Action::Left, KeyCode::ArrowLeft),
        (Action::Right, KeyCode::ArrowRight),
        (Action::Confirm, KeyCode::KeyF),
        (Action::Cancel, KeyCode::KeyD),
        (Action::Menu, KeyCode::KeyS),
        (Action::Minimap, KeyCode::KeyR),
        (Action::Pause, KeyCode::Space),
    ]
}

/// Default joystick button indices
pub fn default_joy_bindings() -> Vec<(Action, u8)> {
    vec![
        (Action::Confirm, 0),
        (Action::Cancel, 1),
        (Action::Menu, 2),
        (Action::Minimap, 3),
        (Action::Pause, 4),
        (Action::Help, 5),
        (Action::Quit, 6),
    ]
}
