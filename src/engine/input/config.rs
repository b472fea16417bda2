// Binding tables, remapping and the settings document

use super::action::{is_reserved_key, Action, Axis, MAX_AXIS_MAGNITUDE};
use super::InputError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use winit::keyboard::KeyCode;

/// Settings document shipped with the crate
pub const DEFAULT_SETTINGS_TOML: &str = include_str!("../../../config/input.toml");

/// A physical code that can be stored in a [`BindingTable`]
pub trait PhysicalCode: Copy + Eq + Hash + Debug {
    /// Reserved codes belong to a fixed action and can never be rebound
    fn is_reserved(self) -> bool;

    /// Whether `action` may hold a code of this kind
    fn accepts(action: Action) -> bool;
}

impl PhysicalCode for KeyCode {
    fn is_reserved(self) -> bool {
        is_reserved_key(self)
    }

    fn accepts(action: Action) -> bool {
        action.is_key_remappable()
    }
}

/// Joystick button index
impl PhysicalCode for u8 {
    fn is_reserved(self) -> bool {
        false
    }

    fn accepts(action: Action) -> bool {
        action.is_joy_remappable()
    }
}

/// Injective mapping from logical actions to physical codes.
///
/// Every call that changes the table keeps it injective: assigning a code
/// already held by another action unbinds that action first.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingTable<C: PhysicalCode> {
    /// Code per action, `None` when unbound
    codes: [Option<C>; Action::COUNT],

    /// Reverse mapping for event resolution
    actions: HashMap<C, Action>,
}

/// Keyboard bindings
pub type KeyBindings = BindingTable<KeyCode>;

/// Joystick button bindings
pub type JoyButtonBindings = BindingTable<u8>;

impl<C: PhysicalCode> BindingTable<C> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            codes: [None; Action::COUNT],
            actions: HashMap::new(),
        }
    }

    /// Build a table from a list of bindings, refusing anything that would
    /// break injectivity instead of silently evicting
    pub fn from_bindings(bindings: Vec<(Action, C)>) -> Result<Self, InputError> {
        let mut table = Self::new();
        for (action, code) in bindings {
            if !C::accepts(action) {
                return Err(InputError::InvalidSettings(format!(
                    "{:?} cannot be bound to {:?}",
                    action, code
                )));
            }
            if code.is_reserved() {
                return Err(InputError::InvalidSettings(format!(
                    "{:?} is reserved and cannot be bound to {:?}",
                    code, action
                )));
            }
            if let Some(other) = table.action_for(code) {
                return Err(InputError::InvalidSettings(format!(
                    "{:?} is bound to both {:?} and {:?}",
                    code, other, action
                )));
            }
            table.assign(action, code);
        }
        Ok(table)
    }

    /// Bind `code` to `action`.
    ///
    /// Returns false and leaves the table untouched when the code is reserved
    /// or the action does not accept this kind of code. Any other action that
    /// held `code` becomes unbound.
    pub fn set_binding(&mut self, action: Action, code: C) -> bool {
        if !C::accepts(action) || code.is_reserved() {
            log::debug!("Rejected binding {:?} -> {:?}", action, code);
            return false;
        }

        if let Some(other) = self.action_for(code) {
            if other == action {
                return true;
            }
            log::debug!("{:?} unbound, {:?} now uses {:?}", other, action, code);
            self.unbind(other);
        }

        self.unbind(action);
        self.assign(action, code);
        true
    }

    /// Unbind an action
    pub fn unbind(&mut self, action: Action) {
        if let Some(old) = self.codes[action.index()].take() {
            self.actions.remove(&old);
        }
    }

    /// Get the code bound to an action
    pub fn get(&self, action: Action) -> Option<C> {
        self.codes[action.index()]
    }

    /// Get the action bound to a code
    pub fn action_for(&self, code: C) -> Option<Action> {
        self.actions.get(&code).copied()
    }

    /// Check if a code is bound to any action
    pub fn is_bound(&self, code: C) -> bool {
        self.actions.contains_key(&code)
    }

    /// All current bindings in action order
    pub fn bindings(&self) -> Vec<(Action, C)> {
        Action::ALL
            .iter()
            .filter_map(|&action| self.get(action).map(|code| (action, code)))
            .collect()
    }

    /// Actions whose code differs between `other` and this table
    pub fn changed_actions(&self, other: &Self) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|&action| self.get(action) != other.get(action))
            .collect()
    }

    fn assign(&mut self, action: Action, code: C) {
        self.codes[action.index()] = Some(code);
        self.actions.insert(code, action);
    }
}

impl<C: PhysicalCode> Default for BindingTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Physical axis indices and the digitizing threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBinding {
    x_axis: u8,
    y_axis: u8,
    threshold: u16,
}

impl AxisBinding {
    /// Create an axis binding, validating `threshold <= MAX_AXIS_MAGNITUDE`
    pub fn new(x_axis: u8, y_axis: u8, threshold: u16) -> Result<Self, InputError> {
        if threshold > MAX_AXIS_MAGNITUDE {
            return Err(InputError::InvalidSettings(format!(
                "Axis threshold {} exceeds {}",
                threshold, MAX_AXIS_MAGNITUDE
            )));
        }
        if x_axis == y_axis {
            return Err(InputError::InvalidSettings(format!(
                "X and Y both use axis {}",
                x_axis
            )));
        }
        Ok(Self {
            x_axis,
            y_axis,
            threshold,
        })
    }

    pub fn x_axis(&self) -> u8 {
        self.x_axis
    }

    pub fn y_axis(&self) -> u8 {
        self.y_axis
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    /// Physical index of a logical axis
    pub fn index_of(&self, axis: Axis) -> u8 {
        match axis {
            Axis::X => self.x_axis,
            Axis::Y => self.y_axis,
        }
    }

    /// Logical axis for a physical index, if it is one of the tracked two
    pub fn axis_for(&self, index: u8) -> Option<Axis> {
        if index == self.x_axis {
            Some(Axis::X)
        } else if index == self.y_axis {
            Some(Axis::Y)
        } else {
            None
        }
    }

    /// Move a logical axis to another physical index.
    /// Swaps the two when the index is already used by the other axis.
    pub fn set_index(&mut self, axis: Axis, index: u8) {
        match axis {
            Axis::X => {
                if self.y_axis == index {
                    self.y_axis = self.x_axis;
                }
                self.x_axis = index;
            }
            Axis::Y => {
                if self.x_axis == index {
                    self.x_axis = self.y_axis;
                }
                self.y_axis = index;
            }
        }
    }

    /// Change the threshold. Returns false for values above the axis range.
    pub fn set_threshold(&mut self, threshold: u16) -> bool {
        if threshold > MAX_AXIS_MAGNITUDE {
            return false;
        }
        self.threshold = threshold;
        true
    }
}

impl Default for AxisBinding {
    fn default() -> Self {
        Self {
            x_axis: 0,
            y_axis: 1,
            threshold: 16384,
        }
    }
}

/// Keyboard section of the settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySettings {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub confirm: KeyCode,
    pub cancel: KeyCode,
    pub menu: KeyCode,
    pub minimap: KeyCode,
    pub pause: KeyCode,
}

impl KeySettings {
    fn entries(&self) -> Vec<(Action, KeyCode)> {
        vec![
            (Action::Up, self.up),
            (Action::Down, self.down),
            (Action::Left, self.left),
            (Action::Right, self.right),
            (Action::Confirm, self.confirm),
            (Action::Cancel, self.cancel),
            (Action::Menu, self.menu),
            (Action::Minimap, self.minimap),
            (Action::Pause, self.pause),
        ]
    }
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            up: KeyCode::ArrowUp,
            down: KeyCode::ArrowDown,
            left: KeyCode::ArrowLeft,
            right: KeyCode::ArrowRight,
            confirm: KeyCode::KeyF,
            cancel: KeyCode::KeyD,
            menu: KeyCode::KeyS,
            minimap: KeyCode::KeyR,
            pause: KeyCode::Space,
        }
    }
}

/// Joystick section of the settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickSettings {
    pub enabled: bool,
    pub joy_index: usize,
    pub confirm: u8,
    pub cancel: u8,
    pub menu: u8,
    pub minimap: u8,
    pub pause: u8,
    pub help: u8,
    pub quit: u8,
    pub x_axis: u8,
    pub y_axis: u8,
    pub threshold: u16,
}

impl JoystickSettings {
    fn entries(&self) -> Vec<(Action, u8)> {
        vec![
            (Action::Confirm, self.confirm),
            (Action::Cancel, self.cancel),
            (Action::Menu, self.menu),
            (Action::Minimap, self.minimap),
            (Action::Pause, self.pause),
            (Action::Help, self.help),
            (Action::Quit, self.quit),
        ]
    }
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            joy_index: 0,
            confirm: 0,
            cancel: 1,
            menu: 2,
            minimap: 3,
            pause: 4,
            help: 5,
            quit: 6,
            x_axis: 0,
            y_axis: 1,
            threshold: 16384,
        }
    }
}

/// The input settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    pub keys: KeySettings,

    #[serde(default)]
    pub joystick: JoystickSettings,
}

impl InputSettings {
    /// Parse and validate a TOML settings document
    pub fn parse(text: &str) -> Result<Self, InputError> {
        let settings: InputSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, InputError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every table built from this document is consistent
    pub fn validate(&self) -> Result<(), InputError> {
        self.key_bindings()?;
        self.joy_bindings()?;
        self.axis_binding()?;
        Ok(())
    }

    pub fn key_bindings(&self) -> Result<KeyBindings, InputError> {
        BindingTable::from_bindings(self.keys.entries())
    }

    pub fn joy_bindings(&self) -> Result<JoyButtonBindings, InputError> {
        BindingTable::from_bindings(self.joystick.entries())
    }

    pub fn axis_binding(&self) -> Result<AxisBinding, InputError> {
        AxisBinding::new(
            self.joystick.x_axis,
            self.joystick.y_axis,
            self.joystick.threshold,
        )
    }
}

/// Where the settings document comes from
pub trait SettingsSource {
    /// Read the raw document
    fn read_settings(&self) -> Result<String, InputError>;

    /// Read and parse the document
    fn load(&self) -> Result<InputSettings, InputError> {
        InputSettings::parse(&self.read_settings()?)
    }
}

/// Settings stored in a file on disk
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsSource for SettingsFile {
    fn read_settings(&self) -> Result<String, InputError> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Settings held in memory
#[derive(Debug, Clone)]
pub struct InlineSettings {
    text: String,
}

impl InlineSettings {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for InlineSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_TOML)
    }
}

impl SettingsSource for InlineSettings {
    fn read_settings(&self) -> Result<String, InputError> {
        Ok(self.text.clone())
    }
}
