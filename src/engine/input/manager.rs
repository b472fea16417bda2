// Input engine - once-per-frame coordination of all input

use super::action::{reserved_key_action, Action, Axis, HELP_KEY, QUIT_KEY};
use super::axis::{AxisDigitizer, AxisTransition};
use super::config::{AxisBinding, InputSettings, JoyButtonBindings, KeyBindings, SettingsSource};
use super::meta::{self, MetaCommand, MetaCommandDispatcher};
use super::source::{EventSource, GamepadSource, RawEvent};
use super::state::{Diagnostics, InputSnapshot, InputStateMachine};
use super::InputError;
use std::collections::HashSet;
use winit::keyboard::{KeyCode, ModifiersState};

/// Owns bindings, device state and the per-frame snapshot.
///
/// Created by the game loop and passed by reference to whatever needs input.
/// All mutation happens through `&mut self` on the owning thread; copy the
/// snapshot to share it elsewhere.
pub struct InputEngine {
    /// Keyboard bindings for the remappable actions
    keys: KeyBindings,

    /// Joystick button bindings
    joy_buttons: JoyButtonBindings,

    /// Joystick axes used for directions
    axes: AxisBinding,

    /// Gamepad whose events are accepted
    joy_index: usize,

    /// Game option; false when the user disabled joysticks or the device
    /// layer failed to start
    joysticks_enabled: bool,

    /// Present between a successful initialize and the next deinitialize
    joystick: Option<GamepadSource>,

    state: InputStateMachine,
    digitizer: AxisDigitizer,

    /// Actions held through joystick buttons or the hat
    joystick_held: HashSet<Action>,

    meta: MetaCommandDispatcher,

    /// Document used to restore default bindings
    settings: Box<dyn SettingsSource>,

    /// Most recent keyboard event, for remap screens
    last_key_event: Option<RawEvent>,

    /// Most recent joystick event, for remap screens
    last_joystick_event: Option<RawEvent>,
}

impl InputEngine {
    /// Create an engine configured from `source`.
    /// The same source is re-read by the restore-defaults calls.
    pub fn from_source<S: SettingsSource + 'static>(source: S) -> Result<Self, InputError> {
        let settings = source.load()?;
        Self::with_settings(&settings, Box::new(source))
    }

    /// Create an engine from already parsed settings
    pub fn with_settings(
        settings: &InputSettings,
        source: Box<dyn SettingsSource>,
    ) -> Result<Self, InputError> {
        Ok(Self {
            keys: settings.key_bindings()?,
            joy_buttons: settings.joy_bindings()?,
            axes: settings.axis_binding()?,
            joy_index: settings.joystick.joy_index,
            joysticks_enabled: settings.joystick.enabled,
            joystick: None,
            state: InputStateMachine::new(),
            digitizer: AxisDigitizer::new(),
            joystick_held: HashSet::new(),
            meta: MetaCommandDispatcher::new(),
            settings: source,
            last_key_event: None,
            last_joystick_event: None,
        })
    }

    /// Process every pending event. Call exactly once per game-loop iteration.
    ///
    /// Edges from the previous call are cleared first, then the window source
    /// and the joystick are drained in arrival order. Returns the meta command
    /// recognized this cycle, if any.
    pub fn handle_events(&mut self, source: &mut dyn EventSource) -> Option<MetaCommand> {
        self.state.begin_cycle();
        self.meta.begin_cycle();

        while let Some(event) = source.poll_event() {
            self.dispatch(event);
        }

        if let Some(mut joystick) = self.joystick.take() {
            while let Some(event) = joystick.poll_event() {
                self.dispatch(event);
            }
            self.joystick = Some(joystick);
        }

        self.meta.pending()
    }

    fn dispatch(&mut self, event: RawEvent) {
        if event.is_joystick() && !self.joysticks_enabled {
            return;
        }

        match event {
            RawEvent::CloseRequested => self.meta.emit(MetaCommand::Quit),
            RawEvent::KeyDown {
                code,
                modifiers,
                repeat,
            } => {
                self.last_key_event = Some(event);
                if repeat {
                    self.repeat(code, modifiers);
                    return;
                }
                if self.meta.intercept(code, modifiers) {
                    return;
                }
                self.state.diagnostics_mut().any_keyboard_key_press = true;
                if let Some(action) = self.key_action(code) {
                    self.press(action);
                }
            }
            RawEvent::KeyUp { code } => {
                self.last_key_event = Some(event);
                if let Some(action) = self.key_action(code) {
                    self.release(action);
                }
            }
            RawEvent::JoyButtonDown(button) => {
                self.last_joystick_event = Some(event);
                self.state.diagnostics_mut().any_joystick_key_press = true;
                if let Some(action) = self.joy_buttons.action_for(button) {
                    self.joystick_held.insert(action);
                    self.press(action);
                }
            }
            RawEvent::JoyButtonUp(button) => {
                self.last_joystick_event = Some(event);
                if let Some(action) = self.joy_buttons.action_for(button) {
                    self.joystick_held.remove(&action);
                    self.release(action);
                }
            }
            RawEvent::JoyHat { direction, pressed } => {
                self.last_joystick_event = Some(event);
                let action = direction.action();
                if pressed {
                    self.joystick_held.insert(action);
                    self.press(action);
                } else {
                    self.joystick_held.remove(&action);
                    self.release(action);
                }
            }
            RawEvent::JoyAxis { axis, value } => {
                let before = self.digitizer.position(axis);
                let transition = self.digitizer.update(axis, value, &self.axes);
                if self.digitizer.position(axis) != before {
                    self.last_joystick_event = Some(event);
                }
                self.apply_axis(transition);
            }
        }
    }

    fn key_action(&self, code: KeyCode) -> Option<Action> {
        reserved_key_action(code).or_else(|| self.keys.action_for(code))
    }

    /// A held key only presses again if its action was released meanwhile
    fn repeat(&mut self, code: KeyCode, modifiers: ModifiersState) {
        if meta::recognize(code, modifiers).is_some() {
            return;
        }
        if let Some(action) = self.key_action(code) {
            if self.state.press(action) {
                self.state.diagnostics_mut().registered_key_press = true;
            }
        }
    }

    fn press(&mut self, action: Action) {
        self.state.diagnostics_mut().registered_key_press = true;
        self.state.press(action);
    }

    fn release(&mut self, action: Action) {
        if self.state.release(action) {
            self.state.diagnostics_mut().registered_key_release = true;
        }
    }

    fn apply_axis(&mut self, transition: AxisTransition) {
        if let Some(action) = transition.release {
            self.state.release(action);
        }
        if let Some(action) = transition.press {
            self.state.press(action);
        }
    }

    /// Snapshot of the current cycle
    pub fn snapshot(&self) -> &InputSnapshot {
        self.state.snapshot()
    }

    /// Check if an action is held
    pub fn state(&self, action: Action) -> bool {
        self.snapshot().state(action)
    }

    /// Check if an action was just pressed this cycle
    pub fn pressed(&self, action: Action) -> bool {
        self.snapshot().press(action)
    }

    /// Check if an action was just released this cycle
    pub fn released(&self, action: Action) -> bool {
        self.snapshot().release(action)
    }

    /// Check if any direction was just pressed this cycle
    pub fn arrow_press(&self) -> bool {
        self.snapshot().arrow_press()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.state.diagnostics()
    }

    /// A bound key or button went down this cycle
    pub fn any_registered_key_press(&self) -> bool {
        self.diagnostics().registered_key_press
    }

    /// A bound key or button went up this cycle
    pub fn any_registered_key_release(&self) -> bool {
        self.diagnostics().registered_key_release
    }

    /// Any keyboard key went down this cycle
    pub fn any_keyboard_key_press(&self) -> bool {
        self.diagnostics().any_keyboard_key_press
    }

    /// Any joystick button went down this cycle
    pub fn any_joystick_key_press(&self) -> bool {
        self.diagnostics().any_joystick_key_press
    }

    /// Physical axis that last changed position, kept until
    /// [`reset_last_axis_moved`](Self::reset_last_axis_moved)
    pub fn last_axis_moved(&self) -> Option<u8> {
        if self.joysticks_enabled {
            self.digitizer.last_axis_moved()
        } else {
            None
        }
    }

    pub fn reset_last_axis_moved(&mut self) {
        self.digitizer.reset_last_axis_moved();
    }

    pub fn last_key_event(&self) -> Option<RawEvent> {
        self.last_key_event
    }

    pub fn last_joystick_event(&self) -> Option<RawEvent> {
        self.last_joystick_event
    }

    /// Release every action and forget axis positions
    pub fn reset(&mut self) {
        self.state.reset();
        self.digitizer.clear();
        self.joystick_held.clear();
    }

    /// Key bound to an action, including the fixed Quit and Help keys
    pub fn key(&self, action: Action) -> Option<KeyCode> {
        match action {
            Action::Quit => Some(QUIT_KEY),
            Action::Help => Some(HELP_KEY),
            _ => self.keys.get(action),
        }
    }

    /// Display name of the key bound to an action
    pub fn key_name(&self, action: Action) -> Option<String> {
        self.key(action).map(|code| format!("{:?}", code))
    }

    pub fn key_bindings(&self) -> &KeyBindings {
        &self.keys
    }

    /// Bind a key to an action.
    ///
    /// Reserved keys and the fixed actions are silently refused; re-query
    /// with [`key`](Self::key) to confirm. An action that loses its key, or
    /// is held on its old key, is released.
    pub fn set_key(&mut self, action: Action, code: KeyCode) {
        let previous = self.keys.action_for(code);
        if previous == Some(action) {
            return;
        }
        if self.keys.set_binding(action, code) {
            for affected in [Some(action), previous].into_iter().flatten() {
                self.state.release(affected);
            }
        }
    }

    pub fn joy_button(&self, action: Action) -> Option<u8> {
        self.joy_buttons.get(action)
    }

    pub fn joy_button_bindings(&self) -> &JoyButtonBindings {
        &self.joy_buttons
    }

    /// Bind a joystick button to an action, evicting any previous holder
    pub fn set_joy_button(&mut self, action: Action, button: u8) {
        let previous = self.joy_buttons.action_for(button);
        if previous == Some(action) {
            return;
        }
        if self.joy_buttons.set_binding(action, button) {
            for affected in [Some(action), previous].into_iter().flatten() {
                self.joystick_held.remove(&affected);
                self.state.release(affected);
            }
        }
    }

    pub fn axis_binding(&self) -> &AxisBinding {
        &self.axes
    }

    pub fn x_axis(&self) -> u8 {
        self.axes.x_axis()
    }

    pub fn y_axis(&self) -> u8 {
        self.axes.y_axis()
    }

    pub fn threshold(&self) -> u16 {
        self.axes.threshold()
    }

    /// Use another physical axis for a logical axis.
    /// Directions held through the old axes are released.
    pub fn set_axis(&mut self, axis: Axis, index: u8) {
        self.release_axes();
        self.axes.set_index(axis, index);
    }

    /// Change the axis threshold; values above the axis range are refused
    pub fn set_threshold(&mut self, threshold: u16) {
        if !self.axes.set_threshold(threshold) {
            log::warn!("Ignoring out of range axis threshold {}", threshold);
        }
    }

    fn release_axes(&mut self) {
        for axis in [Axis::X, Axis::Y] {
            let transition = self.digitizer.reset_axis(self.axes.index_of(axis), axis);
            self.apply_axis(transition);
        }
    }

    pub fn joy_index(&self) -> usize {
        self.joy_index
    }

    /// Select which gamepad is listened to
    pub fn set_joy_index(&mut self, joy_index: usize) {
        self.joy_index = joy_index;
        if let Some(joystick) = self.joystick.as_mut() {
            joystick.set_joy_index(joy_index);
        }
    }

    pub fn joysticks_enabled(&self) -> bool {
        self.joysticks_enabled
    }

    /// Enable or disable joystick input. Disabling also releases the device.
    pub fn set_joysticks_enabled(&mut self, enabled: bool) {
        self.joysticks_enabled = enabled;
        if !enabled {
            self.deinitialize_joysticks();
        }
    }

    /// Whether the joystick device layer is currently acquired
    pub fn joystick_active(&self) -> bool {
        self.joystick.is_some()
    }

    /// Acquire the joystick device layer.
    ///
    /// Does nothing when joysticks are disabled. On failure joysticks are
    /// disabled and every joystick query stays inert.
    pub fn initialize_joysticks(&mut self) {
        self.initialize_joysticks_with(GamepadSource::new);
    }

    /// Acquire the joystick device layer through `open`, which receives the
    /// gamepad index to listen to
    pub fn initialize_joysticks_with<F>(&mut self, open: F)
    where
        F: FnOnce(usize) -> Result<GamepadSource, InputError>,
    {
        if !self.joysticks_enabled || self.joystick.is_some() {
            return;
        }

        match open(self.joy_index) {
            Ok(joystick) => {
                log::info!("Joysticks initialized (listening to #{})", self.joy_index);
                self.joystick = Some(joystick);
            }
            Err(e) => {
                log::warn!("{}. Joystick input disabled.", e);
                self.joysticks_enabled = false;
            }
        }
    }

    /// Release the joystick device layer, if acquired.
    /// Every action held through the joystick is released.
    pub fn deinitialize_joysticks(&mut self) {
        if self.joystick.take().is_some() {
            log::info!("Joysticks deinitialized");
        }
        for action in self.joystick_held.drain() {
            self.state.release(action);
        }
        self.release_axes();
        self.digitizer.clear();
    }

    /// Reload keyboard bindings from the settings source.
    /// On failure the current bindings are kept untouched.
    pub fn restore_default_keys(&mut self) -> Result<(), InputError> {
        let settings = self.settings.load();
        self.apply_default_keys(settings)
    }

    /// Reload keyboard bindings from another source
    pub fn restore_default_keys_from(
        &mut self,
        source: &dyn SettingsSource,
    ) -> Result<(), InputError> {
        self.apply_default_keys(source.load())
    }

    fn apply_default_keys(
        &mut self,
        settings: Result<InputSettings, InputError>,
    ) -> Result<(), InputError> {
        let keys = settings
            .and_then(|s| s.key_bindings())
            .map_err(|e| {
                log::warn!("Could not restore default keys: {}", e);
                e
            })?;
        let previous = std::mem::replace(&mut self.keys, keys);
        for action in self.keys.changed_actions(&previous) {
            self.state.release(action);
        }
        log::info!("Default keys restored");
        Ok(())
    }

    /// Reload joystick button bindings from the settings source.
    /// On failure the current bindings are kept untouched.
    pub fn restore_default_joy_buttons(&mut self) -> Result<(), InputError> {
        let settings = self.settings.load();
        self.apply_default_joy_buttons(settings)
    }

    /// Reload joystick button bindings from another source
    pub fn restore_default_joy_buttons_from(
        &mut self,
        source: &dyn SettingsSource,
    ) -> Result<(), InputError> {
        self.apply_default_joy_buttons(source.load())
    }

    fn apply_default_joy_buttons(
        &mut self,
        settings: Result<InputSettings, InputError>,
    ) -> Result<(), InputError> {
        let buttons = settings
            .and_then(|s| s.joy_bindings())
            .map_err(|e| {
                log::warn!("Could not restore default joystick buttons: {}", e);
                e
            })?;
        let previous = std::mem::replace(&mut self.joy_buttons, buttons);
        for action in self.joy_buttons.changed_actions(&previous) {
            self.joystick_held.remove(&action);
            self.state.release(action);
        }
        log::info!("Default joystick buttons restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::action::TriState;
    use crate::engine::input::config::InlineSettings;
    use crate::engine::input::source::EventQueue;
    use crate::engine::input::HatDirection;
    use winit::keyboard::ModifiersState;

    fn engine() -> InputEngine {
        InputEngine::from_source(InlineSettings::default()).unwrap()
    }

    /// Run one frame over the given events
    fn frame(engine: &mut InputEngine, events: &[RawEvent]) -> Option<MetaCommand> {
        let mut queue = EventQueue::new();
        for event in events {
            queue.push(*event);
        }
        engine.handle_events(&mut queue)
    }

    fn ctrl(code: KeyCode) -> RawEvent {
        RawEvent::KeyDown {
            code,
            modifiers: ModifiersState::CONTROL,
            repeat: false,
        }
    }

    fn repeat(code: KeyCode) -> RawEvent {
        RawEvent::KeyDown {
            code,
            modifiers: ModifiersState::empty(),
            repeat: true,
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.key(Action::Up), Some(KeyCode::ArrowUp));
        assert_eq!(engine.key(Action::Quit), Some(KeyCode::Escape));
        assert_eq!(engine.joy_button(Action::Confirm), Some(0));
        assert_eq!(engine.threshold(), 16384);
        assert!(engine.joysticks_enabled());
        assert!(!engine.joystick_active());
    }

    #[test]
    fn test_invalid_source_fails_creation() {
        assert!(InputEngine::from_source(InlineSettings::new("not = [toml")).is_err());
    }

    #[test]
    fn test_key_press_and_release() {
        let mut engine = engine();

        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyF)]);
        assert!(engine.pressed(Action::Confirm));
        assert!(engine.state(Action::Confirm));
        assert!(engine.any_registered_key_press());

        frame(&mut engine, &[RawEvent::key_up(KeyCode::KeyF)]);
        assert!(!engine.pressed(Action::Confirm));
        assert!(engine.released(Action::Confirm));
        assert!(!engine.state(Action::Confirm));
        assert!(engine.any_registered_key_release());
    }

    #[test]
    fn test_hold_across_frames_presses_once() {
        let mut engine = engine();

        frame(&mut engine, &[RawEvent::key_down(KeyCode::ArrowUp)]);
        assert!(engine.pressed(Action::Up));

        for _ in 0..4 {
            frame(&mut engine, &[repeat(KeyCode::ArrowUp)]);
            assert!(engine.state(Action::Up));
            assert!(!engine.pressed(Action::Up));
            assert!(!engine.released(Action::Up));
        }
    }

    #[test]
    fn test_repeat_presses_released_action() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::ArrowUp)]);
        engine.reset();
        assert!(!engine.state(Action::Up));

        frame(&mut engine, &[repeat(KeyCode::ArrowUp)]);
        assert!(engine.pressed(Action::Up));
        assert!(engine.state(Action::Up));
        assert!(engine.any_registered_key_press());
        assert!(!engine.any_keyboard_key_press());
    }

    #[test]
    fn test_repeated_meta_combination_stays_consumed() {
        let mut engine = engine();
        let held = RawEvent::KeyDown {
            code: KeyCode::KeyS,
            modifiers: ModifiersState::CONTROL,
            repeat: true,
        };
        assert_eq!(
            frame(&mut engine, &[ctrl(KeyCode::KeyS)]),
            Some(MetaCommand::Screenshot)
        );
        assert_eq!(frame(&mut engine, &[held, held]), None);
        assert!(!engine.state(Action::Menu));
    }

    #[test]
    fn test_duplicate_key_down_does_not_refire() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyD)]);
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyD)]);
        assert!(engine.state(Action::Cancel));
        assert!(!engine.pressed(Action::Cancel));
    }

    #[test]
    fn test_tap_within_one_frame() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[
                RawEvent::key_down(KeyCode::Space),
                RawEvent::key_up(KeyCode::Space),
            ],
        );
        assert!(engine.pressed(Action::Pause));
        assert!(engine.released(Action::Pause));
        assert!(!engine.state(Action::Pause));
    }

    #[test]
    fn test_edges_cleared_without_events() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyS)]);
        frame(&mut engine, &[]);
        assert!(engine.state(Action::Menu));
        assert!(!engine.pressed(Action::Menu));
        assert!(!engine.any_registered_key_press());
    }

    #[test]
    fn test_reserved_keys_drive_fixed_actions() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[
                RawEvent::key_down(KeyCode::Escape),
                RawEvent::key_down(KeyCode::F1),
                RawEvent::key_down(KeyCode::NumpadEnter),
            ],
        );
        assert!(engine.pressed(Action::Quit));
        assert!(engine.pressed(Action::Help));
        assert!(engine.pressed(Action::Confirm));
    }

    #[test]
    fn test_unbound_key_only_updates_diagnostics() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyZ)]);
        assert!(engine.any_keyboard_key_press());
        assert!(!engine.any_registered_key_press());
        assert_eq!(*engine.snapshot(), InputSnapshot::default());
        assert_eq!(
            engine.last_key_event(),
            Some(RawEvent::key_down(KeyCode::KeyZ))
        );
    }

    #[test]
    fn test_meta_combination_bypasses_state() {
        let mut engine = engine();
        // S is bound to Menu, Ctrl+S is the screenshot combination
        let command = frame(&mut engine, &[ctrl(KeyCode::KeyS)]);
        assert_eq!(command, Some(MetaCommand::Screenshot));
        assert!(!engine.state(Action::Menu));
        assert!(!engine.pressed(Action::Menu));
        assert!(!engine.any_keyboard_key_press());
    }

    #[test]
    fn test_only_first_meta_command_per_frame() {
        let mut engine = engine();
        let command = frame(
            &mut engine,
            &[ctrl(KeyCode::KeyF), ctrl(KeyCode::KeyQ), RawEvent::CloseRequested],
        );
        assert_eq!(command, Some(MetaCommand::ToggleFullscreen));

        assert_eq!(frame(&mut engine, &[]), None);
    }

    #[test]
    fn test_close_requested_is_quit() {
        let mut engine = engine();
        assert_eq!(
            frame(&mut engine, &[RawEvent::CloseRequested]),
            Some(MetaCommand::Quit)
        );
        assert_eq!(
            frame(&mut engine, &[ctrl(KeyCode::KeyQ)]),
            Some(MetaCommand::Quit)
        );
    }

    #[test]
    fn test_joystick_buttons() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::JoyButtonDown(1)]);
        assert!(engine.pressed(Action::Cancel));
        assert!(engine.any_joystick_key_press());
        assert!(!engine.any_keyboard_key_press());

        frame(&mut engine, &[RawEvent::JoyButtonUp(1)]);
        assert!(engine.released(Action::Cancel));
        assert_eq!(engine.last_joystick_event(), Some(RawEvent::JoyButtonUp(1)));
    }

    #[test]
    fn test_joystick_hat() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[RawEvent::JoyHat {
                direction: HatDirection::Left,
                pressed: true,
            }],
        );
        assert!(engine.pressed(Action::Left));
        assert!(engine.arrow_press());
    }

    #[test]
    fn test_disabled_joystick_is_inert() {
        let mut engine = engine();
        engine.set_joysticks_enabled(false);

        frame(
            &mut engine,
            &[
                RawEvent::JoyButtonDown(0),
                RawEvent::JoyAxis {
                    axis: 0,
                    value: 30000,
                },
            ],
        );
        assert_eq!(*engine.snapshot(), InputSnapshot::default());
        assert!(!engine.any_joystick_key_press());
        assert_eq!(engine.last_axis_moved(), None);
        assert_eq!(engine.last_joystick_event(), None);
    }

    #[test]
    fn test_disabling_joysticks_releases_held_buttons() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[
                RawEvent::JoyButtonDown(0),
                RawEvent::JoyHat {
                    direction: HatDirection::Left,
                    pressed: true,
                },
            ],
        );
        assert!(engine.state(Action::Confirm));
        assert!(engine.state(Action::Left));

        engine.set_joysticks_enabled(false);
        assert!(!engine.state(Action::Confirm));
        assert!(!engine.state(Action::Left));

        // The matching releases arrive after the device is gone
        frame(
            &mut engine,
            &[
                RawEvent::JoyButtonUp(0),
                RawEvent::JoyHat {
                    direction: HatDirection::Left,
                    pressed: false,
                },
            ],
        );
        frame(&mut engine, &[]);
        assert_eq!(*engine.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn test_released_joystick_buttons_not_released_again() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[RawEvent::JoyButtonDown(1), RawEvent::JoyButtonUp(1)],
        );
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyD)]);

        // Cancel is now held on the keyboard only
        engine.deinitialize_joysticks();
        assert!(engine.state(Action::Cancel));
    }

    #[test]
    fn test_joystick_init_failure_disables_joysticks() {
        let mut engine = engine();
        let mut opened = None;
        engine.initialize_joysticks_with(|joy_index| {
            opened = Some(joy_index);
            Err(InputError::Joystick("no device layer".to_string()))
        });
        assert_eq!(opened, Some(0));
        assert!(!engine.joysticks_enabled());
        assert!(!engine.joystick_active());

        frame(&mut engine, &[RawEvent::JoyButtonDown(0)]);
        assert!(!engine.state(Action::Confirm));
        assert!(!engine.any_joystick_key_press());
    }

    #[test]
    fn test_disabled_joysticks_never_open_device() {
        let mut engine = engine();
        engine.set_joysticks_enabled(false);
        let mut called = false;
        engine.initialize_joysticks_with(|_| {
            called = true;
            Err(InputError::Joystick("unreachable".to_string()))
        });
        assert!(!called);
        assert!(!engine.joystick_active());
    }

    #[test]
    fn test_axis_sequence() {
        let mut engine = engine();
        engine.set_threshold(16000);
        let sample = |value| RawEvent::JoyAxis { axis: 0, value };

        frame(&mut engine, &[sample(0)]);
        assert_eq!(engine.digitizer.position(0), TriState::Neutral);
        assert_eq!(engine.snapshot().get(Action::Right), Default::default());

        frame(&mut engine, &[sample(20000)]);
        assert_eq!(engine.digitizer.position(0), TriState::Positive);
        assert!(engine.pressed(Action::Right));
        assert!(engine.state(Action::Right));

        frame(&mut engine, &[sample(20000)]);
        assert_eq!(engine.digitizer.position(0), TriState::Positive);
        assert!(!engine.pressed(Action::Right));
        assert!(engine.state(Action::Right));

        frame(&mut engine, &[sample(0)]);
        assert_eq!(engine.digitizer.position(0), TriState::Neutral);
        assert!(engine.released(Action::Right));
        assert!(!engine.state(Action::Right));
    }

    #[test]
    fn test_axis_swing_surfaces_both_edges() {
        let mut engine = engine();
        let sample = |value| RawEvent::JoyAxis { axis: 1, value };

        frame(&mut engine, &[sample(30000)]);
        assert!(engine.state(Action::Down));

        frame(&mut engine, &[sample(-30000)]);
        assert!(engine.released(Action::Down));
        assert!(!engine.state(Action::Down));
        assert!(engine.pressed(Action::Up));
        assert!(engine.state(Action::Up));
    }

    #[test]
    fn test_last_axis_moved_latch() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::JoyAxis { axis: 3, value: -30000 }]);
        frame(&mut engine, &[]);
        frame(&mut engine, &[]);
        assert_eq!(engine.last_axis_moved(), Some(3));

        engine.reset_last_axis_moved();
        assert_eq!(engine.last_axis_moved(), None);
    }

    #[test]
    fn test_set_axis_releases_held_direction() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::JoyAxis { axis: 0, value: 30000 }]);
        assert!(engine.state(Action::Right));

        engine.set_axis(Axis::X, 2);
        assert!(!engine.state(Action::Right));
        assert_eq!(engine.x_axis(), 2);

        frame(&mut engine, &[RawEvent::JoyAxis { axis: 2, value: -30000 }]);
        assert!(engine.pressed(Action::Left));
    }

    #[test]
    fn test_set_threshold_rejects_out_of_range() {
        let mut engine = engine();
        engine.set_threshold(40000);
        assert_eq!(engine.threshold(), 16384);
        engine.set_threshold(1000);
        assert_eq!(engine.threshold(), 1000);
    }

    #[test]
    fn test_remap_evicts() {
        let mut engine = engine();
        let k = engine.key(Action::Cancel).unwrap();

        engine.set_key(Action::Confirm, k);
        assert_eq!(engine.key(Action::Cancel), None);
        assert_eq!(engine.key(Action::Confirm), Some(k));

        frame(&mut engine, &[RawEvent::key_down(k)]);
        assert!(engine.pressed(Action::Confirm));
        assert!(!engine.pressed(Action::Cancel));
    }

    #[test]
    fn test_set_confirm_key_to_quit_key_rejected() {
        let mut engine = engine();
        let before = engine.key(Action::Confirm);
        engine.set_key(Action::Confirm, KeyCode::Escape);
        assert_eq!(engine.key(Action::Confirm), before);
    }

    #[test]
    fn test_remap_releases_held_action() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::ArrowUp)]);
        engine.set_key(Action::Up, KeyCode::KeyW);
        assert!(!engine.state(Action::Up));

        // The old key no longer maps to anything
        frame(&mut engine, &[RawEvent::key_up(KeyCode::ArrowUp)]);
        assert!(!engine.released(Action::Up));
    }

    #[test]
    fn test_rebinding_same_key_keeps_action_held() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::ArrowUp)]);
        engine.set_key(Action::Up, KeyCode::ArrowUp);
        assert!(engine.state(Action::Up));

        frame(&mut engine, &[repeat(KeyCode::ArrowUp)]);
        assert!(engine.state(Action::Up));
        assert!(!engine.pressed(Action::Up));

        frame(&mut engine, &[RawEvent::key_up(KeyCode::ArrowUp)]);
        assert!(engine.released(Action::Up));
    }

    #[test]
    fn test_rebinding_same_joy_button_keeps_action_held() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::JoyButtonDown(2)]);
        engine.set_joy_button(Action::Menu, 2);
        assert!(engine.state(Action::Menu));

        frame(&mut engine, &[RawEvent::JoyButtonUp(2)]);
        assert!(engine.released(Action::Menu));
    }

    #[test]
    fn test_set_joy_button_evicts() {
        let mut engine = engine();
        engine.set_joy_button(Action::Quit, 0);
        assert_eq!(engine.joy_button(Action::Quit), Some(0));
        assert_eq!(engine.joy_button(Action::Confirm), None);
        // Keyboard table untouched
        assert_eq!(engine.key(Action::Confirm), Some(KeyCode::KeyF));
    }

    #[test]
    fn test_restore_default_keys() {
        let mut engine = engine();
        engine.set_key(Action::Up, KeyCode::KeyW);
        engine.set_key(Action::Down, KeyCode::KeyF);

        assert!(engine.restore_default_keys().is_ok());
        assert_eq!(engine.key(Action::Up), Some(KeyCode::ArrowUp));
        assert_eq!(engine.key(Action::Confirm), Some(KeyCode::KeyF));
    }

    #[test]
    fn test_restore_default_keys_releases_rebound_action() {
        let mut engine = engine();
        engine.set_key(Action::Up, KeyCode::KeyW);
        frame(
            &mut engine,
            &[RawEvent::key_down(KeyCode::KeyW), RawEvent::key_down(KeyCode::KeyF)],
        );

        assert!(engine.restore_default_keys().is_ok());
        assert!(!engine.state(Action::Up));
        // Confirm keeps its key and stays held
        assert!(engine.state(Action::Confirm));

        frame(&mut engine, &[RawEvent::key_up(KeyCode::KeyW)]);
        for _ in 0..3 {
            frame(&mut engine, &[]);
        }
        assert!(!engine.state(Action::Up));
        assert!(engine.state(Action::Confirm));
    }

    #[test]
    fn test_restore_default_joy_buttons_releases_rebound_action() {
        let mut engine = engine();
        engine.set_joy_button(Action::Pause, 9);
        frame(&mut engine, &[RawEvent::JoyButtonDown(9)]);
        assert!(engine.state(Action::Pause));

        assert!(engine.restore_default_joy_buttons().is_ok());
        assert!(!engine.state(Action::Pause));

        frame(&mut engine, &[RawEvent::JoyButtonUp(9)]);
        frame(&mut engine, &[]);
        assert!(!engine.state(Action::Pause));
    }

    #[test]
    fn test_restore_default_keys_from_corrupt_source_keeps_bindings() {
        let mut engine = engine();
        engine.set_key(Action::Up, KeyCode::KeyW);
        let before = engine.key_bindings().clone();

        let corrupt = InlineSettings::new("[keys]\nup = 42\n");
        assert!(engine.restore_default_keys_from(&corrupt).is_err());
        assert_eq!(*engine.key_bindings(), before);

        let invalid = InlineSettings::new(
            crate::engine::input::config::DEFAULT_SETTINGS_TOML
                .replace("cancel = \"KeyD\"", "cancel = \"KeyF\""),
        );
        assert!(engine.restore_default_keys_from(&invalid).is_err());
        assert_eq!(*engine.key_bindings(), before);
    }

    #[test]
    fn test_restore_default_joy_buttons() {
        let mut engine = engine();
        engine.set_joy_button(Action::Menu, 9);
        let before = engine.joy_button_bindings().clone();

        assert!(engine
            .restore_default_joy_buttons_from(&InlineSettings::new("garbage"))
            .is_err());
        assert_eq!(*engine.joy_button_bindings(), before);

        assert!(engine.restore_default_joy_buttons().is_ok());
        assert_eq!(engine.joy_button(Action::Menu), Some(2));
    }

    #[test]
    fn test_key_name() {
        let engine = engine();
        assert_eq!(engine.key_name(Action::Up).as_deref(), Some("ArrowUp"));
        assert_eq!(engine.key_name(Action::Help).as_deref(), Some("F1"));
    }

    #[test]
    fn test_reset() {
        let mut engine = engine();
        frame(
            &mut engine,
            &[
                RawEvent::key_down(KeyCode::ArrowLeft),
                RawEvent::JoyAxis { axis: 1, value: 30000 },
            ],
        );
        engine.reset();
        assert_eq!(*engine.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn test_snapshot_is_a_detached_copy() {
        let mut engine = engine();
        frame(&mut engine, &[RawEvent::key_down(KeyCode::KeyR)]);
        let published = *engine.snapshot();

        frame(&mut engine, &[RawEvent::key_up(KeyCode::KeyR)]);
        assert!(published.press(Action::Minimap));
        assert!(!engine.state(Action::Minimap));
    }
}
