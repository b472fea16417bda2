// Raw input events and the sources that produce them

use super::action::HatDirection;
use super::InputError;
use gilrs::Gilrs;
use std::collections::VecDeque;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

/// A platform input event, before any binding is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    KeyDown {
        code: KeyCode,
        modifiers: ModifiersState,
        repeat: bool,
    },
    KeyUp {
        code: KeyCode,
    },
    JoyButtonDown(u8),
    JoyButtonUp(u8),
    JoyAxis {
        axis: u8,
        value: i16,
    },
    JoyHat {
        direction: HatDirection,
        pressed: bool,
    },
    /// The user tried to close the window
    CloseRequested,
}

impl RawEvent {
    /// Plain key press without modifiers, for tests and scripted feeds
    pub fn key_down(code: KeyCode) -> Self {
        Self::KeyDown {
            code,
            modifiers: ModifiersState::empty(),
            repeat: false,
        }
    }

    pub fn key_up(code: KeyCode) -> Self {
        Self::KeyUp { code }
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(self, RawEvent::KeyDown { .. } | RawEvent::KeyUp { .. })
    }

    pub fn is_joystick(&self) -> bool {
        matches!(
            self,
            RawEvent::JoyButtonDown(_)
                | RawEvent::JoyButtonUp(_)
                | RawEvent::JoyAxis { .. }
                | RawEvent::JoyHat { .. }
        )
    }
}

/// Non-blocking supplier of pending raw events
pub trait EventSource {
    /// Next pending event, or `None` once the queue is drained
    fn poll_event(&mut self) -> Option<RawEvent>;
}

/// FIFO of raw events.
///
/// Fed either directly (scripted input, tests) or from winit window events,
/// which arrive through callbacks and are held here until the next frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<RawEvent>,

    /// Modifier keys currently held, tracked from winit
    modifiers: ModifiersState,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw event
    pub fn push(&mut self, event: RawEvent) {
        self.events.push_back(event);
    }

    /// Translate and queue a winit window event. Events that are not
    /// input are ignored.
    pub fn push_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                // Keys without a layout-independent code can't be bound
                if let PhysicalKey::Code(code) = event.physical_key {
                    let raw = match event.state {
                        ElementState::Pressed => RawEvent::KeyDown {
                            code,
                            modifiers: self.modifiers,
                            repeat: event.repeat,
                        },
                        ElementState::Released => RawEvent::KeyUp { code },
                    };
                    self.push(raw);
                }
            }
            WindowEvent::CloseRequested => self.push(RawEvent::CloseRequested),
            _ => {}
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for EventQueue {
    fn poll_event(&mut self) -> Option<RawEvent> {
        self.events.pop_front()
    }
}

/// Fixed button numbering used in the settings document
fn button_index(button: gilrs::Button) -> Option<u8> {
    use gilrs::Button::*;
    let index = match button {
        South => 0,
        East => 1,
        North => 2,
        West => 3,
        LeftTrigger => 4,
        RightTrigger => 5,
        LeftTrigger2 => 6,
        RightTrigger2 => 7,
        Select => 8,
        Start => 9,
        Mode => 10,
        LeftThumb => 11,
        RightThumb => 12,
        C => 13,
        Z => 14,
        _ => return None,
    };
    Some(index)
}

fn hat_direction(button: gilrs::Button) -> Option<HatDirection> {
    match button {
        gilrs::Button::DPadUp => Some(HatDirection::Up),
        gilrs::Button::DPadDown => Some(HatDirection::Down),
        gilrs::Button::DPadLeft => Some(HatDirection::Left),
        gilrs::Button::DPadRight => Some(HatDirection::Right),
        _ => None,
    }
}

/// Axis index and whether its sign must be flipped so that negative is up
fn axis_index(axis: gilrs::Axis) -> Option<(u8, bool)> {
    use gilrs::Axis::*;
    let mapped = match axis {
        LeftStickX => (0, false),
        LeftStickY => (1, true),
        LeftZ => (2, false),
        RightStickX => (3, false),
        RightStickY => (4, true),
        RightZ => (5, false),
        DPadX => (6, false),
        DPadY => (7, true),
        _ => return None,
    };
    Some(mapped)
}

/// Scale a normalized axis value to the signed 16-bit range
pub fn scale_axis(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16
}

fn translate(event: gilrs::EventType) -> Option<RawEvent> {
    match event {
        gilrs::EventType::ButtonPressed(button, _) => match hat_direction(button) {
            Some(direction) => Some(RawEvent::JoyHat {
                direction,
                pressed: true,
            }),
            None => button_index(button).map(RawEvent::JoyButtonDown),
        },
        gilrs::EventType::ButtonReleased(button, _) => match hat_direction(button) {
            Some(direction) => Some(RawEvent::JoyHat {
                direction,
                pressed: false,
            }),
            None => button_index(button).map(RawEvent::JoyButtonUp),
        },
        gilrs::EventType::AxisChanged(axis, value, _) => {
            axis_index(axis).map(|(axis, flip)| RawEvent::JoyAxis {
                axis,
                value: scale_axis(if flip { -value } else { value }),
            })
        }
        _ => None,
    }
}

/// Joystick backend. Owning one means the device layer is initialized.
pub struct GamepadSource {
    gilrs: Gilrs,

    /// Only events from this gamepad are reported
    joy_index: usize,
}

impl GamepadSource {
    /// Acquire the gamepad subsystem
    pub fn new(joy_index: usize) -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Joystick(e.to_string()))?;
        for (id, gamepad) in gilrs.gamepads() {
            log::info!("Gamepad {} found: {}", id, gamepad.name());
        }
        Ok(Self { gilrs, joy_index })
    }

    pub fn joy_index(&self) -> usize {
        self.joy_index
    }

    pub fn set_joy_index(&mut self, joy_index: usize) {
        self.joy_index = joy_index;
    }
}

impl EventSource for GamepadSource {
    fn poll_event(&mut self) -> Option<RawEvent> {
        while let Some(event) = self.gilrs.next_event() {
            if usize::from(event.id) != self.joy_index {
                continue;
            }
            match event.event {
                gilrs::EventType::Connected => {
                    log::info!("Gamepad {} connected", event.id);
                }
                gilrs::EventType::Disconnected => {
                    log::info!("Gamepad {} disconnected", event.id);
                }
                other => {
                    if let Some(raw) = translate(other) {
                        return Some(raw);
                    }
                }
            }
        }
        None
    }
}
