// Reserved modifier combinations (Ctrl+F, Ctrl+Q, Ctrl+S)

use winit::keyboard::{KeyCode, ModifiersState};

/// One-shot command for the application, outside the action state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaCommand {
    ToggleFullscreen,
    Screenshot,
    Quit,
}

/// Recognize a reserved combination from a key going down
pub fn recognize(code: KeyCode, modifiers: ModifiersState) -> Option<MetaCommand> {
    if !modifiers.control_key() {
        return None;
    }
    match code {
        KeyCode::KeyF => Some(MetaCommand::ToggleFullscreen),
        KeyCode::KeyQ => Some(MetaCommand::Quit),
        KeyCode::KeyS => Some(MetaCommand::Screenshot),
        _ => None,
    }
}

/// Collects the command of the current cycle. Only the first one sticks.
#[derive(Debug, Default)]
pub struct MetaCommandDispatcher {
    pending: Option<MetaCommand>,
}

impl MetaCommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous cycle's command
    pub fn begin_cycle(&mut self) {
        self.pending = None;
    }

    /// Check a key-down event. Returns true when the event is a reserved
    /// combination and must not reach the action state.
    pub fn intercept(&mut self, code: KeyCode, modifiers: ModifiersState) -> bool {
        match recognize(code, modifiers) {
            Some(command) => {
                self.emit(command);
                true
            }
            None => false,
        }
    }

    /// Record a command unless one already fired this cycle
    pub fn emit(&mut self, command: MetaCommand) {
        if self.pending.is_none() {
            log::info!("Meta command: {:?}", command);
            self.pending = Some(command);
        } else {
            log::debug!("Dropped {:?}, a command already fired this cycle", command);
        }
    }

    /// Command recognized this cycle
    pub fn pending(&self) -> Option<MetaCommand> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_requires_control() {
        assert_eq!(recognize(KeyCode::KeyF, ModifiersState::empty()), None);
        assert_eq!(recognize(KeyCode::KeyF, ModifiersState::SHIFT), None);
        assert_eq!(
            recognize(KeyCode::KeyF, ModifiersState::CONTROL),
            Some(MetaCommand::ToggleFullscreen)
        );
    }

    #[test]
    fn test_recognize_all_combinations() {
        let ctrl = ModifiersState::CONTROL;
        assert_eq!(recognize(KeyCode::KeyQ, ctrl), Some(MetaCommand::Quit));
        assert_eq!(recognize(KeyCode::KeyS, ctrl), Some(MetaCommand::Screenshot));
        assert_eq!(recognize(KeyCode::KeyA, ctrl), None);
        assert_eq!(
            recognize(KeyCode::KeyS, ctrl | ModifiersState::SHIFT),
            Some(MetaCommand::Screenshot)
        );
    }

    #[test]
    fn test_first_command_wins() {
        let mut dispatcher = MetaCommandDispatcher::new();
        assert!(dispatcher.intercept(KeyCode::KeyS, ModifiersState::CONTROL));
        assert!(dispatcher.intercept(KeyCode::KeyQ, ModifiersState::CONTROL));
        assert_eq!(dispatcher.pending(), Some(MetaCommand::Screenshot));

        dispatcher.begin_cycle();
        assert_eq!(dispatcher.pending(), None);
    }

    #[test]
    fn test_plain_key_not_intercepted() {
        let mut dispatcher = MetaCommandDispatcher::new();
        assert!(!dispatcher.intercept(KeyCode::KeyS, ModifiersState::empty()));
        assert_eq!(dispatcher.pending(), None);
    }
}
