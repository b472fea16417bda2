// Per-action level/edge state and the per-frame snapshot

use super::action::Action;

/// Level and edge flags of a single action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    /// True while the action is held
    pub state: bool,

    /// True only in the cycle the action went from released to held
    pub press: bool,

    /// True only in the cycle the action went from held to released
    pub release: bool,
}

impl ActionState {
    /// Apply one sample of the physical level.
    ///
    /// Edges accumulate within a cycle, so a press and release arriving in
    /// the same cycle are both kept. Repeating the current level is a no-op.
    pub fn transition(self, down: bool) -> Self {
        match (self.state, down) {
            (false, true) => Self {
                state: true,
                press: true,
                ..self
            },
            (true, false) => Self {
                state: false,
                release: true,
                ..self
            },
            _ => self,
        }
    }

    /// Drop the edges, keep the level
    pub fn begin_cycle(self) -> Self {
        Self {
            state: self.state,
            press: false,
            release: false,
        }
    }
}

/// State of every action, valid for one call of the event handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    actions: [ActionState; Action::COUNT],
}

impl InputSnapshot {
    /// Full triple for an action
    pub fn get(&self, action: Action) -> ActionState {
        self.actions[action.index()]
    }

    /// Check if an action is held
    pub fn state(&self, action: Action) -> bool {
        self.get(action).state
    }

    /// Check if an action was just pressed this cycle
    pub fn press(&self, action: Action) -> bool {
        self.get(action).press
    }

    /// Check if an action was just released this cycle
    pub fn release(&self, action: Action) -> bool {
        self.get(action).release
    }

    /// Check if any direction was just pressed this cycle
    pub fn arrow_press(&self) -> bool {
        [Action::Up, Action::Down, Action::Left, Action::Right]
            .iter()
            .any(|&a| self.press(a))
    }

    /// All actions pressed this cycle
    pub fn pressed_actions(&self) -> Vec<Action> {
        Action::ALL.iter().copied().filter(|&a| self.press(a)).collect()
    }
}

/// "Something happened" flags for remap and title screens.
/// Reset at the start of every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// A bound key or button went down
    pub registered_key_press: bool,

    /// A bound key or button went up
    pub registered_key_release: bool,

    /// Any keyboard key went down, bound or not
    pub any_keyboard_key_press: bool,

    /// Any joystick button went down, bound or not
    pub any_joystick_key_press: bool,
}

/// Owns the per-action triples and advances them once per poll cycle
#[derive(Debug, Default)]
pub struct InputStateMachine {
    snapshot: InputSnapshot,
    diagnostics: Diagnostics,
}

impl InputStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new poll cycle: clear every edge and diagnostic flag
    pub fn begin_cycle(&mut self) {
        for action in &mut self.snapshot.actions {
            *action = action.begin_cycle();
        }
        self.diagnostics = Diagnostics::default();
    }

    /// Register an action going down.
    /// Returns true if this produced a press edge.
    pub fn press(&mut self, action: Action) -> bool {
        self.apply(action, true)
    }

    /// Register an action going up.
    /// Returns true if this produced a release edge.
    pub fn release(&mut self, action: Action) -> bool {
        self.apply(action, false)
    }

    fn apply(&mut self, action: Action, down: bool) -> bool {
        let slot = &mut self.snapshot.actions[action.index()];
        let before = *slot;
        *slot = before.transition(down);
        before.state != slot.state
    }

    /// Current snapshot
    pub fn snapshot(&self) -> &InputSnapshot {
        &self.snapshot
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Release everything without emitting edges
    pub fn reset(&mut self) {
        self.snapshot = InputSnapshot::default();
        self.diagnostics = Diagnostics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_press() {
        let next = ActionState::default().transition(true);
        assert_eq!(
            next,
            ActionState {
                state: true,
                press: true,
                release: false
            }
        );
    }

    #[test]
    fn test_transition_repeat_is_noop() {
        let held = ActionState::default().transition(true).begin_cycle();
        assert_eq!(held.transition(true), held);
    }

    #[test]
    fn test_transition_release_unpressed() {
        let idle = ActionState::default();
        assert_eq!(idle.transition(false), idle);
    }

    #[test]
    fn test_tap_within_one_cycle_keeps_both_edges() {
        let tapped = ActionState::default().transition(true).transition(false);
        assert!(tapped.press);
        assert!(tapped.release);
        assert!(!tapped.state);
    }

    #[test]
    fn test_begin_cycle_keeps_level() {
        let mut machine = InputStateMachine::new();
        assert!(machine.press(Action::Confirm));
        machine.begin_cycle();

        let snapshot = machine.snapshot();
        assert!(snapshot.state(Action::Confirm));
        assert!(!snapshot.press(Action::Confirm));
    }

    #[test]
    fn test_hold_presses_once() {
        let mut machine = InputStateMachine::new();
        let mut presses = 0;
        for _ in 0..5 {
            machine.begin_cycle();
            machine.press(Action::Up);
            let snapshot = machine.snapshot();
            assert!(snapshot.state(Action::Up));
            assert!(!snapshot.release(Action::Up));
            if snapshot.press(Action::Up) {
                presses += 1;
            }
        }
        assert_eq!(presses, 1);
    }

    #[test]
    fn test_release_edge() {
        let mut machine = InputStateMachine::new();
        machine.press(Action::Cancel);
        machine.begin_cycle();
        assert!(machine.release(Action::Cancel));
        assert!(machine.snapshot().release(Action::Cancel));
        assert!(!machine.snapshot().state(Action::Cancel));

        machine.begin_cycle();
        assert!(!machine.snapshot().release(Action::Cancel));
    }

    #[test]
    fn test_arrow_press() {
        let mut machine = InputStateMachine::new();
        assert!(!machine.snapshot().arrow_press());
        machine.press(Action::Left);
        assert!(machine.snapshot().arrow_press());
        assert_eq!(machine.snapshot().pressed_actions(), vec![Action::Left]);
    }

    #[test]
    fn test_reset() {
        let mut machine = InputStateMachine::new();
        machine.press(Action::Menu);
        machine.diagnostics_mut().any_keyboard_key_press = true;
        machine.reset();

        assert_eq!(*machine.snapshot(), InputSnapshot::default());
        assert_eq!(*machine.diagnostics(), Diagnostics::default());
    }
}
