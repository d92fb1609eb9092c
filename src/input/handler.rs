use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use super::keybindings::{Action, KeyBindings};

pub enum InputResult {
    Continue,
    Quit,
    Action(Action),
    Char(char),
    Backspace,
    Enter,
}

pub fn handle_input(event: Event, bindings: &KeyBindings) -> InputResult {
    match event {
        Event::Key(key_event) => handle_key(key_event, bindings),
        _ => InputResult::Continue,
    }
}

fn handle_key(key: KeyEvent, bindings: &KeyBindings) -> InputResult {
    // Mapped actions (modifier combinations and navigation keys) win over
    // text input.
    if let Some(action) = bindings.get(&key) {
        if action == Action::Quit {
            return InputResult::Quit;
        }
        return InputResult::Action(action);
    }

    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputResult::Char(c)
        }
        KeyCode::Backspace => InputResult::Backspace,
        KeyCode::Enter => InputResult::Enter,
        _ => InputResult::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_bound_keys_become_actions() {
        let bindings = KeyBindings::new();
        assert!(matches!(
            handle_input(key(KeyCode::Char('g'), KeyModifiers::CONTROL), &bindings),
            InputResult::Action(Action::Generate)
        ));
        assert!(matches!(
            handle_input(key(KeyCode::Esc, KeyModifiers::NONE), &bindings),
            InputResult::Quit
        ));
    }

    #[test]
    fn test_plain_characters_flow_into_fields() {
        let bindings = KeyBindings::new();
        assert!(matches!(
            handle_input(key(KeyCode::Char('a'), KeyModifiers::NONE), &bindings),
            InputResult::Char('a')
        ));
        assert!(matches!(
            handle_input(key(KeyCode::Char('A'), KeyModifiers::SHIFT), &bindings),
            InputResult::Char('A')
        ));
        assert!(matches!(
            handle_input(key(KeyCode::Backspace, KeyModifiers::NONE), &bindings),
            InputResult::Backspace
        ));
        assert!(matches!(
            handle_input(key(KeyCode::Enter, KeyModifiers::NONE), &bindings),
            InputResult::Enter
        ));
    }

    #[test]
    fn test_unbound_control_keys_are_ignored() {
        let bindings = KeyBindings::new();
        assert!(matches!(
            handle_input(key(KeyCode::Char('x'), KeyModifiers::CONTROL), &bindings),
            InputResult::Continue
        ));
    }
}
