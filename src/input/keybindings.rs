use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Form navigation
    NextField,
    PrevField,

    // Workflow
    Generate,
    Send,
    Logout,

    Quit,
}

pub struct KeyBindings {
    bindings: HashMap<KeyEvent, Action>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut map = HashMap::new();

        map.insert(key_code(KeyCode::Tab), Action::NextField);
        // BackTab arrives with or without an explicit shift modifier
        // depending on the terminal.
        map.insert(key_code(KeyCode::BackTab), Action::PrevField);
        map.insert(
            KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            Action::PrevField,
        );

        map.insert(ctrl_key('g'), Action::Generate);
        map.insert(ctrl_key('s'), Action::Send);
        map.insert(ctrl_key('l'), Action::Logout);

        map.insert(ctrl_key('q'), Action::Quit);
        map.insert(key_code(KeyCode::Esc), Action::Quit);

        Self { bindings: map }
    }

    pub fn get(&self, event: &KeyEvent) -> Option<Action> {
        self.bindings.get(event).copied()
    }
}

fn key_code(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl_key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}
