use crate::store::{Mode, Store};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A decoded key press, independent of the physical binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    MoveTaskUp,
    MoveTaskDown,
    Promote,
    Demote,
    Toggle,
    Delete,
    StartAdd,
    StartEdit,
    Insert(char),
    Backspace,
    Submit,
    Cancel,
}

/// Map a key to the action it means in `mode`. Keys with no meaning in the
/// current mode map to `None`.
pub fn action_for(mode: Mode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match mode {
        Mode::List => list_action(key),
        Mode::Add | Mode::Edit => input_action(key),
        Mode::Error => match key.code {
            KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => Some(Action::Quit),
            _ => None,
        },
        Mode::Loading => None,
    }
}

fn list_action(key: KeyEvent) -> Option<Action> {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('J') => Action::MoveTaskDown,
        KeyCode::Char('K') => Action::MoveTaskUp,
        KeyCode::Down if shift => Action::MoveTaskDown,
        KeyCode::Up if shift => Action::MoveTaskUp,
        KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
        KeyCode::Tab | KeyCode::Char('>') => Action::Demote,
        KeyCode::BackTab | KeyCode::Char('<') => Action::Promote,
        KeyCode::Char(' ') => Action::Toggle,
        KeyCode::Char('d') | KeyCode::Char('D') => Action::Delete,
        KeyCode::Char('a') | KeyCode::Char('A') => Action::StartAdd,
        KeyCode::Char('e') | KeyCode::Char('E') => Action::StartEdit,
        _ => return None,
    };
    Some(action)
}

fn input_action(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Backspace | KeyCode::Delete => Some(Action::Backspace),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::Insert(c))
        }
        _ => None,
    }
}

/// Apply one action to the store. Returns `true` when the app should exit.
pub fn dispatch(store: &mut Store, action: Action) -> bool {
    match action {
        Action::Quit => return true,
        Action::MoveUp => store.move_up(),
        Action::MoveDown => store.move_down(),
        Action::MoveTaskUp => store.move_task_up(),
        Action::MoveTaskDown => store.move_task_down(),
        Action::Promote => store.indent_promote(),
        Action::Demote => store.indent_demote(),
        Action::Toggle => store.toggle_task(),
        Action::Delete => store.delete_task(),
        Action::StartAdd => {
            store.set_input_value("");
            store.set_mode(Mode::Add);
        }
        Action::StartEdit => {
            if let Some(label) = store.selected_task().map(|task| task.label.clone()) {
                store.set_input_value(label);
                store.set_mode(Mode::Edit);
            }
        }
        Action::Insert(c) => {
            let mut value = store.input().to_string();
            value.push(c);
            store.set_input_value(value);
        }
        Action::Backspace => {
            let mut value = store.input().to_string();
            value.pop();
            store.set_input_value(value);
        }
        Action::Submit => store.add_task(),
        Action::Cancel => {
            store.set_input_value("");
            store.set_mode(Mode::List);
        }
    }
    false
}

/// Handle one key press: clear the previous status line, then dispatch.
pub fn handle_key(store: &mut Store, key: KeyEvent) -> bool {
    store.clear_message();
    match action_for(store.mode(), key) {
        Some(action) => dispatch(store, action),
        None => false,
    }
}
