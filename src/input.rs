//! Terminal events mapped onto simulator actions.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    TogglePause,
    Feed,
    SpawnFish,
    SpawnPlant,
    SpawnRock,
    ClearFish,
    Export,
    Import,
    ToggleGrid,
    ToggleHud,
    ToggleHelp,
    /// Terminal cell coordinates; the app converts to world space.
    Click(u16, u16),
    Resize(u16, u16),
}

pub fn map_event(ev: Event) -> Option<Action> {
    match ev {
        Event::Key(KeyEvent { code, kind, .. }) if kind == KeyEventKind::Press => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char(' ') => Some(Action::TogglePause),
            KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::Feed),
            KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::SpawnFish),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::SpawnPlant),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::SpawnRock),
            KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::ClearFish),
            KeyCode::Char('e') | KeyCode::Char('E') => Some(Action::Export),
            KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::Import),
            KeyCode::Char('g') | KeyCode::Char('G') => Some(Action::ToggleGrid),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            _ => None,
        },
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => Some(Action::Click(column, row)),
        Event::Resize(w, h) => Some(Action::Resize(w, h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn key_map() {
        assert_eq!(map_event(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(map_event(key(KeyCode::Char('f'))), Some(Action::Feed));
        assert_eq!(map_event(key(KeyCode::Char('g'))), Some(Action::ToggleGrid));
        assert_eq!(map_event(key(KeyCode::Char('z'))), None);
    }

    #[test]
    fn release_events_are_ignored() {
        let ev = Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(ev), None);
    }
}
