//! Keyboard input handling.
//!
//! Translates crossterm key events into viewer actions:
//! - 1-7: display mode
//! - +/=/-: zoom in/out
//! - Arrow keys: pan
//! - 0: reset zoom and pan
//! - s: toggle status bar
//! - q, Esc, Ctrl+C: quit

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::render::DisplayMode;

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    /// Switch the display mode.
    SetMode(DisplayMode),
    /// Multiply zoom by a step up or down.
    ZoomIn,
    ZoomOut,
    /// Pan the viewport by one step.
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    /// Reset zoom and pan to defaults.
    ResetView,
    /// Toggle the status bar.
    ToggleStatus,
    /// Exit the viewer.
    Quit,
    /// Key does nothing.
    None,
}

/// Map a key event to a viewer action. Release and repeat events from
/// terminals that report them are treated the same as presses, except
/// releases, which are ignored.
pub fn handle_key_event(event: KeyEvent) -> KeyAction {
    if event.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Quit,
            _ => KeyAction::None,
        };
    }

    match code {
        KeyCode::Char(c @ '1'..='7') => {
            let idx = c as usize - '1' as usize;
            KeyAction::SetMode(DisplayMode::ALL[idx])
        }
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::ZoomIn,
        KeyCode::Char('-') => KeyAction::ZoomOut,
        KeyCode::Left => KeyAction::PanLeft,
        KeyCode::Right => KeyAction::PanRight,
        KeyCode::Up => KeyAction::PanUp,
        KeyCode::Down => KeyAction::PanDown,
        KeyCode::Char('0') => KeyAction::ResetView,
        KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::ToggleStatus,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::None,
    }
}
