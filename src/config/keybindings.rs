//! Keybinding configuration for the TUI.
//!
//! Bindings apply in browse mode only. While the url input is focused every
//! printable key is text; Enter submits and Esc leaves the input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::tui::event::Action;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeybindingConfig {
    pub quit: Vec<String>,
    pub move_up: Vec<String>,
    pub move_down: Vec<String>,
    pub edit_url: Vec<String>,
    pub open_bookmark: Vec<String>,
    pub delete_bookmark: Vec<String>,
    pub reload: Vec<String>,
    pub login: Vec<String>,
    pub logout: Vec<String>,
}

fn keys(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: keys(&["q", "Ctrl+c"]),
            move_up: keys(&["k", "Up"]),
            move_down: keys(&["j", "Down"]),
            edit_url: keys(&["a", "i"]),
            open_bookmark: keys(&["o", "Enter"]),
            delete_bookmark: keys(&["d", "Delete"]),
            reload: keys(&["R"]),
            login: keys(&["l"]),
            logout: keys(&["L"]),
        }
    }
}

impl KeybindingConfig {
    pub fn get_action(&self, key: &KeyEvent) -> Action {
        let table: [(&[String], Action); 9] = [
            (&self.quit, Action::Quit),
            (&self.move_up, Action::MoveUp),
            (&self.move_down, Action::MoveDown),
            (&self.edit_url, Action::EditUrl),
            (&self.open_bookmark, Action::OpenBookmark),
            (&self.delete_bookmark, Action::DeleteBookmark),
            (&self.reload, Action::Reload),
            (&self.login, Action::Login),
            (&self.logout, Action::Logout),
        ];

        table
            .iter()
            .find(|(bindings, _)| matches_any(key, bindings))
            .map(|(_, action)| *action)
            .unwrap_or(Action::None)
    }
}

fn matches_any(key: &KeyEvent, bindings: &[String]) -> bool {
    bindings
        .iter()
        .filter_map(|binding| parse_key_string(binding).ok())
        .any(|parsed| parsed.matches(key))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Shift is ignored on the event side so "R" matches Shift+r terminals.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.code == key.code
            && (self.modifiers == key.modifiers
                || self.modifiers == (key.modifiers & !KeyModifiers::SHIFT))
    }
}

/// Parse "a", "Enter", "Ctrl+c", "Shift+Tab" and similar into a binding.
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    let s = s.trim();
    let (modifier_parts, key_part) = match s.rsplit_once('+') {
        // "+" on its own is a key, not a separator
        Some((mods, key)) if !mods.is_empty() && !key.is_empty() => (Some(mods), key),
        _ => (None, s),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in modifier_parts.into_iter().flat_map(|m| m.split('+')) {
        modifiers |= match part.to_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        };
    }

    Ok(KeyBinding {
        code: parse_key_code(key_part)?,
        modifiers,
    })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let lower = s.to_lowercase();
    if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Ok(KeyCode::F(n));
        }
    }

    match lower.as_str() {
        "enter" | "return" => Ok(KeyCode::Enter),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "backspace" | "bs" => Ok(KeyCode::Backspace),
        "delete" | "del" => Ok(KeyCode::Delete),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" | "pgup" => Ok(KeyCode::PageUp),
        "pagedown" | "pgdn" => Ok(KeyCode::PageDown),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("Unknown key: {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_special_keys() {
        assert_eq!(parse_key_string("d").unwrap().code, KeyCode::Char('d'));
        assert_eq!(parse_key_string("Delete").unwrap().code, KeyCode::Delete);
        assert_eq!(parse_key_string("F5").unwrap().code, KeyCode::F(5));
        assert_eq!(parse_key_string("+").unwrap().code, KeyCode::Char('+'));
        assert!(parse_key_string("F13").is_err());
    }

    #[test]
    fn test_parse_modifiers() {
        let binding = parse_key_string("Ctrl+Shift+r").unwrap();
        assert_eq!(binding.code, KeyCode::Char('r'));
        assert_eq!(binding.modifiers, KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert!(parse_key_string("Hyper+x").is_err());
    }

    #[test]
    fn test_uppercase_binding_matches_shifted_event() {
        let binding = parse_key_string("L").unwrap();
        let key = KeyEvent::new(KeyCode::Char('L'), KeyModifiers::SHIFT);
        assert!(binding.matches(&key));
    }

    #[test]
    fn test_default_actions() {
        let config = KeybindingConfig::default();
        let action = |code, mods| config.get_action(&KeyEvent::new(code, mods));

        assert_eq!(action(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(action(KeyCode::Char('a'), KeyModifiers::NONE), Action::EditUrl);
        assert_eq!(action(KeyCode::Enter, KeyModifiers::NONE), Action::OpenBookmark);
        assert_eq!(action(KeyCode::Delete, KeyModifiers::NONE), Action::DeleteBookmark);
        assert_eq!(action(KeyCode::Char('l'), KeyModifiers::NONE), Action::Login);
        assert_eq!(action(KeyCode::Char('L'), KeyModifiers::SHIFT), Action::Logout);
        assert_eq!(action(KeyCode::Char('z'), KeyModifiers::NONE), Action::None);
    }
}
