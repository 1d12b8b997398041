use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;

use crate::config::KeybindingConfig;
use crate::domain::Bookmark;
use crate::tui::event::Action;
use crate::view::{BookmarkView, ViewMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Browse,
    Input,
}

/// Work that needs the network; performed by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add,
    Delete(String),
    Open(String),
    Reload,
    Login,
    Logout,
}

impl Intent {
    /// Status line shown while the intent is awaited.
    pub fn busy_label(&self) -> Option<&'static str> {
        match self {
            Intent::Add => Some("Adding bookmark..."),
            Intent::Delete(_) => Some("Deleting bookmark..."),
            Intent::Reload => Some("Reloading..."),
            Intent::Logout => Some("Logging out..."),
            Intent::Open(_) | Intent::Login => None,
        }
    }
}

/// Terminal-only presentation state layered over the view state.
pub struct TuiApp {
    pub focus: Focus,
    pub selected: usize,
    pub list_state: ListState,
    pub should_quit: bool,
    pub status_message: Option<String>,
    /// Modal message; any key dismisses it.
    pub alert: Option<String>,
    /// (bookmark id, url) awaiting y/n
    pub pending_delete: Option<(String, String)>,
    pub busy: Option<&'static str>,
    pub login_in_progress: bool,
}

impl TuiApp {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            focus: Focus::Browse,
            selected: 0,
            list_state,
            should_quit: false,
            status_message: None,
            alert: None,
            pending_delete: None,
            busy: None,
            login_in_progress: false,
        }
    }

    pub fn selected_bookmark<'a>(&self, bookmarks: &'a [Bookmark]) -> Option<&'a Bookmark> {
        bookmarks.get(self.selected)
    }

    pub fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
            self.list_state.select(Some(self.selected));
        }
    }

    /// Keep the selection inside a list that was just replaced.
    pub fn clamp_selection(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        self.list_state.select(Some(self.selected));
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn show_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(message.into());
    }

    /// Translate a key press into local state changes and, when the network
    /// is involved, an [`Intent`] for the event loop.
    pub fn on_key(
        &mut self,
        key: KeyEvent,
        view: &mut BookmarkView,
        bindings: &KeybindingConfig,
    ) -> Option<Intent> {
        if self.alert.take().is_some() {
            return None;
        }

        if let Some((id, url)) = self.pending_delete.take() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(Intent::Delete(id)),
                _ => {
                    self.set_status(format!("Kept {}", url));
                    None
                }
            };
        }

        if self.focus == Focus::Input {
            return self.on_input_key(key, view);
        }

        let action = bindings.get_action(&key);
        if action == Action::Quit {
            self.should_quit = true;
            return None;
        }

        match view.mode() {
            ViewMode::Loading => None,
            ViewMode::Unauthenticated => match action {
                Action::Login if self.login_in_progress => {
                    self.set_status("Sign-in already in progress");
                    None
                }
                Action::Login => Some(Intent::Login),
                _ => None,
            },
            ViewMode::Authenticated { bookmarks, .. } => match action {
                Action::MoveUp => {
                    self.move_up();
                    None
                }
                Action::MoveDown => {
                    self.move_down(bookmarks.len());
                    None
                }
                Action::EditUrl => {
                    self.focus = Focus::Input;
                    None
                }
                Action::OpenBookmark => self
                    .selected_bookmark(bookmarks)
                    .map(|b| Intent::Open(b.url.clone())),
                Action::DeleteBookmark => {
                    if let Some(b) = self.selected_bookmark(bookmarks) {
                        self.pending_delete = Some((b.id.clone(), b.url.clone()));
                    }
                    None
                }
                Action::Reload => Some(Intent::Reload),
                Action::Logout => Some(Intent::Logout),
                _ => None,
            },
        }
    }

    fn on_input_key(&mut self, key: KeyEvent, view: &mut BookmarkView) -> Option<Intent> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            KeyCode::Esc => {
                self.focus = Focus::Browse;
                None
            }
            KeyCode::Enter => Some(Intent::Add),
            KeyCode::Backspace => {
                view.input_mut().pop();
                None
            }
            KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                view.input_mut().push(c);
                None
            }
            _ => None,
        }
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}
