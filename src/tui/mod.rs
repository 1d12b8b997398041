pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::{AppContext, Result};
use crate::view::{BookmarkView, ViewState};

use self::app::{Focus, Intent, TuiApp};
use self::event::{AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    let config = ctx.config.clone();
    let provider = config.auth.provider.display_name();
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));
    let (login_tx, mut login_rx) = mpsc::unbounded_channel::<Result<()>>();

    // Placeholder while the session is checked.
    terminal.draw(|frame| layout::render(frame, &mut tui_app, &ViewState::new(), provider, &config.colors))?;
    let mut view = ctx.mount_view().await;

    loop {
        terminal.draw(|frame| layout::render(frame, &mut tui_app, view.state(), provider, &config.colors))?;

        if let AppEvent::Key(key) = event_handler.next()? {
            if let Some(intent) = tui_app.on_key(key, &mut view, &config.keybindings) {
                tui_app.status_message = None;
                if let Some(label) = intent.busy_label() {
                    tui_app.busy = Some(label);
                    terminal.draw(|frame| {
                        layout::render(frame, &mut tui_app, view.state(), provider, &config.colors)
                    })?;
                }
                perform(intent, &mut tui_app, &mut view, &login_tx).await;
                tui_app.busy = None;
            }
        }

        if view.process_pending_events().await > 0 {
            tui_app.clamp_selection(view.state().bookmarks.len());
        }

        while let Ok(result) = login_rx.try_recv() {
            tui_app.login_in_progress = false;
            if let Err(e) = result {
                error!("Login error: {}", e);
                tui_app.set_status(format!("Login failed: {}", e));
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    view.unmount();
    Ok(())
}

async fn perform(
    intent: Intent,
    tui_app: &mut TuiApp,
    view: &mut BookmarkView,
    login_tx: &mpsc::UnboundedSender<Result<()>>,
) {
    match intent {
        Intent::Add => match view.add_bookmark().await {
            Ok(()) => {
                tui_app.focus = Focus::Browse;
                tui_app.selected = 0;
                tui_app.set_status("Bookmark added");
            }
            Err(alert) => tui_app.show_alert(alert.to_string()),
        },
        Intent::Delete(id) => view.delete_bookmark(&id).await,
        Intent::Open(url) => {
            if let Err(e) = open::that(&url) {
                tui_app.set_status(format!("Failed to open browser: {}", e));
            }
        }
        Intent::Reload => view.reload().await,
        Intent::Login => {
            info!("Starting sign-in");
            tui_app.login_in_progress = true;
            let login = view.login();
            let tx = login_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(login.await);
            });
        }
        Intent::Logout => {
            view.logout().await;
            tui_app.focus = Focus::Browse;
            tui_app.set_status("Logged out");
        }
    }
    tui_app.clamp_selection(view.state().bookmarks.len());
}
