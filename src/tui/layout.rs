use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::{Bookmark, Identity};
use crate::tui::app::{Focus, TuiApp};
use crate::view::{ViewMode, ViewState};

pub fn render(frame: &mut Frame, app: &mut TuiApp, state: &ViewState, provider: &str, colors: &ColorConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Screen
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    match state.mode() {
        ViewMode::Loading => render_loading(frame, chunks[0], colors),
        ViewMode::Unauthenticated => render_login(frame, app, chunks[0], provider, colors),
        ViewMode::Authenticated { identity, bookmarks } => {
            render_bookmarks(frame, app, chunks[0], identity, bookmarks, &state.input, colors)
        }
    }
    render_status_bar(frame, app, state, chunks[1], colors);

    if let Some(ref message) = app.alert {
        render_alert(frame, message, colors);
    }
}

fn bordered(title: &str, colors: &ColorConfig) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
}

fn render_loading(frame: &mut Frame, area: Rect, colors: &ColorConfig) {
    let paragraph = Paragraph::new("Loading...")
        .alignment(Alignment::Center)
        .block(bordered("smartmark", colors));
    frame.render_widget(paragraph, area);
}

fn render_login(frame: &mut Frame, app: &TuiApp, area: Rect, provider: &str, colors: &ColorConfig) {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Please login",
            Style::default().fg(colors.heading).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if app.login_in_progress {
        lines.push(Line::from("Finish signing in in your browser..."));
    } else {
        lines.push(Line::from(format!("[l] Login with {}", provider)));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .block(bordered("smartmark", colors));
    frame.render_widget(paragraph, area);
}

fn render_bookmarks(
    frame: &mut Frame,
    app: &mut TuiApp,
    area: Rect,
    identity: &Identity,
    bookmarks: &[Bookmark],
    input: &str,
    colors: &ColorConfig,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(3), // Url input
            Constraint::Min(3),    // Your Links
        ])
        .split(area);

    let header = Text::from(vec![
        Line::from(Span::styled(
            "Smart Bookmark",
            Style::default().fg(colors.heading).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::raw("Welcome "),
            Span::styled(identity.display_email(), Style::default().fg(colors.email)),
        ]),
    ]);
    frame.render_widget(Paragraph::new(header), chunks[0]);

    render_input(frame, app, chunks[1], input, colors);

    let block = bordered(&format!("Your Links ({})", bookmarks.len()), colors);
    if bookmarks.is_empty() {
        let empty = Paragraph::new(Span::styled("No bookmarks yet", Style::default().fg(colors.muted)))
            .block(block);
        frame.render_widget(empty, chunks[2]);
        return;
    }

    let items: Vec<ListItem> = bookmarks
        .iter()
        .map(|b| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    b.created_at.format("%Y-%m-%d ").to_string(),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(b.url.clone(), Style::default().fg(colors.link)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(colors.selection_bg)
                .fg(colors.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[2], &mut app.list_state);
}

fn render_input(frame: &mut Frame, app: &TuiApp, area: Rect, input: &str, colors: &ColorConfig) {
    let editing = app.focus == Focus::Input;
    let border = if editing { colors.input_border } else { colors.border };
    let block = Block::default()
        .title(" Paste a link ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let content = if input.is_empty() && !editing {
        Span::styled("press a to add a link", Style::default().fg(colors.muted))
    } else {
        Span::raw(input.to_string())
    };
    frame.render_widget(Paragraph::new(content).block(block), area);

    if editing {
        let x = area.x + 1 + (input.chars().count() as u16).min(area.width.saturating_sub(3));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, state: &ViewState, area: Rect, colors: &ColorConfig) {
    let status = if let Some((_, ref url)) = app.pending_delete {
        format!("Delete \"{}\"? (y/n)", url)
    } else if let Some(busy) = app.busy {
        busy.to_string()
    } else if let Some(ref msg) = app.status_message {
        msg.clone()
    } else {
        match (state.mode(), app.focus) {
            (ViewMode::Loading, _) => "q:Quit".to_string(),
            (ViewMode::Unauthenticated, _) => "l:Login  q:Quit".to_string(),
            (ViewMode::Authenticated { .. }, Focus::Input) => "Enter:Add  Esc:Cancel".to_string(),
            (ViewMode::Authenticated { .. }, Focus::Browse) => {
                "j/k:Nav  a:Add  o:Open  d:Delete  R:Reload  L:Logout  q:Quit".to_string()
            }
        }
    };

    let paragraph = Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));
    frame.render_widget(paragraph, area);
}

fn render_alert(frame: &mut Frame, message: &str, colors: &ColorConfig) {
    let area = centered_rect(50, 5, frame.area());
    let block = Block::default()
        .title(" Alert ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.alert_border));
    let text = Text::from(vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled("Press any key", Style::default().fg(colors.muted))),
    ]);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block),
        area,
    );
}

/// Rect of `percent_x` width and `height` rows centered in `area`.
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x.min(100)) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
