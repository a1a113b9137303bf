use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use filebox_core::files::ActionKind;

use crate::app::{AnonymousForm, App, AppState, LoginFocus, Prompt, RegisterField};
use crate::utils::{format_notice_time, truncate_string};

use super::styles;

/// Width of the login/register dialogs
const FORM_WIDTH: u16 = 50;

/// Visible width of a text field inside a form
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(8),    // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    if app.is_authenticated() {
        render_file_list(frame, app, chunks[1]);
    } else {
        match app.form {
            AnonymousForm::Login => render_login_form(frame, app, chunks[1]),
            AnonymousForm::Register => render_register_form(frame, app, chunks[1]),
        }
    }
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if matches!(app.state, AppState::Prompting) {
        if let Some(ref prompt) = app.prompt {
            render_prompt_overlay(frame, app, prompt);
        }
    }

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame, app);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  filebox";
    let right = match app.session.display_name() {
        Some(name) => format!("{}  [?] Help", name),
        None if app.is_authenticated() => "signed in  [?] Help".to_string(),
        None => "[?] Help".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + right.chars().count() + 2),
        )),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_file_list(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.files.snapshot();
    let actions_hint = ActionKind::ALL
        .iter()
        .map(|kind| format!("[{}] {}", action_key(*kind), kind.label()))
        .collect::<Vec<_>>()
        .join("  ");

    let name_width = (area.width as usize).saturating_sub(6);
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            ListItem::new(Line::from(Span::styled(
                format!(" {}", truncate_string(&row.name, name_width)),
                styles::list_item_style(),
            )))
        })
        .collect();

    let title = format!(" Files ({}) ", rows.len());
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .title_bottom(Line::from(Span::styled(
            format!(" {} ", actions_hint),
            styles::muted_style(),
        )))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if items.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No files. Press [u] to upload or [l] to reload.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style())
        .highlight_symbol("▶");

    let mut state = ListState::default();
    state.select(app.files.selected_index());
    frame.render_stateful_widget(list, area, &mut state);
}

/// Key bound to each row action
pub fn action_key(kind: ActionKind) -> char {
    match kind {
        ActionKind::Download => 'd',
        ActionKind::Modify => 'm',
        ActionKind::Rename => 'r',
        ActionKind::Delete => 'x',
    }
}

fn text_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    let shown: String = {
        let count = value.chars().count();
        value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect()
    };
    Line::from(vec![
        Span::styled(format!("  {:>11}: [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", shown, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("               ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let height = if app.login_error.is_some() { 11 } else { 9 };
    let dialog = centered_rect_fixed(FORM_WIDTH, height, area);

    let mut lines = vec![
        Line::from(""),
        text_field(
            "Username",
            app.login_username.clone(),
            app.login_focus == LoginFocus::Username,
        ),
        text_field(
            "Password",
            "*".repeat(app.login_password.chars().count()),
            app.login_focus == LoginFocus::Password,
        ),
        Line::from(""),
        button_line(
            if app.login_pending { "Logging in..." } else { "Login" },
            app.login_focus == LoginFocus::Button,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "  [Ctrl+R] Create an account   [Esc] Quit",
            styles::muted_style(),
        )),
    ];

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(Span::styled(" Log in ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_register_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.register;
    let height = if form.error.is_some() { 14 } else { 12 };
    let dialog = centered_rect_fixed(FORM_WIDTH, height, area);

    let mut lines = vec![Line::from("")];
    for field in RegisterField::INPUTS {
        let value = if field == RegisterField::Password {
            "*".repeat(form.value(field).chars().count())
        } else {
            form.value(field).to_string()
        };
        lines.push(text_field(field.label(), value, form.focus == field));
    }
    lines.push(Line::from(""));
    lines.push(button_line(
        if app.register_pending {
            "Registering..."
        } else {
            RegisterField::Button.label()
        },
        form.focus == RegisterField::Button,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  [Ctrl+R] Back to login   [Esc] Quit",
        styles::muted_style(),
    )));

    if let Some(ref error) = form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(Span::styled(" Register ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), dialog);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = if app.is_authenticated() {
        "[u]pload | [l] reload | [o] logout | [q]uit"
    } else {
        "[Esc] quit"
    };

    let (left_text, left_style) = match app.status {
        Some(ref notice) => (
            format!(
                " {} {} ",
                format_notice_time(&notice.raised_at),
                notice.message
            ),
            styles::notice_style(notice.level),
        ),
        None => (String::from(" Ready "), styles::muted_style()),
    };

    let busy = if app.tasks_in_flight > 0 {
        format!(" working ({}) ", app.tasks_in_flight)
    } else {
        String::new()
    };
    let right_text = format!("{} {} ", busy, shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());
    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_prompt_overlay(frame: &mut Frame, app: &App, prompt: &Prompt) {
    let area = centered_rect_fixed(60, 8, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    if prompt.takes_text() {
        let visible = 54;
        let count = app.prompt_input.chars().count();
        let shown: String = app
            .prompt_input
            .chars()
            .skip(count.saturating_sub(visible))
            .collect();
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{}▌", shown), styles::selected_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to submit, ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "  This cannot be undone.",
            styles::highlight_style(),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to delete, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to keep it", styles::muted_style()),
        ]));
    }

    let block = Block::default()
        .title(Span::styled(format!(" {} ", prompt.title()), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(
            format!("  filebox {}", version),
            styles::title_style(),
        )),
        Line::from(Span::styled(
            format!("  {}", app.config.api_url),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("↑/↓ j/k", "Select file"),
        Line::from(""),
        Line::from(Span::styled(" File actions", styles::highlight_style())),
        help_line("d", "Download to the download folder"),
        help_line("m", "Replace contents with a local file"),
        help_line("r", "Rename"),
        help_line("x", "Delete"),
        help_line("u", "Upload a local file"),
        help_line("l", "Reload the list"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        help_line("o", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
