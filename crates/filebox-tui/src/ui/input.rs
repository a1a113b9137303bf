//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use filebox_core::files::ActionKind;

use crate::app::{
    can_add_password_char, can_add_username_char, AnonymousForm, App, AppState, LoginFocus,
    RegisterField,
};

/// Handle keyboard input. Returns true if the app should quit.
///
/// Never waits on the network: remote work is handed to background tasks.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle prompt overlay
    if matches!(app.state, AppState::Prompting) {
        handle_prompt_input(app, key);
        return Ok(false);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    if !app.is_authenticated() {
        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            app.toggle_form();
            return Ok(false);
        }
        return match app.form {
            AnonymousForm::Login => handle_login_input(app, key),
            AnonymousForm::Register => handle_register_input(app, key),
        };
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Down | KeyCode::Char('j') => app.files.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.files.select_prev(),
        KeyCode::Char('d') => app.start_action(ActionKind::Download),
        KeyCode::Char('m') => app.start_action(ActionKind::Modify),
        KeyCode::Char('r') => app.start_action(ActionKind::Rename),
        KeyCode::Char('x') | KeyCode::Delete => app.start_action(ActionKind::Delete),
        KeyCode::Char('u') => app.start_upload(),
        KeyCode::Char('l') => app.refresh_background(),
        KeyCode::Char('o') => app.logout(),
        _ => {}
    }
    Ok(false)
}

fn handle_prompt_input(app: &mut App, key: KeyEvent) {
    let takes_text = app.prompt.as_ref().map(|p| p.takes_text()).unwrap_or(false);

    if takes_text {
        match key.code {
            KeyCode::Esc => app.cancel_prompt(),
            KeyCode::Enter => app.submit_prompt(true),
            KeyCode::Backspace => {
                app.prompt_input.pop();
            }
            KeyCode::Char(c) => app.push_prompt_char(c),
            _ => {}
        }
    } else {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.submit_prompt(true),
            KeyCode::Char('n') | KeyCode::Char('N') => app.submit_prompt(false),
            KeyCode::Esc => app.cancel_prompt(),
            _ => {}
        }
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            // Move to next field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            // Move to previous field
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.attempt_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => app.register.focus = app.register.focus.next(),
        KeyCode::Up | KeyCode::BackTab => app.register.focus = app.register.focus.prev(),
        KeyCode::Enter => {
            if app.register.focus == RegisterField::Button {
                app.attempt_register();
            } else {
                app.register.focus = app.register.focus.next();
            }
        }
        KeyCode::Backspace => app.register.pop_char(),
        KeyCode::Char(c) => app.register.push_char(c),
        _ => {}
    }
    Ok(false)
}
