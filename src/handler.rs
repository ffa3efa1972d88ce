use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::browser::mode::Mode;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }
    app.message = None;

    match app.mode {
        Mode::Idle => handle_idle(app, key),
        Mode::Moving { .. } => handle_moving(app, key),
        _ => handle_text_input(app, key),
    }
}

/// Keys shared by Idle and Moving.
fn handle_navigation(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('g') | KeyCode::Home => app.goto_top(),
        KeyCode::Char('G') | KeyCode::End => app.goto_bottom(),
        KeyCode::Char('l') | KeyCode::Right => app.open_selected(),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => app.go_parent(),
        KeyCode::Char('~') => app.go_home(),
        KeyCode::Char('.') => app.toggle_hidden(),
        KeyCode::Char('R') | KeyCode::F(5) => app.refresh(),
        KeyCode::Char('J') => app.scroll_preview_down(),
        KeyCode::Char('K') => app.scroll_preview_up(),
        _ => return false,
    }
    true
}

fn handle_idle(app: &mut App, key: KeyEvent) {
    if handle_navigation(app, key) {
        return;
    }
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Esc => app.cancel(),
        KeyCode::Char('r') | KeyCode::F(2) => app.begin_rename(),
        KeyCode::Char('m') => app.begin_move(),
        KeyCode::Char('d') | KeyCode::Delete => app.begin_delete(),
        KeyCode::Char('a') => app.begin_create_file(),
        KeyCode::Char('A') => app.begin_create_directory(),
        KeyCode::Char('/') => app.begin_find(),
        KeyCode::Char(':') => app.begin_command(),
        KeyCode::Char('c') => app.copy_selected(),
        KeyCode::Char('z') => app.zip_selected(),
        KeyCode::Char('u') => app.unzip_selected(),
        _ => {}
    }
}

fn handle_moving(app: &mut App, key: KeyEvent) {
    if handle_navigation(app, key) {
        return;
    }
    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Esc => app.cancel(),
        _ => {}
    }
}

fn handle_text_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Esc => app.cancel(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Left => app.input_left(),
        KeyCode::Right => app.input_right(),
        KeyCode::Home => app.input_home(),
        KeyCode::End => app.input_end(),
        KeyCode::Char(c) => app.input_char(c),
        _ => {}
    }
}

/// Handle a mouse event. The wheel moves the cursor.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.move_down(),
        MouseEventKind::ScrollUp => app.move_up(),
        _ => {}
    }
}
