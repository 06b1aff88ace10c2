pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;

use renderfns::{draw_footer, draw_header, HeaderInfo};

/// Keep a table selection inside `0..len`, selecting the first row when
/// rows appear and clearing it when they go away.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    Some(i) if i >= len => state.select(Some(len - 1)),
    None => state.select(Some(0)),
    Some(_) => {}
  }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, content, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let user = app.user().clone();
  let title = app.title().to_string();
  let breadcrumb = app.breadcrumb();
  let toast = app.toast();

  if let Some(view) = app.current_view_mut() {
    let mut shortcuts = view.shortcuts();
    shortcuts.sort_by_key(|s| s.priority);
    let info = HeaderInfo {
      title: &title,
      user_name: &user.name,
      role: user.role,
      context: view.context(),
    };
    draw_header(frame, header, &info, &shortcuts);
    view.render(frame, content);
  }

  draw_footer(frame, footer, &breadcrumb, toast);
  app.command_input().render_overlay(frame, content);
}
