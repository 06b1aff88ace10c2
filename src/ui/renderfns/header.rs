use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::api::types::Role;
use crate::ui::view::ShortcutInfo;

/// What the header shows besides the shortcuts
pub struct HeaderInfo<'a> {
  pub title: &'a str,
  pub user_name: &'a str,
  pub role: Role,
  /// Current view context, e.g. the selected day
  pub context: Option<String>,
}

/// Draw the header bar with title, user, context, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, info: &HeaderInfo, shortcuts: &[ShortcutInfo]) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let mut spans = vec![
    Span::styled(" shopdesk ", Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(format!(" {} ", info.title), Style::default().fg(Color::White)),
    separator(),
    Span::styled(format!(" {} ", info.user_name), Style::default().fg(Color::White)),
    Span::styled(
      format!("[{}]", info.role.label()),
      Style::default().fg(role_color(info.role)).bold(),
    ),
    Span::raw(" "),
  ];

  if let Some(context) = &info.context {
    spans.push(separator());
    spans.push(Span::styled(
      format!(" {} ", context),
      Style::default().fg(Color::Yellow).bold(),
    ));
  }

  spans.push(Span::raw(" "));

  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);
  for shortcut in sorted {
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}  ", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn role_color(role: Role) -> Color {
  match role {
    Role::Admin => Color::Magenta,
    Role::Supervisor => Color::Blue,
    Role::Operator => Color::Green,
  }
}
