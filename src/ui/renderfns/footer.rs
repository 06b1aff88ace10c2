use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb on the left, current toast on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<Line>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let background = Style::default().bg(Color::Black);
  let toast_width = toast.as_ref().map(|t| t.width() as u16).unwrap_or(0);
  let [crumbs_area, toast_area] =
    Layout::horizontal([Constraint::Min(0), Constraint::Length(toast_width)]).areas(area);

  frame.render_widget(Paragraph::new(Line::from(spans)).style(background), crumbs_area);

  if let Some(toast) = toast {
    frame.render_widget(Paragraph::new(toast).style(background), toast_area);
  }
}
