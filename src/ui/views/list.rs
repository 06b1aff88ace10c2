use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, TableState, Wrap};

use crate::query::{Query, QueryKey};
use crate::ui::components::{render_table, row_matches, Column, KeyResult, SearchInput};
use crate::ui::ensure_valid_selection;

/// A query-backed table with selection and a `/` row filter.
///
/// Every list page is one of these plus its own key bindings.
pub struct ListPanel<K, T> {
  title: &'static str,
  query: Query<K, Vec<T>>,
  columns: Vec<Column<T>>,
  state: TableState,
  search: SearchInput,
  empty_message: &'static str,
}

impl<K: QueryKey, T: Clone + Send + 'static> ListPanel<K, T> {
  pub fn new(title: &'static str, query: Query<K, Vec<T>>, columns: Vec<Column<T>>) -> Self {
    Self {
      title,
      query,
      columns,
      state: TableState::default().with_selected(Some(0)),
      search: SearchInput::new(),
      empty_message: "Nothing recorded.",
    }
  }

  pub fn with_empty_message(mut self, message: &'static str) -> Self {
    self.empty_message = message;
    self
  }

  pub fn query(&self) -> &Query<K, Vec<T>> {
    &self.query
  }

  /// Switch the key, keeping the filter but starting at the top.
  pub fn set_key(&mut self, key: K) {
    self.query.set_key(key);
    self.state.select(Some(0));
  }

  pub fn is_filtering(&self) -> bool {
    self.search.is_active()
  }

  pub fn refetch(&mut self) {
    self.query.refetch();
  }

  /// Reload after a write: every cached key may be out of date now.
  pub fn reload(&mut self) {
    self.query.invalidate_all();
    self.query.refetch();
  }

  /// All loaded rows, ignoring the filter
  pub fn rows(&self) -> &[T] {
    self.query.data().map(Vec::as_slice).unwrap_or(&[])
  }

  /// Loaded rows that pass the filter
  pub fn visible_rows(&self) -> Vec<&T> {
    let needle = self.search.query();
    self
      .rows()
      .iter()
      .filter(|row| row_matches(&self.columns, *row, needle))
      .collect()
  }

  pub fn selected(&self) -> Option<&T> {
    let idx = self.state.selected()?;
    self.visible_rows().get(idx).copied()
  }

  /// Poll the query. Returns `true` when new data or an error arrived.
  pub fn tick(&mut self) -> bool {
    self.query.poll()
  }

  /// Filter, movement and refresh keys shared by every list page.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<()> {
    match self.search.handle_key(key) {
      KeyResult::NotHandled => {}
      _ => {
        self.state.select(Some(0));
        return KeyResult::Handled;
      }
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.state.select_last(),
      KeyCode::Char('r') => self.query.refetch(),
      _ => return KeyResult::NotHandled,
    }
    KeyResult::Handled
  }

  /// Render the table (or its loading / error / empty state) with an
  /// optional summary line under it.
  pub fn render(&mut self, frame: &mut Frame, area: Rect, subtitle: &str, summary: Option<Line>) {
    let (table_area, summary_area) = match summary {
      Some(_) => {
        let [table, summary] =
          Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
        (table, Some(summary))
      }
      None => (area, None),
    };

    // Field-level borrows so the selection can be fixed up below
    let filter = self.search.query();
    let all: &[T] = self.query.data().map(Vec::as_slice).unwrap_or(&[]);
    let rows: Vec<&T> = all
      .iter()
      .filter(|row| row_matches(&self.columns, *row, filter))
      .collect();

    let count = if filter.is_empty() {
      rows.len().to_string()
    } else {
      format!("{}/{}", rows.len(), all.len())
    };
    let title = if self.query.is_loading() {
      format!(" {} · {} (loading...) ", self.title, subtitle)
    } else if self.query.is_error() {
      format!(" {} · {} (error) ", self.title, subtitle)
    } else if filter.is_empty() {
      format!(" {} · {} ({}) ", self.title, subtitle, count)
    } else {
      format!(" {} · {} ({}) /{} ", self.title, subtitle, count, filter)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if rows.is_empty() {
      let (content, color) = if let Some(e) = self.query.error() {
        (format!("{}\n\nPress 'r' to retry.", e), Color::Red)
      } else if !self.query.state().is_ready() {
        ("Loading...".to_string(), Color::DarkGray)
      } else if !filter.is_empty() {
        (format!("No rows match '{}'.", filter), Color::DarkGray)
      } else {
        (self.empty_message.to_string(), Color::DarkGray)
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color));
      frame.render_widget(paragraph, table_area);
    } else {
      ensure_valid_selection(&mut self.state, rows.len());
      render_table(frame, table_area, block, &self.columns, &rows, &mut self.state);
    }

    if let (Some(line), Some(area)) = (summary, summary_area) {
      frame.render_widget(Paragraph::new(line), area);
    }

    self.search.render_overlay(frame, area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn loaded_panel() -> ListPanel<(), String> {
    let query = Query::new(|_: ()| async {
      Ok(vec![
        "Haircut".to_string(),
        "Beard trim".to_string(),
        "Hair color".to_string(),
      ])
    })
    .with_key(());
    let columns = vec![Column::new("Service", Constraint::Min(10), |s: &String| s.clone())];
    let mut panel = ListPanel::new("Services", query, columns);
    for _ in 0..10 {
      tokio::task::yield_now().await;
    }
    assert!(panel.tick());
    panel
  }

  #[tokio::test]
  async fn test_selection_moves() {
    let mut panel = loaded_panel().await;
    assert_eq!(panel.selected().map(String::as_str), Some("Haircut"));
    panel.handle_key(key(KeyCode::Char('j')));
    assert_eq!(panel.selected().map(String::as_str), Some("Beard trim"));
  }

  #[tokio::test]
  async fn test_filter_narrows_rows() {
    let mut panel = loaded_panel().await;
    panel.handle_key(key(KeyCode::Char('/')));
    for c in "hair".chars() {
      panel.handle_key(key(KeyCode::Char(c)));
    }
    panel.handle_key(key(KeyCode::Enter));

    let visible: Vec<_> = panel.visible_rows().into_iter().cloned().collect();
    assert_eq!(visible, vec!["Haircut", "Hair color"]);
    assert_eq!(panel.rows().len(), 3);
  }

  fn screen(panel: &mut ListPanel<(), String>) -> String {
    let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(60, 8)).unwrap();
    terminal
      .draw(|frame| panel.render(frame, frame.area(), "today", None))
      .unwrap();
    let buffer = terminal.backend().buffer().clone();
    buffer.content().iter().map(|cell| cell.symbol()).collect()
  }

  #[tokio::test]
  async fn test_failed_load_shows_error_and_retry_hint() {
    let query = Query::new(|_: ()| async {
      Err::<Vec<String>, _>(crate::api::RequestError::transport("connection refused"))
    })
    .with_key(());
    let columns = vec![Column::new("Service", Constraint::Min(10), |s: &String| s.clone())];
    let mut panel = ListPanel::new("Services", query, columns);
    assert!(screen(&mut panel).contains("(loading...)"));

    for _ in 0..10 {
      tokio::task::yield_now().await;
    }
    assert!(panel.tick());

    let text = screen(&mut panel);
    assert!(text.contains("(error)"));
    assert!(text.contains("connection refused"));
    assert!(text.contains("Press 'r' to retry."));
  }

  #[tokio::test]
  async fn test_unknown_key_not_handled() {
    let mut panel = loaded_panel().await;
    assert_eq!(panel.handle_key(key(KeyCode::Char('p'))), KeyResult::NotHandled);
  }
}
