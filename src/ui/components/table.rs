use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Row, Table, TableState};

type CellFn<T> = Box<dyn Fn(&T) -> String>;
type StyleFn<T> = Box<dyn Fn(&T) -> Style>;

/// Typed column descriptor: a title, a width, and how to render a row.
pub struct Column<T> {
  pub title: &'static str,
  pub width: Constraint,
  value: CellFn<T>,
  style: Option<StyleFn<T>>,
  right_aligned: bool,
}

impl<T> Column<T> {
  pub fn new(title: &'static str, width: Constraint, value: impl Fn(&T) -> String + 'static) -> Self {
    Self {
      title,
      width,
      value: Box::new(value),
      style: None,
      right_aligned: false,
    }
  }

  /// Per-row style for this column's cells
  pub fn styled(mut self, style: impl Fn(&T) -> Style + 'static) -> Self {
    self.style = Some(Box::new(style));
    self
  }

  /// Right-align, for amounts
  pub fn right(mut self) -> Self {
    self.right_aligned = true;
    self
  }

  pub fn text(&self, row: &T) -> String {
    (self.value)(row)
  }

  fn cell(&self, row: &T) -> Cell<'static> {
    let mut text = Text::from(self.text(row));
    if self.right_aligned {
      text = text.alignment(Alignment::Right);
    }
    let style = self.style.as_ref().map(|f| f(row)).unwrap_or_default();
    Cell::from(text).style(style)
  }

  fn header(&self) -> Cell<'static> {
    let mut text = Text::from(self.title);
    if self.right_aligned {
      text = text.alignment(Alignment::Right);
    }
    Cell::from(text)
  }
}

/// Case-insensitive match of `needle` against any rendered cell of `row`.
pub fn row_matches<T>(columns: &[Column<T>], row: &T, needle: &str) -> bool {
  let needle = needle.trim().to_lowercase();
  needle.is_empty()
    || columns
      .iter()
      .any(|col| col.text(row).to_lowercase().contains(&needle))
}

/// Draw `rows` as a table with a bold header and a highlighted selection.
pub fn render_table<T>(
  frame: &mut Frame,
  area: Rect,
  block: Block,
  columns: &[Column<T>],
  rows: &[&T],
  state: &mut TableState,
) {
  let header = Row::new(columns.iter().map(Column::header))
    .style(Style::default().fg(Color::Yellow).bold())
    .bottom_margin(0);

  let body: Vec<Row> = rows
    .iter()
    .map(|row| Row::new(columns.iter().map(|col| col.cell(row))))
    .collect();

  let table = Table::new(body, columns.iter().map(|c| c.width))
    .header(header)
    .block(block)
    .column_spacing(2)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(table, area, state);
}
