use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::step_day;
use crate::api::types::Income;
use crate::query::Query;
use crate::ui::components::{Column, KeyResult};
use crate::ui::renderfns::{date_label, format_money};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Additional income (rentals, tips pool, one-offs) on a day
pub struct IncomeView {
  date: NaiveDate,
  currency: String,
  list: ListPanel<NaiveDate, Income>,
}

impl IncomeView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |date: NaiveDate| {
      let api = api.clone();
      async move { api.income().list(date).await }
    })
    .with_options(ctx.query_options)
    .with_key(ctx.start_date);

    let currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Description", Constraint::Min(24), |i: &Income| i.description.clone()),
      Column::new("Source", Constraint::Min(12), |i: &Income| {
        i.source.clone().unwrap_or_default()
      }),
      Column::new("Amount", Constraint::Length(12), move |i: &Income| {
        format_money(i.amount, &currency)
      })
      .right()
      .styled(|_| Style::default().fg(Color::Green)),
    ];

    Self {
      date: ctx.start_date,
      currency: ctx.currency.clone(),
      list: ListPanel::new("Income", query, columns)
        .with_empty_message("No additional income on this day."),
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }
    let total: f64 = rows.iter().map(|i| i.amount).sum();
    Some(Line::from(Span::styled(
      format!(" total {}", format_money(total, &self.currency)),
      Style::default().fg(Color::Green).bold(),
    )))
  }
}

impl View for IncomeView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.list.handle_key(key) != KeyResult::NotHandled {
      return ViewAction::None;
    }

    if let Some(date) = step_day(&key, self.date) {
      self.date = date;
      self.list.set_key(date);
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let summary = self.summary();
    self.list.render(frame, area, &date_label(self.date), summary);
  }

  fn breadcrumb_label(&self) -> String {
    "Income".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(date_label(self.date))
  }

  fn captures_input(&self) -> bool {
    self.list.is_filtering()
  }

  fn tick(&mut self) {
    self.list.tick();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("h/l", "day").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}
