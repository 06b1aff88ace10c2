use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::step_day;
use crate::api::types::ServiceRecord;
use crate::query::Query;
use crate::ui::components::{Column, KeyResult};
use crate::ui::renderfns::{date_label, format_money, time_label};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Services performed on a day
pub struct ServicesView {
  date: NaiveDate,
  currency: String,
  list: ListPanel<NaiveDate, ServiceRecord>,
}

impl ServicesView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |date: NaiveDate| {
      let api = api.clone();
      async move { api.services().list(date).await }
    })
    .with_options(ctx.query_options)
    .with_key(ctx.start_date);

    let currency = ctx.currency.clone();
    let commission_currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Time", Constraint::Length(5), |s: &ServiceRecord| {
        time_label(&s.performed_at)
      }),
      Column::new("Employee", Constraint::Min(14), |s: &ServiceRecord| {
        s.employee_name.clone()
      }),
      Column::new("Service", Constraint::Min(18), |s: &ServiceRecord| {
        s.service_name.clone()
      }),
      Column::new("Paid with", Constraint::Length(10), |s: &ServiceRecord| {
        s.payment_method.clone().unwrap_or_default()
      }),
      Column::new("Price", Constraint::Length(12), move |s: &ServiceRecord| {
        format_money(s.price, &currency)
      })
      .right(),
      Column::new("Commission", Constraint::Length(12), move |s: &ServiceRecord| {
        format_money(s.commission, &commission_currency)
      })
      .right()
      .styled(|_| Style::default().fg(Color::DarkGray)),
    ];

    Self {
      date: ctx.start_date,
      currency: ctx.currency.clone(),
      list: ListPanel::new("Services", query, columns)
        .with_empty_message("No services registered on this day."),
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }
    let total: f64 = rows.iter().map(|s| s.price).sum();
    Some(Line::from(vec![
      Span::styled(format!(" {} services  ", rows.len()), Style::default().fg(Color::DarkGray)),
      Span::styled(
        format!("total {}", format_money(total, &self.currency)),
        Style::default().fg(Color::Green).bold(),
      ),
    ]))
  }
}

impl View for ServicesView {
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
    "Services".to_string()
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
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("h/l", "day").with_priority(30),
      ShortcutInfo::new("t", "today").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}
