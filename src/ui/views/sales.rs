use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::step_day;
use crate::api::types::Sale;
use crate::query::Query;
use crate::ui::components::{Column, KeyResult};
use crate::ui::renderfns::{date_label, format_money, time_label};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Product sales on a day
pub struct SalesView {
  date: NaiveDate,
  currency: String,
  list: ListPanel<NaiveDate, Sale>,
}

impl SalesView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |date: NaiveDate| {
      let api = api.clone();
      async move { api.sales().list(date).await }
    })
    .with_options(ctx.query_options)
    .with_key(ctx.start_date);

    let unit_currency = ctx.currency.clone();
    let total_currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Time", Constraint::Length(5), |s: &Sale| time_label(&s.sold_at)),
      Column::new("Product", Constraint::Min(18), |s: &Sale| s.product_name.clone()),
      Column::new("Qty", Constraint::Length(4), |s: &Sale| s.quantity.to_string()).right(),
      Column::new("Unit", Constraint::Length(10), move |s: &Sale| {
        format_money(s.unit_price, &unit_currency)
      })
      .right(),
      Column::new("Total", Constraint::Length(12), move |s: &Sale| {
        format_money(s.total, &total_currency)
      })
      .right()
      .styled(|_| Style::default().fg(Color::Green)),
      Column::new("Sold by", Constraint::Min(12), |s: &Sale| {
        s.employee_name.clone().unwrap_or_else(|| "-".to_string())
      }),
    ];

    Self {
      date: ctx.start_date,
      currency: ctx.currency.clone(),
      list: ListPanel::new("Sales", query, columns).with_empty_message("No sales on this day."),
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }
    let units: u32 = rows.iter().map(|s| s.quantity).sum();
    let total: f64 = rows.iter().map(|s| s.total).sum();
    Some(Line::from(vec![
      Span::styled(format!(" {} units  ", units), Style::default().fg(Color::DarkGray)),
      Span::styled(
        format!("total {}", format_money(total, &self.currency)),
        Style::default().fg(Color::Green).bold(),
      ),
    ]))
  }
}

impl View for SalesView {
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
    "Sales".to_string()
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
