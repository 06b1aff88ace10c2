use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use std::collections::BTreeMap;

use super::list::ListPanel;
use super::{report_write, step_month};
use crate::api::types::Expense;
use crate::api::ApiClient;
use crate::period::Month;
use crate::query::{Mutation, Query};
use crate::ui::components::{Column, KeyResult, Notification};
use crate::ui::renderfns::{format_money, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Operating expenses for a month.
///
/// Deleting takes two presses of `d` on the same row.
pub struct ExpensesView {
  api: ApiClient,
  currency: String,
  month: Month,
  list: ListPanel<Month, Expense>,
  delete: Mutation<String>,
  /// Expense id armed for deletion by the first `d`
  confirm_delete: Option<String>,
  notifications: Vec<Notification>,
}

impl ExpensesView {
  pub fn new(ctx: &ViewContext) -> Self {
    let month = Month::of(ctx.start_date);

    let api = ctx.api.clone();
    let query = Query::new(move |month: Month| {
      let api = api.clone();
      async move { api.expenses().list(month).await }
    })
    .with_options(ctx.query_options)
    .with_key(month);

    let currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Date", Constraint::Length(10), |e: &Expense| {
        e.date.format("%Y-%m-%d").to_string()
      }),
      Column::new("Category", Constraint::Length(14), |e: &Expense| e.category.clone())
        .styled(|_| Style::default().fg(Color::Cyan)),
      Column::new("Description", Constraint::Min(20), |e: &Expense| {
        truncate(&e.description, 60)
      }),
      Column::new("Amount", Constraint::Length(12), move |e: &Expense| {
        format_money(e.amount, &currency)
      })
      .right()
      .styled(|_| Style::default().fg(Color::Red)),
    ];

    Self {
      api: ctx.api.clone(),
      currency: ctx.currency.clone(),
      month,
      list: ListPanel::new("Expenses", query, columns)
        .with_empty_message("No expenses recorded this month."),
      delete: Mutation::new(),
      confirm_delete: None,
      notifications: Vec::new(),
    }
  }

  fn delete_selected(&mut self) {
    let Some(expense) = self.list.selected().cloned() else {
      return;
    };

    if self.confirm_delete.as_deref() != Some(expense.id.as_str()) {
      self.notifications.push(Notification::info(format!(
        "Press d again to delete {} ({})",
        expense.category,
        format_money(expense.amount, &self.currency)
      )));
      self.confirm_delete = Some(expense.id);
      return;
    }
    self.confirm_delete = None;

    let api = self.api.clone();
    let label = format!("Deleted {} expense", expense.category);
    let started = self.delete.start(async move {
      api.expenses().delete(&expense.id).await.map(|()| label)
    });
    if !started {
      self
        .notifications
        .push(Notification::info("Still deleting the previous expense"));
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }

    let mut by_category: BTreeMap<&str, f64> = BTreeMap::new();
    for e in rows {
      *by_category.entry(e.category.as_str()).or_default() += e.amount;
    }
    let total: f64 = by_category.values().sum();

    let mut spans = vec![Span::styled(
      format!(" total {}", format_money(total, &self.currency)),
      Style::default().fg(Color::Red).bold(),
    )];
    for (category, amount) in by_category {
      spans.push(Span::styled(
        format!("  {} {}", category, format_money(amount, &self.currency)),
        Style::default().fg(Color::DarkGray),
      ));
    }
    Some(Line::from(spans))
  }

  fn set_month(&mut self, month: Month) {
    self.month = month;
    self.confirm_delete = None;
    self.list.set_key(month);
  }
}

impl View for ExpensesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code != KeyCode::Char('d') {
      self.confirm_delete = None;
    }

    if self.list.handle_key(key) != KeyResult::NotHandled {
      return ViewAction::None;
    }

    if let Some(month) = step_month(&key, self.month) {
      self.set_month(month);
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('d') => self.delete_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let summary = self.summary();
    self.list.render(frame, area, &self.month.label(), summary);
  }

  fn breadcrumb_label(&self) -> String {
    "Expenses".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(self.month.label())
  }

  fn captures_input(&self) -> bool {
    self.list.is_filtering()
  }

  fn tick(&mut self) {
    self.list.tick();
    if let Some(outcome) = self.delete.poll() {
      if report_write(outcome, &mut self.notifications) {
        self.list.reload();
      }
    }
  }

  fn take_notifications(&mut self) -> Vec<Notification> {
    std::mem::take(&mut self.notifications)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("h/l", "month").with_priority(30),
      ShortcutInfo::new("d", "delete").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}
