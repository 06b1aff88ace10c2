use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::report_write;
use crate::api::types::{EmployeePayment, PaymentStatus};
use crate::api::ApiClient;
use crate::query::{Mutation, Query};
use crate::ui::components::{Column, KeyResult, Notification};
use crate::ui::renderfns::{format_money, payment_status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Payments owed to employees, filtered by status
pub struct PaymentsView {
  api: ApiClient,
  currency: String,
  status: PaymentStatus,
  list: ListPanel<PaymentStatus, EmployeePayment>,
  mark_paid: Mutation<String>,
  notifications: Vec<Notification>,
}

impl PaymentsView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |status: PaymentStatus| {
      let api = api.clone();
      async move { api.payments().list(status).await }
    })
    .with_options(ctx.query_options)
    .with_key(PaymentStatus::Pending);

    let currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Employee", Constraint::Min(16), |p: &EmployeePayment| {
        p.employee_name.clone()
      }),
      Column::new("Period", Constraint::Length(23), |p: &EmployeePayment| {
        format!(
          "{} - {}",
          p.period_start.format("%d %b"),
          p.period_end.format("%d %b %Y")
        )
      }),
      Column::new("Amount", Constraint::Length(12), move |p: &EmployeePayment| {
        format_money(p.amount, &currency)
      })
      .right(),
      Column::new("Status", Constraint::Length(8), |p: &EmployeePayment| {
        p.status.as_str().to_string()
      })
      .styled(|p: &EmployeePayment| Style::default().fg(payment_status_color(p.status))),
      Column::new("Paid at", Constraint::Length(16), |p: &EmployeePayment| {
        p.paid_at
          .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
          .unwrap_or_default()
      }),
    ];

    Self {
      api: ctx.api.clone(),
      currency: ctx.currency.clone(),
      status: PaymentStatus::Pending,
      list: ListPanel::new("Payments", query, columns)
        .with_empty_message("No payments with this status."),
      mark_paid: Mutation::new(),
      notifications: Vec::new(),
    }
  }

  fn toggle_status(&mut self) {
    self.status = match self.status {
      PaymentStatus::Pending => PaymentStatus::Paid,
      PaymentStatus::Paid => PaymentStatus::Pending,
    };
    self.list.set_key(self.status);
  }

  fn pay_selected(&mut self) {
    let Some(payment) = self.list.selected().cloned() else {
      return;
    };
    if payment.status == PaymentStatus::Paid {
      self.notifications.push(Notification::info(format!(
        "{} is already paid",
        payment.employee_name
      )));
      return;
    }

    let api = self.api.clone();
    let amount = format_money(payment.amount, &self.currency);
    let started = self.mark_paid.start(async move {
      api
        .payments()
        .mark_paid(&payment.id)
        .await
        .map(|paid| format!("Paid {} to {}", amount, paid.employee_name))
    });
    if !started {
      self
        .notifications
        .push(Notification::info("A payment is still being recorded"));
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }
    let total: f64 = rows.iter().map(|p| p.amount).sum();
    let mut spans = vec![Span::styled(
      format!(" {} {} total {}", rows.len(), self.status.as_str(), format_money(total, &self.currency)),
      Style::default().fg(payment_status_color(self.status)).bold(),
    )];
    if self.mark_paid.is_pending() {
      spans.push(Span::styled("  saving...", Style::default().fg(Color::DarkGray)));
    }
    Some(Line::from(spans))
  }
}

impl View for PaymentsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.list.handle_key(key) != KeyResult::NotHandled {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Tab => self.toggle_status(),
      KeyCode::Char('p') => self.pay_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let summary = self.summary();
    let subtitle = self.status.as_str();
    self.list.render(frame, area, subtitle, summary);
  }

  fn breadcrumb_label(&self) -> String {
    "Payments".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(format!("{} payments", self.status.as_str()))
  }

  fn captures_input(&self) -> bool {
    self.list.is_filtering()
  }

  fn tick(&mut self) {
    self.list.tick();
    if let Some(outcome) = self.mark_paid.poll() {
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
      ShortcutInfo::new("tab", "pending/paid").with_priority(30),
      ShortcutInfo::new("p", "mark paid").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}
