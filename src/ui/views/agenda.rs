use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::{report_write, step_day};
use crate::api::types::{Appointment, AppointmentStatus};
use crate::api::ApiClient;
use crate::query::{Mutation, Query};
use crate::ui::components::{Column, KeyResult, Notification};
use crate::ui::renderfns::{appointment_status_color, date_label, time_label, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Appointments booked for a day.
pub struct AgendaView {
  api: ApiClient,
  date: NaiveDate,
  list: ListPanel<NaiveDate, Appointment>,
  update: Mutation<String>,
  notifications: Vec<Notification>,
}

impl AgendaView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |date: NaiveDate| {
      let api = api.clone();
      async move { api.appointments().list(date).await }
    })
    .with_options(ctx.query_options)
    .with_key(ctx.start_date);

    let columns = vec![
      Column::new("Time", Constraint::Length(11), |a: &Appointment| {
        format!("{}-{}", time_label(&a.start), time_label(&a.end))
      }),
      Column::new("Client", Constraint::Min(16), |a: &Appointment| a.client_name.clone()),
      Column::new("Service", Constraint::Min(16), |a: &Appointment| a.service_name.clone()),
      Column::new("With", Constraint::Length(14), |a: &Appointment| a.employee_name.clone()),
      Column::new("Status", Constraint::Length(10), |a: &Appointment| {
        a.status.as_str().to_string()
      })
      .styled(|a: &Appointment| Style::default().fg(appointment_status_color(a.status))),
      Column::new("Notes", Constraint::Min(10), |a: &Appointment| {
        a.notes.as_deref().map(|n| truncate(n, 40)).unwrap_or_default()
      })
      .styled(|_| Style::default().fg(Color::DarkGray)),
    ];

    Self {
      api: ctx.api.clone(),
      date: ctx.start_date,
      list: ListPanel::new("Agenda", query, columns)
        .with_empty_message("No appointments booked for this day."),
      update: Mutation::new(),
      notifications: Vec::new(),
    }
  }

  fn set_selected_status(&mut self, status: AppointmentStatus) {
    let Some(appt) = self.list.selected().cloned() else {
      return;
    };
    if appt.status != AppointmentStatus::Scheduled {
      self.notifications.push(Notification::info(format!(
        "Appointment for {} is already {}",
        appt.client_name,
        appt.status.as_str()
      )));
      return;
    }

    let api = self.api.clone();
    let started = self.update.start(async move {
      api
        .appointments()
        .set_status(&appt.id, status)
        .await
        .map(|a| format!("{} marked {}", a.client_name, a.status.as_str()))
    });
    if !started {
      self
        .notifications
        .push(Notification::info("Still saving the previous change"));
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let rows = self.list.rows();
    if rows.is_empty() {
      return None;
    }

    let count = |status: AppointmentStatus| rows.iter().filter(|a| a.status == status).count();
    let spans = [
      AppointmentStatus::Scheduled,
      AppointmentStatus::Completed,
      AppointmentStatus::Cancelled,
    ]
    .into_iter()
    .map(|status| {
      Span::styled(
        format!(" {} {} ", count(status), status.as_str()),
        Style::default().fg(appointment_status_color(status)),
      )
    })
    .collect::<Vec<_>>();
    Some(Line::from(spans))
  }
}

impl View for AgendaView {
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
      KeyCode::Char('c') => self.set_selected_status(AppointmentStatus::Completed),
      KeyCode::Char('x') => self.set_selected_status(AppointmentStatus::Cancelled),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let summary = self.summary();
    self.list.render(frame, area, &date_label(self.date), summary);
  }

  fn breadcrumb_label(&self) -> String {
    "Agenda".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(date_label(self.date))
  }

  fn captures_input(&self) -> bool {
    self.list.is_filtering()
  }

  fn tick(&mut self) {
    self.list.tick();
    if let Some(outcome) = self.update.poll() {
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
      ShortcutInfo::new("h/l", "day").with_priority(30),
      ShortcutInfo::new("c", "complete").with_priority(40),
      ShortcutInfo::new("x", "cancel").with_priority(41),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}
