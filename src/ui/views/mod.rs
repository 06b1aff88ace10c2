mod agenda;
mod dashboard;
mod expenses;
mod income;
mod inventory;
mod list;
mod payments;
mod sales;
mod services;

pub use agenda::AgendaView;
pub use dashboard::DashboardView;
pub use expenses::ExpensesView;
pub use income::IncomeView;
pub use inventory::InventoryView;
pub use payments::PaymentsView;
pub use sales::SalesView;
pub use services::ServicesView;

use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::warn;

use crate::api::RequestError;
use crate::period::{shift_days, Month};
use crate::ui::components::Notification;
use crate::ui::view::{View, ViewContext};

/// Build the root view for a command name.
pub fn open(name: &str, ctx: &ViewContext) -> Option<Box<dyn View>> {
  let view: Box<dyn View> = match name {
    "dashboard" => Box::new(DashboardView::new(ctx)),
    "services" => Box::new(ServicesView::new(ctx)),
    "agenda" => Box::new(AgendaView::new(ctx)),
    "sales" => Box::new(SalesView::new(ctx)),
    "inventory" => Box::new(InventoryView::new(ctx)),
    "income" => Box::new(IncomeView::new(ctx)),
    "payments" => Box::new(PaymentsView::new(ctx)),
    "expenses" => Box::new(ExpensesView::new(ctx)),
    _ => return None,
  };
  Some(view)
}

pub(crate) fn today() -> NaiveDate {
  Local::now().date_naive()
}

/// Day navigation shared by the dated pages: h/l step, t jumps to today.
pub(crate) fn step_day(key: &KeyEvent, date: NaiveDate) -> Option<NaiveDate> {
  match key.code {
    KeyCode::Char('h') | KeyCode::Left => Some(shift_days(date, -1)),
    KeyCode::Char('l') | KeyCode::Right => Some(shift_days(date, 1)),
    KeyCode::Char('t') => Some(today()),
    _ => None,
  }
}

/// Month navigation: h/l step, t jumps to the current month.
pub(crate) fn step_month(key: &KeyEvent, month: Month) -> Option<Month> {
  match key.code {
    KeyCode::Char('h') | KeyCode::Left => Some(month.prev()),
    KeyCode::Char('l') | KeyCode::Right => Some(month.next()),
    KeyCode::Char('t') => Some(Month::of(today())),
    _ => None,
  }
}

/// Same day of month in another month, clamped to its last day.
pub(crate) fn same_day_in(month: Month, day: u32) -> NaiveDate {
  let first = month.first_day();
  let last = shift_days(month.next().first_day(), -1);
  first
    .with_day(day.min(last.day()))
    .unwrap_or(first)
}

/// Turn a finished write into a toast. Returns `true` if it succeeded.
pub(crate) fn report_write(
  outcome: Result<String, RequestError>,
  notifications: &mut Vec<Notification>,
) -> bool {
  match outcome {
    Ok(message) => {
      notifications.push(Notification::success(message));
      true
    }
    Err(e) if e.is_cancelled() => false,
    Err(e) => {
      warn!(status = ?e.status, "Write failed: {}", e);
      notifications.push(Notification::error(e.message));
      false
    }
  }
}
