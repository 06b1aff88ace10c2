use chrono::{DateTime, Local, NaiveDate, Utc};
use ratatui::prelude::Color;

use crate::api::types::{AppointmentStatus, PaymentStatus};

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Format an amount with thousands separators and two decimals: `$1,234.50`
pub fn format_money(amount: f64, currency: &str) -> String {
  let cents = (amount.abs() * 100.0).round() as u64;
  let whole = (cents / 100).to_string();
  let frac = cents % 100;

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, ch) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }

  let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
  format!("{}{}{}.{:02}", sign, currency, grouped, frac)
}

/// Day label used in titles: `Sat 01 Jun 2024`
pub fn date_label(date: NaiveDate) -> String {
  date.format("%a %d %b %Y").to_string()
}

/// Local wall-clock time of a backend timestamp: `14:30`
pub fn time_label(at: &DateTime<Utc>) -> String {
  at.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn payment_status_color(status: PaymentStatus) -> Color {
  match status {
    PaymentStatus::Paid => Color::Green,
    PaymentStatus::Pending => Color::Yellow,
  }
}

pub fn appointment_status_color(status: AppointmentStatus) -> Color {
  match status {
    AppointmentStatus::Completed => Color::Green,
    AppointmentStatus::Cancelled => Color::Red,
    AppointmentStatus::Scheduled => Color::White,
  }
}
