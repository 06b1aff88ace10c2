//! Toast messages shown in the footer after writes and refusals.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::prelude::*;

const DEFAULT_LIFETIME: Duration = Duration::from_secs(4);
const ERROR_LIFETIME: Duration = Duration::from_secs(8);
const MAX_QUEUED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
  Info,
  Success,
  Error,
}

impl NotificationLevel {
  pub fn color(&self) -> Color {
    match self {
      NotificationLevel::Info => Color::Cyan,
      NotificationLevel::Success => Color::Green,
      NotificationLevel::Error => Color::Red,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub level: NotificationLevel,
  pub message: String,
}

impl Notification {
  pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
    Self {
      level,
      message: message.into(),
    }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self::new(NotificationLevel::Info, message)
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self::new(NotificationLevel::Success, message)
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(NotificationLevel::Error, message)
  }

  fn lifetime(&self) -> Duration {
    match self.level {
      NotificationLevel::Error => ERROR_LIFETIME,
      _ => DEFAULT_LIFETIME,
    }
  }
}

/// Queue of live toasts; the newest one is displayed.
#[derive(Debug, Default)]
pub struct Notifications {
  items: VecDeque<(Notification, Instant)>,
}

impl Notifications {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, notification: Notification) {
    self.push_at(notification, Instant::now());
  }

  fn push_at(&mut self, notification: Notification, now: Instant) {
    tracing::debug!(level = ?notification.level, message = %notification.message, "Notification");
    self.items.push_back((notification, now));
    while self.items.len() > MAX_QUEUED {
      self.items.pop_front();
    }
  }

  /// Drop expired toasts.
  pub fn prune(&mut self) {
    self.prune_at(Instant::now());
  }

  fn prune_at(&mut self, now: Instant) {
    self
      .items
      .retain(|(n, created)| now.duration_since(*created) < n.lifetime());
  }

  pub fn current(&self) -> Option<&Notification> {
    self.items.back().map(|(n, _)| n)
  }

  /// Footer line for the current toast
  pub fn line(&self) -> Option<Line<'static>> {
    self.current().map(|n| {
      Line::from(Span::styled(
        format!(" {} ", n.message),
        Style::default().fg(Color::Black).bg(n.level.color()),
      ))
    })
  }
}
