use chrono::NaiveDate;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::api::types::User;
use crate::api::ApiClient;
use crate::query::QueryOptions;
use crate::ui::components::Notification;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Everything a view needs to build its queries and render amounts.
#[derive(Clone)]
pub struct ViewContext {
  pub api: ApiClient,
  pub user: User,
  pub query_options: QueryOptions,
  pub currency: String,
  /// Day the dated views open on
  pub start_date: NaiveDate,
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
}

/// Trait for view behavior
///
/// Views handle their own input modes (filter, confirmations) and return
/// actions for the App to execute: App → View → Components.
///
/// Views that load data asynchronously use `Query<K, T>` internally and
/// poll it in `tick()`.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// What the view is showing right now, for the header (a day, a month)
  fn context(&self) -> Option<String> {
    None
  }

  /// True while the view is editing text, so `:` belongs to the view
  fn captures_input(&self) -> bool {
    false
  }

  /// Called on each tick to allow views to poll async queries
  fn tick(&mut self) {}

  /// Toasts raised since the last call, e.g. by a finished write
  fn take_notifications(&mut self) -> Vec<Notification> {
    Vec::new()
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "filter").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
