use crate::api::types::User;
use crate::commands;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult, Notification, Notifications};
use crate::ui::view::{View, ViewAction, ViewContext};
use crate::ui::views;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const DEFAULT_VIEW: &str = "dashboard";

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Command palette (after pressing :)
  command_input: CommandInput,

  /// Toasts shown in the footer
  notifications: Notifications,

  /// Shared by every view the app opens
  ctx: ViewContext,

  /// Header title
  title: String,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  /// Build the app on `initial_view`, or the dashboard when it is missing
  /// or not available to the signed-in role.
  pub fn new(ctx: ViewContext, title: String, initial_view: Option<&str>) -> Self {
    let mut app = Self {
      view_stack: Vec::new(),
      command_input: CommandInput::new(ctx.user.role),
      notifications: Notifications::new(),
      ctx,
      title,
      should_quit: false,
    };

    let requested = initial_view.unwrap_or(DEFAULT_VIEW);
    if !app.open_root(requested) {
      app.open_root(DEFAULT_VIEW);
    }
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // While a view edits text, `:` is just a character
    let view_captures = self
      .view_stack
      .last()
      .is_some_and(|view| view.captures_input());

    if self.command_input.is_active() || !view_captures {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let Some(view) = self.view_stack.last_mut() else {
      return;
    };
    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
    self.collect_notifications();
  }

  fn execute_command(&mut self, name: &str) {
    if name.is_empty() {
      return;
    }
    if commands::find(name).is_some_and(|cmd| cmd.name == "quit") {
      self.should_quit = true;
      return;
    }
    if !self.open_root(name) {
      self.collect_notifications();
    }
  }

  /// Replace the whole stack with the view a command names.
  /// Refused commands leave the stack alone and raise an error toast.
  fn open_root(&mut self, name: &str) -> bool {
    let role = self.ctx.user.role;
    let Some(cmd) = commands::find(name) else {
      warn!(command = name, "Unknown command");
      self
        .notifications
        .push(Notification::error(format!("Unknown command: {}", name)));
      return false;
    };
    if !cmd.allows(role) {
      warn!(command = cmd.name, role = role.label(), "Command not permitted");
      self.notifications.push(Notification::error(format!(
        "{} is not available to {}",
        cmd.name,
        role.label()
      )));
      return false;
    }

    let Some(view) = views::open(cmd.name, &self.ctx) else {
      return false;
    };
    info!(view = cmd.name, "Opening view");
    self.view_stack.clear();
    self.view_stack.push(view);
    true
  }

  fn tick(&mut self) {
    for view in self.view_stack.iter_mut() {
      view.tick();
    }
    self.collect_notifications();
    self.notifications.prune();
  }

  fn collect_notifications(&mut self) {
    for view in self.view_stack.iter_mut() {
      for notification in view.take_notifications() {
        self.notifications.push(notification);
      }
    }
  }

  pub fn user(&self) -> &User {
    &self.ctx.user
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }

  pub fn toast(&self) -> Option<Line<'static>> {
    self.notifications.line()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::services::testing::client_for;
  use crate::api::types::Role;
  use crate::query::QueryOptions;
  use chrono::NaiveDate;

  // Nothing listens here; views start in the loading state and stay there.
  const NOWHERE: &str = "http://127.0.0.1:9";

  fn app_for(role: Role, initial: Option<&str>) -> App {
    let ctx = ViewContext {
      api: client_for(NOWHERE),
      user: User {
        id: "e1".to_string(),
        name: "Ana".to_string(),
        email: None,
        role,
      },
      query_options: QueryOptions::default(),
      currency: "$".to_string(),
      start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    };
    App::new(ctx, "Main St".to_string(), initial)
  }

  fn type_keys(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
    }
  }

  fn enter(app: &mut App) {
    app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
  }

  fn toast_text(app: &App) -> Option<String> {
    app.notifications.current().map(|n| n.message.clone())
  }

  #[tokio::test]
  async fn test_starts_on_dashboard() {
    let app = app_for(Role::Admin, None);
    assert_eq!(app.breadcrumb(), vec!["Dashboard".to_string()]);
  }

  #[tokio::test]
  async fn test_command_replaces_root_view() {
    let mut app = app_for(Role::Supervisor, None);
    type_keys(&mut app, ":sales");
    enter(&mut app);
    assert_eq!(app.breadcrumb(), vec!["Sales".to_string()]);
  }

  #[tokio::test]
  async fn test_operator_cannot_open_payments() {
    let mut app = app_for(Role::Operator, None);
    type_keys(&mut app, ":payments");
    enter(&mut app);

    assert_eq!(app.breadcrumb(), vec!["Dashboard".to_string()]);
    assert_eq!(
      toast_text(&app).as_deref(),
      Some("payments is not available to operator")
    );
  }

  #[tokio::test]
  async fn test_forbidden_initial_view_falls_back() {
    let app = app_for(Role::Supervisor, Some("expenses"));
    assert_eq!(app.breadcrumb(), vec!["Dashboard".to_string()]);
    assert!(toast_text(&app).is_some());
  }

  #[tokio::test]
  async fn test_unknown_command() {
    let mut app = app_for(Role::Admin, Some("agenda"));
    app.execute_command("haircuts");
    assert_eq!(toast_text(&app).as_deref(), Some("Unknown command: haircuts"));
    assert_eq!(app.breadcrumb(), vec!["Agenda".to_string()]);
  }

  #[tokio::test]
  async fn test_q_at_root_quits() {
    let mut app = app_for(Role::Admin, None);
    type_keys(&mut app, "q");
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let mut app = app_for(Role::Operator, None);
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_colon_goes_to_filter_while_filtering() {
    let mut app = app_for(Role::Admin, Some("services"));
    type_keys(&mut app, "/a:b");
    assert!(!app.command_input.is_active());
  }
}
