use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;

use super::list::ListPanel;
use super::report_write;
use crate::api::types::Product;
use crate::api::ApiClient;
use crate::query::{Mutation, Query};
use crate::ui::components::{Column, KeyResult, Notification};
use crate::ui::renderfns::format_money;
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

fn stock_style(p: &Product) -> Style {
  if p.is_low_stock() {
    Style::default().fg(Color::Red).bold()
  } else {
    Style::default()
  }
}

/// Products and stock levels; low rows are highlighted
pub struct InventoryView {
  api: ApiClient,
  list: ListPanel<(), Product>,
  adjust: Mutation<String>,
  notifications: Vec<Notification>,
}

impl InventoryView {
  pub fn new(ctx: &ViewContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::new(move |_: ()| {
      let api = api.clone();
      async move { api.inventory().list().await }
    })
    .with_options(ctx.query_options)
    .with_key(());

    let currency = ctx.currency.clone();
    let columns = vec![
      Column::new("Product", Constraint::Min(20), |p: &Product| p.name.clone()).styled(stock_style),
      Column::new("Category", Constraint::Length(14), |p: &Product| {
        p.category.clone().unwrap_or_default()
      }),
      Column::new("Stock", Constraint::Length(6), |p: &Product| p.stock.to_string())
        .right()
        .styled(stock_style),
      Column::new("Min", Constraint::Length(5), |p: &Product| p.min_stock.to_string())
        .right()
        .styled(|_| Style::default().fg(Color::DarkGray)),
      Column::new("Price", Constraint::Length(10), move |p: &Product| {
        format_money(p.price, &currency)
      })
      .right(),
    ];

    Self {
      api: ctx.api.clone(),
      list: ListPanel::new("Inventory", query, columns).with_empty_message("No products yet."),
      adjust: Mutation::new(),
      notifications: Vec::new(),
    }
  }

  fn adjust_selected(&mut self, delta: i64) {
    let Some(product) = self.list.selected().cloned() else {
      return;
    };
    if product.stock + delta < 0 {
      self
        .notifications
        .push(Notification::error(format!("{} is out of stock", product.name)));
      return;
    }

    let api = self.api.clone();
    let started = self.adjust.start(async move {
      api
        .inventory()
        .adjust_stock(&product.id, delta)
        .await
        .map(|p| format!("{} stock is now {}", p.name, p.stock))
    });
    if !started {
      self
        .notifications
        .push(Notification::info("Still saving the previous change"));
    }
  }

  fn summary(&self) -> Option<Line<'static>> {
    let low = self.list.rows().iter().filter(|p| p.is_low_stock()).count();
    (low > 0).then(|| {
      Line::from(Span::styled(
        format!(" {} product(s) at or below minimum stock", low),
        Style::default().fg(Color::Red),
      ))
    })
  }
}

impl View for InventoryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.list.handle_key(key) != KeyResult::NotHandled {
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_selected(1),
      KeyCode::Char('-') => self.adjust_selected(-1),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let summary = self.summary();
    self.list.render(frame, area, "all products", summary);
  }

  fn breadcrumb_label(&self) -> String {
    "Inventory".to_string()
  }

  fn captures_input(&self) -> bool {
    self.list.is_filtering()
  }

  fn tick(&mut self) {
    self.list.tick();
    if let Some(outcome) = self.adjust.poll() {
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
      ShortcutInfo::new("+/-", "stock").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(50),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_low_stock_is_highlighted() {
    let low = Product {
      id: "p1".to_string(),
      name: "Pomade".to_string(),
      stock: 1,
      min_stock: 3,
      price: 12.0,
      category: None,
    };
    let plenty = Product {
      stock: 10,
      ..low.clone()
    };
    assert_eq!(stock_style(&low).fg, Some(Color::Red));
    assert_eq!(stock_style(&plenty), Style::default());
  }
}
