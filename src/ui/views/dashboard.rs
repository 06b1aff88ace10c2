use chrono::{Datelike, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Sparkline, TableState};

use super::{same_day_in, step_day};
use crate::api::types::{DailyEarnings, EmployeeEarnings, MonthlyEarnings, Role, User};
use crate::period::Month;
use crate::query::{Query, QueryState};
use crate::ui::components::{render_table, Column};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{date_label, format_money};
use crate::ui::view::{ShortcutInfo, View, ViewAction, ViewContext};

/// Earnings overview for a day, plus the month it falls in.
///
/// Operators only see their own row; shop-wide totals and the monthly
/// panel are for admins and supervisors.
pub struct DashboardView {
  user: User,
  currency: String,
  date: NaiveDate,
  daily: Query<NaiveDate, DailyEarnings>,
  monthly: Option<Query<Month, MonthlyEarnings>>,
  columns: Vec<Column<EmployeeEarnings>>,
  table_state: TableState,
}

impl DashboardView {
  pub fn new(ctx: &ViewContext) -> Self {
    let date = ctx.start_date;

    let api = ctx.api.clone();
    let daily = Query::new(move |date: NaiveDate| {
      let api = api.clone();
      async move { api.earnings().daily(date).await }
    })
    .with_options(ctx.query_options)
    .with_key(date);

    let monthly = (ctx.user.role != Role::Operator).then(|| {
      let api = ctx.api.clone();
      Query::new(move |month: Month| {
        let api = api.clone();
        async move { api.earnings().monthly(month).await }
      })
      .with_options(ctx.query_options)
      .with_key(Month::of(date))
    });

    Self {
      user: ctx.user.clone(),
      currency: ctx.currency.clone(),
      date,
      daily,
      monthly,
      columns: employee_columns(&ctx.currency),
      table_state: TableState::default().with_selected(Some(0)),
    }
  }

  fn set_date(&mut self, date: NaiveDate) {
    self.date = date;
    self.daily.set_key(date);
    if let Some(monthly) = &mut self.monthly {
      monthly.set_key(Month::of(date));
    }
  }

  fn money(&self, amount: f64) -> String {
    format_money(amount, &self.currency)
  }

  /// Rows this user may see
  fn visible_employees<'a>(&self, daily: &'a DailyEarnings) -> Vec<&'a EmployeeEarnings> {
    visible_rows(&self.user, daily)
  }

  fn render_totals(&self, frame: &mut Frame, area: Rect, daily: &DailyEarnings) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let value = |amount: f64, color: Color| {
      Span::styled(format!("{:>14}", self.money(amount)), Style::default().fg(color).bold())
    };

    let lines = if self.user.role == Role::Operator {
      let own = self.visible_employees(daily);
      let services: u32 = own.iter().map(|e| e.services_count).sum();
      let commission: f64 = own.iter().map(|e| e.commission).sum();
      let tips: f64 = own.iter().map(|e| e.tips).sum();
      vec![
        Line::from(vec![label(" Services   "), Span::raw(format!("{:>14}", services))]),
        Line::from(vec![label(" Commission "), value(commission, Color::White)]),
        Line::from(vec![label(" Tips       "), value(tips, Color::White)]),
        Line::from(vec![label(" You earned "), value(commission + tips, Color::Green)]),
      ]
    } else {
      let net_color = if daily.net() >= 0.0 { Color::Green } else { Color::Red };
      vec![
        Line::from(vec![label(" Services   "), value(daily.services_total, Color::White)]),
        Line::from(vec![label(" Sales      "), value(daily.sales_total, Color::White)]),
        Line::from(vec![label(" Income     "), value(daily.income_total, Color::White)]),
        Line::from(vec![label(" Expenses   "), value(daily.expenses_total, Color::Red)]),
        Line::from(vec![label(" Net        "), value(daily.net(), net_color)]),
      ]
    };

    let block = Block::default()
      .title(" Day ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn render_daily(&mut self, frame: &mut Frame, area: Rect) {
    let title = format!(" Earnings · {} ", date_label(self.date));
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let daily = match self.daily.state() {
      QueryState::Ready(daily) => daily.clone(),
      QueryState::Error(e) => {
        let text = format!("{}\n\nPress 'r' to retry.", e);
        frame.render_widget(
          Paragraph::new(text).block(block).style(Style::default().fg(Color::Red)),
          area,
        );
        return;
      }
      QueryState::Loading | QueryState::Idle => {
        frame.render_widget(
          Paragraph::new("Loading...")
            .block(block)
            .style(Style::default().fg(Color::DarkGray)),
          area,
        );
        return;
      }
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [totals_area, table_area] =
      Layout::horizontal([Constraint::Length(30), Constraint::Min(20)]).areas(inner);
    self.render_totals(frame, totals_area, &daily);

    let rows = self.visible_employees(&daily);
    let table_block = Block::default()
      .title(" By employee ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    if rows.is_empty() {
      let message = if self.user.role == Role::Operator {
        "No services registered for you on this day."
      } else {
        "No services registered on this day."
      };
      frame.render_widget(
        Paragraph::new(message)
          .block(table_block)
          .style(Style::default().fg(Color::DarkGray)),
        table_area,
      );
    } else {
      ensure_valid_selection(&mut self.table_state, rows.len());
      render_table(
        frame,
        table_area,
        table_block,
        &self.columns,
        &rows,
        &mut self.table_state,
      );
    }
  }

  fn render_monthly(&self, frame: &mut Frame, area: Rect, monthly: &Query<Month, MonthlyEarnings>) {
    let month = Month::of(self.date);
    let block = Block::default()
      .title(format!(" {} ", month.label()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let data = match monthly.state() {
      QueryState::Ready(data) => data,
      QueryState::Error(e) => {
        frame.render_widget(
          Paragraph::new(e.to_string())
            .block(block)
            .style(Style::default().fg(Color::Red)),
          area,
        );
        return;
      }
      _ => {
        frame.render_widget(
          Paragraph::new("Loading...")
            .block(block)
            .style(Style::default().fg(Color::DarkGray)),
          area,
        );
        return;
      }
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);
    let [summary_area, chart_area] =
      Layout::horizontal([Constraint::Length(40), Constraint::Min(10)]).areas(inner);

    let best = data
      .best_day()
      .map(|d| format!("{} ({})", date_label(d.date), self.money(d.total)))
      .unwrap_or_else(|| "-".to_string());
    let lines = vec![
      Line::from(format!(
        " Gross    {}",
        self.money(data.services_total + data.sales_total + data.income_total)
      )),
      Line::from(format!(" Expenses {}", self.money(data.expenses_total))),
      Line::from(vec![
        Span::raw(" Net      "),
        Span::styled(self.money(data.net()), Style::default().fg(Color::Green).bold()),
      ]),
      Line::from(Span::styled(
        format!(" Best day {}", best),
        Style::default().fg(Color::DarkGray),
      )),
    ];
    frame.render_widget(Paragraph::new(lines), summary_area);

    // One bar per day of the month, in cents so small totals still show
    let mut per_day = vec![0u64; 31];
    for day in &data.days {
      if let Some(slot) = per_day.get_mut(day.date.day0() as usize) {
        *slot = (day.total.max(0.0) * 100.0).round() as u64;
      }
    }
    let sparkline = Sparkline::default()
      .data(&per_day)
      .style(Style::default().fg(Color::Cyan));
    frame.render_widget(sparkline, chart_area);
  }
}

fn visible_rows<'a>(user: &User, daily: &'a DailyEarnings) -> Vec<&'a EmployeeEarnings> {
  daily
    .by_employee
    .iter()
    .filter(|e| user.role != Role::Operator || e.employee_id == user.id)
    .collect()
}

fn employee_columns(currency: &str) -> Vec<Column<EmployeeEarnings>> {
  let money = |f: fn(&EmployeeEarnings) -> f64| {
    let currency = currency.to_string();
    move |e: &EmployeeEarnings| format_money(f(e), &currency)
  };
  vec![
    Column::new("Employee", Constraint::Min(16), |e: &EmployeeEarnings| {
      e.employee_name.clone()
    }),
    Column::new("Services", Constraint::Length(8), |e: &EmployeeEarnings| {
      e.services_count.to_string()
    })
    .right(),
    Column::new("Billed", Constraint::Length(12), money(|e| e.services_total)).right(),
    Column::new("Commission", Constraint::Length(12), money(|e| e.commission)).right(),
    Column::new("Tips", Constraint::Length(10), money(|e| e.tips)).right(),
    Column::new("Payable", Constraint::Length(12), money(EmployeeEarnings::payable))
      .right()
      .styled(|_| Style::default().fg(Color::Green)),
  ]
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(date) = step_day(&key, self.date) {
      self.set_date(date);
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('H') => {
        let month = Month::of(self.date).prev();
        self.set_date(same_day_in(month, self.date.day()));
      }
      KeyCode::Char('L') => {
        let month = Month::of(self.date).next();
        self.set_date(same_day_in(month, self.date.day()));
      }
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('r') => {
        self.daily.refetch();
        if let Some(monthly) = &mut self.monthly {
          monthly.refetch();
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.monthly.take() {
      Some(monthly) => {
        let [daily_area, monthly_area] =
          Layout::vertical([Constraint::Min(10), Constraint::Length(7)]).areas(area);
        self.render_daily(frame, daily_area);
        self.render_monthly(frame, monthly_area, &monthly);
        self.monthly = Some(monthly);
      }
      None => self.render_daily(frame, area),
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(date_label(self.date))
  }

  fn tick(&mut self) {
    self.daily.poll();
    if let Some(monthly) = &mut self.monthly {
      monthly.poll();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("h/l", "day").with_priority(20),
      ShortcutInfo::new("H/L", "month").with_priority(25),
      ShortcutInfo::new("t", "today").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn earnings() -> DailyEarnings {
    serde_json::from_str(
      r#"{"date":"2024-06-01","servicesTotal":90.0,"byEmployee":[
        {"employeeId":"e1","employeeName":"Ana","servicesCount":3,"servicesTotal":60.0,"commission":24.0},
        {"employeeId":"e2","employeeName":"Leo","servicesCount":1,"servicesTotal":30.0,"commission":12.0}
      ]}"#,
    )
    .unwrap()
  }

  fn user(id: &str, role: Role) -> User {
    User {
      id: id.to_string(),
      name: "Test".to_string(),
      email: None,
      role,
    }
  }

  #[test]
  fn test_operator_sees_only_own_row() {
    let daily = earnings();
    let rows = visible_rows(&user("e2", Role::Operator), &daily);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].employee_name, "Leo");
  }

  #[test]
  fn test_managers_see_everyone() {
    let daily = earnings();
    assert_eq!(visible_rows(&user("u9", Role::Supervisor), &daily).len(), 2);
    assert_eq!(visible_rows(&user("u1", Role::Admin), &daily).len(), 2);
  }

  #[test]
  fn test_payable_column_uses_currency() {
    let columns = employee_columns("€");
    let daily = earnings();
    let payable = columns.last().unwrap().text(&daily.by_employee[0]);
    assert_eq!(payable, "€24.00");
  }
}
