//! Data shapes exchanged with the backend.
//!
//! Field names follow the backend's camelCase JSON; missing optional fields
//! default rather than failing the whole payload.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session / profile
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  Supervisor,
  Operator,
}

impl Role {
  pub fn label(&self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Supervisor => "supervisor",
      Role::Operator => "operator",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub email: Option<String>,
  pub role: Role,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeEarnings {
  pub employee_id: String,
  pub employee_name: String,
  #[serde(default)]
  pub services_count: u32,
  #[serde(default)]
  pub services_total: f64,
  #[serde(default)]
  pub commission: f64,
  #[serde(default)]
  pub tips: f64,
}

impl EmployeeEarnings {
  /// What the shop owes this employee for the period.
  pub fn payable(&self) -> f64 {
    self.commission + self.tips
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEarnings {
  pub date: NaiveDate,
  #[serde(default)]
  pub services_total: f64,
  #[serde(default)]
  pub sales_total: f64,
  #[serde(default)]
  pub income_total: f64,
  #[serde(default)]
  pub expenses_total: f64,
  #[serde(default)]
  pub by_employee: Vec<EmployeeEarnings>,
}

impl DailyEarnings {
  pub fn gross(&self) -> f64 {
    self.services_total + self.sales_total + self.income_total
  }

  pub fn net(&self) -> f64 {
    self.gross() - self.expenses_total
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotal {
  pub date: NaiveDate,
  pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyEarnings {
  pub month: String,
  #[serde(default)]
  pub services_total: f64,
  #[serde(default)]
  pub sales_total: f64,
  #[serde(default)]
  pub income_total: f64,
  #[serde(default)]
  pub expenses_total: f64,
  #[serde(default)]
  pub days: Vec<DayTotal>,
}

impl MonthlyEarnings {
  pub fn net(&self) -> f64 {
    self.services_total + self.sales_total + self.income_total - self.expenses_total
  }

  /// The day with the highest takings, if any.
  pub fn best_day(&self) -> Option<&DayTotal> {
    self
      .days
      .iter()
      .max_by(|a, b| a.total.total_cmp(&b.total))
  }
}

// ============================================================================
// Services performed
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
  pub id: String,
  pub employee_name: String,
  pub service_name: String,
  pub price: f64,
  #[serde(default)]
  pub commission: f64,
  #[serde(default)]
  pub payment_method: Option<String>,
  pub performed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewServiceRecord {
  pub employee_id: String,
  pub service_id: String,
  pub price: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payment_method: Option<String>,
  pub date: NaiveDate,
}

/// An entry of the shop's service menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogService {
  pub id: String,
  pub name: String,
  pub price: f64,
  #[serde(default)]
  pub duration_minutes: Option<u32>,
}

// ============================================================================
// Employee payments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayment {
  pub id: String,
  pub employee_name: String,
  pub amount: f64,
  pub period_start: NaiveDate,
  pub period_end: NaiveDate,
  pub status: PaymentStatus,
  #[serde(default)]
  pub paid_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Sales and inventory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
  pub id: String,
  pub product_name: String,
  pub quantity: u32,
  pub unit_price: f64,
  pub total: f64,
  #[serde(default)]
  pub employee_name: Option<String>,
  pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
  pub product_id: String,
  pub quantity: u32,
  pub unit_price: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub employee_id: Option<String>,
  pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  pub name: String,
  pub stock: i64,
  #[serde(default)]
  pub min_stock: i64,
  pub price: f64,
  #[serde(default)]
  pub category: Option<String>,
}

impl Product {
  pub fn is_low_stock(&self) -> bool {
    self.stock <= self.min_stock
  }
}

// ============================================================================
// Additional income and expenses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
  pub id: String,
  pub description: String,
  pub amount: f64,
  pub date: NaiveDate,
  #[serde(default)]
  pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
  pub description: String,
  pub amount: f64,
  pub date: NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
  pub id: String,
  pub category: String,
  #[serde(default)]
  pub description: String,
  pub amount: f64,
  pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
  pub category: String,
  pub description: String,
  pub amount: f64,
  pub date: NaiveDate,
}

// ============================================================================
// Agenda
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
  Scheduled,
  Completed,
  Cancelled,
}

impl AppointmentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      AppointmentStatus::Scheduled => "scheduled",
      AppointmentStatus::Completed => "completed",
      AppointmentStatus::Cancelled => "cancelled",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id: String,
  pub client_name: String,
  pub service_name: String,
  pub employee_name: String,
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
  pub status: AppointmentStatus,
  #[serde(default)]
  pub notes: Option<String>,
}

// ============================================================================
// Staff
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: String,
  pub name: String,
  pub role: Role,
  #[serde(default)]
  pub commission_rate: f64,
  #[serde(default = "default_active")]
  pub active: bool,
}

fn default_active() -> bool {
  true
}
