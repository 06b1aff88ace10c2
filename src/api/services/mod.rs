//! One service per backend resource.
//!
//! Each function performs exactly one request and returns the parsed body.
//! Nothing is cached here and errors pass through untouched.

mod appointments;
mod earnings;
mod employees;
mod expenses;
mod income;
mod inventory;
mod payments;
mod profile;
mod sales;
mod services;

pub use appointments::AppointmentsService;
pub use earnings::EarningsService;
pub use employees::EmployeesService;
pub use expenses::ExpensesService;
pub use income::IncomeService;
pub use inventory::InventoryService;
pub use payments::PaymentsService;
pub use profile::ProfileService;
pub use sales::SalesService;
pub use services::ServicesService;

use super::client::ApiClient;

impl ApiClient {
  pub fn appointments(&self) -> AppointmentsService {
    AppointmentsService::new(self.clone())
  }

  pub fn earnings(&self) -> EarningsService {
    EarningsService::new(self.clone())
  }

  pub fn employees(&self) -> EmployeesService {
    EmployeesService::new(self.clone())
  }

  pub fn expenses(&self) -> ExpensesService {
    ExpensesService::new(self.clone())
  }

  pub fn income(&self) -> IncomeService {
    IncomeService::new(self.clone())
  }

  pub fn inventory(&self) -> InventoryService {
    InventoryService::new(self.clone())
  }

  pub fn payments(&self) -> PaymentsService {
    PaymentsService::new(self.clone())
  }

  pub fn profile(&self) -> ProfileService {
    ProfileService::new(self.clone())
  }

  pub fn sales(&self) -> SalesService {
    SalesService::new(self.clone())
  }

  pub fn services(&self) -> ServicesService {
    ServicesService::new(self.clone())
  }
}
