use chrono::NaiveDate;

use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{DailyEarnings, MonthlyEarnings};
use crate::period::Month;

/// Dashboard summaries.
#[derive(Clone)]
pub struct EarningsService {
  client: ApiClient,
}

impl EarningsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  /// Earnings for one day, broken down by employee
  pub async fn daily(&self, date: NaiveDate) -> Result<DailyEarnings, RequestError> {
    self
      .client
      .get_with("dashboard/daily-earnings", &[("date", date.to_string())])
      .await
  }

  /// Totals for a month with a per-day series
  pub async fn monthly(&self, month: Month) -> Result<MonthlyEarnings, RequestError> {
    self
      .client
      .get_with("dashboard/monthly-earnings", &[("month", month.to_string())])
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::services::testing::client_for;
  use crate::api::test_server::TestServer;

  #[tokio::test]
  async fn test_daily_earnings_request() {
    let server = TestServer::respond(
      200,
      r#"{"date":"2024-06-01","servicesTotal":250.0,"byEmployee":[]}"#,
    )
    .await;
    let service = client_for(&server.url).earnings();

    let daily = service
      .daily(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
      .await
      .unwrap();
    assert_eq!(daily.services_total, 250.0);

    let req = server.last_request();
    assert_eq!(req.target, "/api/dashboard/daily-earnings?date=2024-06-01");
    assert_eq!(req.header("authorization"), Some("Bearer test-token"));
  }

  #[tokio::test]
  async fn test_monthly_earnings_request() {
    let server = TestServer::respond(200, r#"{"month":"2024-06","days":[]}"#).await;
    let service = client_for(&server.url).earnings();

    let monthly = service.monthly(Month::new(2024, 6).unwrap()).await.unwrap();
    assert_eq!(monthly.month, "2024-06");
    assert_eq!(
      server.last_request().target,
      "/api/dashboard/monthly-earnings?month=2024-06"
    );
  }
}
