use chrono::NaiveDate;

use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{Income, NewIncome};

/// Income outside services and product sales (rentals, tips pool, etc.).
#[derive(Clone)]
pub struct IncomeService {
  client: ApiClient,
}

impl IncomeService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, date: NaiveDate) -> Result<Vec<Income>, RequestError> {
    self
      .client
      .get_with("incomes", &[("date", date.to_string())])
      .await
  }

  pub async fn record(&self, income: &NewIncome) -> Result<Income, RequestError> {
    self.client.post("incomes", income).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::services::testing::client_for;
  use crate::api::test_server::TestServer;

  #[tokio::test]
  async fn test_record_income() {
    let server = TestServer::respond(
      201,
      r#"{"id":"i1","description":"Chair rental","amount":80.0,"date":"2024-06-01"}"#,
    )
    .await;
    let income = NewIncome {
      description: "Chair rental".to_string(),
      amount: 80.0,
      date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
      source: None,
    };
    let created = client_for(&server.url)
      .income()
      .record(&income)
      .await
      .unwrap();
    assert_eq!(created.id, "i1");

    let req = server.last_request();
    assert_eq!(req.target, "/api/incomes");
    assert_eq!(req.json()["description"], "Chair rental");
    assert!(req.json().get("source").is_none());
  }
}
