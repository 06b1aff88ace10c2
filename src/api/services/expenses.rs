use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{Expense, NewExpense};
use crate::period::Month;

/// Operating expenses, reported per month.
#[derive(Clone)]
pub struct ExpensesService {
  client: ApiClient,
}

impl ExpensesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, month: Month) -> Result<Vec<Expense>, RequestError> {
    self
      .client
      .get_with("expenses", &[("month", month.to_string())])
      .await
  }

  pub async fn record(&self, expense: &NewExpense) -> Result<Expense, RequestError> {
    self.client.post("expenses", expense).await
  }

  pub async fn delete(&self, id: &str) -> Result<(), RequestError> {
    self.client.delete(&format!("expenses/{}", id)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::services::testing::client_for;
  use crate::api::test_server::TestServer;

  #[tokio::test]
  async fn test_list_by_month() {
    let server = TestServer::respond(
      200,
      r#"[{"id":"x1","category":"rent","amount":900.0,"date":"2024-06-01"}]"#,
    )
    .await;
    let expenses = client_for(&server.url)
      .expenses()
      .list(Month::new(2024, 6).unwrap())
      .await
      .unwrap();
    assert_eq!(expenses[0].category, "rent");
    assert_eq!(expenses[0].description, "");
    assert_eq!(server.last_request().target, "/api/expenses?month=2024-06");
  }

  #[tokio::test]
  async fn test_delete() {
    let server = TestServer::respond(204, "").await;
    client_for(&server.url)
      .expenses()
      .delete("x1")
      .await
      .unwrap();

    let req = server.last_request();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.target, "/api/expenses/x1");
  }
}
