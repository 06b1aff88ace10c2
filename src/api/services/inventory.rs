use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::Product;

/// Products on the shelf.
#[derive(Clone)]
pub struct InventoryService {
  client: ApiClient,
}

impl InventoryService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self) -> Result<Vec<Product>, RequestError> {
    self.client.get("inventory").await
  }

  /// Add (or with a negative delta, remove) units of stock.
  pub async fn adjust_stock(&self, id: &str, delta: i64) -> Result<Product, RequestError> {
    self
      .client
      .patch(
        &format!("inventory/{}/stock", id),
        &serde_json::json!({ "delta": delta }),
      )
      .await
  }
}

#[cfg(test)]
mod tests {
  use crate::api::services::testing::client_for;
  use crate::api::test_server::TestServer;

  #[tokio::test]
  async fn test_adjust_stock_sends_delta() {
    let server = TestServer::respond(
      200,
      r#"{"id":"p1","name":"Pomade","stock":4,"minStock":3,"price":12.0}"#,
    )
    .await;
    let product = client_for(&server.url)
      .inventory()
      .adjust_stock("p1", -1)
      .await
      .unwrap();
    assert_eq!(product.stock, 4);

    let req = server.last_request();
    assert_eq!(req.method, "PATCH");
    assert_eq!(req.target, "/api/inventory/p1/stock");
    assert_eq!(req.json()["delta"], -1);
  }
}
