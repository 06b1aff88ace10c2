use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{EmployeePayment, PaymentStatus};

/// Money owed to (and paid to) employees.
#[derive(Clone)]
pub struct PaymentsService {
  client: ApiClient,
}

impl PaymentsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, status: PaymentStatus) -> Result<Vec<EmployeePayment>, RequestError> {
    self
      .client
      .get_with("payments", &[("status", status.as_str())])
      .await
  }

  pub async fn mark_paid(&self, id: &str) -> Result<EmployeePayment, RequestError> {
    self
      .client
      .post(&format!("payments/{}/pay", id), &serde_json::json!({}))
      .await
  }
}
