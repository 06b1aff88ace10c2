use chrono::NaiveDate;

use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{NewSale, Sale};

/// Product sales.
#[derive(Clone)]
pub struct SalesService {
  client: ApiClient,
}

impl SalesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, date: NaiveDate) -> Result<Vec<Sale>, RequestError> {
    self
      .client
      .get_with("sales", &[("date", date.to_string())])
      .await
  }

  pub async fn record(&self, sale: &NewSale) -> Result<Sale, RequestError> {
    self.client.post("sales", sale).await
  }
}
