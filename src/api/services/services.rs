use chrono::NaiveDate;

use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{CatalogService, NewServiceRecord, ServiceRecord};

/// Services performed by staff, and the shop's service menu.
#[derive(Clone)]
pub struct ServicesService {
  client: ApiClient,
}

impl ServicesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, date: NaiveDate) -> Result<Vec<ServiceRecord>, RequestError> {
    self
      .client
      .get_with("services", &[("date", date.to_string())])
      .await
  }

  pub async fn register(&self, record: &NewServiceRecord) -> Result<ServiceRecord, RequestError> {
    self.client.post("services", record).await
  }

  pub async fn catalog(&self) -> Result<Vec<CatalogService>, RequestError> {
    self.client.get("services/catalog").await
  }
}
