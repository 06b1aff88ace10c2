use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::Employee;

#[derive(Clone)]
pub struct EmployeesService {
  client: ApiClient,
}

impl EmployeesService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self) -> Result<Vec<Employee>, RequestError> {
    self.client.get("employees").await
  }
}
