use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::User;

/// The signed-in user's own profile.
#[derive(Clone)]
pub struct ProfileService {
  client: ApiClient,
}

impl ProfileService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn me(&self) -> Result<User, RequestError> {
    self.client.get("users/me").await
  }
}
