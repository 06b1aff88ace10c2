use chrono::NaiveDate;

use crate::api::client::ApiClient;
use crate::api::error::RequestError;
use crate::api::types::{Appointment, AppointmentStatus};

/// The booking agenda.
#[derive(Clone)]
pub struct AppointmentsService {
  client: ApiClient,
}

impl AppointmentsService {
  pub fn new(client: ApiClient) -> Self {
    Self { client }
  }

  pub async fn list(&self, date: NaiveDate) -> Result<Vec<Appointment>, RequestError> {
    self
      .client
      .get_with("appointments", &[("date", date.to_string())])
      .await
  }

  pub async fn set_status(
    &self,
    id: &str,
    status: AppointmentStatus,
  ) -> Result<Appointment, RequestError> {
    self
      .client
      .patch(
        &format!("appointments/{}/status", id),
        &serde_json::json!({ "status": status }),
      )
      .await
  }
}
