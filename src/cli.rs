//! One-shot subcommands run outside the dashboard.

use chrono::NaiveDate;
use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn};

use crate::api::types::{NewExpense, NewIncome, NewSale, NewServiceRecord};
use crate::api::ApiClient;
use crate::period::parse_date;
use crate::session::Session;
use crate::ui::renderfns::format_money;

#[derive(Subcommand, Debug)]
pub enum Cmd {
  /// Sign in with an API token and store the profile
  Login {
    #[arg(long)]
    token: String,
  },
  /// Forget the stored token and profile
  Logout,
  /// Show the signed-in profile
  Whoami,
  /// Record something without opening the dashboard
  Add {
    #[command(subcommand)]
    record: AddRecord,
  },
}

#[derive(Subcommand, Debug)]
pub enum AddRecord {
  /// A service performed by an employee
  Service {
    /// Employee name or id
    #[arg(long)]
    employee: String,
    /// Catalog service name or id
    #[arg(long)]
    service: String,
    /// Defaults to the catalog price
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    payment_method: Option<String>,
    /// YYYY-MM-DD, defaults to today
    #[arg(long)]
    date: Option<String>,
  },
  /// A product sale
  Sale {
    /// Product name or id
    #[arg(long)]
    product: String,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
    /// Defaults to the product's list price
    #[arg(long)]
    price: Option<f64>,
    /// Employee name or id credited with the sale
    #[arg(long)]
    employee: Option<String>,
    #[arg(long)]
    date: Option<String>,
  },
  /// Additional income
  Income {
    #[arg(long)]
    description: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    source: Option<String>,
    #[arg(long)]
    date: Option<String>,
  },
  /// An operating expense
  Expense {
    #[arg(long)]
    category: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    amount: f64,
    #[arg(long)]
    date: Option<String>,
  },
}

/// Run a subcommand against the backend, returning what to print.
pub async fn run(cmd: Cmd, session: &Session, api: &ApiClient, currency: &str) -> Result<String> {
  match cmd {
    Cmd::Login { token } => login(&token, session, api).await,
    Cmd::Logout => {
      session.logout()?;
      Ok("Signed out.".to_string())
    }
    Cmd::Whoami => match session.user() {
      Some(user) => Ok(format!("{} ({})", user.name, user.role.label())),
      None => Err(eyre!("Not signed in")),
    },
    Cmd::Add { record } => {
      if !session.is_signed_in() {
        return Err(eyre!("Not signed in. Run `shopdesk login --token <TOKEN>` first."));
      }
      add(record, api, currency).await
    }
  }
}

/// Keep the token only if the backend accepts it.
async fn login(token: &str, session: &Session, api: &ApiClient) -> Result<String> {
  let token = token.trim();
  if token.is_empty() {
    return Err(eyre!("Token must not be empty"));
  }

  session.begin(token)?;
  match api.profile().me().await {
    Ok(user) => {
      let greeting = format!("Signed in as {} ({})", user.name, user.role.label());
      session.login(token, user)?;
      Ok(greeting)
    }
    Err(e) => {
      warn!(status = ?e.status, "Login failed: {}", e);
      session.logout()?;
      if e.is_unauthorized() {
        return Err(eyre!("Login failed: token rejected ({})", e));
      }
      Err(eyre!("Login failed: {}", e))
    }
  }
}

async fn add(record: AddRecord, api: &ApiClient, currency: &str) -> Result<String> {
  match record {
    AddRecord::Service {
      employee,
      service,
      price,
      payment_method,
      date,
    } => {
      let employees = api
        .employees()
        .list()
        .await
        .map_err(|e| eyre!("Failed to load employees: {}", e))?;
      let employee = lookup(&employees, &employee, "employee", |e| e.id.as_str(), |e| e.name.as_str())?;

      let catalog = api
        .services()
        .catalog()
        .await
        .map_err(|e| eyre!("Failed to load the service catalog: {}", e))?;
      let service = lookup(&catalog, &service, "service", |s| s.id.as_str(), |s| s.name.as_str())?;

      let record = NewServiceRecord {
        employee_id: employee.id.clone(),
        service_id: service.id.clone(),
        price: positive(price.unwrap_or(service.price), "price")?,
        payment_method,
        date: date_or_today(date.as_deref())?,
      };
      let saved = api
        .services()
        .register(&record)
        .await
        .map_err(|e| eyre!("Failed to register service: {}", e))?;
      info!(id = %saved.id, "Service registered");
      Ok(format!(
        "Registered {} by {} for {}",
        saved.service_name,
        saved.employee_name,
        format_money(saved.price, currency)
      ))
    }

    AddRecord::Sale {
      product,
      quantity,
      price,
      employee,
      date,
    } => {
      if quantity == 0 {
        return Err(eyre!("Quantity must be at least 1"));
      }
      let products = api
        .inventory()
        .list()
        .await
        .map_err(|e| eyre!("Failed to load inventory: {}", e))?;
      let product = lookup(&products, &product, "product", |p| p.id.as_str(), |p| p.name.as_str())?;

      let employee_id = match employee {
        Some(wanted) => {
          let employees = api
            .employees()
            .list()
            .await
            .map_err(|e| eyre!("Failed to load employees: {}", e))?;
          Some(lookup(&employees, &wanted, "employee", |e| e.id.as_str(), |e| e.name.as_str())?.id.clone())
        }
        None => None,
      };

      let sale = NewSale {
        product_id: product.id.clone(),
        quantity,
        unit_price: positive(price.unwrap_or(product.price), "price")?,
        employee_id,
        date: date_or_today(date.as_deref())?,
      };
      let saved = api
        .sales()
        .record(&sale)
        .await
        .map_err(|e| eyre!("Failed to record sale: {}", e))?;
      info!(id = %saved.id, "Sale recorded");
      Ok(format!(
        "Sold {} x {} for {}",
        saved.quantity,
        saved.product_name,
        format_money(saved.total, currency)
      ))
    }

    AddRecord::Income {
      description,
      amount,
      source,
      date,
    } => {
      let income = NewIncome {
        description: required(description, "description")?,
        amount: positive(amount, "amount")?,
        date: date_or_today(date.as_deref())?,
        source,
      };
      let saved = api
        .income()
        .record(&income)
        .await
        .map_err(|e| eyre!("Failed to record income: {}", e))?;
      info!(id = %saved.id, "Income recorded");
      Ok(format!(
        "Recorded {} income: {}",
        format_money(saved.amount, currency),
        saved.description
      ))
    }

    AddRecord::Expense {
      category,
      description,
      amount,
      date,
    } => {
      let expense = NewExpense {
        category: required(category, "category")?,
        description: description.trim().to_string(),
        amount: positive(amount, "amount")?,
        date: date_or_today(date.as_deref())?,
      };
      let saved = api
        .expenses()
        .record(&expense)
        .await
        .map_err(|e| eyre!("Failed to record expense: {}", e))?;
      info!(id = %saved.id, "Expense recorded");
      Ok(format!(
        "Recorded {} expense: {}",
        format_money(saved.amount, currency),
        saved.category
      ))
    }
  }
}

/// Find an item by exact id, then by case-insensitive name.
fn lookup<'a, T>(
  items: &'a [T],
  wanted: &str,
  what: &str,
  id: impl Fn(&T) -> &str,
  name: impl Fn(&T) -> &str,
) -> Result<&'a T> {
  let wanted = wanted.trim();
  items
    .iter()
    .find(|item| id(item) == wanted)
    .or_else(|| {
      items
        .iter()
        .find(|item| name(item).eq_ignore_ascii_case(wanted))
    })
    .ok_or_else(|| {
      let known: Vec<&str> = items.iter().map(|item| name(item)).collect();
      eyre!("No {} named '{}'. Known: {}", what, wanted, known.join(", "))
    })
}

fn positive(amount: f64, what: &str) -> Result<f64> {
  if amount.is_finite() && amount > 0.0 {
    Ok(amount)
  } else {
    Err(eyre!("The {} must be greater than zero", what))
  }
}

fn required(value: String, what: &str) -> Result<String> {
  let value = value.trim().to_string();
  if value.is_empty() {
    return Err(eyre!("The {} must not be empty", what));
  }
  Ok(value)
}

fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
  match date {
    Some(s) => parse_date(s),
    None => Ok(chrono::Local::now().date_naive()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::services::testing::client_for;
  use crate::api::test_server::TestServer;
  use crate::api::types::{Employee, Role};
  use crate::session::MemoryStorage;

  const ME: &str = r#"{"id":"u1","name":"Owner","role":"admin"}"#;
  const EMPLOYEES: &str = r#"[{"id":"e1","name":"Ana","role":"operator","commissionRate":0.4}]"#;
  const CATALOG: &str = r#"[{"id":"s1","name":"Fade","price":25.0}]"#;
  const REGISTERED: &str = r#"{"id":"r1","employeeName":"Ana","serviceName":"Fade","price":25.0,
    "commission":10.0,"performedAt":"2024-06-01T10:00:00Z"}"#;

  fn session() -> Session {
    Session::restore(Box::new(MemoryStorage::new())).unwrap()
  }

  fn employees() -> Vec<Employee> {
    serde_json::from_str(EMPLOYEES).unwrap()
  }

  #[test]
  fn test_lookup_by_id_or_name() {
    let staff = employees();
    let by_id = lookup(&staff, "e1", "employee", |e| e.id.as_str(), |e| e.name.as_str()).unwrap();
    let by_name = lookup(&staff, " ana ", "employee", |e| e.id.as_str(), |e| e.name.as_str()).unwrap();
    assert_eq!(by_id.name, "Ana");
    assert_eq!(by_name.id, "e1");

    let missing = lookup(&staff, "Bo", "employee", |e| e.id.as_str(), |e| e.name.as_str()).unwrap_err();
    assert!(missing.to_string().contains("Known: Ana"));
  }

  #[test]
  fn test_amounts_must_be_positive() {
    assert_eq!(positive(12.5, "amount").unwrap(), 12.5);
    assert!(positive(0.0, "amount").is_err());
    assert!(positive(-3.0, "amount").is_err());
    assert!(positive(f64::NAN, "amount").is_err());
  }

  #[tokio::test]
  async fn test_login_stores_profile() {
    let server = TestServer::respond(200, ME).await;
    let session = session();
    let out = run(
      Cmd::Login {
        token: "tok".to_string(),
      },
      &session,
      &client_for(&server.url),
      "$",
    )
    .await
    .unwrap();

    assert_eq!(out, "Signed in as Owner (admin)");
    assert!(session.is_signed_in());
    assert_eq!(session.user().map(|u| u.role), Some(Role::Admin));
  }

  #[tokio::test]
  async fn test_rejected_login_leaves_session_empty() {
    let server = TestServer::respond(401, r#"{"message":"Invalid token"}"#).await;
    let session = session();
    let err = run(
      Cmd::Login {
        token: "bad".to_string(),
      },
      &session,
      &client_for(&server.url),
      "$",
    )
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Login failed: token rejected (Invalid token)");
    assert!(!session.is_signed_in());
  }

  #[tokio::test]
  async fn test_add_service_resolves_names() {
    let server = TestServer::start(vec![(200, EMPLOYEES), (200, CATALOG), (201, REGISTERED)]).await;
    let session = session();
    session
      .login("tok", serde_json::from_str(ME).unwrap())
      .unwrap();

    let out = run(
      Cmd::Add {
        record: AddRecord::Service {
          employee: "ana".to_string(),
          service: "fade".to_string(),
          price: None,
          payment_method: Some("cash".to_string()),
          date: Some("2024-06-01".to_string()),
        },
      },
      &session,
      &client_for(&server.url),
      "$",
    )
    .await
    .unwrap();
    assert_eq!(out, "Registered Fade by Ana for $25.00");

    let post = server.last_request();
    assert_eq!(post.method, "POST");
    assert_eq!(post.target, "/api/services");
    let body = post.json();
    assert_eq!(body["employeeId"], "e1");
    assert_eq!(body["serviceId"], "s1");
    assert_eq!(body["price"], 25.0);
    assert_eq!(body["date"], "2024-06-01");
  }

  #[tokio::test]
  async fn test_add_needs_session() {
    let server = TestServer::start(vec![]).await;
    let err = run(
      Cmd::Add {
        record: AddRecord::Expense {
          category: "rent".to_string(),
          description: String::new(),
          amount: 900.0,
          date: None,
        },
      },
      &session(),
      &client_for(&server.url),
      "$",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Not signed in"));
    assert!(server.requests().is_empty());
  }
}
