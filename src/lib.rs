pub mod cache;
pub mod codes;
pub mod decode;
mod error;
pub mod history;
pub mod report;

use std::fmt;

use anyhow::{anyhow, ensure, Context, Result};
use chrono::Utc;
use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use cache::SnapshotCache;
pub use decode::{celsius_to_fahrenheit, DecodedCycle, DecodedEvent, LocalTime, Window, TZ_OFFSET};
pub use error::{DecodeError, StructuralError};
pub use history::{Day, EnergyHistory, RawCycle, RawEvent};
pub use report::{aggregate, report_lines, DailyTotals, DayReport, HistoryProcessor};

pub const LOGIN_URL: &str = "https://home.nest.com/session";
const TRANSPORT_URL: &str = "https://transport03-rts06-iad01.transport.home.nest.com/v5";

#[derive(Serialize, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(Credentials {
            email: std::env::var("NEST_EMAIL").with_context(|| "reading NEST_EMAIL")?,
            password: std::env::var("NEST_PASSWORD").with_context(|| "reading NEST_PASSWORD")?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// What a successful login leaves behind. Every other call needs one.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: String,
    pub user: String,
    pub user_id: String,
    pub session_id: String,
}

impl Session {
    pub fn new(access_token: String, user: String, user_id: String) -> Self {
        let session_id = format!(
            "{}.{:05}.{}",
            user_id,
            rand::thread_rng().gen_range(0..100_000),
            Utc::now().timestamp()
        );
        Session {
            access_token,
            user,
            user_id,
            session_id,
        }
    }

    pub fn authorization(&self) -> String {
        format!("Basic {}", self.access_token)
    }
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    access_token: String,
    // e.g. "user.123456"
    user: String,
    userid: Value,
}

/// The listing returned by the web endpoint; only the headers are needed to subscribe.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ObjectsResponse {
    pub objects: Vec<ObjectHeader>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ObjectHeader {
    // <bucket>.<serial>
    pub object_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_revision: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_timestamp: Option<Value>,
}

#[derive(Serialize, Debug)]
pub struct SubscribeRequest {
    pub objects: Vec<ObjectHeader>,
    pub session: String,
    pub timeout: u64,
}

impl SubscribeRequest {
    /// Subscribes to everything listed, plus the device's `energy_latest` bucket.
    pub fn new(listing: &ObjectsResponse, session: &Session, timeout: u64) -> Result<Self> {
        let device_key = listing
            .objects
            .get(1)
            .map(|obj| obj.object_key.as_str())
            .ok_or_else(|| anyhow!("object listing has no device entry"))?;
        let serial = device_key
            .split('.')
            .nth(1)
            .ok_or_else(|| anyhow!("no serial number in object key {:?}", device_key))?;

        let mut objects = listing.objects.clone();
        objects.push(ObjectHeader {
            object_key: format!("energy_latest.{}", serial),
            object_revision: None,
            object_timestamp: None,
        });

        Ok(SubscribeRequest {
            objects,
            session: session.session_id.clone(),
            timeout,
        })
    }
}

pub struct Client {
    http: reqwest::Client,
    session: Option<Session>,
    subscribe_timeout: u64,
}

impl Client {
    pub fn new() -> Result<Self> {
        Ok(Client {
            http: reqwest::Client::builder().cookie_store(true).build()?,
            session: None,
            subscribe_timeout: 850 + (250.0 * rand::thread_rng().gen::<f64>()).round() as u64,
        })
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<&Session> {
        debug!("logging in as {}", credentials.email);
        let resp: LoginResponse = self
            .http
            .post(LOGIN_URL)
            .json(credentials)
            .send()
            .await?
            .error_for_status()
            .with_context(|| "login rejected")?
            .json()
            .await
            .with_context(|| "JSON-deserializing login response")?;

        let user_id = match resp.userid {
            Value::String(id) => id,
            other => other.to_string(),
        };
        Ok(&*self
            .session
            .insert(Session::new(resp.access_token, resp.user, user_id)))
    }

    /// Fails unless [`login`](Self::login) has succeeded.
    pub fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| anyhow!("an authorization token is required to use this function"))
    }

    pub async fn get_objects(&self) -> Result<ObjectsResponse> {
        let session = self.session()?;
        let url = format!(
            "{}/web/{}?_={}",
            TRANSPORT_URL,
            session.user,
            Utc::now().timestamp()
        );
        debug!("fetching object listing from {}", url);
        Ok(self
            .http
            .get(&url)
            .header("Authorization", session.authorization())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "JSON-deserializing object listing")?)
    }

    /// The raw subscribe response; parse it with [`EnergyHistory::from_value`].
    pub async fn get_energy_history(&self, listing: &ObjectsResponse) -> Result<Value> {
        let session = self.session()?;
        let request = SubscribeRequest::new(listing, session, self.subscribe_timeout)?;
        debug!(
            "subscribing to {} objects, timeout {}",
            request.objects.len(),
            request.timeout
        );
        let body: Value = self
            .http
            .post(format!("{}/subscribe", TRANSPORT_URL))
            .header("Authorization", session.authorization())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| "JSON-deserializing energy history")?;
        ensure!(body.get("objects").is_some(), "subscribe response has no objects: {}", body);
        Ok(body)
    }

    pub async fn fetch_energy_history(&self) -> Result<Value> {
        let listing = self.get_objects().await?;
        self.get_energy_history(&listing).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> Session {
        Session::new("tok".to_string(), "user.42".to_string(), "42".to_string())
    }

    #[test]
    fn session_id_shape() {
        let session = session();
        let parts: Vec<_> = session.session_id.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "42");
        assert_eq!(parts[1].len(), 5);
        assert!(parts[2].parse::<i64>().is_ok());
        assert_eq!(session.authorization(), "Basic tok");
    }

    #[test]
    fn subscribe_adds_energy_bucket() {
        let listing: ObjectsResponse = serde_json::from_value(json!({
            "objects": [
                {"object_key": "user.42", "object_revision": 3, "object_timestamp": 100, "value": {}},
                {"object_key": "device.01AB", "object_revision": 7, "object_timestamp": 200},
            ]
        }))
        .unwrap();
        let request = SubscribeRequest::new(&listing, &session(), 900).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["objects"],
            json!([
                {"object_key": "user.42", "object_revision": 3, "object_timestamp": 100},
                {"object_key": "device.01AB", "object_revision": 7, "object_timestamp": 200},
                {"object_key": "energy_latest.01AB"},
            ])
        );
        assert_eq!(body["timeout"], 900);
        assert_eq!(body["session"], json!(request.session));
    }

    #[test]
    fn subscribe_needs_a_device() {
        let listing = ObjectsResponse {
            objects: vec![ObjectHeader {
                object_key: "user.42".to_string(),
                object_revision: None,
                object_timestamp: None,
            }],
        };
        assert!(SubscribeRequest::new(&listing, &session(), 900).is_err());
    }

    #[tokio::test]
    async fn calls_before_login_are_refused() {
        let client = Client::new().unwrap();
        let err = client.get_objects().await.unwrap_err();
        assert!(err.to_string().contains("authorization token is required"));
        assert!(client.subscribe_timeout >= 850 && client.subscribe_timeout <= 1100);
    }
}
