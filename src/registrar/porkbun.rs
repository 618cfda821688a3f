//! A [Porkbun JSON API v3][api] implementation of the [`Registrar`][super::Registrar] trait.
//!
//! Every call is a `POST` whose JSON body carries the API key and secret. Porkbun answers with a
//! JSON object whose `status` is `SUCCESS` or `ERROR` (plus a `message`).
//!
//! Porkbun reports fully qualified record names and expects the bare subdomain (empty for the
//! apex) when creating or editing. The client converts both ways so the rest of the crate only
//! sees zone-relative names with [`APEX`][super::APEX] for the apex.
//!
//! [api]: https://porkbun.com/api/json/v3/documentation
use crate::config::Config;
use crate::error::Error;
use crate::metrics;
use crate::registrar::{LiveRecord, Registrar, APEX};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::fmt;
use std::time::Duration;

const STATUS_SUCCESS: &str = "SUCCESS";

pub struct PorkbunClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl fmt::Debug for PorkbunClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PorkbunClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .finish()
    }
}

#[derive(Serialize)]
struct Request<'a, T: Serialize> {
    apikey: &'a str,
    secretapikey: &'a str,
    #[serde(flatten)]
    payload: T,
}

#[derive(Serialize)]
struct NoPayload {}

#[derive(Serialize)]
struct RecordPayload<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    ttl: &'a str,
}

#[derive(Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct Empty {}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    records: Vec<PorkbunRecord>,
}

#[derive(Deserialize)]
struct PorkbunRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: String,
}

#[serde_as]
#[derive(Deserialize)]
struct CreateResponse {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    id: u64,
}

impl PorkbunClient {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`] or [`Error::MissingApiSecret`] for empty credentials, and
    /// [`Error::Http`] if the HTTP client can't be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let (api_key, api_secret) = (api_key.into(), api_secret.into());
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        if api_secret.is_empty() {
            return Err(Error::MissingApiSecret);
        }
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("porkbun-webhook/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            api_secret,
        })
    }

    /// Build a client from the configured API URL, credentials and timeout.
    ///
    /// # Errors
    ///
    /// See [`PorkbunClient::new`].
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.api_secret.clone(),
            config.registrar_timeout,
        )
    }

    async fn call<P, T>(
        &self,
        operation: &'static str,
        zone: &str,
        path: &str,
        payload: P,
    ) -> Result<T, Error>
    where
        P: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let result = self.send(operation, zone, path, payload).await;
        metrics::record_registrar_call(operation, result.is_ok());
        result
    }

    async fn send<P, T>(
        &self,
        operation: &'static str,
        zone: &str,
        path: &str,
        payload: P,
    ) -> Result<T, Error>
    where
        P: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!("porkbun {operation} request for zone \"{zone}\"");
        let request = Request {
            apikey: &self.api_key,
            secretapikey: &self.api_secret,
            payload,
        };
        let response = self.client.post(url).json(&request).send().await?;
        let http_status = response.status();
        let body = response.text().await?;

        let registrar_error = |message: String| Error::Registrar {
            operation,
            zone: zone.to_string(),
            message,
        };
        let status: StatusResponse = match serde_json::from_str(&body) {
            Ok(status) => status,
            Err(_) => {
                let message = format!("unexpected response ({http_status}): {body}");
                return Err(registrar_error(message));
            }
        };
        if !http_status.is_success() || status.status != STATUS_SUCCESS {
            let message = if status.message.is_empty() {
                format!("status {http_status}")
            } else {
                status.message
            };
            return Err(registrar_error(message));
        }
        serde_json::from_str(&body).map_err(|err| {
            let message = format!("invalid response: {err}");
            registrar_error(message)
        })
    }
}

/// Porkbun's fully qualified record name, relative to `zone`.
fn relative_name(name: &str, zone: &str) -> String {
    if name.is_empty() || name == zone {
        return APEX.to_string();
    }
    match name.strip_suffix(zone).and_then(|sub| sub.strip_suffix('.')) {
        Some(sub) if !sub.is_empty() => sub.to_string(),
        _ => name.to_string(),
    }
}

/// The subdomain Porkbun expects when creating or editing, empty for the apex.
fn wire_name(name: &str) -> &str {
    if name == APEX {
        ""
    } else {
        name
    }
}

fn record_payload(record: &LiveRecord) -> RecordPayload<'_> {
    RecordPayload {
        name: wire_name(&record.name),
        record_type: &record.record_type,
        content: &record.content,
        ttl: &record.ttl,
    }
}

#[async_trait::async_trait]
impl Registrar for PorkbunClient {
    async fn ping(&self) -> Result<(), Error> {
        self.call::<_, Empty>("ping", "", "ping", NoPayload {}).await?;
        Ok(())
    }

    async fn retrieve_records(&self, zone: &str) -> Result<Vec<LiveRecord>, Error> {
        let path = format!("dns/retrieve/{zone}");
        let response: RetrieveResponse = self.call("retrieve", zone, &path, NoPayload {}).await?;
        let records = response
            .records
            .into_iter()
            .map(|r| LiveRecord {
                id: r.id,
                name: relative_name(&r.name, zone),
                record_type: r.record_type,
                content: r.content,
                ttl: r.ttl,
            })
            .collect();
        Ok(records)
    }

    async fn create_record(&self, zone: &str, record: &LiveRecord) -> Result<u64, Error> {
        let path = format!("dns/create/{zone}");
        let payload = record_payload(record);
        let response: CreateResponse = self.call("create", zone, &path, payload).await?;
        Ok(response.id)
    }

    async fn edit_record(&self, zone: &str, id: u64, record: &LiveRecord) -> Result<(), Error> {
        let path = format!("dns/edit/{zone}/{id}");
        let payload = record_payload(record);
        self.call::<_, Empty>("edit", zone, &path, payload).await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &str, id: u64) -> Result<(), Error> {
        let path = format!("dns/delete/{zone}/{id}");
        self.call::<_, Empty>("delete", zone, &path, NoPayload {}).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ZONE: &str = "example.com";

    fn client(server: &MockServer) -> PorkbunClient {
        PorkbunClient::new(server.uri(), "KEY", "SECRET", Duration::from_secs(5)).unwrap()
    }

    fn www() -> LiveRecord {
        LiveRecord {
            id: String::new(),
            name: "www".into(),
            record_type: "A".into(),
            content: "1.2.3.4".into(),
            ttl: "600".into(),
        }
    }

    fn success(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(body)
    }

    #[test]
    fn rejects_empty_credentials() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            PorkbunClient::new("http://localhost", "", "SECRET", timeout),
            Err(Error::MissingApiKey)
        ));
        assert!(matches!(
            PorkbunClient::new("http://localhost", "KEY", "", timeout),
            Err(Error::MissingApiSecret)
        ));
    }

    #[test]
    fn names_are_made_zone_relative() {
        assert_eq!(relative_name("example.com", ZONE), "@");
        assert_eq!(relative_name("www.example.com", ZONE), "www");
        assert_eq!(relative_name("a.b.example.com", ZONE), "a.b");
        assert_eq!(relative_name("www", ZONE), "www");
        assert_eq!(relative_name("@", ZONE), "@");
        assert_eq!(wire_name("@"), "");
        assert_eq!(wire_name("www"), "www");
    }

    #[test]
    fn debug_hides_credentials() {
        let timeout = Duration::from_secs(1);
        let client = PorkbunClient::new("http://localhost", "KEY", "SECRET", timeout).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("KEY"));
        assert!(!debug.contains("SECRET"));
    }

    #[tokio::test]
    async fn ping_sends_credentials() {
        let server = MockServer::start().await;
        let credentials = json!({"apikey": "KEY", "secretapikey": "SECRET"});
        Mock::given(method("POST"))
            .and(path("/ping"))
            .and(body_partial_json(credentials))
            .respond_with(success(json!({"status": "SUCCESS", "yourIp": "127.0.0.1"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn ping_failure_carries_registrar_message() {
        let server = MockServer::start().await;
        let rejection = json!({"status": "ERROR", "message": "Invalid API key."});
        Mock::given(method("POST"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(400).set_body_json(rejection))
            .mount(&server)
            .await;

        let err = client(&server).ping().await.unwrap_err();
        match err {
            Error::Registrar { message, .. } => assert_eq!(message, "Invalid API key."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_keeps_its_cause() {
        let timeout = Duration::from_secs(5);
        let client = PorkbunClient::new("http://127.0.0.1:1", "KEY", "SECRET", timeout).unwrap();

        let err = client.ping().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        let message = err.to_string();
        assert!(message.starts_with("registrar request failed: "));
        assert!(message.contains("127.0.0.1:1"), "{message}");
    }

    #[tokio::test]
    async fn retrieve_converts_names() {
        let server = MockServer::start().await;
        let records = json!({
            "status": "SUCCESS",
            "records": [
                {"id": "106926652", "name": "example.com", "type": "A", "content": "1.1.1.1",
                 "ttl": "600", "prio": "0", "notes": ""},
                {"id": "106926659", "name": "www.example.com", "type": "A", "content": "1.1.1.1",
                 "ttl": "600", "prio": "0", "notes": ""}
            ]
        });
        Mock::given(method("POST"))
            .and(path("/dns/retrieve/example.com"))
            .respond_with(success(records))
            .mount(&server)
            .await;

        let records = client(&server).retrieve_records(ZONE).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "@");
        assert_eq!(records[0].id, "106926652");
        assert_eq!(records[1].name, "www");
        assert_eq!(records[1].ttl, "600");
    }

    #[tokio::test]
    async fn create_returns_numeric_id() {
        let server = MockServer::start().await;
        let expected = json!({"name": "www", "type": "A", "content": "1.2.3.4", "ttl": "600"});
        Mock::given(method("POST"))
            .and(path("/dns/create/example.com"))
            .and(body_partial_json(expected))
            .respond_with(success(json!({"status": "SUCCESS", "id": 106_926_659})))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).create_record(ZONE, &www()).await.unwrap();
        assert_eq!(id, 106_926_659);
    }

    #[tokio::test]
    async fn apex_is_sent_as_empty_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dns/edit/example.com/7"))
            .and(body_partial_json(json!({"name": "", "content": "1.2.3.4"})))
            .respond_with(success(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        let apex = LiveRecord {
            name: APEX.into(),
            ..www()
        };
        client(&server).edit_record(ZONE, 7, &apex).await.unwrap();
    }

    #[tokio::test]
    async fn error_status_carries_registrar_message() {
        let server = MockServer::start().await;
        let rejection = json!({"status": "ERROR", "message": "Invalid record ID."});
        Mock::given(method("POST"))
            .and(path("/dns/delete/example.com/7"))
            .respond_with(success(rejection))
            .mount(&server)
            .await;

        let err = client(&server).delete_record(ZONE, 7).await.unwrap_err();
        match err {
            Error::Registrar {
                operation, message, ..
            } => {
                assert_eq!(operation, "delete");
                assert_eq!(message, "Invalid record ID.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
