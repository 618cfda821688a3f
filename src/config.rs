use crate::error::Error;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub type SharedConfig = Arc<Config>;

/// Porkbun JSON API v3.
pub const DEFAULT_API_BASE_URL: &str = "https://api.porkbun.com/api/json/v3";

const API_KEY_ENV: &str = "API_KEY";
const API_SECRET_ENV: &str = "API_SECRET";
const DRY_RUN_ENV: &str = "DRY_RUN";
const DOMAIN_FILTER_ENV: &str = "DOMAIN_FILTER";
const LISTEN_ADDRESS_ENV: &str = "LISTEN_ADDRESS";
const METRICS_LISTEN_ADDRESS_ENV: &str = "METRICS_LISTEN_ADDRESS";

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub domain_filter: Vec<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_metrics_listen_addr")]
    pub metrics_listen_addr: SocketAddr,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub api_timeout: Duration,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub registrar_timeout: Duration,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8888))
}

fn default_metrics_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8889))
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Parse a listen address, accepting the `:port` shorthand for all interfaces.
fn parse_listen_addr(variable: &'static str, value: &str) -> Result<SocketAddr, Error> {
    let full = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    full.parse().map_err(|_| Error::InvalidListenAddress {
        variable,
        value: value.to_string(),
    })
}

impl Config {
    /// Load and validate a [`Config`] from the JSON document at the given path.
    ///
    /// The environment takes precedence over the file:
    ///
    /// - `DOMAIN_FILTER`: comma separated list of zones, replaces `domain_filter`.
    /// - `LISTEN_ADDRESS` and `METRICS_LISTEN_ADDRESS`: socket addresses, `:port` meaning all
    ///   interfaces.
    /// - `DRY_RUN=true` forces dry-run mode on.
    ///
    /// Credentials missing from the file are taken from `API_KEY` and `API_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IO`] or [`Error::InvalidJSON`] if the file can't be read or parsed,
    /// [`Error::InvalidListenAddress`] for a malformed address variable, and the errors of
    /// [`Config::validate`] otherwise.
    pub fn try_from_file(p: impl AsRef<Path>) -> Result<Self, Error> {
        let f = File::open(p)?;
        let reader = BufReader::new(f);
        let mut conf: Config = serde_json::from_reader(reader)?;
        conf.apply_env(|key| std::env::var(key).ok())?;
        conf.validate()?;
        Ok(conf)
    }

    /// Check the settings the webhook can't run without.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoZones`], [`Error::MissingApiKey`] or [`Error::MissingApiSecret`].
    pub fn validate(&self) -> Result<(), Error> {
        if self.domain_filter.iter().all(String::is_empty) {
            return Err(Error::NoZones);
        }
        if self.api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }
        if self.api_secret.is_empty() {
            return Err(Error::MissingApiSecret);
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), Error> {
        if let Some(zones) = lookup(DOMAIN_FILTER_ENV) {
            self.domain_filter = zones
                .split(',')
                .map(str::trim)
                .filter(|zone| !zone.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if self.api_key.is_empty() {
            if let Some(key) = lookup(API_KEY_ENV) {
                self.api_key = key;
            }
        }
        if self.api_secret.is_empty() {
            if let Some(secret) = lookup(API_SECRET_ENV) {
                self.api_secret = secret;
            }
        }
        if lookup(DRY_RUN_ENV).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            self.dry_run = true;
        }
        if let Some(addr) = lookup(LISTEN_ADDRESS_ENV) {
            self.listen_addr = parse_listen_addr(LISTEN_ADDRESS_ENV, &addr)?;
        }
        if let Some(addr) = lookup(METRICS_LISTEN_ADDRESS_ENV) {
            self.metrics_listen_addr = parse_listen_addr(METRICS_LISTEN_ADDRESS_ENV, &addr)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("domain_filter", &self.domain_filter)
            .field("api_key", &"<REDACTED>")
            .field("api_secret", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .field("listen_addr", &self.listen_addr)
            .field("metrics_listen_addr", &self.metrics_listen_addr)
            .field("api_timeout", &self.api_timeout)
            .field("api_base_url", &self.api_base_url)
            .field("registrar_timeout", &self.registrar_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    fn minimal() -> Config {
        parse(r#"{"domain_filter": ["example.com"], "api_key": "k", "api_secret": "s"}"#)
    }

    #[test]
    fn defaults_are_applied() {
        let conf = minimal();
        assert!(!conf.dry_run);
        assert_eq!(conf.listen_addr, default_listen_addr());
        assert_eq!(conf.metrics_listen_addr.port(), 8889);
        assert_eq!(conf.api_timeout, Duration::from_secs(30));
        assert_eq!(conf.api_base_url, DEFAULT_API_BASE_URL);
        assert!(conf.validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_settings() {
        let no_zones = parse(r#"{"domain_filter": [], "api_key": "k", "api_secret": "s"}"#);
        assert!(matches!(no_zones.validate(), Err(Error::NoZones)));

        let no_key = parse(r#"{"domain_filter": ["example.com"], "api_secret": "s"}"#);
        assert!(matches!(no_key.validate(), Err(Error::MissingApiKey)));

        let no_secret = parse(r#"{"domain_filter": ["example.com"], "api_key": "k"}"#);
        assert!(matches!(no_secret.validate(), Err(Error::MissingApiSecret)));
    }

    #[test]
    fn environment_fills_missing_credentials() {
        let mut conf = parse(r#"{"domain_filter": ["example.com"], "api_key": "file-key"}"#);
        conf.apply_env(|key| match key {
            API_KEY_ENV => Some("env-key".to_string()),
            API_SECRET_ENV => Some("env-secret".to_string()),
            DRY_RUN_ENV => Some("TRUE".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(conf.api_key, "file-key");
        assert_eq!(conf.api_secret, "env-secret");
        assert!(conf.dry_run);
    }

    #[test]
    fn environment_overrides_zones_and_addresses() {
        let mut conf = minimal();
        conf.apply_env(|key| match key {
            DOMAIN_FILTER_ENV => Some("example.org, example.net,".to_string()),
            LISTEN_ADDRESS_ENV => Some(":9999".to_string()),
            METRICS_LISTEN_ADDRESS_ENV => Some("127.0.0.1:9100".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(conf.domain_filter, ["example.org", "example.net"]);
        assert_eq!(conf.listen_addr, SocketAddr::from(([0, 0, 0, 0], 9999)));
        assert_eq!(
            conf.metrics_listen_addr,
            SocketAddr::from(([127, 0, 0, 1], 9100))
        );
    }

    #[test]
    fn malformed_listen_address_is_rejected() {
        let lookup = |key: &str| (key == LISTEN_ADDRESS_ENV).then(|| "localhost".to_string());
        let err = minimal().apply_env(lookup).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidListenAddress { variable, ref value }
                if variable == LISTEN_ADDRESS_ENV && value == "localhost"
        ));
    }

    #[test]
    fn debug_redacts_credentials() {
        let conf = parse(
            r#"{"domain_filter": ["example.com"], "api_key": "k3y", "api_secret": "s3cr3t"}"#,
        );
        let debug = format!("{conf:?}");
        assert!(!debug.contains("k3y"));
        assert!(!debug.contains("s3cr3t"));
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"domain_filter": ["example.com"], "api_key": "k", "api_secret": "s",
                "dry_run": true, "api_timeout": 5}}"#
        )
        .unwrap();
        let conf = Config::try_from_file(f.path()).unwrap();
        assert!(conf.dry_run);
        assert_eq!(conf.api_timeout, Duration::from_secs(5));
    }
}
