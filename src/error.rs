//! Error types.

/// Error enumerates the possible webhook error states.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Returned when the configured
    /// [`Config::domain_filter`][`crate::config::Config::domain_filter`] is empty. At least one
    /// managed zone is required.
    #[error("at least one zone must be configured in the domain filter")]
    NoZones,

    /// Returned when no Porkbun API key was configured.
    #[error("an API key is required to connect to Porkbun")]
    MissingApiKey,

    /// Returned when no Porkbun API secret was configured.
    #[error("an API secret is required to connect to Porkbun")]
    MissingApiSecret,

    /// Returned when a listen address taken from the environment can't be parsed.
    #[error("invalid listen address '{value}' in {variable}")]
    InvalidListenAddress {
        variable: &'static str,
        value: String,
    },

    /// Returned when the registrar rejects the credential check performed before a
    /// reconciliation or listing cycle.
    #[error("authentication with the registrar failed: {0}")]
    Authentication(String),

    /// Returned when an endpoint without any target is handed to the
    /// [record translator][crate::provider::translate].
    #[error("endpoint \"{name}\" ({record_type}) has no targets")]
    EmptyTargets { name: String, record_type: String },

    /// Returned when a mutation needs a numeric registrar ID but the resolved ID is empty or
    /// not a number. An empty ID means no live record matched the endpoint.
    #[error(
        "unable to parse record ID '{id}' for {record_type} record \"{name}\" \
         with content \"{content}\""
    )]
    InvalidRecordId {
        id: String,
        name: String,
        record_type: String,
        content: String,
    },

    /// Returned when a live record's TTL is not an integer.
    #[error("unable to parse TTL value '{ttl}' of record \"{name}\"")]
    InvalidTtl { name: String, ttl: String },

    /// Returned when the registrar answers a request with an error status.
    #[error("registrar {operation} failed for zone \"{zone}\": {message}")]
    Registrar {
        operation: &'static str,
        zone: String,
        message: String,
    },

    /// Returned when a request to the registrar can't be sent or its response can't be read.
    #[error("registrar request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Returned when a generic IO error occurs.
    #[error("an IO error occurred")]
    IO(#[from] std::io::Error),

    /// Returned when [loading a `Config`][crate::config::Config::try_from_file] fails due to
    /// invalid JSON content.
    #[error("invalid JSON")]
    InvalidJSON(#[from] serde_json::Error),
}
