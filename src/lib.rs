//! Porkbun Webhook
//!
//! An [external-dns] [webhook provider] for the [Porkbun] DNS registrar.
//!
//! external-dns decides which DNS records should exist and hands them to this webhook as
//! generic [endpoints][endpoint::Endpoint]. The webhook reconciles them with the records
//! Porkbun holds: it routes every endpoint to the managed zone that owns it, translates it into
//! Porkbun's record shape, recovers the registrar-assigned ID needed to edit or delete it, and
//! applies each zone's changes in an order that keeps the live zone consistent.
//!
//! [external-dns]: https://github.com/kubernetes-sigs/external-dns
//! [webhook provider]: https://kubernetes-sigs.github.io/external-dns/latest/docs/tutorials/webhook-provider/
//! [Porkbun]: https://porkbun.com/api/json/v3/documentation
//!
#![warn(clippy::pedantic)]

pub mod api;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod metrics;
pub mod provider;
pub mod registrar;
pub mod zone;

pub use api::new as new_http;
pub use config::{Config, SharedConfig};
pub use endpoint::{Changes, Endpoint};
pub use error::Error;
pub use events::{EventSink, MemorySink, TracingSink};
pub use provider::{Provider, SharedProvider};
pub use registrar::{InMemoryRegistrar, PorkbunClient, Registrar};
pub use zone::ZoneSet;
