//! Registrar API access.
//!
//! The registrar owns the live record set. It assigns every record an opaque numeric ID when
//! the record is created, and requires that ID for every later edit or delete. This module
//! describes the operations the webhook needs from a registrar as the [`Registrar`] trait.
//!
//! Two implementations are provided, [`porkbun::PorkbunClient`] and
//! [`memory::InMemoryRegistrar`]. The former talks to the Porkbun JSON API. The latter keeps
//! records in memory and records every call made against it.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod porkbun;

pub use memory::{InMemoryRegistrar, Operation, RegistrarCall};
pub use porkbun::PorkbunClient;

/// Zone-relative name the registrar uses for the zone apex.
pub const APEX: &str = "@";

/// `DynRegistrar` is a type alias for a [`Registrar`] shared by every request handler.
pub type DynRegistrar = Arc<dyn Registrar + Send + Sync>;

/// A record as the registrar sees it.
///
/// `name` is relative to the zone, with [`APEX`] standing for the zone itself. `id` is assigned
/// by the registrar; in a mutation request it is whatever ID resolution found, and empty when no
/// live record matched. `ttl` is empty when the registrar default should apply.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    pub ttl: String,
}

impl LiveRecord {
    /// Parse the numeric ID required by edit and delete calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecordId`] naming the record if the ID is empty or not a number.
    pub fn numeric_id(&self) -> Result<u64, Error> {
        self.id.parse().map_err(|_| Error::InvalidRecordId {
            id: self.id.clone(),
            name: self.name.clone(),
            record_type: self.record_type.clone(),
            content: self.content.clone(),
        })
    }
}

/// An async trait describing the registrar calls used by the
/// [`Provider`][crate::provider::Provider]. Each method is one round trip to the registrar.
#[async_trait::async_trait]
pub trait Registrar {
    /// Check that the configured credentials are accepted.
    async fn ping(&self) -> Result<(), Error>;

    /// Fetch every live record of `zone`.
    async fn retrieve_records(&self, zone: &str) -> Result<Vec<LiveRecord>, Error>;

    /// Create `record` in `zone`, returning the ID the registrar assigned to it.
    async fn create_record(&self, zone: &str, record: &LiveRecord) -> Result<u64, Error>;

    /// Replace the record `id` of `zone` with `record`.
    async fn edit_record(&self, zone: &str, id: u64, record: &LiveRecord) -> Result<(), Error>;

    /// Delete the record `id` of `zone`.
    async fn delete_record(&self, zone: &str, id: u64) -> Result<(), Error>;
}
