//! The external-dns webhook HTTP API.
//!
//! Every JSON response of the contract is sent with the media type
//! `application/external.dns.webhook+json;version=1`.
//!
//! # API Endpoints
//!
//! ## `/` (GET)
//!
//!   Capability negotiation. Returns the managed zones and the supported record types:
//!
//!   ```json
//!   { "filters": ["example.com"], "include": ["example.com"],
//!     "supportedRecordTypes": ["A", "AAAA", "CNAME", "TXT", "MX", "NS", "SRV", "CAA", "ALIAS"] }
//!   ```
//!
//! ## `/records` (GET)
//!
//!   Returns every live record of the managed zones as a JSON list of endpoints, see
//!   [`Provider::records`][crate::provider::Provider::records].
//!
//! ## `/` and `/records` (POST)
//!
//!   Expects a JSON change batch of the form:
//!
//!   ```json
//!   { "Create": [ ... ], "UpdateOld": [ ... ], "UpdateNew": [ ... ], "Delete": [ ... ] }
//!   ```
//!
//!   and applies it, see [`Provider::apply_changes`][crate::provider::Provider::apply_changes].
//!   Returns HTTP 204 (No Content) on success and HTTP 500 with a JSON body
//!   `{"error": "..."}` if the cycle failed.
//!
//! ## `/adjustendpoints` (POST)
//!
//!   Expects a JSON list of endpoints and returns it unchanged.
//!
//! ## `/healthz` (GET)
//!
//!   Returns HTTP 200 (OK) with the body `OK`.

mod api_error;
mod model;
mod routes;
pub mod server;

pub use model::MEDIA_TYPE;
pub use server::{new, router};
