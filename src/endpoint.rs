//! The external-dns webhook wire model.
//!
//! These types mirror the JSON external-dns exchanges with webhook providers: an [`Endpoint`] is
//! one desired DNS record (name, type, targets, TTL), and [`Changes`] is the batch of endpoints to
//! create, update and delete in one reconciliation cycle.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use std::collections::BTreeMap;
use std::fmt;

pub const RECORD_TYPE_A: &str = "A";
pub const RECORD_TYPE_AAAA: &str = "AAAA";
pub const RECORD_TYPE_CNAME: &str = "CNAME";
pub const RECORD_TYPE_TXT: &str = "TXT";
pub const RECORD_TYPE_MX: &str = "MX";
pub const RECORD_TYPE_NS: &str = "NS";
pub const RECORD_TYPE_SRV: &str = "SRV";
pub const RECORD_TYPE_CAA: &str = "CAA";
pub const RECORD_TYPE_ALIAS: &str = "ALIAS";

/// Record types the webhook advertises during negotiation.
pub const SUPPORTED_RECORD_TYPES: [&str; 9] = [
    RECORD_TYPE_A,
    RECORD_TYPE_AAAA,
    RECORD_TYPE_CNAME,
    RECORD_TYPE_TXT,
    RECORD_TYPE_MX,
    RECORD_TYPE_NS,
    RECORD_TYPE_SRV,
    RECORD_TYPE_CAA,
    RECORD_TYPE_ALIAS,
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSpecificProperty {
    pub name: String,
    pub value: String,
}

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub dns_name: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub targets: Vec<String>,
    pub record_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(rename = "recordTTL", default, skip_serializing_if = "is_zero")]
    pub record_ttl: i64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecificProperty>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(ttl: &i64) -> bool {
    *ttl == 0
}

impl Endpoint {
    pub fn new(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets,
            ..Self::default()
        }
    }

    pub fn with_ttl(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: i64,
        targets: Vec<String>,
    ) -> Self {
        Self {
            record_ttl: ttl,
            ..Self::new(dns_name, record_type, targets)
        }
    }

    /// Whether the endpoint carries an explicit TTL.
    pub fn ttl_is_configured(&self) -> bool {
        self.record_ttl > 0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} IN {} {} {:?}",
            self.dns_name,
            self.record_ttl,
            self.record_type,
            self.set_identifier,
            self.targets
        )
    }
}

/// One reconciliation cycle's worth of changes.
///
/// `update_old` holds the current state of records being updated and `update_new` their target
/// state. Missing and `null` lists are read as empty.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    #[serde(rename = "Create", alias = "create", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub create: Vec<Endpoint>,
    #[serde(rename = "UpdateOld", alias = "updateOld", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub update_old: Vec<Endpoint>,
    #[serde(rename = "UpdateNew", alias = "updateNew", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub update_new: Vec<Endpoint>,
    #[serde(rename = "Delete", alias = "delete", default)]
    #[serde_as(as = "DefaultOnNull")]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    pub fn has_changes(&self) -> bool {
        !(self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty())
    }
}

/// Capability negotiation answer for `GET /`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Negotiation {
    pub filters: Vec<String>,
    pub include: Vec<String>,
    pub supported_record_types: Vec<String>,
}

impl Negotiation {
    pub fn new(zones: &[String]) -> Self {
        Self {
            filters: zones.to_vec(),
            include: zones.to_vec(),
            supported_record_types: SUPPORTED_RECORD_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_accept_null_and_missing_lists() {
        let changes: Changes = serde_json::from_str(
            r#"{"Create": [{"dnsName": "api.example.com", "targets": ["1.2.3.4"],
                            "recordType": "A"}],
                "UpdateOld": null}"#,
        )
        .unwrap();
        assert_eq!(changes.create.len(), 1);
        assert!(changes.update_old.is_empty());
        assert!(changes.update_new.is_empty());
        assert!(changes.has_changes());
        assert!(!Changes::default().has_changes());
    }

    #[test]
    fn changes_accept_lowercase_keys() {
        let changes: Changes = serde_json::from_str(
            r#"{"delete": [{"dnsName": "api.example.com", "targets": ["1.2.3.4"],
                            "recordType": "A"}]}"#,
        )
        .unwrap();
        assert_eq!(changes.delete[0].dns_name, "api.example.com");
    }

    #[test]
    fn endpoint_json_uses_external_dns_names() {
        let ep = Endpoint::with_ttl("example.com", RECORD_TYPE_A, 600, vec!["1.2.3.4".into()]);
        let json = serde_json::to_value(&ep).unwrap();
        assert_eq!(json["dnsName"], "example.com");
        assert_eq!(json["recordTTL"], 600);
        assert_eq!(json["recordType"], "A");
        assert!(json.get("labels").is_none());

        let parsed: Endpoint = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, ep);
    }
}
