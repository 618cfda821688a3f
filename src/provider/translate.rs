//! Translation from external-dns endpoints to registrar records, and ID resolution against a
//! zone's live-record snapshot.

use crate::endpoint::{Endpoint, RECORD_TYPE_TXT};
use crate::error::Error;
use crate::registrar::{LiveRecord, APEX};

const HERITAGE_PREFIX: &str = "\"heritage=";

/// What a translated record will be used for.
///
/// Both intents currently translate identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Create, or the target state of an update.
    Upsert,
    /// Delete, or the previous state of an update.
    Delete,
}

/// The name of `dns_name` relative to `zone`, [`APEX`] for the zone itself.
pub fn relative_name(dns_name: &str, zone: &str) -> String {
    let name = dns_name
        .strip_suffix(zone)
        .and_then(|rest| rest.strip_suffix('.'))
        .unwrap_or(dns_name);
    if name == zone {
        APEX.to_string()
    } else {
        name.to_string()
    }
}

/// The content sent to the registrar for the first target of an endpoint.
///
/// Ownership TXT records written by external-dns are quoted (`"heritage=..."`); Porkbun stores
/// TXT content unquoted, so the quotes are stripped.
pub fn record_content(record_type: &str, target: &str) -> String {
    if record_type == RECORD_TYPE_TXT && target.starts_with(HERITAGE_PREFIX) {
        target.trim_matches('"').to_string()
    } else {
        target.to_string()
    }
}

/// The ID of the first live record matching name, content and type exactly, or an empty string
/// when none does.
pub fn find_id(name: &str, content: &str, record_type: &str, live: &[LiveRecord]) -> String {
    live.iter()
        .find(|r| r.record_type == record_type && r.content == content && r.name == name)
        .map(|r| r.id.clone())
        .unwrap_or_default()
}

/// Translate one endpoint of `zone` into a registrar record, resolving its ID against `live`.
///
/// Only the first target is used.
///
/// # Errors
///
/// Returns [`Error::EmptyTargets`] if the endpoint has no target.
pub fn to_live_record(
    endpoint: &Endpoint,
    zone: &str,
    live: &[LiveRecord],
    _intent: Intent,
) -> Result<LiveRecord, Error> {
    let target = endpoint.targets.first().ok_or_else(|| Error::EmptyTargets {
        name: endpoint.dns_name.clone(),
        record_type: endpoint.record_type.clone(),
    })?;
    let name = relative_name(&endpoint.dns_name, zone);
    let content = record_content(&endpoint.record_type, target);
    let ttl = if endpoint.ttl_is_configured() {
        endpoint.record_ttl.to_string()
    } else {
        String::new()
    };
    Ok(LiveRecord {
        id: find_id(&name, &content, &endpoint.record_type, live),
        name,
        record_type: endpoint.record_type.clone(),
        content,
        ttl,
    })
}

/// Translate every endpoint of a list, preserving order.
///
/// # Errors
///
/// See [`to_live_record`].
pub fn to_live_records(
    endpoints: &[Endpoint],
    zone: &str,
    live: &[LiveRecord],
    intent: Intent,
) -> Result<Vec<LiveRecord>, Error> {
    endpoints
        .iter()
        .map(|ep| to_live_record(ep, zone, live, intent))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::RECORD_TYPE_A;

    const HERITAGE: &str =
        "heritage=external-dns,external-dns/owner=default,external-dns/resource=service/default/nginx";

    fn live(id: &str, name: &str, record_type: &str, content: &str) -> LiveRecord {
        LiveRecord {
            id: id.into(),
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            ttl: String::new(),
        }
    }

    #[test]
    fn find_id_requires_exact_triple() {
        let records = vec![
            live("10", "foo.example.com", "TXT", HERITAGE),
            live("10", "foo.foo.org", "A", "5.5.5.5"),
            live("", "baz.org", "A", "5.5.5.5"),
        ];
        assert_eq!(find_id("foo.example.com", HERITAGE, "TXT", &records), "10");
        assert_eq!(find_id("foo.example.com", "5.5.5.5", "TXT", &records), "");
        assert_eq!(find_id("FOO.example.com", HERITAGE, "TXT", &records), "");
    }

    #[test]
    fn apex_becomes_sentinel() {
        assert_eq!(relative_name("bar.org", "bar.org"), "@");
        assert_eq!(relative_name("foo.bar.org", "bar.org"), "foo");
        assert_eq!(relative_name("foo.foo.org", "bar.org"), "foo.foo.org");
    }

    #[test]
    fn heritage_txt_is_unquoted() {
        let quoted = format!("\"{HERITAGE}\"");
        assert_eq!(record_content("TXT", &quoted), HERITAGE);
        assert_eq!(record_content("A", &quoted), quoted);
        assert_eq!(record_content("TXT", "\"v=spf1 -all\""), "\"v=spf1 -all\"");
    }

    #[test]
    fn translates_endpoint_list() {
        let endpoints = vec![
            Endpoint::new("foo.bar.org", RECORD_TYPE_A, vec!["5.5.5.5".into()]),
            Endpoint::new("foo.foo.org", RECORD_TYPE_A, vec!["5.5.5.5".into()]),
            Endpoint::new("bar.org", RECORD_TYPE_A, vec!["5.5.5.5".into()]),
            Endpoint::new(
                "foo.baz.org",
                RECORD_TYPE_TXT,
                vec![format!("\"{HERITAGE}\"")],
            ),
        ];
        let snapshot = vec![
            live("10", "foo", "A", "5.5.5.5"),
            live("15", "foo.foo.org", "A", "5.5.5.5"),
        ];
        let expected = vec![
            live("10", "foo", "A", "5.5.5.5"),
            live("15", "foo.foo.org", "A", "5.5.5.5"),
            live("", "@", "A", "5.5.5.5"),
            live("", "foo.baz.org", "TXT", HERITAGE),
        ];
        let translated = to_live_records(&endpoints, "bar.org", &snapshot, Intent::Upsert).unwrap();
        assert_eq!(translated, expected);

        let as_delete = to_live_records(&endpoints, "bar.org", &snapshot, Intent::Delete).unwrap();
        assert_eq!(as_delete, translated);
    }

    #[test]
    fn ttl_is_carried_when_configured() {
        let ep = Endpoint::with_ttl("www.bar.org", RECORD_TYPE_A, 600, vec!["1.2.3.4".into()]);
        let record = to_live_record(&ep, "bar.org", &[], Intent::Upsert).unwrap();
        assert_eq!(record.ttl, "600");
        assert_eq!(record.id, "");
    }

    #[test]
    fn empty_targets_are_rejected() {
        let ep = Endpoint::new("www.bar.org", RECORD_TYPE_A, vec![]);
        let err = to_live_record(&ep, "bar.org", &[], Intent::Upsert).unwrap_err();
        assert!(matches!(err, Error::EmptyTargets { ref name, .. } if name == "www.bar.org"));
    }
}
