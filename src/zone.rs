//! Managed zones and the zone router.

use crate::error::Error;

/// The domain suffixes this webhook manages, in configuration order.
///
/// Immutable once built, and never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSet {
    zones: Vec<String>,
}

impl ZoneSet {
    /// Build a zone set from the configured domain filter. Blank entries are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoZones`] if no zone remains.
    pub fn new<I, S>(zones: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for zone in zones {
            let zone = zone.into();
            if !zone.is_empty() && !set.contains(&zone) {
                set.push(zone);
            }
        }
        if set.is_empty() {
            return Err(Error::NoZones);
        }
        Ok(Self { zones: set })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.zones
    }

    /// The zone owning `name`: the longest configured zone that `name` equals or ends with on a
    /// label boundary. Ties can't happen since zones are unique, so configuration order never
    /// matters. `None` means the name is unmanaged.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.iter()
            .filter(|zone| in_zone(name, zone))
            .max_by_key(|zone| zone.len())
    }
}

fn in_zone(name: &str, zone: &str) -> bool {
    match name.strip_suffix(zone) {
        Some("") => true,
        Some(rest) => rest.ends_with('.'),
        None => false,
    }
}
