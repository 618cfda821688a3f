//! Splitting a change batch by zone.

use crate::endpoint::{Changes, Endpoint};
use crate::events::{Event, EventSink};
use crate::zone::ZoneSet;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    UpdateOld,
    UpdateNew,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::UpdateOld => "updateOld",
            ChangeKind::UpdateNew => "updateNew",
            ChangeKind::Delete => "delete",
        }
    }

    fn list(self, changes: &Changes) -> &[Endpoint] {
        match self {
            ChangeKind::Create => &changes.create,
            ChangeKind::UpdateOld => &changes.update_old,
            ChangeKind::UpdateNew => &changes.update_new,
            ChangeKind::Delete => &changes.delete,
        }
    }

    fn list_mut(self, changes: &mut Changes) -> &mut Vec<Endpoint> {
        match self {
            ChangeKind::Create => &mut changes.create,
            ChangeKind::UpdateOld => &mut changes.update_old,
            ChangeKind::UpdateNew => &mut changes.update_new,
            ChangeKind::Delete => &mut changes.delete,
        }
    }
}

/// Split `changes` into one batch per configured zone.
///
/// Every configured zone gets an entry, possibly empty. Endpoints keep their input order within
/// each list. Endpoints outside every zone are dropped and reported as debug events.
pub fn partition(
    changes: &Changes,
    zones: &ZoneSet,
    events: &dyn EventSink,
) -> HashMap<String, Changes> {
    let mut per_zone: HashMap<String, Changes> = zones
        .iter()
        .map(|zone| {
            events.emit(Event::debug("zone detected").field("zone", zone));
            (zone.to_string(), Changes::default())
        })
        .collect();

    for kind in [
        ChangeKind::Create,
        ChangeKind::UpdateOld,
        ChangeKind::UpdateNew,
        ChangeKind::Delete,
    ] {
        for ep in kind.list(changes) {
            let Some(zone) = zones.resolve(&ep.dns_name) else {
                events.emit(
                    Event::debug("ignoring change since it did not match any zone")
                        .field("type", kind.as_str())
                        .field("endpoint", ep),
                );
                continue;
            };
            events.emit(
                Event::debug("planning")
                    .field("type", kind.as_str())
                    .field("endpoint", ep)
                    .field("zone", zone),
            );
            if let Some(batch) = per_zone.get_mut(zone) {
                kind.list_mut(batch).push(ep.clone());
            }
        }
    }
    per_zone
}
