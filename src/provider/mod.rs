//! Reconciliation between external-dns endpoints and the registrar's live records.
//!
//! # Listing
//!
//! [`Provider::records`] reads every configured zone from the registrar and reports each live
//! record as an [`Endpoint`] with a fully qualified name.
//!
//! # Applying changes
//!
//! [`Provider::apply_changes`] runs one reconciliation cycle:
//!
//! 1. An empty batch returns immediately, without registrar calls.
//! 2. The registrar credentials are checked (skipped in dry-run mode).
//! 3. The batch is [partitioned][partition::partition] by zone. Unmanaged endpoints are dropped.
//! 4. In dry-run mode the cycle ends here.
//! 5. Each zone with pending changes fetches one snapshot of its live records, translates its
//!    endpoints against that snapshot to recover registrar IDs, then issues its mutations in the
//!    order: previous state of updates, deletions, creations, target state of updates.
//!
//! Deletions run before creations so a record being replaced by one with the same name and type
//! is gone before its replacement is created. The first failing mutation ends the cycle; changes
//! already applied are not rolled back.

use crate::config::Config;
use crate::endpoint::{Changes, Endpoint};
use crate::error::Error;
use crate::events::{DynEventSink, Event};
use crate::registrar::{DynRegistrar, LiveRecord, PorkbunClient, APEX};
use crate::zone::ZoneSet;
use std::sync::Arc;

pub mod partition;
pub mod translate;

use translate::{to_live_records, Intent};

/// `SharedProvider` is a type alias for a [`Provider`] shared by every request handler.
pub type SharedProvider = Arc<Provider>;

pub struct Provider {
    zones: ZoneSet,
    registrar: DynRegistrar,
    dry_run: bool,
    events: DynEventSink,
}

/// The mutations of one zone, translated into registrar records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct ZoneMutations {
    create: Vec<LiveRecord>,
    update_old: Vec<LiveRecord>,
    update_new: Vec<LiveRecord>,
    delete: Vec<LiveRecord>,
}

impl Provider {
    pub fn new(
        zones: ZoneSet,
        registrar: DynRegistrar,
        dry_run: bool,
        events: DynEventSink,
    ) -> Self {
        Self {
            zones,
            registrar,
            dry_run,
            events,
        }
    }

    /// Build a provider talking to Porkbun with the configured zones and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoZones`], [`Error::MissingApiKey`] or [`Error::MissingApiSecret`] when
    /// the configuration is incomplete.
    pub fn from_config(config: &Config, events: DynEventSink) -> Result<Self, Error> {
        let zones = ZoneSet::new(config.domain_filter.iter().map(String::as_str))?;
        let registrar = PorkbunClient::from_config(config)?;
        events.emit(
            Event::debug("creating porkbun provider")
                .field("zones", format!("{:?}", zones.as_slice()))
                .field("dry_run", config.dry_run),
        );
        Ok(Self::new(zones, Arc::new(registrar), config.dry_run, events))
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Every live record of every configured zone, as endpoints.
    ///
    /// Returns nothing in dry-run mode.
    ///
    /// # Errors
    ///
    /// Fails as a whole, without partial results, if authentication fails, a zone can't be read,
    /// or a record's TTL isn't an integer.
    pub async fn records(&self) -> Result<Vec<Endpoint>, Error> {
        let mut endpoints = Vec::new();

        if self.dry_run {
            self.events.emit(Event::debug("dry run - skipping login"));
        } else {
            self.ensure_login().await?;

            for zone in self.zones.iter() {
                let records = self.registrar.retrieve_records(zone).await?;
                let event = Event::info("got DNS records for domain").field("domain", zone);
                self.events.emit(event);
                for record in records {
                    let ttl = record.ttl.parse::<i64>().map_err(|_| Error::InvalidTtl {
                        name: record.name.clone(),
                        ttl: record.ttl.clone(),
                    })?;
                    endpoints.push(Endpoint::with_ttl(
                        fully_qualified(&record.name, zone),
                        record.record_type,
                        ttl,
                        vec![record.content],
                    ));
                }
            }
        }

        for ep in &endpoints {
            let event = Event::debug("endpoints collected").field("endpoint", ep);
            self.events.emit(event);
        }
        Ok(endpoints)
    }

    /// Apply one batch of changes to the registrar.
    ///
    /// # Errors
    ///
    /// Returns the first authentication, translation, ID or mutation error. Mutations issued
    /// before the error stay applied.
    pub async fn apply_changes(&self, changes: &Changes) -> Result<(), Error> {
        if !changes.has_changes() {
            self.events.emit(Event::debug("no changes detected - nothing to do"));
            return Ok(());
        }

        if self.dry_run {
            self.events.emit(Event::debug("dry run - skipping login"));
        } else {
            self.ensure_login().await?;
        }

        let per_zone = partition::partition(changes, &self.zones, self.events.as_ref());

        if self.dry_run {
            self.events.emit(Event::info("dry run - not applying changes"));
            return Ok(());
        }

        for zone in self.zones.iter() {
            match per_zone.get(zone) {
                Some(zone_changes) if zone_changes.has_changes() => {
                    self.apply_zone(zone, zone_changes).await?;
                }
                _ => {}
            }
        }

        self.events.emit(Event::debug("update completed"));
        Ok(())
    }

    /// Endpoint adjustment is a pass-through: Porkbun needs no provider-specific rewriting.
    pub fn adjust_endpoints(&self, endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
        endpoints
    }

    async fn ensure_login(&self) -> Result<(), Error> {
        self.events.emit(Event::debug("performing login to Porkbun API"));
        self.registrar.ping().await.map_err(|err| match err {
            Error::Authentication(_) => err,
            other => Error::Authentication(other.to_string()),
        })?;
        self.events.emit(Event::debug("successfully logged in to Porkbun API"));
        Ok(())
    }

    async fn apply_zone(&self, zone: &str, changes: &Changes) -> Result<(), Error> {
        // A zone that can't be read still gets its changes applied. Nothing resolves against an
        // empty snapshot, so its edits and deletes fail on the missing ID.
        let snapshot = match self.registrar.retrieve_records(zone).await {
            Ok(records) => records,
            Err(err) => {
                self.events.emit(
                    Event::error("unable to get DNS records for domain")
                        .field("zone", zone)
                        .field("error", &err),
                );
                Vec::new()
            }
        };

        let mutations = self.translate(zone, changes, &snapshot)?;
        self.events.emit(
            Event::debug("applying changes")
                .field("zone", zone)
                .field("updateOld", mutations.update_old.len())
                .field("delete", mutations.delete.len())
                .field("create", mutations.create.len())
                .field("updateNew", mutations.update_new.len()),
        );

        self.update_records(zone, &mutations.update_old).await?;
        self.delete_records(zone, &mutations.delete).await?;
        self.create_records(zone, &mutations.create).await?;
        self.update_records(zone, &mutations.update_new).await?;
        Ok(())
    }

    fn translate(
        &self,
        zone: &str,
        changes: &Changes,
        snapshot: &[LiveRecord],
    ) -> Result<ZoneMutations, Error> {
        let update_old = to_live_records(&changes.update_old, zone, snapshot, Intent::Delete)?;
        let mut update_new = to_live_records(&changes.update_new, zone, snapshot, Intent::Upsert)?;
        inherit_update_ids(&mut update_new, &update_old);
        Ok(ZoneMutations {
            create: to_live_records(&changes.create, zone, snapshot, Intent::Upsert)?,
            update_old,
            update_new,
            delete: to_live_records(&changes.delete, zone, snapshot, Intent::Delete)?,
        })
    }

    async fn create_records(&self, zone: &str, records: &[LiveRecord]) -> Result<(), Error> {
        for record in records {
            let id = self
                .registrar
                .create_record(zone, record)
                .await
                .map_err(|err| self.mutation_failed("create", zone, record, err))?;
            self.events.emit(
                Event::debug("created record")
                    .field("zone", zone)
                    .field("id", id)
                    .field("name", &record.name)
                    .field("type", &record.record_type),
            );
        }
        Ok(())
    }

    async fn update_records(&self, zone: &str, records: &[LiveRecord]) -> Result<(), Error> {
        for record in records {
            let id = record
                .numeric_id()
                .map_err(|err| self.mutation_failed("update", zone, record, err))?;
            self.registrar
                .edit_record(zone, id, record)
                .await
                .map_err(|err| self.mutation_failed("update", zone, record, err))?;
            self.events.emit(
                Event::debug("updated record")
                    .field("zone", zone)
                    .field("id", id)
                    .field("name", &record.name)
                    .field("type", &record.record_type),
            );
        }
        Ok(())
    }

    async fn delete_records(&self, zone: &str, records: &[LiveRecord]) -> Result<(), Error> {
        for record in records {
            let id = record
                .numeric_id()
                .map_err(|err| self.mutation_failed("delete", zone, record, err))?;
            self.registrar
                .delete_record(zone, id)
                .await
                .map_err(|err| self.mutation_failed("delete", zone, record, err))?;
            self.events.emit(
                Event::debug("deleted record")
                    .field("zone", zone)
                    .field("id", id)
                    .field("name", &record.name)
                    .field("type", &record.record_type),
            );
        }
        Ok(())
    }

    fn mutation_failed(
        &self,
        action: &'static str,
        zone: &str,
        record: &LiveRecord,
        err: Error,
    ) -> Error {
        self.events.emit(
            Event::error(format!("unable to {action} record"))
                .field("zone", zone)
                .field("id", &record.id)
                .field("name", &record.name)
                .field("type", &record.record_type)
                .field("content", &record.content)
                .field("error", &err),
        );
        err
    }
}

/// The target state of an update usually differs in content from the live record, so it
/// can't be found in the snapshot. It takes the ID resolved for the previous state of the same
/// name and type instead.
///
/// external-dns lists both states of an update at the same position, so the previous state at
/// the record's own index is preferred. Otherwise the first unclaimed previous state with the
/// same name and type is used. Each ID is handed out at most once.
fn inherit_update_ids(update_new: &mut [LiveRecord], update_old: &[LiveRecord]) {
    let mut claimed: Vec<bool> = update_old
        .iter()
        .map(|old| old.id.is_empty() || update_new.iter().any(|new| new.id == old.id))
        .collect();

    for (i, record) in update_new.iter_mut().enumerate() {
        if !record.id.is_empty() {
            continue;
        }
        let pairs = |j: usize| {
            let old = &update_old[j];
            !claimed[j] && old.name == record.name && old.record_type == record.record_type
        };
        let index = if i < update_old.len() && pairs(i) {
            Some(i)
        } else {
            (0..update_old.len()).find(|&j| pairs(j))
        };
        if let Some(j) = index {
            record.id = update_old[j].id.clone();
            claimed[j] = true;
        }
    }
}

/// The fully qualified name of a zone-relative registrar name.
fn fully_qualified(name: &str, zone: &str) -> String {
    if name == APEX {
        return zone.to_string();
    }
    let qualified = name
        .strip_suffix(zone)
        .map_or(false, |rest| rest.is_empty() || rest.ends_with('.'));
    if qualified {
        name.to_string()
    } else {
        format!("{name}.{zone}")
    }
}
