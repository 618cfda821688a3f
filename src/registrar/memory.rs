//! An in-memory implementation of the [`Registrar`][super::Registrar] trait.
//!
//! Records live in per-zone vectors and get increasing numeric IDs, like the registrar would
//! assign. Every call is appended to a call log so callers can check which mutations were issued
//! and in what order, and individual operations can be told to fail.
use crate::error::Error;
use crate::registrar::{LiveRecord, Registrar};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A call received by an [`InMemoryRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrarCall {
    Ping,
    Retrieve { zone: String },
    Create { zone: String, record: LiveRecord },
    Edit { zone: String, id: u64, record: LiveRecord },
    Delete { zone: String, id: u64 },
}

impl RegistrarCall {
    pub fn operation(&self) -> Operation {
        match self {
            RegistrarCall::Ping => Operation::Ping,
            RegistrarCall::Retrieve { .. } => Operation::Retrieve,
            RegistrarCall::Create { .. } => Operation::Create,
            RegistrarCall::Edit { .. } => Operation::Edit,
            RegistrarCall::Delete { .. } => Operation::Delete,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(
            self.operation(),
            Operation::Create | Operation::Edit | Operation::Delete
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    Retrieve,
    Create,
    Edit,
    Delete,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Operation::Ping => "ping",
            Operation::Retrieve => "retrieve",
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug)]
struct State {
    zones: HashMap<String, Vec<LiveRecord>>,
    next_id: u64,
    calls: Vec<RegistrarCall>,
    failing: HashSet<Operation>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            zones: HashMap::default(),
            next_id: 1,
            calls: Vec::default(),
            failing: HashSet::default(),
        }
    }
}

#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct InMemoryRegistrar {
    state: Mutex<State>,
}

impl InMemoryRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `zone` with `records`. Records keep their IDs; new IDs are allocated above them.
    #[must_use]
    pub fn with_records(self, zone: &str, records: Vec<LiveRecord>) -> Self {
        {
            let mut state = self.lock();
            let highest = records
                .iter()
                .filter_map(|r| r.id.parse::<u64>().ok())
                .max();
            if let Some(highest) = highest {
                state.next_id = state.next_id.max(highest + 1);
            }
            let zone_records = state.zones.entry(zone.to_string()).or_default();
            zone_records.extend(records);
        }
        self
    }

    /// Make every later call of `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.lock().failing.insert(operation);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RegistrarCall> {
        self.lock().calls.clone()
    }

    /// Only the create, edit and delete calls received so far, in order.
    pub fn mutations(&self) -> Vec<RegistrarCall> {
        self.calls()
            .into_iter()
            .filter(RegistrarCall::is_mutation)
            .collect()
    }

    /// The live records currently held for `zone`.
    pub fn records(&self, zone: &str) -> Vec<LiveRecord> {
        self.lock().zones.get(zone).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_call(&self, call: RegistrarCall, zone: &str) -> Result<MutexGuard<'_, State>, Error> {
        let operation = call.operation();
        let mut state = self.lock();
        state.calls.push(call);
        if state.failing.contains(&operation) {
            return Err(Error::Registrar {
                operation: operation.as_str(),
                zone: zone.to_string(),
                message: "injected failure".to_string(),
            });
        }
        Ok(state)
    }
}

fn not_found(operation: Operation, zone: &str, id: u64) -> Error {
    Error::Registrar {
        operation: operation.as_str(),
        zone: zone.to_string(),
        message: format!("record {id} does not exist"),
    }
}

#[async_trait::async_trait]
impl Registrar for InMemoryRegistrar {
    async fn ping(&self) -> Result<(), Error> {
        self.record_call(RegistrarCall::Ping, "")?;
        Ok(())
    }

    async fn retrieve_records(&self, zone: &str) -> Result<Vec<LiveRecord>, Error> {
        let call = RegistrarCall::Retrieve {
            zone: zone.to_string(),
        };
        let state = self.record_call(call, zone)?;
        Ok(state.zones.get(zone).cloned().unwrap_or_default())
    }

    async fn create_record(&self, zone: &str, record: &LiveRecord) -> Result<u64, Error> {
        let call = RegistrarCall::Create {
            zone: zone.to_string(),
            record: record.clone(),
        };
        let mut state = self.record_call(call, zone)?;
        let id = state.next_id;
        state.next_id += 1;
        let zone_records = state.zones.entry(zone.to_string()).or_default();
        zone_records.push(LiveRecord {
            id: id.to_string(),
            ..record.clone()
        });
        Ok(id)
    }

    async fn edit_record(&self, zone: &str, id: u64, record: &LiveRecord) -> Result<(), Error> {
        let call = RegistrarCall::Edit {
            zone: zone.to_string(),
            id,
            record: record.clone(),
        };
        let mut state = self.record_call(call, zone)?;
        let existing = state
            .zones
            .get_mut(zone)
            .and_then(|records| records.iter_mut().find(|r| r.id == id.to_string()))
            .ok_or_else(|| not_found(Operation::Edit, zone, id))?;
        *existing = LiveRecord {
            id: id.to_string(),
            ..record.clone()
        };
        Ok(())
    }

    async fn delete_record(&self, zone: &str, id: u64) -> Result<(), Error> {
        let call = RegistrarCall::Delete {
            zone: zone.to_string(),
            id,
        };
        let mut state = self.record_call(call, zone)?;
        let records = state.zones.entry(zone.to_string()).or_default();
        let before = records.len();
        records.retain(|r| r.id != id.to_string());
        if records.len() == before {
            return Err(not_found(Operation::Delete, zone, id));
        }
        Ok(())
    }
}
