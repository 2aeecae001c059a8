//! In-memory space store for simulation mode and tests.
//!
//! Implements the same merge semantics as the Firebase RTDB PATCH
//! endpoint (null deletes a field) and keeps a history of applied
//! patches so tests can assert on individual writes.

use super::{SpaceRecord, SpaceStore};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    records: HashMap<String, Map<String, Value>>,
    history: Vec<(String, Value)>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, replacing any existing one. Panics on a record that
    /// does not serialize to a JSON object, which cannot happen for
    /// [`SpaceRecord`].
    pub fn seed(&self, space_id: &str, record: &SpaceRecord) {
        let value = serde_json::to_value(record).unwrap();
        let Value::Object(map) = value else {
            unreachable!("SpaceRecord serializes to an object");
        };
        self.inner.lock().records.insert(space_id.to_string(), map);
    }

    /// Raw JSON view of a record, for asserting field presence/absence.
    pub fn raw(&self, space_id: &str) -> Option<Value> {
        self.inner
            .lock()
            .records
            .get(space_id)
            .cloned()
            .map(Value::Object)
    }

    /// All patches applied so far, in order, as (space_id, patch) pairs.
    pub fn history(&self) -> Vec<(String, Value)> {
        self.inner.lock().history.clone()
    }
}

#[async_trait]
impl SpaceStore for InMemoryStore {
    async fn get(&self, space_id: &str) -> Result<Option<SpaceRecord>> {
        let inner = self.inner.lock();
        let Some(map) = inner.records.get(space_id) else {
            return Ok(None);
        };
        let record = serde_json::from_value(Value::Object(map.clone()))?;
        Ok(Some(record))
    }

    async fn update(&self, space_id: &str, patch: Value) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.history.push((space_id.to_string(), patch.clone()));

        let record = inner.records.entry(space_id.to_string()).or_default();
        if let Value::Object(fields) = patch {
            for (key, value) in fields {
                if value.is_null() {
                    record.remove(&key);
                } else {
                    record.insert(key, value);
                }
            }
        }
        Ok(())
    }
}
