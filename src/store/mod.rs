//! Remote space records and the store boundary.
//!
//! Each parking space has one record in the remote store, keyed by
//! `parking_spaces/{id}`. The store exposes exactly two operations:
//! fetch a record and merge a partial update into it. Updates follow
//! Firebase RTDB merge semantics, where a field written as JSON null
//! is deleted from the record.

pub mod firebase;
pub mod memory;

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

pub use firebase::FirebaseStore;
pub use memory::InMemoryStore;

use crate::error::Result;

/// Derived state of one parking space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum SpaceStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

impl fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpaceStatus::Available => "Available",
            SpaceStatus::Occupied => "Occupied",
            SpaceStatus::Reserved => "Reserved",
        };
        f.write_str(s)
    }
}

// Unknown status strings fall back to Available rather than failing the
// whole fetch; the reconciler recomputes status every cycle anyway.
impl<'de> Deserialize<'de> for SpaceStatus {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "Occupied" => SpaceStatus::Occupied,
            "Reserved" => SpaceStatus::Reserved,
            _ => SpaceStatus::Available,
        })
    }
}

/// One space's remote record.
///
/// All fields are optional on the wire; a missing record is treated as
/// Available with no reservation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpaceRecord {
    pub status: SpaceStatus,
    pub distance: Option<f64>,
    pub reserved_by: Option<String>,
    /// ISO-8601 timestamp written by the reservation app.
    pub reserved_at: Option<String>,
    #[serde(deserialize_with = "de_hours")]
    pub reserved_for_hours: Option<i64>,
}

/// The reservation app has written `reservedForHours` both as a number and
/// as a numeric string; accept either. An unreadable value is logged and
/// treated as absent — it must never take down the fetch, or the sweep
/// would crash-loop on one bad record until somebody edits the database.
fn de_hours<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n
            .as_i64()
            // Fractional hours truncate toward zero
            .or_else(|| n.as_f64().map(|f| f as i64))),
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(hours) => Ok(Some(hours)),
            Err(e) => {
                warn!("ignoring unparseable reservedForHours {:?}: {}", s, e);
                Ok(None)
            }
        },
        Some(other) => {
            warn!("ignoring reservedForHours of unexpected type: {}", other);
            Ok(None)
        }
    }
}

/// Path-addressed record store (Firebase RTDB or the in-memory stand-in).
///
/// `update` has merge semantics: unspecified fields are untouched and
/// null-valued fields are removed.
#[async_trait]
pub trait SpaceStore: Send + Sync {
    /// Fetch the record for a space, or `None` if it does not exist.
    async fn get(&self, space_id: &str) -> Result<Option<SpaceRecord>>;

    /// Merge a partial update into the record for a space.
    async fn update(&self, space_id: &str, patch: Value) -> Result<()>;
}
