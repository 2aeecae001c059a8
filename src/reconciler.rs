//! Per-cycle status reconciliation for one parking space.
//!
//! Reads the space's remote record, expires a stale reservation if one is
//! found, derives the new status from the measured distance and the
//! reservation state, and writes the result back. Occupancy always wins:
//! a car parked in a reserved space makes the space Occupied.

use crate::error::Result;
use crate::store::{SpaceRecord, SpaceStatus, SpaceStore};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use log::{error, info};
use serde_json::json;
use std::sync::Arc;

/// Outcome of evaluating a record's reservation fields at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// No reservation, or an unreadable one (fail open).
    None,
    /// Reservation window still holds.
    Active,
    /// Window has passed; fields must be cleared.
    Expired,
}

pub struct StatusReconciler {
    store: Arc<dyn SpaceStore>,
    occupied_threshold_cm: f64,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn SpaceStore>, occupied_threshold_cm: f64) -> Self {
        Self {
            store,
            occupied_threshold_cm,
        }
    }

    /// Reconcile one space against a fresh distance measurement.
    ///
    /// Issues one merge write with the derived status and distance, plus
    /// a separate clearing write first when a reservation has expired.
    /// Store errors propagate; there is no retry.
    pub async fn reconcile(&self, space_id: &str, distance_cm: f64) -> Result<SpaceStatus> {
        let record = self.store.get(space_id).await?.unwrap_or_default();
        let now = Utc::now();

        let reservation = evaluate_reservation(space_id, &record, now);
        if reservation == Reservation::Expired {
            self.store
                .update(
                    space_id,
                    json!({
                        "status": SpaceStatus::Available,
                        "reservedBy": null,
                        "reservedAt": null,
                        "reservedForHours": null,
                    }),
                )
                .await?;
        }

        let new_status = if distance_cm < self.occupied_threshold_cm {
            SpaceStatus::Occupied
        } else if reservation == Reservation::Active {
            SpaceStatus::Reserved
        } else {
            SpaceStatus::Available
        };

        self.store
            .update(space_id, json!({"status": new_status, "distance": distance_cm}))
            .await?;

        info!("{}", status_line(space_id, new_status, distance_cm));
        Ok(new_status)
    }
}

/// Format the per-cycle status line. `{:?}` keeps whole-number distances
/// in float form ("999.0 cm", not "999 cm").
fn status_line(space_id: &str, status: SpaceStatus, distance_cm: f64) -> String {
    format!("{}: {} ({:?} cm)", space_id, status, distance_cm)
}

/// Evaluate the reservation fields of a record against `now`.
///
/// A reservation exists only when `reservedAt` and `reservedForHours` are
/// both present. An unparseable timestamp is logged and treated as no
/// reservation rather than blocking the space indefinitely.
pub fn evaluate_reservation(
    space_id: &str,
    record: &SpaceRecord,
    now: DateTime<Utc>,
) -> Reservation {
    let (Some(reserved_at), Some(hours)) = (&record.reserved_at, record.reserved_for_hours)
    else {
        return Reservation::None;
    };

    let reserved_time = match parse_reserved_at(reserved_at) {
        Ok(t) => t,
        Err(e) => {
            error!("[{}] could not parse reservation time: {}", space_id, e);
            return Reservation::None;
        }
    };

    let expiry = TimeDelta::try_hours(hours)
        .and_then(|window| reserved_time.checked_add_signed(window));
    match expiry {
        Some(expiry) if now < expiry => Reservation::Active,
        Some(_) => Reservation::Expired,
        None => {
            error!("[{}] reservation window overflows: {} h", space_id, hours);
            Reservation::None
        }
    }
}

/// Parse `reservedAt` as RFC 3339, falling back to a naive timestamp
/// interpreted as UTC (the format the reservation app actually writes).
fn parse_reserved_at(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|n| n.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").map(|n| n.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    fn reconciler(store: Arc<InMemoryStore>) -> StatusReconciler {
        StatusReconciler::new(store, 10.0)
    }

    fn reserved_record(reserved_at: DateTime<Utc>, hours: i64) -> SpaceRecord {
        SpaceRecord {
            status: SpaceStatus::Reserved,
            distance: Some(120.0),
            reserved_by: Some("user_42".to_string()),
            reserved_at: Some(reserved_at.to_rfc3339()),
            reserved_for_hours: Some(hours),
        }
    }

    #[tokio::test]
    async fn test_far_distance_without_reservation_is_available() {
        let store = Arc::new(InMemoryStore::new());
        let status = reconciler(store.clone())
            .reconcile("space_1", 150.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Available);
        let record = store.get("space_1").await.unwrap().unwrap();
        assert_eq!(record.status, SpaceStatus::Available);
        assert_eq!(record.distance, Some(150.0));
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_near_distance_overrides_active_reservation() {
        let store = Arc::new(InMemoryStore::new());
        store.seed("space_1", &reserved_record(Utc::now(), 2));

        let status = reconciler(store.clone())
            .reconcile("space_1", 5.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Occupied);
        // Reservation fields survive; only status and distance were written
        let record = store.get("space_1").await.unwrap().unwrap();
        assert_eq!(record.reserved_by.as_deref(), Some("user_42"));
        assert!(record.reserved_at.is_some());
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_active_reservation_holds_empty_space() {
        let store = Arc::new(InMemoryStore::new());
        // Half an hour left on a 2-hour reservation
        let reserved_at = Utc::now() - Duration::minutes(90);
        store.seed("space_1", &reserved_record(reserved_at, 2));

        let status = reconciler(store.clone())
            .reconcile("space_1", 150.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Reserved);
        let record = store.get("space_1").await.unwrap().unwrap();
        assert_eq!(record.reserved_for_hours, Some(2));
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_reservation_cleared_then_available() {
        let store = Arc::new(InMemoryStore::new());
        // Expired an hour ago
        let reserved_at = Utc::now() - Duration::hours(3);
        store.seed("space_1", &reserved_record(reserved_at, 2));

        let status = reconciler(store.clone())
            .reconcile("space_1", 150.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Available);

        // Two distinct writes: the clearing patch, then the status patch
        let history = store.history();
        assert_eq!(history.len(), 2);
        assert!(history[0].1.get("reservedBy").unwrap().is_null());
        assert!(history[1].1.get("distance").is_some());

        // Null fields were deleted by merge semantics
        let raw = store.raw("space_1").unwrap();
        assert!(raw.get("reservedAt").is_none());
        assert!(raw.get("reservedBy").is_none());
        assert!(raw.get("reservedForHours").is_none());
    }

    #[tokio::test]
    async fn test_expired_reservation_with_car_present_is_occupied() {
        let store = Arc::new(InMemoryStore::new());
        let reserved_at = Utc::now() - Duration::hours(3);
        store.seed("space_1", &reserved_record(reserved_at, 2));

        let status = reconciler(store.clone())
            .reconcile("space_1", 4.2)
            .await
            .unwrap();

        // Cleared, but occupancy still wins on the final write
        assert_eq!(status, SpaceStatus::Occupied);
        assert_eq!(store.history().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_reserved_at_fails_open() {
        let store = Arc::new(InMemoryStore::new());
        let mut record = reserved_record(Utc::now(), 2);
        record.reserved_at = Some("next tuesday".to_string());
        store.seed("space_1", &record);

        let status = reconciler(store.clone())
            .reconcile("space_1", 150.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Available);
        // Parse failure does not clear the fields, only skips the reservation
        let raw = store.raw("space_1").unwrap();
        assert!(raw.get("reservedAt").is_some());
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_written_as_available() {
        let store = Arc::new(InMemoryStore::new());
        let status = reconciler(store.clone())
            .reconcile("space_9", 999.0)
            .await
            .unwrap();

        assert_eq!(status, SpaceStatus::Available);
        let record = store.get("space_9").await.unwrap().unwrap();
        assert_eq!(record.distance, Some(999.0));
    }

    #[tokio::test]
    async fn test_garbage_reservation_hours_fails_open() {
        let store = Arc::new(InMemoryStore::new());
        store
            .update(
                "space_1",
                serde_json::json!({
                    "reservedAt": "2026-08-27T10:00:00",
                    "reservedForHours": "soon",
                }),
            )
            .await
            .unwrap();

        // An unreadable hours value must not fail the fetch (which would
        // be fatal to the whole sweep); the space just reads as free.
        let status = reconciler(store.clone())
            .reconcile("space_1", 150.0)
            .await
            .unwrap();
        assert_eq!(status, SpaceStatus::Available);

        // Seed patch plus the status patch; no clearing write in between
        assert_eq!(store.history().len(), 2);
        assert!(store.history()[1].1.get("distance").is_some());
        let raw = store.raw("space_1").unwrap();
        assert!(raw.get("reservedAt").is_some());
        assert!(raw.get("reservedForHours").is_some());
    }

    #[test]
    fn test_status_line_keeps_float_form() {
        assert_eq!(
            status_line("space_1", SpaceStatus::Available, 999.0),
            "space_1: Available (999.0 cm)"
        );
        assert_eq!(
            status_line("space_2", SpaceStatus::Occupied, 7.35),
            "space_2: Occupied (7.35 cm)"
        );
    }

    #[test]
    fn test_evaluate_boundary_is_expired() {
        let now = Utc::now();
        let record = reserved_record(now - Duration::hours(2), 2);
        // now == expiry counts as expired (active requires now < expiry)
        assert_eq!(
            evaluate_reservation("space_1", &record, now),
            Reservation::Expired
        );
    }

    #[test]
    fn test_evaluate_requires_both_fields() {
        let now = Utc::now();
        let mut record = reserved_record(now, 2);
        record.reserved_for_hours = None;
        assert_eq!(
            evaluate_reservation("space_1", &record, now),
            Reservation::None
        );

        let mut record = reserved_record(now, 2);
        record.reserved_at = None;
        assert_eq!(
            evaluate_reservation("space_1", &record, now),
            Reservation::None
        );
    }

    #[test]
    fn test_parse_accepts_naive_timestamp() {
        let parsed = parse_reserved_at("2026-08-27T10:30:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-27T10:30:00+00:00");

        let parsed = parse_reserved_at("2026-08-27 10:30:00.250").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_accepts_offset_timestamp() {
        let parsed = parse_reserved_at("2026-08-27T12:30:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-27T10:30:00+00:00");
    }
}
