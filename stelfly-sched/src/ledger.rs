use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use dashmap::DashMap;
use stelfly_core::booking::{Booking, BookingPatch};
use stelfly_core::slot;

/// Partition key: one calendar day of one resource's schedule.
pub type PartitionKey = (NaiveDate, String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Slot occupied: {resource_id} is already booked over {time} on {date}")]
    SlotOccupied {
        resource_id: String,
        date: NaiveDate,
        time: String,
    },

    #[error("Booking not found: {0}")]
    NotFound(String),
}

/// The authoritative (date, resource) -> bookings mapping.
///
/// Each partition is guarded by its map entry's lock: an insert's overlap
/// check and its write happen under one guard, so check-then-insert races on
/// the same partition cannot interleave. Partitions are independent and may
/// be mutated concurrently.
#[derive(Debug, Default)]
pub struct BookingLedger {
    partitions: DashMap<PartitionKey, Vec<Booking>>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self {
            partitions: DashMap::new(),
        }
    }

    /// Inserts a booking, re-validating hour overlap at commit time.
    ///
    /// Callers are expected to have consulted the availability checker
    /// first; this re-check closes the gap between check and insert.
    pub fn insert(&self, booking: Booking) -> Result<(), LedgerError> {
        let key = (booking.date, booking.resource_id.clone());
        let mut partition = self.partitions.entry(key).or_default();

        if let Some(existing) = partition.iter().find(|b| b.overlaps(&booking)) {
            return Err(LedgerError::SlotOccupied {
                resource_id: booking.resource_id.clone(),
                date: booking.date,
                time: existing.start_time(),
            });
        }

        tracing::debug!(
            booking_id = %booking.id,
            resource_id = %booking.resource_id,
            date = %booking.date,
            start = %booking.start_time(),
            "booking inserted"
        );
        partition.push(booking);
        Ok(())
    }

    /// Replaces the fields present in `patch` on the booking with `id`,
    /// preserving the id. A patch that moves or stretches the booking is
    /// re-validated against the rest of the partition before it lands.
    pub fn update_by_id(
        &self,
        date: NaiveDate,
        resource_id: &str,
        id: &str,
        patch: &BookingPatch,
    ) -> Result<Booking, LedgerError> {
        let key = (date, resource_id.to_string());
        let mut partition = self
            .partitions
            .get_mut(&key)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let index = partition
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let mut updated = partition[index].clone();
        patch.apply_to(&mut updated);

        if let Some(clash) = partition
            .iter()
            .enumerate()
            .find(|(i, b)| *i != index && b.overlaps(&updated))
        {
            return Err(LedgerError::SlotOccupied {
                resource_id: resource_id.to_string(),
                date,
                time: clash.1.start_time(),
            });
        }

        partition[index] = updated.clone();
        tracing::debug!(booking_id = %id, resource_id, %date, "booking updated");
        Ok(updated)
    }

    /// Removes and returns the booking with `id`.
    pub fn remove_by_id(
        &self,
        date: NaiveDate,
        resource_id: &str,
        id: &str,
    ) -> Result<Booking, LedgerError> {
        let key = (date, resource_id.to_string());
        let mut partition = self
            .partitions
            .get_mut(&key)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let index = partition
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;

        let removed = partition.remove(index);
        tracing::debug!(booking_id = %id, resource_id, %date, "booking removed");
        Ok(removed)
    }

    pub fn find_by_id(&self, date: NaiveDate, resource_id: &str, id: &str) -> Option<Booking> {
        let key = (date, resource_id.to_string());
        self.partitions
            .get(&key)
            .and_then(|p| p.iter().find(|b| b.id == id).cloned())
    }

    /// Locates a booking by id across every resource booked on `date`. Used
    /// when the caller knows the day but not which aircraft the id lives on.
    pub fn find_on_date(&self, date: NaiveDate, id: &str) -> Option<Booking> {
        self.partitions
            .iter()
            .filter(|entry| entry.key().0 == date)
            .find_map(|entry| entry.value().iter().find(|b| b.id == id).cloned())
    }

    /// Snapshot of a day's schedule, keyed by resource id in stable order.
    pub fn list_for_date(&self, date: NaiveDate) -> BTreeMap<String, Vec<Booking>> {
        let mut out = BTreeMap::new();
        for entry in self.partitions.iter() {
            let (entry_date, resource_id) = entry.key();
            if *entry_date == date && !entry.value().is_empty() {
                let mut bookings = entry.value().clone();
                bookings.sort_by_key(|b| b.start_hour);
                out.insert(resource_id.clone(), bookings);
            }
        }
        out
    }

    pub fn bookings_for(&self, date: NaiveDate, resource_id: &str) -> Vec<Booking> {
        let key = (date, resource_id.to_string());
        self.partitions
            .get(&key)
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    /// The set of whole hours already blocked on a (date, resource) pair.
    pub fn occupied_hours(&self, date: NaiveDate, resource_id: &str) -> BTreeSet<u8> {
        self.bookings_for(date, resource_id)
            .iter()
            .flat_map(|b| b.occupied_hours())
            .filter(|h| *h >= slot::FIRST_HOUR && *h <= slot::LAST_HOUR)
            .collect()
    }
}
