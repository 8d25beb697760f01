//! Pure reads over a ledger snapshot. Nothing here mutates; a decision can
//! call these repeatedly without observing its own uncommitted writes.

use chrono::NaiveDate;
use stelfly_core::slot;

use crate::ledger::BookingLedger;

/// True when `hour` is not a member of the resource's occupied-hour set on
/// `date`.
pub fn is_available(ledger: &BookingLedger, resource_id: &str, date: NaiveDate, hour: u8) -> bool {
    !ledger.occupied_hours(date, resource_id).contains(&hour)
}

/// True when every hour a booking of `duration` starting at `start_hour`
/// would block is currently free.
pub fn is_range_available(
    ledger: &BookingLedger,
    resource_id: &str,
    date: NaiveDate,
    start_hour: u8,
    duration: f64,
) -> bool {
    let occupied = ledger.occupied_hours(date, resource_id);
    slot::blocked_hours(start_hour, duration)
        .iter()
        .all(|h| !occupied.contains(h))
}

/// The operating-window hours still free on a (date, resource) pair.
pub fn free_hours(ledger: &BookingLedger, resource_id: &str, date: NaiveDate) -> Vec<u8> {
    let occupied = ledger.occupied_hours(date, resource_id);
    slot::operating_hours()
        .filter(|h| !occupied.contains(h))
        .collect()
}
