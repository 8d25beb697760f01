use std::sync::Arc;

use chrono::NaiveDate;
use stelfly_core::booking::{instructor_is_unassigned, Booking, BookingPatch, BookingType};
use stelfly_core::resource::ResourceCatalog;
use stelfly_core::slot::{self, SlotError};

use crate::ledger::{BookingLedger, LedgerError};

/// The caller-supplied fields of a new logical reservation.
#[derive(Debug, Clone, Default)]
pub struct BookingCore {
    /// Pre-assigned booking id; generated when absent.
    pub id: Option<String>,
    pub start_hour: u8,
    pub duration: f64,
    pub booking_type: BookingType,
    pub pilot: String,
    /// Instructor display name; placeholder values ("TBD", "None") mean
    /// unassigned and produce no instructor-side entry.
    pub instructor: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub booking_id: String,
    /// Id of the instructor-side entry, when one was created.
    pub instructor_entry: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub booking: Booking,
    pub instructor_entry: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Unknown aircraft: {0}")]
    UnknownAircraft(String),

    #[error("Unknown instructor: {0}")]
    UnknownInstructor(String),

    #[error("Unknown booking: {0}")]
    UnknownBooking(String),

    /// The aircraft-side write landed but the instructor-side write did not.
    /// There is no cross-partition transaction; the named aircraft booking
    /// needs manual reconciliation.
    #[error("Aircraft booking {aircraft_booking_id} saved, but its instructor entry failed: {source}")]
    PartialLinkFailure {
        aircraft_booking_id: String,
        #[source]
        source: LedgerError,
    },
}

/// Keeps an aircraft-side booking and its optional instructor-side booking
/// as one logical unit. The instructor entry carries the derived id
/// `<bookingId>-inst` and a back-reference to the aircraft entry; both sides
/// always share time, duration, and classification.
pub struct LinkedBookings {
    ledger: Arc<BookingLedger>,
    catalog: Arc<ResourceCatalog>,
}

impl LinkedBookings {
    pub fn new(ledger: Arc<BookingLedger>, catalog: Arc<ResourceCatalog>) -> Self {
        Self { ledger, catalog }
    }

    /// Materializes a logical reservation: the aircraft entry, plus a linked
    /// instructor entry when an instructor is assigned.
    pub fn create_linked(
        &self,
        date: NaiveDate,
        aircraft_id: &str,
        core: BookingCore,
    ) -> Result<CreateOutcome, CoordinatorError> {
        if self.catalog.find_aircraft(aircraft_id).is_none() {
            return Err(CoordinatorError::UnknownAircraft(aircraft_id.to_string()));
        }
        slot::validate_hour(core.start_hour)?;
        slot::validate_duration(core.duration)?;

        // Resolve the instructor before any write so a bad name cannot
        // leave a half-linked pair behind.
        let instructor = self.resolve_instructor(core.instructor.as_deref())?;

        let booking_id = core.id.clone().unwrap_or_else(Booking::new_id);
        let aircraft_booking = Booking {
            id: booking_id.clone(),
            resource_id: aircraft_id.to_string(),
            date,
            start_hour: core.start_hour,
            duration: core.duration,
            booking_type: core.booking_type,
            pilot: core.pilot.clone(),
            instructor: instructor.as_ref().map(|i| i.1.clone()),
            notes: core.notes.clone(),
            linked_to: None,
        };

        self.ledger.insert(aircraft_booking.clone())?;

        let instructor_entry = match instructor {
            Some((instructor_resource_id, _)) => {
                let entry_id = Booking::instructor_entry_id(&booking_id);
                let mirrored = Booking {
                    id: entry_id.clone(),
                    resource_id: instructor_resource_id,
                    linked_to: Some(booking_id.clone()),
                    ..aircraft_booking
                };
                self.ledger.insert(mirrored).map_err(|source| {
                    tracing::warn!(
                        booking_id = %booking_id,
                        error = %source,
                        "instructor-side write failed after aircraft-side commit"
                    );
                    CoordinatorError::PartialLinkFailure {
                        aircraft_booking_id: booking_id.clone(),
                        source,
                    }
                })?;
                Some(entry_id)
            }
            None => None,
        };

        tracing::info!(
            booking_id = %booking_id,
            aircraft_id,
            %date,
            linked = instructor_entry.is_some(),
            "linked booking created"
        );
        Ok(CreateOutcome {
            booking_id,
            instructor_entry,
        })
    }

    /// Applies `patch` to the aircraft-side entry and reconciles the
    /// instructor side: a stale instructor entry is removed, and a fresh one
    /// mirroring the updated fields is inserted when an instructor remains
    /// assigned.
    pub fn update_linked(
        &self,
        date: NaiveDate,
        booking_id: &str,
        patch: &BookingPatch,
    ) -> Result<UpdateOutcome, CoordinatorError> {
        let existing = self
            .ledger
            .find_on_date(date, booking_id)
            .ok_or_else(|| CoordinatorError::UnknownBooking(booking_id.to_string()))?;

        if let Some(start_hour) = patch.start_hour {
            slot::validate_hour(start_hour)?;
        }
        if let Some(duration) = patch.duration {
            slot::validate_duration(duration)?;
        }
        // Validate an incoming instructor name before touching the ledger.
        if let Some(ref name) = patch.instructor {
            self.resolve_instructor(Some(name))?;
        }

        let old_instructor = existing.instructor.clone();
        let updated = self
            .ledger
            .update_by_id(date, &existing.resource_id, booking_id, patch)?;

        let entry_id = Booking::instructor_entry_id(booking_id);

        // Drop the stale instructor entry. A missing entry is tolerated so a
        // previous partial failure can be repaired by re-applying the patch.
        if let Some((old_resource_id, _)) = self.resolve_instructor(old_instructor.as_deref())? {
            match self.ledger.remove_by_id(date, &old_resource_id, &entry_id) {
                Ok(_) | Err(LedgerError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let instructor_entry = match self.resolve_instructor(updated.instructor.as_deref())? {
            Some((instructor_resource_id, _)) => {
                let mirrored = Booking {
                    id: entry_id.clone(),
                    resource_id: instructor_resource_id,
                    linked_to: Some(booking_id.to_string()),
                    ..updated.clone()
                };
                self.ledger.insert(mirrored).map_err(|source| {
                    tracing::warn!(
                        booking_id,
                        error = %source,
                        "instructor-side update failed after aircraft-side commit"
                    );
                    CoordinatorError::PartialLinkFailure {
                        aircraft_booking_id: booking_id.to_string(),
                        source,
                    }
                })?;
                Some(entry_id)
            }
            None => None,
        };

        tracing::info!(booking_id, %date, linked = instructor_entry.is_some(), "linked booking updated");
        Ok(UpdateOutcome {
            booking: updated,
            instructor_entry,
        })
    }

    /// Removes both linked entries together. The instructor side never
    /// survives its aircraft-side counterpart.
    pub fn cancel_linked(&self, date: NaiveDate, booking_id: &str) -> Result<(), CoordinatorError> {
        let existing = self
            .ledger
            .find_on_date(date, booking_id)
            .ok_or_else(|| CoordinatorError::UnknownBooking(booking_id.to_string()))?;

        self.ledger
            .remove_by_id(date, &existing.resource_id, booking_id)?;

        if let Some((instructor_resource_id, _)) =
            self.resolve_instructor(existing.instructor.as_deref())?
        {
            let entry_id = Booking::instructor_entry_id(booking_id);
            match self
                .ledger
                .remove_by_id(date, &instructor_resource_id, &entry_id)
            {
                Ok(_) | Err(LedgerError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(booking_id, %date, "linked booking cancelled");
        Ok(())
    }

    /// Maps an instructor display name to `(resource_id, name)`, treating
    /// placeholder values as unassigned.
    fn resolve_instructor(
        &self,
        instructor: Option<&str>,
    ) -> Result<Option<(String, String)>, CoordinatorError> {
        if instructor_is_unassigned(instructor) {
            return Ok(None);
        }
        let name = instructor.unwrap_or_default();
        let found = self
            .catalog
            .find_instructor_by_name(name)
            .ok_or_else(|| CoordinatorError::UnknownInstructor(name.to_string()))?;
        Ok(Some((found.id.clone(), found.name.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stelfly_core::resource::{AircraftMaintenance, Instructor};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    fn catalog() -> Arc<ResourceCatalog> {
        Arc::new(ResourceCatalog::new(
            vec![AircraftMaintenance {
                tail_number: "ZS-OHI".to_string(),
                model: "C172 N".to_string(),
                current_tach_time: 2103.0,
                next_50hr_due: 2150.0,
                next_100hr_due: 2200.0,
                annual_due: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            }],
            vec![
                Instructor::new("Tristan Storkey"),
                Instructor::new("Peter Erasmus"),
            ],
        ))
    }

    fn coordinator() -> (Arc<BookingLedger>, LinkedBookings) {
        let ledger = Arc::new(BookingLedger::new());
        let linked = LinkedBookings::new(ledger.clone(), catalog());
        (ledger, linked)
    }

    fn core(instructor: Option<&str>) -> BookingCore {
        BookingCore {
            id: None,
            start_hour: 15,
            duration: 2.0,
            booking_type: BookingType::Training,
            pilot: "AI Booking".to_string(),
            instructor: instructor.map(str::to_string),
            notes: None,
        }
    }

    #[test]
    fn test_create_linked_with_instructor() {
        let (ledger, linked) = coordinator();
        let outcome = linked
            .create_linked(day(), "zsohi", core(Some("Tristan Storkey")))
            .unwrap();

        let entry_id = outcome.instructor_entry.unwrap();
        assert_eq!(entry_id, format!("{}-inst", outcome.booking_id));

        let aircraft_side = ledger.find_by_id(day(), "zsohi", &outcome.booking_id).unwrap();
        let instructor_side = ledger.find_by_id(day(), "inst-tristan", &entry_id).unwrap();
        assert_eq!(instructor_side.linked_to.as_deref(), Some(outcome.booking_id.as_str()));
        assert_eq!(instructor_side.start_hour, aircraft_side.start_hour);
        assert_eq!(instructor_side.duration, aircraft_side.duration);
        assert_eq!(instructor_side.booking_type, aircraft_side.booking_type);
    }

    #[test]
    fn test_create_linked_placeholder_instructor_has_no_entry() {
        let (ledger, linked) = coordinator();
        let outcome = linked.create_linked(day(), "zsohi", core(Some("TBD"))).unwrap();
        assert!(outcome.instructor_entry.is_none());
        assert!(ledger.list_for_date(day()).get("inst-tristan").is_none());
    }

    #[test]
    fn test_create_linked_rejects_unknown_resources() {
        let (_, linked) = coordinator();
        assert!(matches!(
            linked.create_linked(day(), "zsxxx", core(None)),
            Err(CoordinatorError::UnknownAircraft(_))
        ));
        assert!(matches!(
            linked.create_linked(day(), "zsohi", core(Some("Nobody Here"))),
            Err(CoordinatorError::UnknownInstructor(_))
        ));
    }

    #[test]
    fn test_partial_link_failure_names_aircraft_booking() {
        let (ledger, linked) = coordinator();
        // Occupy the instructor at 15:00 directly
        ledger
            .insert(Booking {
                id: "other".to_string(),
                resource_id: "inst-tristan".to_string(),
                date: day(),
                start_hour: 15,
                duration: 1.0,
                booking_type: BookingType::Training,
                pilot: "Someone Else".to_string(),
                instructor: Some("Tristan Storkey".to_string()),
                notes: None,
                linked_to: None,
            })
            .unwrap();

        let err = linked
            .create_linked(day(), "zsohi", core(Some("Tristan Storkey")))
            .unwrap_err();
        match err {
            CoordinatorError::PartialLinkFailure {
                aircraft_booking_id,
                ..
            } => {
                // The aircraft-side entry is real and reachable for cleanup
                assert!(ledger.find_by_id(day(), "zsohi", &aircraft_booking_id).is_some());
            }
            other => panic!("expected PartialLinkFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_update_linked_assigns_instructor() {
        let (ledger, linked) = coordinator();
        let outcome = linked.create_linked(day(), "zsohi", core(Some("TBD"))).unwrap();

        let patch = BookingPatch {
            instructor: Some("Tristan Storkey".to_string()),
            booking_type: Some(BookingType::Training),
            duration: Some(2.0),
            ..Default::default()
        };
        let updated = linked.update_linked(day(), &outcome.booking_id, &patch).unwrap();
        assert_eq!(updated.booking.instructor.as_deref(), Some("Tristan Storkey"));

        let entry_id = updated.instructor_entry.unwrap();
        let instructor_side = ledger.find_by_id(day(), "inst-tristan", &entry_id).unwrap();
        assert_eq!(instructor_side.start_hour, 15);
        assert_eq!(instructor_side.duration, 2.0);
    }

    #[test]
    fn test_update_linked_moves_instructor() {
        let (ledger, linked) = coordinator();
        let outcome = linked
            .create_linked(day(), "zsohi", core(Some("Tristan Storkey")))
            .unwrap();

        let patch = BookingPatch {
            instructor: Some("Peter Erasmus".to_string()),
            ..Default::default()
        };
        linked.update_linked(day(), &outcome.booking_id, &patch).unwrap();

        let entry_id = Booking::instructor_entry_id(&outcome.booking_id);
        assert!(ledger.find_by_id(day(), "inst-tristan", &entry_id).is_none());
        assert!(ledger.find_by_id(day(), "inst-peter", &entry_id).is_some());
    }

    #[test]
    fn test_update_linked_clears_instructor() {
        let (ledger, linked) = coordinator();
        let outcome = linked
            .create_linked(day(), "zsohi", core(Some("Tristan Storkey")))
            .unwrap();

        let patch = BookingPatch {
            instructor: Some("None".to_string()),
            ..Default::default()
        };
        let updated = linked.update_linked(day(), &outcome.booking_id, &patch).unwrap();
        assert!(updated.instructor_entry.is_none());

        let entry_id = Booking::instructor_entry_id(&outcome.booking_id);
        assert!(ledger.find_by_id(day(), "inst-tristan", &entry_id).is_none());
        // Aircraft side survives with no instructor
        let aircraft_side = ledger.find_by_id(day(), "zsohi", &outcome.booking_id).unwrap();
        assert!(aircraft_side.instructor.is_none());
    }

    #[test]
    fn test_update_unknown_booking_mutates_nothing() {
        let (ledger, linked) = coordinator();
        let patch = BookingPatch {
            duration: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            linked.update_linked(day(), "booking-missing", &patch),
            Err(CoordinatorError::UnknownBooking(_))
        ));
        assert!(ledger.list_for_date(day()).is_empty());
    }

    #[test]
    fn test_cancel_removes_both_sides() {
        let (ledger, linked) = coordinator();
        let outcome = linked
            .create_linked(day(), "zsohi", core(Some("Tristan Storkey")))
            .unwrap();

        linked.cancel_linked(day(), &outcome.booking_id).unwrap();
        assert!(ledger.list_for_date(day()).is_empty());
    }
}
