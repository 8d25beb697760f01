//! The conversational booking state machine.
//!
//! A session is either `Idle` (no pending draft) or `AwaitingDetails` (one
//! draft booking with missing required fields). The machine interprets a
//! validated intent, runs availability and maintenance checks, and drives
//! the linked-booking coordinator. Every failure is recoverable: the caller
//! turns it into a user-facing message.

use std::sync::Arc;

use chrono::NaiveDate;
use stelfly_core::booking::{
    instructor_is_unassigned, BookingPatch, BookingType, UNASSIGNED_INSTRUCTOR,
};
use stelfly_core::maintenance::{self, MaintenanceError};
use stelfly_core::resource::ResourceCatalog;
use stelfly_core::slot;
use stelfly_sched::availability;
use stelfly_sched::coordinator::{BookingCore, CoordinatorError, LinkedBookings};
use stelfly_sched::ledger::{BookingLedger, LedgerError};

use crate::intent::{validate_intent, BookingIntent, IntentError, ValidatedIntent};

/// Pilot name recorded on bookings created through the assistant.
pub const ASSISTANT_PILOT: &str = "AI Booking";

/// Draft bookings default to a two-hour slot until the user says otherwise.
pub const DEFAULT_DRAFT_DURATION: f64 = 2.0;

/// The session's one outstanding draft. Tracks which required fields the
/// user actually supplied, independent of the placeholder values the ledger
/// entry was materialized with.
#[derive(Debug, Clone)]
pub struct PendingBooking {
    pub booking_id: String,
    pub date: NaiveDate,
    pub start_hour: u8,
    pub aircraft_id: String,
    pub instructor: Option<String>,
    pub booking_type: Option<BookingType>,
    pub duration: Option<f64>,
}

impl PendingBooking {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if instructor_is_unassigned(self.instructor.as_deref()) {
            missing.push("instructor");
        }
        if self.booking_type.is_none() {
            missing.push("type");
        }
        if self.duration.is_none() {
            missing.push("duration");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Explicit per-session context. Zero or one pending drafts; never shared
/// between sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub pending: Option<PendingBooking>,
}

impl SessionState {
    /// True while the session is in the `AwaitingDetails` state.
    pub fn awaiting_details(&self) -> bool {
        self.pending.is_some()
    }
}

/// What a processed intent did to the ledger and the session.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    /// A complete booking was created in one shot.
    Booked {
        booking_id: String,
        instructor_entry: Option<String>,
    },
    /// A draft was materialized with placeholders; details still needed.
    DraftCreated {
        booking_id: String,
        missing: Vec<&'static str>,
    },
    /// A continuation filled some fields but the draft is still incomplete.
    DraftUpdated {
        booking_id: String,
        missing: Vec<&'static str>,
    },
    /// A continuation supplied the last missing fields; the draft is now a
    /// settled booking and the session is idle again.
    DraftCompleted {
        booking_id: String,
        instructor_entry: Option<String>,
    },
    /// A settled (non-pending) booking was modified in place.
    Modified { booking_id: String },
    /// The pending draft pointer was discarded without ledger mutation.
    PendingCleared,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Intent(#[from] IntentError),

    #[error(transparent)]
    Maintenance(#[from] MaintenanceError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

/// Owns intent interpretation for one scheduling engine instance. Stateless
/// itself; all conversation state lives in the `SessionState` passed in.
pub struct SchedulingAgent {
    ledger: Arc<BookingLedger>,
    catalog: Arc<ResourceCatalog>,
    linked: LinkedBookings,
}

impl SchedulingAgent {
    pub fn new(ledger: Arc<BookingLedger>, catalog: Arc<ResourceCatalog>) -> Self {
        let linked = LinkedBookings::new(ledger.clone(), catalog.clone());
        Self {
            ledger,
            catalog,
            linked,
        }
    }

    /// Transition 5: drop the pending draft without touching the ledger.
    /// The materialized placeholder booking, if any, stays until overwritten
    /// or cancelled.
    pub fn clear_pending(&self, session: &mut SessionState) -> IntentOutcome {
        if session.pending.take().is_some() {
            tracing::debug!("pending booking cleared");
        }
        IntentOutcome::PendingCleared
    }

    /// Routes one structured intent through the state machine.
    pub fn apply_intent(
        &self,
        session: &mut SessionState,
        intent: &BookingIntent,
        needs_more_info: bool,
    ) -> Result<IntentOutcome, AgentError> {
        // Continuation: the intent names the session's own pending draft.
        // Honored even when the producer forgot the isUpdate flag.
        let continuation = match (&session.pending, &intent.booking_id) {
            (Some(pending), Some(id)) => pending.booking_id == *id,
            _ => false,
        };

        // A second incomplete intent while a draft is outstanding continues
        // the existing draft; it never opens a second one. A marker-carrying
        // follow-up may omit date/time/aircraft, so it folds before
        // validation.
        let folds_into_pending =
            !continuation && session.pending.is_some() && needs_more_info && !intent.is_update;

        if continuation || folds_into_pending {
            return self.continue_pending(session, intent);
        }

        let validated = validate_intent(&self.catalog, intent)?;

        if intent.is_update {
            // Transition 4: modification of a settled booking by id.
            let booking_id = validated
                .booking_id
                .clone()
                .ok_or(IntentError::MissingField("bookingId"))?;
            return self.modify_settled(&validated, &booking_id);
        }

        // Same tie-break for an incomplete intent whose producer dropped the
        // marker: required fields are still missing, so it continues the
        // outstanding draft rather than materializing a second placeholder.
        if session.pending.is_some() && !validated.missing_fields().is_empty() {
            return self.continue_pending(session, intent);
        }

        // A stale/unrecognized bookingId without isUpdate is a fresh attempt.
        if needs_more_info || !validated.missing_fields().is_empty() {
            self.create_draft(session, validated)
        } else {
            self.create_complete(validated)
        }
    }

    /// Transition 1: all required fields present, book in one shot.
    fn create_complete(&self, validated: ValidatedIntent) -> Result<IntentOutcome, AgentError> {
        let duration = validated.duration.unwrap_or(DEFAULT_DRAFT_DURATION);
        self.check_maintenance(&validated.aircraft_id, duration)?;
        self.check_availability(&validated, duration)?;

        let outcome = self.linked.create_linked(
            validated.date,
            &validated.aircraft_id,
            BookingCore {
                id: validated.booking_id.clone(),
                start_hour: validated.start_hour,
                duration,
                booking_type: validated.booking_type.unwrap_or_default(),
                pilot: ASSISTANT_PILOT.to_string(),
                instructor: validated.instructor.clone(),
                notes: None,
            },
        )?;

        Ok(IntentOutcome::Booked {
            booking_id: outcome.booking_id,
            instructor_entry: outcome.instructor_entry,
        })
    }

    /// Transition 2: materialize a placeholder draft and remember it as the
    /// session's pending booking.
    fn create_draft(
        &self,
        session: &mut SessionState,
        validated: ValidatedIntent,
    ) -> Result<IntentOutcome, AgentError> {
        let duration = validated.duration.unwrap_or(DEFAULT_DRAFT_DURATION);
        self.check_maintenance(&validated.aircraft_id, duration)?;
        self.check_availability(&validated, duration)?;

        let instructor = validated
            .instructor
            .clone()
            .or_else(|| Some(UNASSIGNED_INSTRUCTOR.to_string()));

        let outcome = self.linked.create_linked(
            validated.date,
            &validated.aircraft_id,
            BookingCore {
                id: validated.booking_id.clone(),
                start_hour: validated.start_hour,
                duration,
                booking_type: validated.booking_type.unwrap_or_default(),
                pilot: ASSISTANT_PILOT.to_string(),
                instructor,
                notes: None,
            },
        )?;

        let pending = PendingBooking {
            booking_id: outcome.booking_id.clone(),
            date: validated.date,
            start_hour: validated.start_hour,
            aircraft_id: validated.aircraft_id.clone(),
            instructor: validated
                .instructor
                .filter(|i| !instructor_is_unassigned(Some(i))),
            booking_type: validated.booking_type,
            duration: validated.duration,
        };
        let missing = pending.missing_fields();
        session.pending = Some(pending);

        tracing::info!(booking_id = %outcome.booking_id, ?missing, "draft booking created");
        Ok(IntentOutcome::DraftCreated {
            booking_id: outcome.booking_id,
            missing,
        })
    }

    /// Transition 3: fold newly supplied fields into the pending draft.
    fn continue_pending(
        &self,
        session: &mut SessionState,
        intent: &BookingIntent,
    ) -> Result<IntentOutcome, AgentError> {
        let Some(pending) = session.pending.clone() else {
            // Routing guarantees a pending draft; fall back to a clear.
            return Ok(self.clear_pending(session));
        };

        let mut patch = BookingPatch::default();
        if let Some(ref time) = intent.time {
            let start_hour = slot::parse_slot_time(time).map_err(IntentError::from)?;
            if start_hour != pending.start_hour {
                patch.start_hour = Some(start_hour);
            }
        }
        if let Some(duration) = intent.duration {
            slot::validate_duration(duration).map_err(IntentError::from)?;
            patch.duration = Some(duration);
        }
        if let Some(ref label) = intent.booking_type {
            patch.booking_type = Some(BookingType::from_label(label));
        }
        if let Some(ref instructor) = intent.instructor {
            patch.instructor = Some(instructor.clone());
        }

        let effective_duration = patch
            .duration
            .or(pending.duration)
            .unwrap_or(DEFAULT_DRAFT_DURATION);
        self.check_maintenance(&pending.aircraft_id, effective_duration)?;

        let updated = self
            .linked
            .update_linked(pending.date, &pending.booking_id, &patch)?;

        let merged = PendingBooking {
            // A supplied instructor patch wins, including an explicit clear.
            instructor: if patch.instructor.is_some() {
                updated.booking.instructor.clone()
            } else {
                pending.instructor.clone()
            },
            booking_type: patch.booking_type.or(pending.booking_type),
            duration: patch.duration.or(pending.duration),
            start_hour: updated.booking.start_hour,
            ..pending
        };

        if merged.is_complete() {
            session.pending = None;
            tracing::info!(booking_id = %merged.booking_id, "draft booking completed");
            Ok(IntentOutcome::DraftCompleted {
                booking_id: merged.booking_id,
                instructor_entry: updated.instructor_entry,
            })
        } else {
            let missing = merged.missing_fields();
            let booking_id = merged.booking_id.clone();
            session.pending = Some(merged);
            Ok(IntentOutcome::DraftUpdated {
                booking_id,
                missing,
            })
        }
    }

    /// Transition 4: patch a settled booking; untouched fields are carried
    /// over from the existing entry.
    fn modify_settled(
        &self,
        validated: &ValidatedIntent,
        booking_id: &str,
    ) -> Result<IntentOutcome, AgentError> {
        let existing = self
            .ledger
            .find_on_date(validated.date, booking_id)
            .ok_or_else(|| CoordinatorError::UnknownBooking(booking_id.to_string()))?;

        let new_duration = validated.duration.unwrap_or(existing.duration);
        if new_duration > existing.duration {
            self.check_maintenance(&existing.resource_id, new_duration)?;
        }

        let patch = BookingPatch {
            start_hour: (validated.start_hour != existing.start_hour)
                .then_some(validated.start_hour),
            duration: validated.duration,
            booking_type: validated.booking_type,
            instructor: validated.instructor.clone(),
            ..Default::default()
        };

        let updated = self
            .linked
            .update_linked(validated.date, booking_id, &patch)?;
        Ok(IntentOutcome::Modified {
            booking_id: updated.booking.id,
        })
    }

    fn check_maintenance(&self, aircraft_id: &str, duration: f64) -> Result<(), AgentError> {
        let Some(aircraft) = self.catalog.find_aircraft(aircraft_id) else {
            return Err(CoordinatorError::UnknownAircraft(aircraft_id.to_string()).into());
        };
        maintenance::can_book_duration(aircraft, duration)?;
        Ok(())
    }

    /// Pre-flight availability check for both sides of the reservation. The
    /// ledger re-validates at commit; this just fails fast with the same
    /// error shape.
    fn check_availability(
        &self,
        validated: &ValidatedIntent,
        duration: f64,
    ) -> Result<(), AgentError> {
        if !availability::is_range_available(
            &self.ledger,
            &validated.aircraft_id,
            validated.date,
            validated.start_hour,
            duration,
        ) {
            return Err(CoordinatorError::Ledger(LedgerError::SlotOccupied {
                resource_id: validated.aircraft_id.clone(),
                date: validated.date,
                time: slot::format_hour(validated.start_hour),
            })
            .into());
        }

        if let Some(ref name) = validated.instructor {
            if !instructor_is_unassigned(Some(name)) {
                if let Some(instructor) = self.catalog.find_instructor_by_name(name) {
                    if !availability::is_range_available(
                        &self.ledger,
                        &instructor.id,
                        validated.date,
                        validated.start_hour,
                        duration,
                    ) {
                        return Err(CoordinatorError::Ledger(LedgerError::SlotOccupied {
                            resource_id: instructor.id.clone(),
                            date: validated.date,
                            time: slot::format_hour(validated.start_hour),
                        })
                        .into());
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stelfly_core::resource::{AircraftMaintenance, Instructor};

    fn catalog() -> Arc<ResourceCatalog> {
        Arc::new(ResourceCatalog::new(
            vec![
                AircraftMaintenance {
                    tail_number: "ZS-OHH".to_string(),
                    model: "C172 N".to_string(),
                    current_tach_time: 1455.0,
                    next_50hr_due: 1500.0,
                    next_100hr_due: 1550.0,
                    annual_due: NaiveDate::from_ymd_opt(2026, 6, 15).unwrap(),
                },
                // 3 hours to the 50hr inspection
                AircraftMaintenance {
                    tail_number: "ZS-KUI".to_string(),
                    model: "C172RG Cutlass".to_string(),
                    current_tach_time: 647.0,
                    next_50hr_due: 650.0,
                    next_100hr_due: 700.0,
                    annual_due: NaiveDate::from_ymd_opt(2026, 5, 30).unwrap(),
                },
                AircraftMaintenance {
                    tail_number: "ZS-OHI".to_string(),
                    model: "C172 N".to_string(),
                    current_tach_time: 2103.0,
                    next_50hr_due: 2150.0,
                    next_100hr_due: 2200.0,
                    annual_due: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
                },
            ],
            vec![
                Instructor::new("Tristan Storkey"),
                Instructor::new("Peter Erasmus"),
            ],
        ))
    }

    fn agent() -> (Arc<BookingLedger>, SchedulingAgent) {
        let ledger = Arc::new(BookingLedger::new());
        let agent = SchedulingAgent::new(ledger.clone(), catalog());
        (ledger, agent)
    }

    fn complete_intent(aircraft: &str, date: &str, time: &str) -> BookingIntent {
        BookingIntent {
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            aircraft: Some(aircraft.to_string()),
            instructor: Some("Peter Erasmus".to_string()),
            booking_type: Some("Training".to_string()),
            duration: Some(2.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_a_double_booking_rejected() {
        let (_, agent) = agent();
        let mut session = SessionState::default();

        let first = agent
            .apply_intent(
                &mut session,
                &complete_intent("ZS-OHH", "2026-01-10", "08:00"),
                false,
            )
            .unwrap();
        assert!(matches!(first, IntentOutcome::Booked { .. }));
        assert!(!session.awaiting_details());

        // 09:00 falls inside the 08:00-10:00 block
        let mut second = complete_intent("ZS-OHH", "2026-01-10", "09:00");
        second.instructor = Some("Tristan Storkey".to_string());
        let err = agent.apply_intent(&mut session, &second, false).unwrap_err();
        assert!(matches!(
            err,
            AgentError::Coordinator(CoordinatorError::Ledger(LedgerError::SlotOccupied { .. }))
        ));
    }

    #[test]
    fn test_scenario_b_draft_then_completion() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        // Incomplete request: aircraft and time only
        let draft_intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            booking_id: Some("booking-123".to_string()),
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &draft_intent, true).unwrap();
        let IntentOutcome::DraftCreated { booking_id, missing } = outcome else {
            panic!("expected draft, got {outcome:?}");
        };
        assert_eq!(booking_id, "booking-123");
        assert_eq!(missing, vec!["instructor", "type", "duration"]);
        assert!(session.awaiting_details());

        // Placeholder instructor, no instructor-side entry yet
        let draft = ledger.find_by_id(day, "zsohi", "booking-123").unwrap();
        assert!(draft.instructor.is_none());
        assert!(ledger.find_by_id(day, "inst-tristan", "booking-123-inst").is_none());

        // Follow-up completes the same booking, not a new one
        let follow_up = BookingIntent {
            booking_id: Some("booking-123".to_string()),
            instructor: Some("Tristan Storkey".to_string()),
            booking_type: Some("Training".to_string()),
            duration: Some(2.0),
            is_update: true,
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &follow_up, false).unwrap();
        assert!(matches!(outcome, IntentOutcome::DraftCompleted { .. }));
        assert!(!session.awaiting_details());

        let completed = ledger.find_by_id(day, "zsohi", "booking-123").unwrap();
        assert_eq!(completed.instructor.as_deref(), Some("Tristan Storkey"));
        assert_eq!(completed.start_hour, 15);

        let instructor_side = ledger
            .find_by_id(day, "inst-tristan", "booking-123-inst")
            .unwrap();
        assert_eq!(instructor_side.start_hour, 15);
        assert_eq!(instructor_side.linked_to.as_deref(), Some("booking-123"));

        // Only those two entries exist
        let entries: usize = ledger.list_for_date(day).values().map(Vec::len).sum();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_scenario_c_maintenance_limits() {
        let (_, agent) = agent();
        let mut session = SessionState::default();

        // ZS-KUI has 3 hours remaining: 4h rejected
        let mut intent = complete_intent("ZS-KUI", "2026-01-10", "08:00");
        intent.duration = Some(4.0);
        let err = agent.apply_intent(&mut session, &intent, false).unwrap_err();
        assert!(matches!(
            err,
            AgentError::Maintenance(MaintenanceError::MaintenanceExceeded { .. })
        ));

        // 2h accepted
        intent.duration = Some(2.0);
        assert!(agent.apply_intent(&mut session, &intent, false).is_ok());
    }

    #[test]
    fn test_continuation_is_idempotent() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let draft_intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            booking_id: Some("booking-777".to_string()),
            ..Default::default()
        };
        agent.apply_intent(&mut session, &draft_intent, true).unwrap();

        let follow_up = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            booking_id: Some("booking-777".to_string()),
            instructor: Some("Tristan Storkey".to_string()),
            booking_type: Some("Training".to_string()),
            duration: Some(2.0),
            is_update: true,
            ..Default::default()
        };
        agent.apply_intent(&mut session, &follow_up, false).unwrap();

        // Same continuation again: routed as a settled modification, no
        // second booking appears.
        agent.apply_intent(&mut session, &follow_up, false).unwrap();

        let entries: usize = ledger.list_for_date(day).values().map(Vec::len).sum();
        assert_eq!(entries, 2);
    }

    #[test]
    fn test_second_incomplete_intent_continues_existing_draft() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let draft_intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &draft_intent, true).unwrap();
        let IntentOutcome::DraftCreated { booking_id, .. } = outcome else {
            panic!("expected draft");
        };

        // A second incomplete intent (producer lost the id) must not open a
        // second draft.
        let second = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            booking_type: Some("Training".to_string()),
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &second, true).unwrap();
        assert!(matches!(outcome, IntentOutcome::DraftUpdated { .. }));

        let aircraft_entries = ledger.list_for_date(day)["zsohi"].len();
        assert_eq!(aircraft_entries, 1);
        assert_eq!(
            session.pending.as_ref().map(|p| p.booking_id.clone()),
            Some(booking_id)
        );
    }

    #[test]
    fn test_second_incomplete_intent_without_marker_continues_draft() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let draft_intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &draft_intent, true).unwrap();
        let IntentOutcome::DraftCreated { booking_id, .. } = outcome else {
            panic!("expected draft");
        };

        // Incomplete follow-up that carries neither the marker nor the
        // booking id, at a different time: it must fold into the draft,
        // not materialize a second placeholder.
        let second = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("10:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            ..Default::default()
        };
        let outcome = agent.apply_intent(&mut session, &second, false).unwrap();
        let IntentOutcome::DraftUpdated { booking_id: updated_id, missing } = outcome else {
            panic!("expected the draft to continue, got a new booking");
        };
        assert_eq!(updated_id, booking_id);
        assert_eq!(missing, vec!["instructor", "type", "duration"]);

        // One aircraft entry, moved to the new time
        let entries = &ledger.list_for_date(day)["zsohi"];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, booking_id);
        assert_eq!(entries[0].start_hour, 10);
    }

    #[test]
    fn test_unknown_booking_modification_fails_closed() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();

        let intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            instructor: Some("Peter Erasmus".to_string()),
            booking_type: Some("Training".to_string()),
            duration: Some(2.0),
            booking_id: Some("booking-ghost".to_string()),
            is_update: true,
            ..Default::default()
        };
        let err = agent.apply_intent(&mut session, &intent, false).unwrap_err();
        assert!(matches!(
            err,
            AgentError::Coordinator(CoordinatorError::UnknownBooking(_))
        ));
        assert!(ledger
            .list_for_date(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())
            .is_empty());
    }

    #[test]
    fn test_modification_of_settled_booking() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let mut create = complete_intent("ZS-OHI", "2026-01-12", "15:00");
        create.booking_id = Some("booking-42".to_string());
        agent.apply_intent(&mut session, &create, false).unwrap();

        // "change instructor to Tristan": full field set, one change
        let mut modify = complete_intent("ZS-OHI", "2026-01-12", "15:00");
        modify.booking_id = Some("booking-42".to_string());
        modify.instructor = Some("Tristan Storkey".to_string());
        modify.is_update = true;
        let outcome = agent.apply_intent(&mut session, &modify, false).unwrap();
        assert!(matches!(outcome, IntentOutcome::Modified { .. }));

        let booking = ledger.find_by_id(day, "zsohi", "booking-42").unwrap();
        assert_eq!(booking.instructor.as_deref(), Some("Tristan Storkey"));
        // The instructor entry moved between rosters
        assert!(ledger.find_by_id(day, "inst-peter", "booking-42-inst").is_none());
        assert!(ledger.find_by_id(day, "inst-tristan", "booking-42-inst").is_some());
    }

    #[test]
    fn test_clear_pending_leaves_ledger_untouched() {
        let (ledger, agent) = agent();
        let mut session = SessionState::default();
        let day = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();

        let draft_intent = BookingIntent {
            date: Some("2026-01-12".to_string()),
            time: Some("15:00".to_string()),
            aircraft: Some("ZS-OHI".to_string()),
            ..Default::default()
        };
        agent.apply_intent(&mut session, &draft_intent, true).unwrap();
        let before: usize = ledger.list_for_date(day).values().map(Vec::len).sum();

        let outcome = agent.clear_pending(&mut session);
        assert_eq!(outcome, IntentOutcome::PendingCleared);
        assert!(!session.awaiting_details());

        // Abandoned placeholder stays materialized (no expiry policy)
        let after: usize = ledger.list_for_date(day).values().map(Vec::len).sum();
        assert_eq!(before, after);
    }
}
