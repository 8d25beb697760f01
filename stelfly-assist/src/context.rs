//! Renders the scheduling engine's state as plain text for the completion
//! model: the two-day schedule snapshot, the pending-draft block, and the
//! full system prompt with the structured reply protocol.

use chrono::{Duration, NaiveDate};
use stelfly_core::booking::{Booking, BookingType};
use stelfly_core::resource::ResourceCatalog;
use stelfly_core::slot;
use stelfly_sched::ledger::BookingLedger;

use crate::intent::{BOOKING_REQUEST_MARKER, CLEAR_PENDING_MARKER, NEEDS_MORE_INFO_MARKER};
use crate::session::PendingBooking;

/// Renders today's and tomorrow's bookings for every catalog resource, in
/// catalog order so the output is deterministic for a given ledger state.
pub fn schedule_context(
    ledger: &BookingLedger,
    catalog: &ResourceCatalog,
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    out.push_str("=== CURRENT BOOKING DATA ===\n");

    for (label, date) in [("TODAY", today), ("TOMORROW", today + Duration::days(1))] {
        out.push_str(&format!("\n{label} ({date}):\n"));
        for aircraft in catalog.aircraft() {
            let id = aircraft.resource_id();
            render_resource(&mut out, ledger, &id, &catalog.resource_display_name(&id), date);
        }
        for instructor in catalog.instructors() {
            let name = catalog.resource_display_name(&instructor.id);
            render_resource(&mut out, ledger, &instructor.id, &name, date);
        }
    }

    out.push_str("\n=== END BOOKING DATA ===\n");
    out
}

fn render_resource(
    out: &mut String,
    ledger: &BookingLedger,
    resource_id: &str,
    display_name: &str,
    date: NaiveDate,
) {
    let mut bookings = ledger.bookings_for(date, resource_id);
    if bookings.is_empty() {
        out.push_str(&format!(
            "  {display_name}: No bookings on {date} - all slots available!\n"
        ));
        return;
    }

    bookings.sort_by_key(|b| b.start_hour);
    out.push_str(&format!("  {display_name}:\n"));
    for booking in &bookings {
        out.push_str(&render_booking(booking));
    }
}

fn render_booking(booking: &Booking) -> String {
    let blocked: Vec<String> = booking
        .occupied_hours()
        .into_iter()
        .map(slot::format_hour)
        .collect();
    format!(
        "    BOOKED: {} - {} ({}h) - {}\n      ID: {} | Instructor: {} | Type: {}\n      (blocks: {})\n",
        booking.start_time(),
        slot::format_hour(booking.end_hour()),
        booking.duration,
        booking.title(),
        booking.id,
        booking.instructor.as_deref().unwrap_or("None"),
        booking.booking_type.label(),
        blocked.join(", "),
    )
}

/// Renders the session's pending draft so the model keeps referring to the
/// same booking id instead of opening a new one.
pub fn pending_context(pending: &PendingBooking) -> String {
    let mut out = String::new();
    out.push_str("=== PENDING BOOKING (awaiting details) ===\n");
    out.push_str(&format!("Booking ID: {}\n", pending.booking_id));
    out.push_str(&format!("Date: {}\n", pending.date));
    out.push_str(&format!("Time: {}\n", slot::format_hour(pending.start_hour)));
    out.push_str(&format!("Aircraft: {}\n", pending.aircraft_id));
    out.push_str(&format!(
        "Still missing: {}\n",
        pending.missing_fields().join(", ")
    ));
    out.push_str(&format!(
        "When the user supplies these, reply with {BOOKING_REQUEST_MARKER} using this exact bookingId and \"isUpdate\": true.\n"
    ));
    out
}

/// Assembles the full system prompt: club identity, rosters, the live
/// schedule snapshot, the optional pending-draft block, and the reply
/// protocol.
pub fn system_prompt(
    catalog: &ResourceCatalog,
    schedule: &str,
    pending: Option<&PendingBooking>,
    today: NaiveDate,
) -> String {
    let aircraft_roster: Vec<String> = catalog
        .aircraft()
        .iter()
        .map(|a| a.display_name())
        .collect();
    let instructor_roster: Vec<String> = catalog
        .instructors()
        .iter()
        .map(|i| i.name.clone())
        .collect();

    let mut prompt = format!(
        "You are the booking assistant for the Stellenbosch Flying Club (FASH).\n\
         Today's date is {today}.\n\n\
         Aircraft fleet: {}\n\
         Instructors: {}\n\n\
         {schedule}\n",
        aircraft_roster.join(", "),
        instructor_roster.join(", "),
    );

    if let Some(pending) = pending {
        prompt.push('\n');
        prompt.push_str(&pending_context(pending));
    }

    prompt.push_str(&format!(
        "\nBooking rules:\n\
         - Operating hours are {} to {}. Never offer slots outside them.\n\
         - A booking needs: date, time, aircraft, instructor, type, duration.\n\
         - Valid types: {}, {}, {}, {}, Other.\n\
         - Only book aircraft and instructors from the rosters above, and only into free slots shown in the booking data.\n\n\
         Reply protocol (machine-read, exact markers required):\n\
         - When you have date, time, and aircraft, append one line:\n\
           {BOOKING_REQUEST_MARKER}{{\"date\": \"YYYY-MM-DD\", \"time\": \"HH:00\", \"aircraft\": \"ZS-OHH\", \"instructor\": \"Peter Erasmus\", \"type\": \"Training\", \"duration\": 2, \"bookingId\": \"booking-abc\", \"isUpdate\": false}}\n\
           Omit fields the user has not given. Keep the JSON flat, on one line.\n\
         - If required details are still missing after that line, also append {NEEDS_MORE_INFO_MARKER} and ask for them.\n\
         - When continuing a pending booking, reuse its bookingId and set \"isUpdate\": true.\n\
         - When modifying an existing booking the user identifies, use its bookingId from the booking data and set \"isUpdate\": true.\n\
         - If the user abandons the pending booking, append {CLEAR_PENDING_MARKER}.\n\
         - For plain questions, answer normally with no markers.\n",
        slot::format_hour(slot::FIRST_HOUR),
        slot::format_hour(slot::LAST_HOUR),
        BookingType::Training.label(),
        BookingType::Solo.label(),
        BookingType::PplTest.label(),
        BookingType::Intro.label(),
    ));

    prompt
}
