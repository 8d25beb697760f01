use std::collections::BTreeMap;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stelfly_core::booking::{Booking, BookingPatch, BookingType};
use stelfly_core::maintenance;
use stelfly_core::resource::aircraft_id_for_tail;
use stelfly_core::slot;
use stelfly_sched::availability;
use stelfly_sched::coordinator::BookingCore;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/schedule/{date}", get(day_schedule))
        .route("/v1/bookings", post(create_booking))
        .route(
            "/v1/bookings/{date}/{id}",
            axum::routing::patch(update_booking).delete(cancel_booking),
        )
        .route(
            "/v1/availability/{date}/{resource_id}",
            get(resource_availability),
        )
}

async fn day_schedule(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Json<BTreeMap<String, Vec<Booking>>> {
    Json(state.ledger.list_for_date(date))
}

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    date: NaiveDate,
    /// Tail number or display label, e.g. "ZS-OHH" or "ZS-OHH (C172 N)".
    aircraft: String,
    start_time: String,
    duration: f64,
    #[serde(default)]
    booking_type: Option<String>,
    pilot: String,
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    booking_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    booking_id: String,
    instructor_entry: Option<String>,
}

async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let aircraft_id = aircraft_id_for_tail(&req.aircraft);
    let aircraft = state
        .catalog
        .find_aircraft(&aircraft_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown aircraft: {}", req.aircraft)))?;

    let start_hour = slot::parse_slot_time(&req.start_time)?;
    slot::validate_duration(req.duration)?;
    maintenance::can_book_duration(aircraft, req.duration)?;

    let outcome = state.linked.create_linked(
        req.date,
        &aircraft_id,
        BookingCore {
            id: req.booking_id,
            start_hour,
            duration: req.duration,
            booking_type: req
                .booking_type
                .as_deref()
                .map(BookingType::from_label)
                .unwrap_or_default(),
            pilot: req.pilot,
            instructor: req.instructor,
            notes: req.notes,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_id: outcome.booking_id,
            instructor_entry: outcome.instructor_entry,
        }),
    ))
}

#[derive(Debug, Deserialize, Default)]
struct UpdateBookingRequest {
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    booking_type: Option<String>,
    #[serde(default)]
    pilot: Option<String>,
    /// "TBD" or "None" clears the assignment.
    #[serde(default)]
    instructor: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

async fn update_booking(
    State(state): State<AppState>,
    Path((date, id)): Path<(NaiveDate, String)>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let existing = state
        .ledger
        .find_on_date(date, &id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown booking: {id}")))?;

    // A longer flight re-runs the maintenance gate
    if let Some(duration) = req.duration {
        if duration > existing.duration {
            if let Some(aircraft) = state.catalog.find_aircraft(&existing.resource_id) {
                maintenance::can_book_duration(aircraft, duration)?;
            }
        }
    }

    let patch = BookingPatch {
        start_hour: req
            .start_time
            .as_deref()
            .map(slot::parse_slot_time)
            .transpose()?,
        duration: req.duration,
        booking_type: req.booking_type.as_deref().map(BookingType::from_label),
        pilot: req.pilot,
        instructor: req.instructor,
        notes: req.notes,
    };
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    let outcome = state.linked.update_linked(date, &id, &patch)?;
    Ok(Json(outcome.booking))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path((date, id)): Path<(NaiveDate, String)>,
) -> Result<StatusCode, AppError> {
    state.linked.cancel_linked(date, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    date: NaiveDate,
    resource_id: String,
    free_slots: Vec<String>,
    occupied_slots: Vec<String>,
}

async fn resource_availability(
    State(state): State<AppState>,
    Path((date, resource_id)): Path<(NaiveDate, String)>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    if !state.catalog.is_known_resource(&resource_id) {
        return Err(AppError::NotFound(format!(
            "Unknown resource: {resource_id}"
        )));
    }

    let free_slots = availability::free_hours(&state.ledger, &resource_id, date)
        .into_iter()
        .map(slot::format_hour)
        .collect();
    let occupied_slots = state
        .ledger
        .occupied_hours(date, &resource_id)
        .into_iter()
        .map(slot::format_hour)
        .collect();

    Ok(Json(AvailabilityResponse {
        date,
        resource_id,
        free_slots,
        occupied_slots,
    }))
}
