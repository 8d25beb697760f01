use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};
use serde::Serialize;

use stelfly_core::maintenance::{self, MaintenanceStatus};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/fleet", get(fleet_status))
}

#[derive(Debug, Serialize)]
struct FleetEntry {
    resource_id: String,
    tail_number: String,
    model: String,
    current_tach_time: f64,
    status: MaintenanceStatus,
    /// Human-readable remaining time, e.g. "4.5h", "30min", "OVERDUE".
    hours_display: String,
}

/// Derived maintenance status for every aircraft, recomputed per request.
async fn fleet_status(State(state): State<AppState>) -> Json<Vec<FleetEntry>> {
    let fleet = state
        .catalog
        .aircraft()
        .iter()
        .map(|aircraft| {
            let status = maintenance::calculate_status(aircraft);
            FleetEntry {
                resource_id: aircraft.resource_id(),
                tail_number: aircraft.tail_number.clone(),
                model: aircraft.model.clone(),
                current_tach_time: aircraft.current_tach_time,
                hours_display: maintenance::format_hours_remaining(status.hours_remaining),
                status,
            }
        })
        .collect();
    Json(fleet)
}
