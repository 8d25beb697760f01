use serde::{Deserialize, Serialize};

use crate::resource::AircraftMaintenance;

/// Warning threshold in hours - aircraft flagged when at or below this.
pub const MPI_WARNING_THRESHOLD: f64 = 10.0;

/// Critical threshold in hours - restricts longer bookings.
pub const MPI_CRITICAL_THRESHOLD: f64 = 5.0;

/// Which MPI threshold is coming up next.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InspectionType {
    #[serde(rename = "50hr")]
    FiftyHour,
    #[serde(rename = "100hr")]
    HundredHour,
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FiftyHour => write!(f, "50hr"),
            Self::HundredHour => write!(f, "100hr"),
        }
    }
}

/// Derived maintenance state. Never stored; recomputed on every read.
///
/// The tiers are mutually exclusive and ordered: grounded (≤0) >
/// critical (≤5, >0) > warning (≤10, >5) > none. Exactly one applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub hours_remaining: f64,
    pub inspection_type: InspectionType,
    pub is_warning: bool,
    pub is_critical: bool,
    pub is_grounded: bool,
}

/// Calculates maintenance status from an aircraft's MPI counters.
pub fn calculate_status(aircraft: &AircraftMaintenance) -> MaintenanceStatus {
    let hours_to_50 = aircraft.next_50hr_due - aircraft.current_tach_time;
    let hours_to_100 = aircraft.next_100hr_due - aircraft.current_tach_time;

    // Nearest upcoming inspection drives the status.
    let hours_remaining = hours_to_50.min(hours_to_100);
    let inspection_type = if hours_to_50 < hours_to_100 {
        InspectionType::FiftyHour
    } else {
        InspectionType::HundredHour
    };

    MaintenanceStatus {
        hours_remaining: hours_remaining.max(0.0),
        inspection_type,
        is_warning: hours_remaining <= MPI_WARNING_THRESHOLD
            && hours_remaining > MPI_CRITICAL_THRESHOLD,
        is_critical: hours_remaining <= MPI_CRITICAL_THRESHOLD && hours_remaining > 0.0,
        is_grounded: hours_remaining <= 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum MaintenanceError {
    #[error("{tail_number} is grounded - {inspection_type} inspection overdue")]
    Grounded {
        tail_number: String,
        inspection_type: InspectionType,
    },

    #[error(
        "Booking exceeds available hours: only {hours_remaining:.1}h until {inspection_type} inspection (requested {requested:.1}h)"
    )]
    MaintenanceExceeded {
        tail_number: String,
        requested: f64,
        hours_remaining: f64,
        inspection_type: InspectionType,
    },
}

/// Checks whether a booking of `requested_hours` fits inside the aircraft's
/// remaining MPI allowance.
pub fn can_book_duration(
    aircraft: &AircraftMaintenance,
    requested_hours: f64,
) -> Result<(), MaintenanceError> {
    let status = calculate_status(aircraft);

    if status.is_grounded {
        return Err(MaintenanceError::Grounded {
            tail_number: aircraft.tail_number.clone(),
            inspection_type: status.inspection_type,
        });
    }

    if requested_hours > status.hours_remaining {
        return Err(MaintenanceError::MaintenanceExceeded {
            tail_number: aircraft.tail_number.clone(),
            requested: requested_hours,
            hours_remaining: status.hours_remaining,
            inspection_type: status.inspection_type,
        });
    }

    Ok(())
}

/// Formats an hours-remaining figure for display.
pub fn format_hours_remaining(hours: f64) -> String {
    if hours <= 0.0 {
        return "OVERDUE".to_string();
    }
    if hours < 1.0 {
        return format!("{}min", (hours * 60.0).round() as i64);
    }
    format!("{:.1}h", hours)
}
