use serde::{Deserialize, Serialize};

/// First bookable hour of the operating day (07:00).
pub const FIRST_HOUR: u8 = 7;

/// Last bookable hour of the operating day (18:00).
pub const LAST_HOUR: u8 = 18;

/// Bookings are accepted in quarter-hour increments.
pub const DURATION_STEP: f64 = 0.25;

/// All bookable start hours, in display order.
pub fn operating_hours() -> impl Iterator<Item = u8> {
    FIRST_HOUR..=LAST_HOUR
}

/// Renders an hour as the `HH:00` slot label used throughout the schedule.
pub fn format_hour(hour: u8) -> String {
    format!("{:02}:00", hour)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum SlotError {
    #[error("Invalid time: {0} (expected HH:MM)")]
    InvalidTime(String),

    #[error("Time {0}:00 is outside operating hours (07:00 - 18:00)")]
    OutsideOperatingWindow(u8),

    #[error("Invalid duration: {0} (must be a positive quarter-hour multiple)")]
    InvalidDuration(f64),
}

/// Parses an `HH:MM` slot label into a start hour.
///
/// Start times are hour-granular; minutes other than `00` are rejected so a
/// loosely typed upstream payload cannot smuggle in an unschedulable time.
pub fn parse_slot_time(value: &str) -> Result<u8, SlotError> {
    let (hour_part, minute_part) = value
        .split_once(':')
        .ok_or_else(|| SlotError::InvalidTime(value.to_string()))?;

    let hour: u8 = hour_part
        .trim()
        .parse()
        .map_err(|_| SlotError::InvalidTime(value.to_string()))?;
    let minute: u8 = minute_part
        .trim()
        .parse()
        .map_err(|_| SlotError::InvalidTime(value.to_string()))?;

    if minute != 0 {
        return Err(SlotError::InvalidTime(value.to_string()));
    }

    validate_hour(hour)?;
    Ok(hour)
}

/// Checks that an hour falls inside the operating window.
pub fn validate_hour(hour: u8) -> Result<(), SlotError> {
    if !(FIRST_HOUR..=LAST_HOUR).contains(&hour) {
        return Err(SlotError::OutsideOperatingWindow(hour));
    }
    Ok(())
}

/// Checks that a duration is a positive quarter-hour multiple that fits the
/// operating window.
pub fn validate_duration(duration: f64) -> Result<(), SlotError> {
    let max = (LAST_HOUR - FIRST_HOUR + 1) as f64;
    if duration < DURATION_STEP || duration > max {
        return Err(SlotError::InvalidDuration(duration));
    }
    let steps = duration / DURATION_STEP;
    if (steps - steps.round()).abs() > 1e-9 {
        return Err(SlotError::InvalidDuration(duration));
    }
    Ok(())
}

/// Number of whole-hour slots a booking of `duration` hours blocks.
///
/// Fractional durations round UP: a 1.5h booking still blocks the second
/// hour it touches, never less.
pub fn blocked_slot_count(duration: f64) -> u8 {
    duration.ceil().max(1.0) as u8
}

/// The whole hours rendered unavailable by a booking starting at
/// `start_hour` for `duration` hours: `[start, start + ceil(duration))`.
pub fn blocked_hours(start_hour: u8, duration: f64) -> Vec<u8> {
    let count = blocked_slot_count(duration);
    (start_hour..start_hour.saturating_add(count)).collect()
}
