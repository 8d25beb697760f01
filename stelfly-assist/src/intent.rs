//! Structured booking intents produced by the completion collaborator.
//!
//! The model embeds a `BOOKING_REQUEST:{json}` marker in its reply, plus the
//! bare markers `NEEDS_MORE_INFO` and `CLEAR_PENDING`. The payload is not
//! trusted: every field is re-validated against the slot grammar and the
//! resource catalog before the engine acts on it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stelfly_core::booking::{instructor_is_unassigned, BookingType};
use stelfly_core::resource::{aircraft_id_for_tail, ResourceCatalog};
use stelfly_core::slot::{self, SlotError};

pub const BOOKING_REQUEST_MARKER: &str = "BOOKING_REQUEST:";
pub const NEEDS_MORE_INFO_MARKER: &str = "NEEDS_MORE_INFO";
pub const CLEAR_PENDING_MARKER: &str = "CLEAR_PENDING";

/// The raw, loosely typed intent payload as the model emits it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingIntent {
    pub date: Option<String>,
    pub time: Option<String>,
    pub aircraft: Option<String>,
    pub instructor: Option<String>,
    #[serde(rename = "type")]
    pub booking_type: Option<String>,
    pub duration: Option<f64>,
    pub booking_id: Option<String>,
    pub is_update: bool,
}

/// A model reply split into its user-facing text and machine markers.
#[derive(Debug, Clone, Default)]
pub struct ExtractedReply {
    pub message: String,
    pub intent: Option<BookingIntent>,
    pub needs_more_info: bool,
    pub clear_pending: bool,
}

/// Pulls markers out of a raw completion and strips them from the message.
/// A malformed intent payload is dropped (and logged), never propagated.
pub fn extract_reply(raw: &str) -> ExtractedReply {
    let mut message = raw.to_string();
    let mut intent = None;

    if let Some(marker_pos) = raw.find(BOOKING_REQUEST_MARKER) {
        let after = &raw[marker_pos + BOOKING_REQUEST_MARKER.len()..];
        if let Some(open) = after.find('{') {
            // The payload is a flat object, so the first closing brace ends it.
            if let Some(close) = after[open..].find('}') {
                let json = &after[open..open + close + 1];
                match serde_json::from_str::<BookingIntent>(json) {
                    Ok(parsed) => intent = Some(parsed),
                    Err(error) => {
                        tracing::warn!(%error, payload = json, "unparseable booking intent")
                    }
                }
                let full = format!("{}{}", BOOKING_REQUEST_MARKER, json);
                message = message.replacen(&full, "", 1);
            }
        }
    }

    let needs_more_info = message.contains(NEEDS_MORE_INFO_MARKER);
    let clear_pending = message.contains(CLEAR_PENDING_MARKER);
    message = message
        .replace(NEEDS_MORE_INFO_MARKER, "")
        .replace(CLEAR_PENDING_MARKER, "")
        .trim()
        .to_string();

    ExtractedReply {
        message,
        intent,
        needs_more_info,
        clear_pending,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntentError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error("Unknown aircraft: {0}")]
    UnknownAircraft(String),

    #[error("Unknown instructor: {0}")]
    UnknownInstructor(String),
}

/// An intent with every supplied field checked and normalized.
///
/// `instructor` keeps placeholder values ("TBD"/"None") verbatim so a
/// modification can explicitly clear an assignment; real names are
/// canonicalized to their catalog spelling.
#[derive(Debug, Clone)]
pub struct ValidatedIntent {
    pub date: NaiveDate,
    pub start_hour: u8,
    pub aircraft_id: String,
    pub instructor: Option<String>,
    pub booking_type: Option<BookingType>,
    pub duration: Option<f64>,
    pub booking_id: Option<String>,
    pub is_update: bool,
}

impl ValidatedIntent {
    /// Required fields (instructor, classification, duration) the payload
    /// did not supply. Non-empty means the intent only supports a draft.
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
}

/// Defensively validates a raw intent against the catalog and slot grammar.
pub fn validate_intent(
    catalog: &ResourceCatalog,
    intent: &BookingIntent,
) -> Result<ValidatedIntent, IntentError> {
    let date_str = intent
        .date
        .as_deref()
        .ok_or(IntentError::MissingField("date"))?;
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| IntentError::InvalidDate(date_str.to_string()))?;

    let time_str = intent
        .time
        .as_deref()
        .ok_or(IntentError::MissingField("time"))?;
    let start_hour = slot::parse_slot_time(time_str)?;

    let aircraft_label = intent
        .aircraft
        .as_deref()
        .ok_or(IntentError::MissingField("aircraft"))?;
    let aircraft_id = aircraft_id_for_tail(aircraft_label);
    if catalog.find_aircraft(&aircraft_id).is_none() {
        return Err(IntentError::UnknownAircraft(aircraft_label.to_string()));
    }

    let instructor = match intent.instructor.as_deref() {
        Some(name) if !instructor_is_unassigned(Some(name)) => {
            let found = catalog
                .find_instructor_by_name(name)
                .ok_or_else(|| IntentError::UnknownInstructor(name.to_string()))?;
            Some(found.name.clone())
        }
        Some(placeholder) => Some(placeholder.to_string()),
        None => None,
    };

    if let Some(duration) = intent.duration {
        slot::validate_duration(duration)?;
    }

    Ok(ValidatedIntent {
        date,
        start_hour,
        aircraft_id,
        instructor,
        booking_type: intent.booking_type.as_deref().map(BookingType::from_label),
        duration: intent.duration,
        booking_id: intent.booking_id.clone(),
        is_update: intent.is_update,
    })
}
