use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot;

/// Placeholder instructor value used while a draft booking is awaiting
/// details. A booking carrying this (or "None") has no instructor-side entry.
pub const UNASSIGNED_INSTRUCTOR: &str = "TBD";

/// Returns true when an instructor field holds no real assignment.
pub fn instructor_is_unassigned(instructor: Option<&str>) -> bool {
    match instructor {
        None => true,
        Some(value) => {
            let v = value.trim();
            v.is_empty() || v.eq_ignore_ascii_case("tbd") || v.eq_ignore_ascii_case("none")
        }
    }
}

/// Booking classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingType {
    Training,
    Solo,
    #[serde(rename = "PPL Test")]
    PplTest,
    Intro,
    Other,
}

impl Default for BookingType {
    fn default() -> Self {
        Self::Training
    }
}

impl BookingType {
    /// Loose parse for externally supplied labels. Unrecognized labels fold
    /// into `Other` rather than failing the whole intent.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "training" => Self::Training,
            "solo" => Self::Solo,
            "ppl test" | "ppl" => Self::PplTest,
            "intro" | "intro flight" => Self::Intro,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Training => "Training",
            Self::Solo => "Solo",
            Self::PplTest => "PPL Test",
            Self::Intro => "Intro",
            Self::Other => "Other",
        }
    }
}

/// A single ledger entry: one resource, one date, one occupied hour range.
///
/// A logical reservation involving both an aircraft and an instructor is two
/// of these, linked through `linked_to` and the `-inst` id suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub resource_id: String,
    pub date: NaiveDate,
    pub start_hour: u8,
    pub duration: f64,
    pub booking_type: BookingType,
    pub pilot: String,
    pub instructor: Option<String>,
    pub notes: Option<String>,
    /// Back-reference carried by the instructor-side entry to its
    /// aircraft-side counterpart.
    pub linked_to: Option<String>,
}

impl Booking {
    /// Generates a fresh booking id.
    pub fn new_id() -> String {
        format!("booking-{}", Uuid::new_v4().simple())
    }

    /// Derived id of the instructor-side entry paired with `booking_id`.
    pub fn instructor_entry_id(booking_id: &str) -> String {
        format!("{}-inst", booking_id)
    }

    /// Whole hours this booking renders unavailable on its resource.
    pub fn occupied_hours(&self) -> Vec<u8> {
        slot::blocked_hours(self.start_hour, self.duration)
    }

    /// First hour past the blocked range.
    pub fn end_hour(&self) -> u8 {
        self.start_hour + slot::blocked_slot_count(self.duration)
    }

    pub fn start_time(&self) -> String {
        slot::format_hour(self.start_hour)
    }

    /// Display title, `<Type> - <pilot>`.
    pub fn title(&self) -> String {
        format!("{} - {}", self.booking_type.label(), self.pilot)
    }

    /// True when this booking occupies any of the same hours as another.
    pub fn overlaps(&self, other: &Booking) -> bool {
        let a = self.occupied_hours();
        other.occupied_hours().iter().any(|h| a.contains(h))
    }
}

/// Partial update applied through `updateById`. `None` fields are left
/// unchanged; setting `instructor` to a placeholder value clears the
/// assignment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    pub start_hour: Option<u8>,
    pub duration: Option<f64>,
    pub booking_type: Option<BookingType>,
    pub pilot: Option<String>,
    pub instructor: Option<String>,
    pub notes: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.start_hour.is_none()
            && self.duration.is_none()
            && self.booking_type.is_none()
            && self.pilot.is_none()
            && self.instructor.is_none()
            && self.notes.is_none()
    }

    /// Applies the patch in place, preserving the booking id.
    pub fn apply_to(&self, booking: &mut Booking) {
        if let Some(start_hour) = self.start_hour {
            booking.start_hour = start_hour;
        }
        if let Some(duration) = self.duration {
            booking.duration = duration;
        }
        if let Some(booking_type) = self.booking_type {
            booking.booking_type = booking_type;
        }
        if let Some(ref pilot) = self.pilot {
            booking.pilot = pilot.clone();
        }
        if let Some(ref instructor) = self.instructor {
            if instructor_is_unassigned(Some(instructor)) {
                booking.instructor = None;
            } else {
                booking.instructor = Some(instructor.clone());
            }
        }
        if let Some(ref notes) = self.notes {
            booking.notes = Some(notes.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_booking(start_hour: u8, duration: f64) -> Booking {
        Booking {
            id: Booking::new_id(),
            resource_id: "zsohh".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            start_hour,
            duration,
            booking_type: BookingType::Training,
            pilot: "Peter Smith".to_string(),
            instructor: None,
            notes: None,
            linked_to: None,
        }
    }

    #[test]
    fn test_occupied_hours() {
        assert_eq!(test_booking(8, 2.0).occupied_hours(), vec![8, 9]);
        assert_eq!(test_booking(8, 1.5).occupied_hours(), vec![8, 9]);
        assert_eq!(test_booking(14, 1.0).occupied_hours(), vec![14]);
    }

    #[test]
    fn test_overlap_detection() {
        let a = test_booking(8, 2.0);
        assert!(a.overlaps(&test_booking(9, 1.0)));
        assert!(a.overlaps(&test_booking(7, 1.5)));
        assert!(!a.overlaps(&test_booking(10, 1.0)));
    }

    #[test]
    fn test_patch_clears_placeholder_instructor() {
        let mut booking = test_booking(8, 2.0);
        booking.instructor = Some("Tristan Storkey".to_string());

        let patch = BookingPatch {
            instructor: Some("None".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut booking);
        assert!(booking.instructor.is_none());
    }

    #[test]
    fn test_patch_preserves_unset_fields() {
        let mut booking = test_booking(8, 2.0);
        let id = booking.id.clone();

        let patch = BookingPatch {
            duration: Some(3.0),
            ..Default::default()
        };
        patch.apply_to(&mut booking);

        assert_eq!(booking.id, id);
        assert_eq!(booking.duration, 3.0);
        assert_eq!(booking.start_hour, 8);
        assert_eq!(booking.pilot, "Peter Smith");
    }

    #[test]
    fn test_unassigned_sentinels() {
        assert!(instructor_is_unassigned(None));
        assert!(instructor_is_unassigned(Some("TBD")));
        assert!(instructor_is_unassigned(Some("None")));
        assert!(instructor_is_unassigned(Some(" ")));
        assert!(!instructor_is_unassigned(Some("Tristan Storkey")));
    }

    #[test]
    fn test_booking_type_labels() {
        assert_eq!(BookingType::from_label("training"), BookingType::Training);
        assert_eq!(BookingType::from_label("PPL Test"), BookingType::PplTest);
        assert_eq!(BookingType::from_label("rental"), BookingType::Other);
        assert_eq!(
            serde_json::to_string(&BookingType::PplTest).unwrap(),
            "\"PPL Test\""
        );
    }
}
