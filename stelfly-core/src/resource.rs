use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Instructor reference data. Resource ids follow the scheduler convention
/// `inst-<first name, lowercased>`, e.g. `inst-peter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    pub id: String,
    pub name: String,
}

impl Instructor {
    pub fn new(name: &str) -> Self {
        Self {
            id: instructor_id_for_name(name),
            name: name.to_string(),
        }
    }
}

/// Derives the instructor resource id from a display name (`inst-` plus the
/// lowercased first name).
pub fn instructor_id_for_name(name: &str) -> String {
    let first = name.split_whitespace().next().unwrap_or(name);
    format!("inst-{}", first.to_lowercase())
}

/// An aircraft with its MPI (Maintenance Plan Inspection) counters.
///
/// Tach time and threshold figures are cumulative engine hours; `annual_due`
/// is the next annual-inspection calendar date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AircraftMaintenance {
    pub tail_number: String,
    pub model: String,
    pub current_tach_time: f64,
    pub next_50hr_due: f64,
    pub next_100hr_due: f64,
    pub annual_due: NaiveDate,
}

impl AircraftMaintenance {
    /// Resource id convention: tail number lowercased with the hyphen
    /// removed (`ZS-OHH` -> `zsohh`).
    pub fn resource_id(&self) -> String {
        aircraft_id_for_tail(&self.tail_number)
    }

    pub fn display_name(&self) -> String {
        format!("{} ({})", self.tail_number, self.model)
    }
}

/// Derives the aircraft resource id from a tail number or a full display
/// label such as `ZS-OHH (C172 N)`.
pub fn aircraft_id_for_tail(label: &str) -> String {
    let tail = label.split_whitespace().next().unwrap_or(label);
    tail.to_lowercase().replace('-', "")
}

/// Immutable resource reference data supplied at configuration time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceCatalog {
    aircraft: Vec<AircraftMaintenance>,
    instructors: Vec<Instructor>,
}

impl ResourceCatalog {
    pub fn new(aircraft: Vec<AircraftMaintenance>, instructors: Vec<Instructor>) -> Self {
        Self {
            aircraft,
            instructors,
        }
    }

    pub fn aircraft(&self) -> &[AircraftMaintenance] {
        &self.aircraft
    }

    pub fn instructors(&self) -> &[Instructor] {
        &self.instructors
    }

    pub fn find_aircraft(&self, resource_id: &str) -> Option<&AircraftMaintenance> {
        self.aircraft.iter().find(|a| a.resource_id() == resource_id)
    }

    pub fn find_instructor(&self, resource_id: &str) -> Option<&Instructor> {
        self.instructors.iter().find(|i| i.id == resource_id)
    }

    /// Case-insensitive lookup by instructor display name.
    pub fn find_instructor_by_name(&self, name: &str) -> Option<&Instructor> {
        let wanted = name.trim().to_lowercase();
        self.instructors
            .iter()
            .find(|i| i.name.to_lowercase() == wanted)
    }

    pub fn is_known_resource(&self, resource_id: &str) -> bool {
        self.find_aircraft(resource_id).is_some() || self.find_instructor(resource_id).is_some()
    }

    /// Human-readable label for a resource id, used in schedule context
    /// rendering and error messages.
    pub fn resource_display_name(&self, resource_id: &str) -> String {
        if let Some(aircraft) = self.find_aircraft(resource_id) {
            return format!("Aircraft: {}", aircraft.display_name());
        }
        if let Some(instructor) = self.find_instructor(resource_id) {
            return format!("Instructor: {}", instructor.name);
        }
        resource_id.to_string()
    }
}
