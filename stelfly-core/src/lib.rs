pub mod booking;
pub mod maintenance;
pub mod resource;
pub mod slot;

pub use booking::{Booking, BookingPatch, BookingType};
pub use maintenance::{MaintenanceError, MaintenanceStatus};
pub use resource::{AircraftMaintenance, Instructor, ResourceCatalog};
