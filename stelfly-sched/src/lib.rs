pub mod availability;
pub mod coordinator;
pub mod ledger;

pub use coordinator::{BookingCore, CoordinatorError, CreateOutcome, LinkedBookings, UpdateOutcome};
pub use ledger::{BookingLedger, LedgerError};
