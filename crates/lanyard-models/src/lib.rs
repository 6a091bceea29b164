pub mod attendee;
pub mod event;
pub mod role;
pub mod stats;
pub mod user;

pub use attendee::{Attendee, CheckInStatus};
pub use event::{Event, EventStatus};
pub use role::Role;
pub use stats::{DispatchOutcome, EventStats, StaffScanCount};
pub use user::User;
