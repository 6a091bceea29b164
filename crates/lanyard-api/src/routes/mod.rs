pub mod analytics;
pub mod attendees;
pub mod diplomas;
pub mod events;
pub mod health;
pub mod users;
