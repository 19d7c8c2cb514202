//! Booking bot — a stack-based dialog core for collecting travel bookings.

pub mod bot;
pub mod channels;
pub mod config;
pub mod context;
pub mod dialogs;
pub mod error;
pub mod nlu;
pub mod timex;
