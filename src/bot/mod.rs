//! Hosting: sessions and the turn loop.

pub mod bot_loop;
pub mod session;

pub use bot_loop::{APOLOGY, BookingBot};
pub use session::{Session, SessionManager};
