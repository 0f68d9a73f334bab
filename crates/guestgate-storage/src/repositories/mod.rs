pub mod event;
pub mod guest;

pub use event::{EventRepository, SqliteEventRepository};
pub use guest::{GuestRepository, SqliteGuestRepository};
