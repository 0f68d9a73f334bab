pub mod event;
pub mod guest;

pub use event::Event;
pub use guest::{Guest, RosterStats};
