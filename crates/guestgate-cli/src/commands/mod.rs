pub mod door;
pub mod event;
pub mod guest;

pub use door::DoorArgs;
pub use event::EventCommands;
pub use guest::GuestCommands;
