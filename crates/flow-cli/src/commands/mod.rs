pub mod apps;
pub mod daemon;
pub mod helpers;
pub mod host;
pub mod reminders;
pub mod system;
