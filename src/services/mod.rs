// Recorder Settings Services
// Persistence, permission gating, and retention logic

mod preferences_store;
mod settings_controller;
mod permissions;
mod events;
mod circular_retention;
mod log_manager;

pub use preferences_store::*;
pub use settings_controller::*;
pub use permissions::*;
pub use events::*;
pub use circular_retention::*;
pub use log_manager::*;
