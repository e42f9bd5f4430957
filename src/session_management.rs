//! Session management: the process-wide owner of the single capture
//! session slot and its start/stop/status transitions.

pub mod session_manager;

pub use session_manager::SessionManager;
