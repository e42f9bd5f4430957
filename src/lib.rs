pub mod capture;
pub use capture::*;

pub mod configuration;
pub use configuration::Config;

pub mod error_handling;

pub mod forwarding;
pub use forwarding::*;

pub mod host_info;

pub mod session_management;
pub use session_management::SessionManager;

pub mod web_interface;
pub use web_interface::WebServer;
