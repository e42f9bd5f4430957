//! Host inventory reporting for the control surface. Pure read-only
//! queries over the OS; no state, no concurrency.

pub mod machine;

pub use machine::{gather, HostInfo};
