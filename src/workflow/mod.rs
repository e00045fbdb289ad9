//! Status machine and the operations built on top of it.

pub mod derive;
pub mod service;
pub mod transition;

pub use transition::{check_initial_status, check_transition, is_allowed};
