//! Document workflow for a cooperative's estimations, invoices and credit notes.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod workflow;

pub use error::{Error, Result};
