//! Tracked-device input: per-frame device state, relational device
//! selection and digital action edges on top of a pluggable tracking runtime.

pub mod config;
pub mod error;
pub mod input;
pub mod paths;

pub use error::{BackendError, InputError, Result};
