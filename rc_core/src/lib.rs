//! ABOUTME: Core types, errors, dates, and tracing utilities
//! ABOUTME: Foundation crate used by all other rollcall components

pub mod error;
pub mod telemetry;
pub mod time;

pub use error::{Error, Result};
pub use time::{format_event_date, today};
