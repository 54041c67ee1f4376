//! Period countdown library - end-of-period deadlines and business days
//!
//! This module exports the calendar, countdown and board components for the
//! `countdown` binary and for integration testing.

pub mod board;
pub mod boundary;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod duration;
pub mod error;
pub mod holidays;
pub mod notify;
pub mod scheduler;
pub mod target;

pub use error::{Error, Result};
