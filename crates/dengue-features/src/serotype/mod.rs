//! Serotype circulation covariates.

pub mod days_since_switch;

pub use days_since_switch::{DaysSinceSwitch, DaysSinceSwitchConfig, days_since_switch};
