//! Helpers shared by the CLI front-end.
//!
//! SYSTEM CONTEXT
//! ==============
//! Form validation, schedule conversion, route guarding, and display mapping
//! live here so the front-end stays a thin layer over the auth facade and
//! gateway.

pub mod auth;
pub mod display;
pub mod forms;
pub mod schedule;
