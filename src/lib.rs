//! notifydesk: client for the notification service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `state` owns the persisted session and the auth lifecycle, `net` owns the
//! single authenticated gateway to the backend, and `util` holds the form and
//! presentation helpers the CLI front-end builds on.

pub mod config;
pub mod net;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_helpers;
