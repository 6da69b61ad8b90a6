//! Networking modules for the notification service REST surface.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` is the single authenticated gateway, `transport` is the HTTP seam it
//! sends through, `error` defines what callers see, and `types` defines the
//! wire schema.

pub mod api;
pub mod error;
pub mod transport;
pub mod types;
