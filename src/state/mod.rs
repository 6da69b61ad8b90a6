//! Client-side session state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `storage` is the durable key/value backend, `session` persists the
//! (token, user) pair on top of it, and `auth` is the facade the rest of the
//! client uses to log in, log out, and read the current user.

pub mod auth;
pub mod session;
pub mod storage;
