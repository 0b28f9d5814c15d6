//! # hb-portal
//!
//! Server and CLI surface of the HB training portal.
//!
//! The binary in `main.rs` is a thin wrapper; the modules live here so the
//! integration tests can build routers and configs directly.

pub mod api;
pub mod cli;
pub mod config;
