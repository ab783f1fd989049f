//! Domain types for the video generation job client.
//!
//! Everything in this crate is pure: no network, no timers. The
//! `vidgen-client` crate drives these types from backend responses.

pub mod error;
pub mod progress;
pub mod status;
pub mod types;
pub mod validation;
