//! # campus-data
//!
//! Data collaborators for the campus bot: the local schedule store,
//! the remote activities and weather feeds, and styled QR synthesis.

pub mod activities;
pub mod qr;
pub mod schedule;
pub mod weather;
