//! # campus-core
//!
//! Core types, traits, configuration, and error handling for the campus bot.

pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod message;
pub mod traits;
pub mod viewstate;
