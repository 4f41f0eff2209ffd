//! # campus-providers
//!
//! AI provider implementations for the campus bot.

pub mod openai;
