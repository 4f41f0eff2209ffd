//! # campus-channels
//!
//! Messaging platform integrations for the campus bot.

pub mod telegram;
