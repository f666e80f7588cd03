//! Event handling and user interactions for art-bot.
//!
//! This module provides functionality for handling chat messages:
//! - Deciding whether a message is addressed to the bot
//! - Matching it against the supported commands
//! - Answering through a per-message response sink

pub mod components;
pub mod help;
pub mod router;
pub mod sink;
