//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by the art-bot:
//! - Chat services (e.g., Slack)
//! - Build system services (e.g., Koji)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod build;
pub mod chat;
