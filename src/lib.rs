//! Library root for `art-bot`.
//!
//! Art-bot is a Slack bot that answers questions about builds:
//! - Listens for direct messages and @-mentions
//! - Matches them against a small set of commands
//! - Looks builds up in Koji (Brew) and replies in a direct message
//!
//! The chat and build system integrations sit behind traits, so the
//! routing logic can be driven by mocks in tests.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod prelude;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the art-bot runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with the build system and chat clients
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting art-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
