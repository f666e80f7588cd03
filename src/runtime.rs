//! Runtime services and shared state for the art-bot.

use tracing::instrument;

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    service::{build::BuildClient, chat::ChatClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the build system client, chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The build system client instance.
    pub build: BuildClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the build system client.
        let build = BuildClient::koji(&config)?;

        // Initialize the chat client.
        let chat = ChatClient::slack(&config, build.clone()).await?;

        Ok(Self { config, build, chat })
    }

    pub async fn start(&self) -> Void {
        self.chat.start().await
    }
}
