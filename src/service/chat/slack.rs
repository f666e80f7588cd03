//! Slack integration for art-bot.
//!
//! This module provides the Slack implementation of `GenericChatClient`:
//! - Receiving message events over socket mode
//! - Opening direct message channels
//! - Posting messages and uploading snippets

use crate::{
    base::{
        config::{Config, LookupFailurePolicy},
        types::{InboundMessage, Res, Snippet, Void},
    },
    interaction::router::Router,
    service::build::BuildClient,
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::prelude::*;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{Instrument, debug, error, info, instrument, warn};

use std::{ops::Deref, sync::Arc};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub async fn slack(config: &Config, build: BuildClient) -> Res<Self> {
        let client = SlackChatClient::new(config, build).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    router: Router,
    /// Held for the whole handling of a message, so messages never overlap.
    gate: Arc<Mutex<()>>,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub bot_user_id: String,
    pub client: Arc<FullClient>,
    pub build: BuildClient,
    pub lookup_failure_policy: LookupFailurePolicy,
}

impl Deref for SlackChatClient {
    type Target = FullClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub async fn new(config: &Config, build: BuildClient) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_bot_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        // Get the bot's user ID.

        let session = client.open_session(&bot_token);
        let bot_user = session.auth_test().await?;
        let bot_user_id = bot_user.user_id.0;

        info!("Slack bot user ID: {}", bot_user_id);

        Ok(Self {
            app_token,
            bot_token,
            bot_user_id,
            client,
            build,
            lookup_failure_policy: config.lookup_failure_policy,
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    async fn start(&self) -> Void {
        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new()
            .with_command_events(handle_command_event)
            .with_interaction_events(handle_interaction_event)
            .with_push_events(handle_push_event);

        // Initialize the socket mode listener environment.

        let router = Router::new(ChatClient::from(self.clone()), self.build.clone(), self.lookup_failure_policy);

        let listener_environment = Arc::new(SlackClientEventsListenerEnvironment::new(self.client.clone()).with_user_state(SlackUserState {
            router,
            gate: Arc::new(Mutex::new(())),
        }));

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register an app token to listen for events,
        socket_mode_listener.listen_for(&self.app_token).await?;

        // Start WS connections calling Slack API to get WS url for the token,
        // and wait for Ctrl-C to shutdown.
        socket_mode_listener.serve().await;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn open_direct_channel(&self, user_id: &str) -> Res<String> {
        let request = SlackApiConversationsOpenRequest::new().with_users(vec![SlackUserId(user_id.to_string())]);

        let session = self.client.open_session(&self.bot_token);

        let response = session
            .conversations_open(&request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open direct message channel: {}", e))?;

        Ok(response.channel.id.0)
    }

    #[instrument(skip(self, text))]
    async fn post_message(&self, channel_id: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message).with_as_user(true);

        let session = self.client.open_session(&self.bot_token);

        let _ = session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }

    #[instrument(skip(self, snippet), fields(filename = %snippet.filename))]
    async fn upload_snippet(&self, channel_id: &str, snippet: &Snippet) -> Void {
        let session = self.client.open_session(&self.bot_token);

        // Reserve an upload URL.

        let upload = session
            .get_upload_url_external(&upload_url_request(snippet))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get upload URL: {}", e))?;

        // Send the content.

        let content_request = SlackApiFilesUploadViaUrlRequest::new(upload.upload_url, snippet.content.clone().into_bytes(), "text/plain".to_string());

        session
            .files_upload_via_url(&content_request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload snippet content: {}", e))?;

        // Share it in the channel with the intro.

        let complete_request = SlackApiFilesCompleteUploadExternalRequest::new(vec![SlackApiFilesComplete::new(upload.file_id).with_title(snippet.filename.clone())])
            .with_channel_id(SlackChannelId(channel_id.to_string()))
            .with_initial_comment(snippet.intro.clone());

        session
            .files_complete_upload_external(&complete_request)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to share snippet: {}", e))?;

        debug!("Uploaded snippet `{}` to {}", snippet.filename, channel_id);

        Ok(())
    }
}

/// Converts a Slack message event into the router's view of a message.
///
/// Returns `None` for events that carry no channel.
fn to_inbound_message(event: &SlackMessageEvent) -> Option<InboundMessage> {
    let channel = event.origin.channel.as_ref()?.0.clone();
    let sender = event.sender.user.as_ref().map(|u| u.0.clone());
    let text = event.content.as_ref().and_then(|c| c.text.clone()).unwrap_or_default();

    Some(InboundMessage { sender, channel, text })
}

/// Builds the `files.getUploadURLExternal` request for a snippet.
fn upload_url_request(snippet: &Snippet) -> SlackApiFilesGetUploadUrlExternalRequest {
    let request = SlackApiFilesGetUploadUrlExternalRequest::new(snippet.filename.clone(), snippet.content.len());

    match &snippet.filetype {
        Some(filetype) => request.with_snippet_type(SlackFileSnippetType(filetype.clone())),
        None => request,
    }
}

/// Handles one message on its own task and returns immediately.
///
/// Every task holds `gate` for the whole handling, so messages never overlap.
fn spawn_message_handling(message: InboundMessage, router: Router, gate: Arc<Mutex<()>>) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let _guard = gate.lock().await;

            // Errors end the interaction; they are logged and the listener keeps going.
            match router.route(&message).await {
                Ok(outcome) => debug!("Message outcome: {:?}", outcome),
                Err(err) => error!("Error while handling: {:#}", err),
            }
        }
        .in_current_span(),
    )
}

// Socket mode listener callbacks for Slack.

/// Handles command events from Slack.
async fn handle_command_event(
    event: SlackCommandEvent,
    _client: Arc<SlackHyperClient>,
    _states: SlackClientEventsUserState,
) -> Result<SlackCommandEventResponse, Box<dyn std::error::Error + Send + Sync>> {
    warn!("[COMMAND] {:#?}", event);
    Ok(SlackCommandEventResponse::new(SlackMessageContent::new().with_text("No app commands are currently supported.".into())))
}

/// Handles interaction events from Slack.
async fn handle_interaction_event(event: SlackInteractionEvent, _client: Arc<SlackHyperClient>, _states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    warn!("[INTERACTION] {:#?}", event);
    Ok(())
}

/// Handles push events from Slack.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let (router, gate) = {
        let states = states.read().await;
        let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;
        (user_state.router.clone(), user_state.gate.clone())
    };

    match event_callback.event {
        SlackEventCallbackBody::Message(slack_message_event) => {
            debug!("Received message event ...");

            let Some(message) = to_inbound_message(&slack_message_event) else {
                warn!("Skipping message event without a channel.");
                return Ok(());
            };

            // Slack expects the ack within seconds, so the handling runs on its own task.
            spawn_message_handling(message, router, gate);
        }
        _ => {
            debug!("Received unhandled push event.")
        }
    }

    Ok(())
}

// Tests.
