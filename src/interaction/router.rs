//! Decides whether a message is for the bot, and which handlers answer it.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use crate::{
    base::{
        config::LookupFailurePolicy,
        replies,
        types::{InboundMessage, Replied, Res},
    },
    service::{build::BuildClient, chat::ChatClient},
};

use super::{components, help, sink::ResponseSink};

// Types.

/// Why a message was dropped before any processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event has no sending user (system messages, edits, bot echoes).
    NoSender,
    /// The bot sent the message itself.
    SelfAuthored,
}

/// What the router did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped without resolving a reply channel.
    Ignored(IgnoreReason),
    /// Posted outside the DM channel without mentioning the bot.
    NotAddressed,
    /// At least one handler replied.
    Handled,
    /// Nothing matched, so the fallback reply was sent.
    Fallback,
}

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ListComponents { nvr: String },
}

// Text helpers.

fn help_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^help$").expect("valid regex"))
}

fn list_components_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^what rpms are used in (?P<nvr>[\w.-]+)$").expect("valid regex"))
}

/// The literal token Slack uses to mention a user.
pub fn mention_token(bot_user_id: &str) -> String {
    format!("<@{bot_user_id}>")
}

/// Removes every mention of the bot from `text`.
///
/// Returns whether the bot was mentioned, and the remaining text.
pub fn strip_mention(text: &str, bot_user_id: &str) -> (bool, String) {
    let token = mention_token(bot_user_id);

    if text.contains(&token) { (true, text.replace(&token, "")) } else { (false, text.to_string()) }
}

/// Collapses whitespace runs to single spaces, trims, and drops trailing `?`.
pub fn normalize_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.trim_end_matches(|c: char| c == '?' || c.is_whitespace()).to_string()
}

/// Matches normalized text against every known command.
///
/// Each pattern is checked independently, so in principle more than one
/// command can come back.
pub fn parse_commands(text: &str) -> Vec<Command> {
    let mut commands = Vec::new();

    if help_pattern().is_match(text) {
        commands.push(Command::Help);
    }

    if let Some(captures) = list_components_pattern().captures(text) {
        commands.push(Command::ListComponents {
            nvr: captures["nvr"].to_string(),
        });
    }

    commands
}

// Router.

/// Routes inbound messages to handlers.
///
/// It is designed to be trivially cloneable.
#[derive(Clone)]
pub struct Router {
    chat: ChatClient,
    build: BuildClient,
    lookup_failure_policy: LookupFailurePolicy,
}

impl Router {
    pub fn new(chat: ChatClient, build: BuildClient, lookup_failure_policy: LookupFailurePolicy) -> Self {
        Self {
            chat,
            build,
            lookup_failure_policy,
        }
    }

    /// Handle one inbound message from start to finish.
    #[instrument(skip_all, fields(channel = %message.channel))]
    pub async fn route(&self, message: &InboundMessage) -> Res<Outcome> {
        let Some(sender) = message.sender.as_deref().filter(|s| !s.is_empty()) else {
            debug!("Ignoring message without a sender.");
            return Ok(Outcome::Ignored(IgnoreReason::NoSender));
        };

        let bot_user_id = self.chat.bot_user_id();

        // Uploads show up as regular user messages, so this also catches our own snippets.
        if sender == bot_user_id {
            debug!("Ignoring message from the bot itself.");
            return Ok(Outcome::Ignored(IgnoreReason::SelfAuthored));
        }

        let (mentioned, text) = strip_mention(&message.text, bot_user_id);
        let text = normalize_text(&text);

        let direct_channel_id = self.chat.open_direct_channel(sender).await?;

        if message.channel != direct_channel_id && !mentioned {
            debug!("Ignoring message that is not addressed to the bot.");
            return Ok(Outcome::NotAddressed);
        }

        info!("Handling `{}` from {} ...", text, sender);

        let sink = ResponseSink::new(self.chat.clone(), direct_channel_id);
        let mut replied = Replied::No;

        for command in parse_commands(&text) {
            replied |= self.dispatch(&sink, command).await?;
        }

        if replied.is_yes() {
            return Ok(Outcome::Handled);
        }

        sink.say(replies::FALLBACK_TEXT).await?;

        Ok(Outcome::Fallback)
    }

    async fn dispatch(&self, sink: &ResponseSink, command: Command) -> Res<Replied> {
        match command {
            Command::Help => help::handle_help(sink).await,
            Command::ListComponents { nvr } => components::handle_list_components(sink, &self.build, &nvr, self.lookup_failure_policy).await,
        }
    }
}

// Tests.
