use crate::prelude::*;

use super::sink::ResponseSink;

/// Replies with the list of questions the bot understands.
#[instrument(skip_all)]
pub async fn handle_help(sink: &ResponseSink) -> Res<Replied> {
    sink.say(replies::HELP_TEXT).await
}
