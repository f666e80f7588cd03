//! Reply operations bound to one direct message channel.

use tracing::instrument;

use crate::{
    base::types::{Replied, Res, Snippet},
    service::chat::ChatClient,
};

/// The `say` / `snippet` pair for a single event.
///
/// A sink is created by the router once the reply channel is known, and is
/// dropped when the event has been handled.
#[derive(Clone)]
pub struct ResponseSink {
    chat: ChatClient,
    channel_id: String,
}

impl ResponseSink {
    pub fn new(chat: ChatClient, channel_id: impl Into<String>) -> Self {
        Self {
            chat,
            channel_id: channel_id.into(),
        }
    }

    /// Post a plain text reply.
    #[instrument(skip_all)]
    pub async fn say(&self, text: &str) -> Res<Replied> {
        self.chat.post_message(&self.channel_id, text).await?;
        Ok(Replied::Yes)
    }

    /// Upload `content` as a file with an introductory comment.
    #[instrument(skip(self, content))]
    pub async fn snippet(&self, content: String, intro: &str, filename: &str, filetype: Option<&str>) -> Res<Replied> {
        let snippet = Snippet {
            content,
            intro: intro.to_string(),
            filename: filename.to_string(),
            filetype: filetype.map(str::to_string),
        };

        self.chat.upload_snippet(&self.channel_id, &snippet).await?;
        Ok(Replied::Yes)
    }
}
