//! Common types shared across the bot.

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Crate-wide error type.
pub type Err = anyhow::Error;
/// Crate-wide result type.
pub type Res<T> = Result<T, Err>;
/// Result of an operation with no value.
pub type Void = Res<()>;

/// Whether an operation sent something back to the user.
///
/// Every sink call and every handler returns one of these, and the router
/// folds them together to decide whether the fallback reply is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Replied {
    /// Something was sent.
    Yes,
    /// Nothing was sent.
    #[default]
    No,
}

impl Replied {
    /// Whether something was sent.
    pub fn is_yes(self) -> bool {
        self == Replied::Yes
    }
}

impl BitOr for Replied {
    type Output = Replied;

    fn bitor(self, rhs: Self) -> Self::Output {
        if self.is_yes() || rhs.is_yes() { Replied::Yes } else { Replied::No }
    }
}

impl BitOrAssign for Replied {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// A chat message as seen by the router, stripped of transport details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The user who sent the message, if any (system messages have none).
    pub sender: Option<String>,
    /// The channel the message was posted in.
    pub channel: String,
    /// The raw message text.
    pub text: String,
}

impl InboundMessage {
    /// Convenience constructor from borrowed parts.
    pub fn new(sender: Option<&str>, channel: &str, text: &str) -> Self {
        Self {
            sender: sender.map(str::to_string),
            channel: channel.to_string(),
            text: text.to_string(),
        }
    }
}

/// A text payload uploaded as a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// The file content.
    pub content: String,
    /// The comment posted alongside the file.
    pub intro: String,
    /// The file name shown in the chat.
    pub filename: String,
    /// Optional file type hint (e.g. `text`).
    pub filetype: Option<String>,
}

/// A build record from the build system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Internal build ID.
    pub id: i64,
    /// Name-version-release of the build.
    pub nvr: String,
    /// Package name.
    #[serde(default)]
    pub name: String,
    /// Package version.
    #[serde(default)]
    pub version: String,
    /// Package release.
    #[serde(default)]
    pub release: String,
    /// Build state code (e.g. `1` for complete).
    #[serde(default)]
    pub state: Option<i64>,
}

/// An archive (image, tarball, ...) produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    /// Internal archive ID.
    pub id: i64,
    /// Archive file name.
    #[serde(default)]
    pub filename: Option<String>,
    /// Archive type (e.g. `tar`).
    #[serde(default)]
    pub type_name: Option<String>,
}

/// An rpm contained in an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpmInfo {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Package release.
    pub release: String,
    /// Architecture (e.g. `x86_64`, `noarch`).
    pub arch: String,
}

impl RpmInfo {
    /// Formats the rpm as `<name>-<version>-<release>.<arch>`.
    pub fn nvra(&self) -> String {
        format!("{}-{}-{}.{}", self.name, self.version, self.release, self.arch)
    }
}
