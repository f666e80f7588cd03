//! Fixed texts the bot replies with.

/// Usage text sent in response to `help`.
pub const HELP_TEXT: &str = r#"Here are questions I can answer...
- What rpms are used in {image-nvr}?
"#;

/// Sent when nothing else replied to an addressed message.
pub const FALLBACK_TEXT: &str = "Sorry, I don't know how to help with that.";

/// Comment posted alongside the rpm listing.
pub const RPM_LISTING_INTRO: &str = "The following rpms are used";

/// Acknowledgement sent before querying the build system.
pub fn checking_on(nvr: &str) -> String {
    format!("Sure.. let me check on {nvr}")
}

/// Reported when a build lookup fails and failures are surfaced to users.
pub fn lookup_failed(nvr: &str, err: &anyhow::Error) -> String {
    format!("Sorry, I couldn't list the rpms in {nvr}: {err}")
}

/// File name for the rpm listing of a build.
pub fn rpm_listing_filename(nvr: &str) -> String {
    format!("{nvr}-rpms.txt")
}
