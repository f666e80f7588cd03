//! Answers "what rpms are used in <nvr>?".

use std::collections::BTreeSet;

use crate::{prelude::*, service::build::BuildClient};

use super::sink::ResponseSink;

/// Collects the distinct rpms (`<name>-<version>-<release>.<arch>`) used by a build.
///
/// The set is ordered, so joining it gives the same text for the same content.
#[instrument(skip(build))]
pub async fn list_components(build: &BuildClient, nvr: &str) -> Res<BTreeSet<String>> {
    let build_info = build.get_build(nvr).await?;

    let mut components = BTreeSet::new();

    for archive in build.list_archives(build_info.id).await? {
        for rpm in build.list_rpms(archive.id).await? {
            components.insert(rpm.nvra());
        }
    }

    info!("Found {} rpms in {}", components.len(), nvr);

    Ok(components)
}

/// Acknowledges the request, looks up the build, and uploads the rpm listing.
///
/// Lookup failures either propagate (`Silent`) or are reported back (`Report`).
/// In both cases the acknowledgement has already been sent.
#[instrument(skip(sink, build))]
pub async fn handle_list_components(sink: &ResponseSink, build: &BuildClient, nvr: &str, policy: LookupFailurePolicy) -> Res<Replied> {
    let mut replied = sink.say(&replies::checking_on(nvr)).await?;

    let components = match list_components(build, nvr).await {
        Ok(components) => components,
        Err(err) => match policy {
            LookupFailurePolicy::Silent => return Err(err),
            LookupFailurePolicy::Report => {
                warn!("Lookup of {} failed: {:#}", nvr, err);
                return Ok(replied | sink.say(&replies::lookup_failed(nvr, &err)).await?);
            }
        },
    };

    let payload = components.into_iter().collect::<Vec<_>>().join("\n");

    replied |= sink
        .snippet(payload, replies::RPM_LISTING_INTRO, &replies::rpm_listing_filename(nvr), None)
        .await?;

    Ok(replied)
}
