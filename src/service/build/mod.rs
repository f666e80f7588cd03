//! Build system integration for art-bot.
//!
//! This module defines the `GenericBuildClient` trait for looking up builds,
//! their archives, and the rpms inside those archives, with a default
//! implementation for Koji (Brew).

pub mod koji;
pub mod xmlrpc;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{ArchiveInfo, BuildInfo, Res, RpmInfo};

// Traits.

/// Generic build system client trait that clients must implement.
///
/// Implementing this trait allows the handlers to be driven by any build
/// tracking service, or by a mock in tests.
#[async_trait]
pub trait GenericBuildClient: Send + Sync + 'static {
    /// Get a build by its NVR.
    ///
    /// The lookup is strict: an unknown NVR is an error, not an empty result.
    async fn get_build(&self, nvr: &str) -> Res<BuildInfo>;

    /// List the archives produced by a build.
    async fn list_archives(&self, build_id: i64) -> Res<Vec<ArchiveInfo>>;

    /// List the rpms contained in an archive (e.g. an image).
    async fn list_rpms(&self, archive_id: i64) -> Res<Vec<RpmInfo>>;
}

// Structs.

/// Build system client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct BuildClient {
    inner: Arc<dyn GenericBuildClient>,
}

impl Deref for BuildClient {
    type Target = dyn GenericBuildClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl BuildClient {
    pub fn new(inner: Arc<dyn GenericBuildClient>) -> Self {
        Self { inner }
    }
}
