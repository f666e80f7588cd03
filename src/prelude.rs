//! Common imports for handlers.

pub use crate::base::{
    config::{Config, LookupFailurePolicy},
    replies,
    types::{Replied, Res, Void},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
