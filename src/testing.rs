//! Test-only helpers: a scripted transport and canned API payloads.

pub(crate) mod fixtures;
pub(crate) mod scripted;
