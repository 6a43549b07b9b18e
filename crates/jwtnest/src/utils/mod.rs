//! Internal helpers shared across modules

pub(crate) mod base64url;
pub(crate) mod bounds;
pub(crate) mod der;
