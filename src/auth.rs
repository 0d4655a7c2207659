//! Handoff-domain values: exchange codes, opaque payloads, credential bundles, and origins.

pub mod code;
pub mod credentials;
pub mod id;
pub mod origin;
pub mod payload;
pub mod secret;

pub use code::*;
pub use credentials::*;
pub use id::*;
pub use origin::*;
pub use payload::*;
pub use secret::*;
