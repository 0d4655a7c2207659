//! Extensions around the handoff surface that are not part of the exchange itself.

pub mod rate_limit;

pub use rate_limit::*;
