//! Optional observability helpers for handoff stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `auth_handoff.flow` with a `stage` field,
//!   plus events for issuance, redemption, expiry, and login failures. Events carry code
//!   fingerprints, never codes or tokens.
//! - Enable `metrics` to increment the `auth_handoff_stage_total` counter for every stage
//!   outcome, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages of a handoff observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandoffStage {
	/// Login entry point surfaced.
	BeginLogin,
	/// Credentials returned and a code minted (or refused).
	CompleteLogin,
	/// Code presented for redemption.
	Redeem,
	/// Expiry sweep.
	Sweep,
}
impl HandoffStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandoffStage::BeginLogin => "begin_login",
			HandoffStage::CompleteLogin => "complete_login",
			HandoffStage::Redeem => "redeem",
			HandoffStage::Sweep => "sweep",
		}
	}
}
impl Display for HandoffStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Entry removed because its deadline passed.
	Expired,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
			StageOutcome::Expired => "expired",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
