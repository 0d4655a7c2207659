//! Per-attempt state machine.
//!
//! ```text
//! Idle -> LoginInFlight -> Authenticated -> CodeIssued -> Redeemed
//!                      \               \             \-> Expired
//!                       \-> Failed      \-> Failed
//! ```
//!
//! `Redeemed`, `Expired`, and `Failed` are terminal. A retry is a new attempt with a new id.

// self
use crate::{
	_prelude::*,
	auth::{AttemptId, TargetOrigin},
};

/// Lifecycle state of a handoff attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffState {
	/// Created, nothing surfaced yet.
	Idle,
	/// Login entry point surfaced; waiting on the end user and the authority.
	LoginInFlight,
	/// The authority returned credentials.
	Authenticated,
	/// A code was minted and handed to the out-of-band channel.
	CodeIssued,
	/// The code was redeemed.
	Redeemed,
	/// The code expired unredeemed.
	Expired,
	/// Login failed or the credentials were incomplete; no code exists.
	Failed,
}
impl HandoffState {
	/// Whether no further transition is possible.
	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Redeemed | Self::Expired | Self::Failed)
	}

	/// Whether `next` is a legal successor of `self`.
	pub const fn can_transition_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Idle, Self::LoginInFlight)
				| (Self::LoginInFlight, Self::Authenticated | Self::Failed)
				| (Self::Authenticated, Self::CodeIssued | Self::Failed)
				| (Self::CodeIssued, Self::Redeemed | Self::Expired)
		)
	}

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::LoginInFlight => "login_in_flight",
			Self::Authenticated => "authenticated",
			Self::CodeIssued => "code_issued",
			Self::Redeemed => "redeemed",
			Self::Expired => "expired",
			Self::Failed => "failed",
		}
	}
}
impl Display for HandoffState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Illegal state transition.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Handoff attempt {attempt} cannot move from {from} to {to}.")]
pub struct TransitionError {
	/// Attempt identifier.
	pub attempt: AttemptId,
	/// Current state.
	pub from: HandoffState,
	/// Requested state.
	pub to: HandoffState,
}

/// One handoff attempt, from login entry to a terminal state.
#[derive(Clone, Debug)]
pub struct HandoffAttempt {
	id: AttemptId,
	state: HandoffState,
	target: TargetOrigin,
	history: Vec<HandoffState>,
}
impl HandoffAttempt {
	/// Creates an `Idle` attempt with a fresh identifier.
	pub fn new(target: TargetOrigin) -> Self {
		Self { id: AttemptId::generate(), state: HandoffState::Idle, target, history: Vec::new() }
	}

	/// Attempt identifier.
	pub fn id(&self) -> &AttemptId {
		&self.id
	}

	/// Current state.
	pub fn state(&self) -> HandoffState {
		self.state
	}

	/// States left behind, oldest first.
	pub fn history(&self) -> &[HandoffState] {
		&self.history
	}

	/// Where the code for this attempt may be delivered.
	pub fn target(&self) -> &TargetOrigin {
		&self.target
	}

	/// Moves to `next` if the edge exists.
	pub fn advance(&mut self, next: HandoffState) -> Result<(), TransitionError> {
		if !self.state.can_transition_to(next) {
			return Err(TransitionError { attempt: self.id.clone(), from: self.state, to: next });
		}

		self.history.push(self.state);
		self.state = next;

		Ok(())
	}
}
