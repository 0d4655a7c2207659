//! Login entry and completion: the issuance half of a handoff.

// self
use crate::{
	_prelude::*,
	auth::{AttemptId, Credentials, ExchangeCode, TargetOrigin},
	channel::AuthCodeMessage,
	handoff::{HandoffAttempt, HandoffCoordinator, HandoffState},
	login::LoginError,
	obs::{self, HandoffSpan, HandoffStage, StageOutcome},
	store::ExchangeTicket,
};

/// Login in flight. Consumed by [`HandoffCoordinator::complete_login`], so an attempt can
/// never be completed twice.
#[derive(Debug)]
pub struct LoginHandle {
	attempt: HandoffAttempt,
}
impl LoginHandle {
	/// Attempt identifier.
	pub fn attempt_id(&self) -> &AttemptId {
		self.attempt.id()
	}

	/// Where the code will be delivered.
	pub fn target(&self) -> &TargetOrigin {
		self.attempt.target()
	}
}

/// A freshly minted code and the attempt that produced it.
#[derive(Debug)]
pub struct IssuedCode {
	/// The one-time code.
	pub code: ExchangeCode,
	/// Snapshot of the attempt in [`HandoffState::CodeIssued`]; the store keeps its own copy
	/// and reports the terminal state on redemption or expiry.
	pub attempt: HandoffAttempt,
}
impl IssuedCode {
	/// Where the out-of-band message must be posted.
	pub fn target(&self) -> &TargetOrigin {
		self.attempt.target()
	}

	/// Out-of-band message carrying the code, and only the code.
	pub fn message(&self) -> AuthCodeMessage {
		AuthCodeMessage::new(self.code.clone())
	}
}

const REJECTED_REASON: &str = "the authority rejected the credentials";
const UNAVAILABLE_REASON: &str = "the authority could not complete the login";
const REQUIRED_FIELD: &str = "access_token";

impl HandoffCoordinator {
	/// Surfaces a login entry point for a requester identified by `redirect_hint`.
	///
	/// Does not block; the login itself happens in a later request driven by the end user.
	pub fn begin_login(&self, redirect_hint: Option<&str>) -> Result<LoginHandle> {
		obs::record_stage(HandoffStage::BeginLogin, StageOutcome::Attempt);

		let target = self.origins.resolve_target(redirect_hint).inspect_err(|_| {
			obs::record_stage(HandoffStage::BeginLogin, StageOutcome::Failure);
		})?;
		let mut attempt = HandoffAttempt::new(target);
		let _span = HandoffSpan::new(HandoffStage::BeginLogin, Some(attempt.id())).entered();

		attempt.advance(HandoffState::LoginInFlight)?;
		obs::record_stage(HandoffStage::BeginLogin, StageOutcome::Success);

		Ok(LoginHandle { attempt })
	}

	/// Runs the login through the broker, then completes the attempt with its outcome.
	pub async fn login(
		&self,
		handle: LoginHandle,
		username: &str,
		password: &str,
	) -> Result<IssuedCode> {
		let span = HandoffSpan::new(HandoffStage::CompleteLogin, Some(handle.attempt_id()));
		let broker = self.login_broker.clone();
		let outcome = span.instrument(broker.perform_login(username, password)).await;

		self.complete_login(handle, outcome)
	}

	/// Completes an attempt with the broker's outcome.
	///
	/// A rejected or failed login, or a bundle without an access token, fails the attempt and
	/// issues nothing. Otherwise the bundle is flattened into the payload and stored under a
	/// fresh code with the coordinator's TTL, bound to the attempt's target origin.
	pub fn complete_login(
		&self,
		handle: LoginHandle,
		outcome: Result<Credentials, LoginError>,
	) -> Result<IssuedCode> {
		const STAGE: HandoffStage = HandoffStage::CompleteLogin;

		let LoginHandle { mut attempt } = handle;
		let _span = HandoffSpan::new(STAGE, Some(attempt.id())).entered();

		obs::record_stage(STAGE, StageOutcome::Attempt);

		let credentials = match outcome {
			Ok(credentials) => credentials,
			Err(err) => {
				attempt.advance(HandoffState::Failed)?;
				self.metrics.record_login_failure();
				obs::note_login_failure(attempt.id(), &err);
				obs::record_stage(STAGE, StageOutcome::Failure);

				let reason = if err.is_rejection() { REJECTED_REASON } else { UNAVAILABLE_REASON };

				return Err(Error::LoginFailed { reason: reason.into() });
			},
		};

		attempt.advance(HandoffState::Authenticated)?;

		if !credentials.has_access_token() {
			attempt.advance(HandoffState::Failed)?;
			self.metrics.record_incomplete();
			obs::note_login_failure(attempt.id(), &"credential bundle lacks an access token");
			obs::record_stage(STAGE, StageOutcome::Failure);

			return Err(Error::IncompleteCredential { field: REQUIRED_FIELD });
		}

		attempt.advance(HandoffState::CodeIssued)?;

		let ticket = ExchangeTicket::new(credentials.into_payload(), self.code_ttl)
			.with_audience(attempt.target().binding().cloned())
			.with_attempt(attempt.clone());
		let code = self.store.issue_at(ticket, OffsetDateTime::now_utc());

		self.metrics.record_issued();
		obs::note_issued(attempt.id(), &code, attempt.target());
		obs::record_stage(STAGE, StageOutcome::Success);

		Ok(IssuedCode { code, attempt })
	}
}
