//! Redemption: the consumption half of a handoff.

// self
use crate::{
	_prelude::*,
	auth::{ExchangeCode, Origin, Payload},
	handoff::{HandoffAttempt, HandoffCoordinator, HandoffState},
	obs::{self, HandoffSpan, HandoffStage, StageOutcome},
	store::ExpirySweeper,
};

/// Released payload plus the attempt it closed.
#[derive(Debug)]
pub struct Redemption {
	/// Credential bundle; no other caller will ever see it.
	pub payload: Payload,
	/// Attempt that issued the code, now in [`HandoffState::Redeemed`]. `None` for codes
	/// issued directly through the store.
	pub attempt: Option<HandoffAttempt>,
}

impl HandoffCoordinator {
	/// Redeems `code` exactly once, without declaring an origin.
	pub fn redeem(&self, code: &str) -> Result<Payload> {
		self.redeem_presented(Some(code), None).map(|redemption| redemption.payload)
	}

	/// Redeems a code as presented by a client.
	///
	/// A missing or empty code is [`Error::MissingCode`]. Unknown, already redeemed, expired,
	/// and wrong-origin codes are all [`Error::CodeNotFound`] with no further distinction.
	pub fn redeem_presented(
		&self,
		code: Option<&str>,
		presenter: Option<&Origin>,
	) -> Result<Redemption> {
		const STAGE: HandoffStage = HandoffStage::Redeem;

		let _span = HandoffSpan::new(STAGE, None).entered();

		obs::record_stage(STAGE, StageOutcome::Attempt);

		let code = code.filter(|value| !value.is_empty()).ok_or_else(|| {
			obs::record_stage(STAGE, StageOutcome::Failure);

			Error::MissingCode
		})?;

		match self.store.redeem_at(code, presenter, OffsetDateTime::now_utc()) {
			Ok(redeemed) => {
				let mut attempt = redeemed.attempt;

				if let Some(Err(e)) = attempt.as_mut().map(|a| a.advance(HandoffState::Redeemed)) {
					obs::note_transition_refused(&e);
				}

				self.metrics.record_redeemed();
				obs::note_redemption(
					&ExchangeCode::presented(code),
					attempt.as_ref().map(HandoffAttempt::id),
					true,
				);
				obs::record_stage(STAGE, StageOutcome::Success);

				Ok(Redemption { payload: redeemed.payload, attempt })
			},
			Err(err) => {
				self.metrics.record_redemption_miss();
				obs::note_redemption(&ExchangeCode::presented(code), None, false);
				obs::record_stage(STAGE, StageOutcome::Failure);

				Err(err.into())
			},
		}
	}

	/// Runs one expiry sweep at `now` and returns the attempts it closed as
	/// [`HandoffState::Expired`].
	pub fn sweep_at(&self, now: OffsetDateTime) -> Vec<HandoffAttempt> {
		ExpirySweeper::new(self.store.clone(), self.sweep_interval, self.metrics.clone())
			.sweep_once(now)
			.into_iter()
			.flatten()
			.collect()
	}
}
