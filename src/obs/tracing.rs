// self
use crate::{
	_prelude::*,
	auth::{AttemptId, ExchangeCode, TargetOrigin},
	handoff::TransitionError,
	obs::HandoffStage,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by handoff stages.
#[derive(Clone, Debug)]
pub struct HandoffSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl HandoffSpan {
	/// Creates a new span tagged with the provided stage and attempt.
	pub fn new(stage: HandoffStage, attempt: Option<&AttemptId>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"auth_handoff.flow",
				stage = stage.as_str(),
				attempt = attempt.map(|id| id.as_ref())
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, attempt);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> HandoffSpanGuard {
		#[cfg(feature = "tracing")]
		{
			HandoffSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			HandoffSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`HandoffSpan::entered`].
pub struct HandoffSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for HandoffSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HandoffSpanGuard(..)")
	}
}

/// Logs a freshly minted code by fingerprint.
pub fn note_issued(attempt: &AttemptId, code: &ExchangeCode, target: &TargetOrigin) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		attempt = attempt.as_ref(),
		code = %code.fingerprint(),
		target = target.as_post_message_target(),
		"exchange code issued"
	);
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, code, target);
	}
}

/// Logs a refused login; `detail` must already be free of credential material.
pub fn note_login_failure(attempt: &AttemptId, detail: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::warn!(attempt = attempt.as_ref(), %detail, "login failed; no code issued");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, detail);
	}
}

/// Logs a redemption outcome by fingerprint.
pub fn note_redemption(code: &ExchangeCode, attempt: Option<&AttemptId>, released: bool) {
	#[cfg(feature = "tracing")]
	{
		if released {
			tracing::info!(
				code = %code.fingerprint(),
				attempt = attempt.map(|id| id.as_ref()),
				"exchange code redeemed"
			);
		} else {
			tracing::debug!(code = %code.fingerprint(), "exchange code not found or expired");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (code, attempt, released);
	}
}

/// Logs an entry removed by the expiry sweep.
pub fn note_expired(attempt: Option<&AttemptId>) {
	#[cfg(feature = "tracing")]
	tracing::debug!(attempt = attempt.map(|id| id.as_ref()), "exchange code expired unredeemed");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = attempt;
	}
}

/// Logs a lifecycle transition that the attempt state machine refused.
pub fn note_transition_refused(err: &TransitionError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		attempt = err.attempt.as_ref(),
		from = err.from.as_str(),
		to = err.to.as_str(),
		"handoff attempt transition refused"
	);
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Logs a server lifecycle or request-level event.
pub fn note_server(message: &str, peer: Option<SocketAddr>) {
	#[cfg(feature = "tracing")]
	tracing::info!(peer = peer.map(|addr| addr.to_string()), "{message}");
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (message, peer);
	}
}
