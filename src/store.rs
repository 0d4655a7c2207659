//! One-time exchange code storage: issuance, atomic single-use redemption, and expiry.

pub mod memory;
pub mod sweeper;

pub use memory::MemoryExchangeStore;
pub use sweeper::{ExpirySweeper, SweeperHandle};

// self
use crate::{
	_prelude::*,
	auth::{ExchangeCode, Origin, Payload},
	handoff::HandoffAttempt,
};

/// Default lifetime of an issued code.
pub const DEFAULT_CODE_TTL: Duration = Duration::minutes(5);

/// Storage contract for one-time exchange codes.
///
/// Implementations must make lookup-plus-delete indivisible with respect to concurrent
/// redemptions and the expiry sweep: for any code, at most one caller ever observes its
/// payload.
pub trait ExchangeStore
where
	Self: Send + Sync,
{
	/// Stores `ticket` under a freshly generated code whose deadline is `now + ticket.ttl`.
	///
	/// # Panics
	///
	/// Panics if the generated code collides with a live one, which means the code generator
	/// is broken.
	fn issue_at(&self, ticket: ExchangeTicket, now: OffsetDateTime) -> ExchangeCode;

	/// Removes the entry for `code` and returns it if it was live at `now`.
	///
	/// Expired entries are deleted and reported as [`StoreError::NotFound`], as are entries
	/// bound to an origin other than `presenter`. Every outcome leaves the code unredeemable.
	fn redeem_at(
		&self,
		code: &str,
		presenter: Option<&Origin>,
		now: OffsetDateTime,
	) -> Result<Redeemed, StoreError>;

	/// Deletes every entry whose deadline is at or before `now`, returning their attempts.
	fn sweep_at(&self, now: OffsetDateTime) -> Vec<Option<HandoffAttempt>>;

	/// Number of entries currently held, expired or not.
	fn len(&self) -> usize;

	/// Whether the store holds no entries.
	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Stores an unbound payload and returns its code.
	fn issue(&self, payload: Payload, ttl: Duration) -> ExchangeCode {
		self.issue_at(ExchangeTicket::new(payload, ttl), OffsetDateTime::now_utc())
	}

	/// Redeems `code` at the current instant without presenting an origin.
	fn redeem(&self, code: &str) -> Result<Payload, StoreError> {
		self.redeem_at(code, None, OffsetDateTime::now_utc()).map(|redeemed| redeemed.payload)
	}
}

/// Everything the store needs to mint a code.
#[derive(Clone, Debug)]
pub struct ExchangeTicket {
	/// Opaque bundle released on redemption.
	pub payload: Payload,
	/// Lifetime of the code.
	pub ttl: Duration,
	/// Handoff attempt that produced the payload, already in `CodeIssued`.
	pub attempt: Option<HandoffAttempt>,
	/// Origin the code is bound to.
	pub audience: Option<Origin>,
}
impl ExchangeTicket {
	/// Creates an unbound ticket.
	pub fn new(payload: Payload, ttl: Duration) -> Self {
		Self { payload, ttl, attempt: None, audience: None }
	}

	/// Tags the ticket with its handoff attempt.
	pub fn with_attempt(mut self, attempt: HandoffAttempt) -> Self {
		self.attempt = Some(attempt);

		self
	}

	/// Binds the code to an origin; redemption from any other declared origin fails.
	pub fn with_audience(mut self, audience: Option<Origin>) -> Self {
		self.audience = audience;

		self
	}
}

/// Stored entry. Created once, never mutated, removed by redemption or expiry.
#[derive(Clone, Debug)]
pub struct ExchangeEntry {
	/// Opaque bundle.
	pub payload: Payload,
	/// Absolute deadline.
	pub expires_at: OffsetDateTime,
	/// Handoff attempt that produced the entry.
	pub attempt: Option<HandoffAttempt>,
	/// Origin the code is bound to.
	pub audience: Option<Origin>,
}
impl ExchangeEntry {
	/// Builds the entry for `ticket` issued at `now`.
	pub fn from_ticket(ticket: ExchangeTicket, now: OffsetDateTime) -> Self {
		let ExchangeTicket { payload, ttl, attempt, audience } = ticket;

		Self { payload, expires_at: now + ttl, attempt, audience }
	}

	/// Whether the deadline has been reached at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Whether `presenter` may redeem this entry.
	pub fn accepts(&self, presenter: Option<&Origin>) -> bool {
		match (self.audience.as_ref(), presenter) {
			(Some(bound), Some(presented)) => bound == presented,
			_ => true,
		}
	}
}

/// Successful redemption.
#[derive(Clone, Debug)]
pub struct Redeemed {
	/// Released payload; the store no longer holds a copy.
	pub payload: Payload,
	/// Handoff attempt the code belonged to, still in `CodeIssued`.
	pub attempt: Option<HandoffAttempt>,
}

/// Error type produced by [`ExchangeStore`] implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Never issued, already redeemed, expired, or presented by the wrong origin.
	#[error("Exchange code was not found or has expired.")]
	NotFound,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn entry_deadline_is_issue_time_plus_ttl() {
		let now = macros::datetime!(2025-11-10 12:00 UTC);
		let entry = ExchangeEntry::from_ticket(
			ExchangeTicket::new(Payload::new(), Duration::minutes(5)),
			now,
		);

		assert_eq!(entry.expires_at, macros::datetime!(2025-11-10 12:05 UTC));
		assert!(!entry.is_expired_at(now + Duration::minutes(4)));
		assert!(entry.is_expired_at(now + Duration::minutes(5)));
	}

	#[test]
	fn bound_entries_only_reject_a_different_declared_origin() {
		let bound = Origin::parse("https://a.com").expect("Origin fixture should parse.");
		let other = Origin::parse("https://b.com").expect("Origin fixture should parse.");
		let entry = ExchangeEntry::from_ticket(
			ExchangeTicket::new(Payload::new(), DEFAULT_CODE_TTL)
				.with_audience(Some(bound.clone())),
			OffsetDateTime::now_utc(),
		);

		assert!(entry.accepts(Some(&bound)));
		assert!(entry.accepts(None));
		assert!(!entry.accepts(Some(&other)));
	}
}
