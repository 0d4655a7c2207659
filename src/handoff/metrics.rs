// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for handoff outcomes.
#[derive(Debug, Default)]
pub struct HandoffMetrics {
	issued: AtomicU64,
	redeemed: AtomicU64,
	expired: AtomicU64,
	login_failures: AtomicU64,
	incomplete: AtomicU64,
	redemption_misses: AtomicU64,
}
impl HandoffMetrics {
	/// Codes minted.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Codes redeemed successfully.
	pub fn redeemed(&self) -> u64 {
		self.redeemed.load(Ordering::Relaxed)
	}

	/// Codes removed by the expiry sweep.
	pub fn expired(&self) -> u64 {
		self.expired.load(Ordering::Relaxed)
	}

	/// Logins the authority rejected or failed to complete.
	pub fn login_failures(&self) -> u64 {
		self.login_failures.load(Ordering::Relaxed)
	}

	/// Logins refused because the credential bundle lacked an access token.
	pub fn incomplete_credentials(&self) -> u64 {
		self.incomplete.load(Ordering::Relaxed)
	}

	/// Redemptions answered with "not found".
	pub fn redemption_misses(&self) -> u64 {
		self.redemption_misses.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_redeemed(&self) {
		self.redeemed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_expired(&self) {
		self.expired.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login_failure(&self) {
		self.login_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_incomplete(&self) {
		self.incomplete.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_redemption_miss(&self) {
		self.redemption_misses.fetch_add(1, Ordering::Relaxed);
	}
}
