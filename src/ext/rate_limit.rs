//! Fixed-window request budgets keyed by client address.

// std
use std::net::IpAddr;
// self
use crate::{_prelude::*, error::ConfigError};

/// Default number of requests a client may make per window.
pub const DEFAULT_RATE_LIMIT: u32 = 30;
/// Default window length.
pub const DEFAULT_RATE_WINDOW: Duration = Duration::minutes(1);

const PRUNE_THRESHOLD: usize = 1_024;

/// Budget applied to every client address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
	/// Requests allowed per window.
	pub max_requests: u32,
	/// Window length.
	pub window: Duration,
}
impl RateLimitPolicy {
	/// Creates a validated policy.
	pub fn new(max_requests: u32, window: Duration) -> Result<Self, ConfigError> {
		let policy = Self { max_requests, window };

		policy.validate()?;

		Ok(policy)
	}

	/// Rejects policies that could never admit a request.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_requests == 0 || !self.window.is_positive() {
			return Err(ConfigError::InvalidRateLimit);
		}

		Ok(())
	}
}
impl Default for RateLimitPolicy {
	fn default() -> Self {
		Self { max_requests: DEFAULT_RATE_LIMIT, window: DEFAULT_RATE_WINDOW }
	}
}

/// Result emitted by [`FixedWindowLimiter::check_at`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow,
	/// The request should be refused until the window rolls over.
	Delay(RetryDirective),
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when the client's window resets.
	pub earliest_retry_at: OffsetDateTime,
	/// Time left until the reset.
	pub recommended_backoff: Duration,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff }
	}

	/// Backoff rounded up to whole seconds, as used by `Retry-After`.
	pub fn retry_after_secs(&self) -> u64 {
		let secs = self.recommended_backoff.whole_seconds().max(0) as u64;

		if self.recommended_backoff.subsec_nanoseconds() > 0 { secs + 1 } else { secs.max(1) }
	}
}

#[derive(Clone, Copy, Debug)]
struct Window {
	started_at: OffsetDateTime,
	count: u32,
}

/// Per-address fixed-window counter.
#[derive(Debug)]
pub struct FixedWindowLimiter {
	policy: RateLimitPolicy,
	windows: Mutex<HashMap<IpAddr, Window>>,
}
impl FixedWindowLimiter {
	/// Creates a limiter enforcing `policy`.
	pub fn new(policy: RateLimitPolicy) -> Self {
		Self { policy, windows: Default::default() }
	}

	/// Active policy.
	pub fn policy(&self) -> RateLimitPolicy {
		self.policy
	}

	/// Counts a request from `client` at the current instant.
	pub fn check(&self, client: IpAddr) -> RateLimitDecision {
		self.check_at(client, OffsetDateTime::now_utc())
	}

	/// Counts a request from `client` at `now`.
	pub fn check_at(&self, client: IpAddr, now: OffsetDateTime) -> RateLimitDecision {
		let RateLimitPolicy { max_requests, window } = self.policy;
		let mut windows = self.windows.lock();

		if windows.len() >= PRUNE_THRESHOLD {
			windows.retain(|_, w| now - w.started_at < window);
		}

		let entry = windows.entry(client).or_insert(Window { started_at: now, count: 0 });

		if now - entry.started_at >= window {
			*entry = Window { started_at: now, count: 0 };
		}
		if entry.count >= max_requests {
			let reset_at = entry.started_at + window;

			return RateLimitDecision::Delay(RetryDirective::new(reset_at, reset_at - now));
		}

		entry.count += 1;

		RateLimitDecision::Allow
	}

	/// Number of addresses currently tracked.
	pub fn tracked(&self) -> usize {
		self.windows.lock().len()
	}
}
