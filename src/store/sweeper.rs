//! Background task that bounds memory by deleting expired entries on a fixed cadence.
//!
//! Lookups already treat expired entries as absent; the sweeper only guarantees that an entry
//! nobody redeems is gone within `ttl + interval`.

// crates.io
use tokio::{
	sync::oneshot,
	task::JoinHandle,
	time::{self, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	handoff::{HandoffAttempt, HandoffMetrics, HandoffState},
	obs::{self, HandoffStage, StageOutcome},
	store::ExchangeStore,
};

/// Default sweep cadence, which is also the grace bound on entry lifetime.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::seconds(1);

/// Periodic expiry sweep over an [`ExchangeStore`].
#[derive(Clone)]
pub struct ExpirySweeper {
	store: Arc<dyn ExchangeStore>,
	interval: Duration,
	metrics: Arc<HandoffMetrics>,
}
impl ExpirySweeper {
	/// Creates a sweeper; non-positive intervals fall back to [`DEFAULT_SWEEP_INTERVAL`].
	pub fn new(
		store: Arc<dyn ExchangeStore>,
		interval: Duration,
		metrics: Arc<HandoffMetrics>,
	) -> Self {
		let interval = if interval.is_positive() { interval } else { DEFAULT_SWEEP_INTERVAL };

		Self { store, interval, metrics }
	}

	/// Runs one sweep at `now` and returns one slot per expired entry.
	///
	/// Attempts carried by the removed entries are moved to [`HandoffState::Expired`].
	pub fn sweep_once(&self, now: OffsetDateTime) -> Vec<Option<HandoffAttempt>> {
		let mut expired = self.store.sweep_at(now);

		for attempt in &mut expired {
			self.metrics.record_expired();
			obs::record_stage(HandoffStage::Sweep, StageOutcome::Expired);
			obs::note_expired(attempt.as_ref().map(HandoffAttempt::id));

			if let Some(Err(e)) = attempt.as_mut().map(|a| a.advance(HandoffState::Expired)) {
				obs::note_transition_refused(&e);
			}
		}

		expired
	}

	/// Spawns the sweep loop on the current tokio runtime.
	///
	/// The loop stops when [`SweeperHandle::shutdown`] is awaited or the handle is dropped.
	pub fn spawn(self) -> SweeperHandle {
		let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
		let period = self.interval.unsigned_abs();
		let task = tokio::spawn(async move {
			let mut ticker = time::interval(period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				tokio::select! {
					_ = ticker.tick() => {
						self.sweep_once(OffsetDateTime::now_utc());
					},
					_ = &mut stop_rx => break,
				}
			}
		});

		SweeperHandle { stop: Some(stop_tx), task: Some(task) }
	}
}
impl Debug for ExpirySweeper {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExpirySweeper").field("interval", &self.interval).finish()
	}
}

/// Owner of a running sweep loop.
#[derive(Debug)]
pub struct SweeperHandle {
	stop: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
}
impl SweeperHandle {
	/// Stops the loop and waits for it to exit.
	pub async fn shutdown(mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(());
		}
		if let Some(task) = self.task.take() {
			let _ = task.await;
		}
	}
}
impl Drop for SweeperHandle {
	fn drop(&mut self) {
		if let Some(stop) = self.stop.take() {
			let _ = stop.send(());
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::Payload,
		store::{ExchangeTicket, MemoryExchangeStore},
	};

	#[tokio::test]
	async fn spawned_sweeper_clears_expired_entries() {
		let backend = Arc::new(MemoryExchangeStore::default());
		let store: Arc<dyn ExchangeStore> = backend.clone();
		let metrics = Arc::new(HandoffMetrics::default());
		let handle =
			ExpirySweeper::new(store.clone(), Duration::milliseconds(10), metrics.clone()).spawn();

		store.issue(Payload::new().with("k", "v"), Duration::milliseconds(1));
		store.issue_at(
			ExchangeTicket::new(Payload::new(), Duration::minutes(5)),
			OffsetDateTime::now_utc(),
		);
		time::sleep(std::time::Duration::from_millis(100)).await;

		assert_eq!(backend.len(), 1);
		assert_eq!(metrics.expired(), 1);

		handle.shutdown().await;
	}

	#[test]
	fn non_positive_interval_falls_back_to_default() {
		let store: Arc<dyn ExchangeStore> = Arc::new(MemoryExchangeStore::default());
		let sweeper = ExpirySweeper::new(store, Duration::ZERO, Default::default());

		assert_eq!(sweeper.interval, DEFAULT_SWEEP_INTERVAL);
		assert!(sweeper.sweep_once(OffsetDateTime::now_utc()).is_empty());
	}
}
