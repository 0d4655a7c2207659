//! Thread-safe in-memory [`ExchangeStore`].

// std
use std::collections::hash_map::Entry;
// self
use crate::{
	_prelude::*,
	auth::{ExchangeCode, Origin},
	handoff::HandoffAttempt,
	store::{ExchangeEntry, ExchangeStore, ExchangeTicket, Redeemed, StoreError},
};

type EntryMap = Arc<Mutex<HashMap<ExchangeCode, ExchangeEntry>>>;

/// Process-local store. Entries do not survive a restart.
///
/// Every mutation (insert, take, sweep) runs under one mutex, so a redemption racing another
/// redemption or the sweeper for the same code has exactly one winner. No lock is held
/// outside these short critical sections.
#[derive(Clone, Debug, Default)]
pub struct MemoryExchangeStore(EntryMap);
impl MemoryExchangeStore {
	fn insert_now(map: &EntryMap, code: ExchangeCode, entry: ExchangeEntry) {
		match map.lock().entry(code) {
			Entry::Vacant(slot) => {
				slot.insert(entry);
			},
			Entry::Occupied(slot) => panic!(
				"exchange code {} collided with a live entry; the code generator is broken",
				slot.key().fingerprint()
			),
		}
	}

	fn take_now(map: &EntryMap, code: &str) -> Option<ExchangeEntry> {
		map.lock().remove(code)
	}

	fn sweep_now(map: &EntryMap, now: OffsetDateTime) -> Vec<Option<HandoffAttempt>> {
		let mut expired = Vec::new();

		map.lock().retain(|_, entry| {
			if entry.is_expired_at(now) {
				expired.push(entry.attempt.take());

				false
			} else {
				true
			}
		});

		expired
	}
}
impl ExchangeStore for MemoryExchangeStore {
	fn issue_at(&self, ticket: ExchangeTicket, now: OffsetDateTime) -> ExchangeCode {
		let code = ExchangeCode::generate();

		Self::insert_now(&self.0, code.clone(), ExchangeEntry::from_ticket(ticket, now));

		code
	}

	fn redeem_at(
		&self,
		code: &str,
		presenter: Option<&Origin>,
		now: OffsetDateTime,
	) -> Result<Redeemed, StoreError> {
		let entry = Self::take_now(&self.0, code).ok_or(StoreError::NotFound)?;

		if entry.is_expired_at(now) || !entry.accepts(presenter) {
			return Err(StoreError::NotFound);
		}

		Ok(Redeemed { payload: entry.payload, attempt: entry.attempt })
	}

	fn sweep_at(&self, now: OffsetDateTime) -> Vec<Option<HandoffAttempt>> {
		Self::sweep_now(&self.0, now)
	}

	fn len(&self) -> usize {
		self.0.lock().len()
	}
}
