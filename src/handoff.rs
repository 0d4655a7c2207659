//! Handoff orchestration: login completion to code issuance, and code redemption.

pub mod attempt;

mod login;
mod metrics;
mod redeem;

pub use attempt::*;
pub use login::{IssuedCode, LoginHandle};
pub use metrics::HandoffMetrics;
pub use redeem::Redemption;

// self
use crate::{
	_prelude::*,
	auth::OriginPolicy,
	config::RelayConfig,
	login::LoginBroker,
	store::{ExchangeStore, ExpirySweeper, SweeperHandle},
};

/// Ties login completion to code issuance and client redemption to code consumption.
///
/// The coordinator owns no per-attempt state; attempts travel through [`LoginHandle`] and
/// [`IssuedCode`] values, then ride inside the store entry until redemption or expiry closes
/// them. The only shared mutable state is the [`ExchangeStore`]. Calls
/// into the [`LoginBroker`] never happen while a store lock is held.
#[derive(Clone)]
pub struct HandoffCoordinator {
	/// Store holding live exchange codes.
	pub store: Arc<dyn ExchangeStore>,
	/// Proxy to the external authority.
	pub login_broker: Arc<dyn LoginBroker>,
	/// Origins that may receive and redeem codes.
	pub origins: OriginPolicy,
	/// Lifetime of every issued code.
	pub code_ttl: Duration,
	/// Sweep cadence and grace bound for expired codes.
	pub sweep_interval: Duration,
	/// Shared outcome counters.
	pub metrics: Arc<HandoffMetrics>,
}
impl HandoffCoordinator {
	/// Creates a coordinator from validated configuration.
	pub fn new(
		store: Arc<dyn ExchangeStore>,
		login_broker: Arc<dyn LoginBroker>,
		config: &RelayConfig,
	) -> Self {
		Self {
			store,
			login_broker,
			origins: config.origins.clone(),
			code_ttl: config.code_ttl,
			sweep_interval: config.sweep_interval,
			metrics: Default::default(),
		}
	}

	/// Starts the background expiry sweep for this coordinator's store.
	pub fn spawn_sweeper(&self) -> SweeperHandle {
		ExpirySweeper::new(self.store.clone(), self.sweep_interval, self.metrics.clone()).spawn()
	}
}
impl Debug for HandoffCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HandoffCoordinator")
			.field("origins", &self.origins)
			.field("code_ttl", &self.code_ttl)
			.field("sweep_interval", &self.sweep_interval)
			.field("live_codes", &self.store.len())
			.finish()
	}
}
