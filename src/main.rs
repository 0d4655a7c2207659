//! Handoff backend: serves the login popup and the one-time redemption endpoint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use auth_handoff::{
	config::RelayConfig,
	handoff::HandoffCoordinator,
	login::{AuthorityLoginBroker, LoginBroker},
	server::{self, AppState},
	store::{ExchangeStore, MemoryExchangeStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = RelayConfig::from_env()?;
	let store: Arc<dyn ExchangeStore> = Arc::new(MemoryExchangeStore::default());
	let broker: Arc<dyn LoginBroker> = Arc::new(
		AuthorityLoginBroker::new(config.authority.clone()).with_timeout(config.login_timeout),
	);
	let coordinator = HandoffCoordinator::new(store, broker, &config);
	let sweeper = coordinator.spawn_sweeper();
	let listener = server::bind(config.bind).await?;

	let state = AppState::new(coordinator, config.rate_limit)
		.with_trusted_proxy(config.trust_forwarded_for);

	server::serve(listener, state, shutdown_signal()).await?;
	sweeper.shutdown().await;

	Ok(())
}

async fn shutdown_signal() {
	let _ = tokio::signal::ctrl_c().await;
}
