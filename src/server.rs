//! HTTP surface: login pages, credential submission, and code redemption.

pub mod middleware;
pub mod pages;
pub mod routes;

// crates.io
use axum::{
	Router,
	middleware::{from_fn, from_fn_with_state},
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	ext::{FixedWindowLimiter, RateLimitPolicy},
	handoff::HandoffCoordinator,
	obs,
};

/// Shared state handed to every route and middleware.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Handoff coordinator.
	pub coordinator: HandoffCoordinator,
	/// Per-client request budget.
	pub limiter: Arc<FixedWindowLimiter>,
	/// Key the budget on the proxy-supplied `X-Forwarded-For` address instead of the peer.
	pub trust_forwarded_for: bool,
}
impl AppState {
	/// Creates state for `coordinator` with the provided request budget.
	pub fn new(coordinator: HandoffCoordinator, rate_limit: RateLimitPolicy) -> Self {
		Self {
			coordinator,
			limiter: Arc::new(FixedWindowLimiter::new(rate_limit)),
			trust_forwarded_for: false,
		}
	}

	/// Trusts `X-Forwarded-For` for rate limiting. Enable only behind a proxy that sets it.
	pub fn with_trusted_proxy(mut self, trusted: bool) -> Self {
		self.trust_forwarded_for = trusted;

		self
	}
}

/// Builds the router with every route and middleware attached.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/", get(routes::index))
		.route("/auth/login", get(routes::login_page))
		.route("/auth/submit", post(routes::submit))
		.route("/token", get(routes::token))
		.layer(from_fn_with_state(state.clone(), middleware::rate_limit))
		.layer(from_fn_with_state(state.clone(), middleware::cors))
		.layer(from_fn(middleware::security_headers))
		.with_state(state)
}

/// Binds the listener for `addr`.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
	let listener = TcpListener::bind(addr).await.map_err(TransportError::from)?;

	obs::note_server("listening", listener.local_addr().ok());

	Ok(listener)
}

/// Serves `state` on `listener` until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
	F: 'static + Send + Future<Output = ()>,
{
	let app = router(state).into_make_service_with_connect_info::<SocketAddr>();

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown)
		.await
		.map_err(TransportError::from)?;
	obs::note_server("stopped", None);

	Ok(())
}
