//! Cross-cutting request handling: CORS, security headers, and rate limiting.

// std
use std::net::IpAddr;
// crates.io
use axum::{
	Json,
	extract::{ConnectInfo, Request, State},
	http::{
		HeaderMap, HeaderValue, Method, StatusCode,
		header::{
			ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
			ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, REFERRER_POLICY,
			RETRY_AFTER, VARY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
			HeaderName,
		},
	},
	middleware::Next,
	response::{IntoResponse, Response},
};
use serde_json::json;
// self
use crate::{_prelude::*, ext::RateLimitDecision, obs, server::AppState};

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Adds `nosniff`, frame denial, and `no-referrer` to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
	let mut response = next.run(request).await;
	let headers = response.headers_mut();

	headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
	headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
	headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

	response
}

/// Echoes `Access-Control-Allow-Origin` for allow-listed origins and answers preflights.
pub async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
	let allowed = state
		.coordinator
		.origins
		.cors_allow_origin(request.headers().get(ORIGIN).and_then(|value| value.to_str().ok()))
		.and_then(|value| HeaderValue::from_str(&value).ok());
	let preflight = request.method() == Method::OPTIONS;
	let mut response =
		if preflight { StatusCode::NO_CONTENT.into_response() } else { next.run(request).await };
	let headers = response.headers_mut();

	headers.insert(VARY, HeaderValue::from_static("Origin"));

	if let Some(origin) = allowed {
		headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);

		if preflight {
			headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST"));
			headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
			headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
		}
	}

	response
}

/// Refuses requests beyond the per-address budget with `429`.
///
/// The budget is keyed on the socket peer unless [`AppState::trust_forwarded_for`] is set, in
/// which case the address appended by the fronting proxy is used. Requests without connection
/// info (e.g. routers driven in-process) are not limited.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
	let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
	let client = client_ip(request.headers(), peer, state.trust_forwarded_for);

	if let Some(client) = client {
		if let RateLimitDecision::Delay(directive) = state.limiter.check(client) {
			obs::note_server("rate limited", peer);

			return (
				StatusCode::TOO_MANY_REQUESTS,
				[(RETRY_AFTER, directive.retry_after_secs().to_string())],
				Json(json!({ "error": "rate_limited" })),
			)
				.into_response();
		}
	}

	next.run(request).await
}

/// Address a request is accounted to.
///
/// With `trust_forwarded_for`, the rightmost `X-Forwarded-For` entry wins, since that is the
/// one the proxy itself appended. Unparsable headers fall back to the socket peer.
fn client_ip(
	headers: &HeaderMap,
	peer: Option<SocketAddr>,
	trust_forwarded_for: bool,
) -> Option<IpAddr> {
	let forwarded = trust_forwarded_for
		.then(|| headers.get_all(X_FORWARDED_FOR).iter().next_back())
		.flatten()
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.rsplit(',').next())
		.and_then(|entry| entry.trim().parse::<IpAddr>().ok());

	forwarded.or(peer.map(|peer| peer.ip()))
}
