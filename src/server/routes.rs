//! Route handlers.

// crates.io
use axum::{
	Form, Json,
	extract::{Query, State},
	http::{
		HeaderMap, StatusCode,
		header::{CACHE_CONTROL, ORIGIN},
	},
	response::{Html, IntoResponse, Response},
};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::Origin,
	server::{AppState, pages},
};

/// Query string of `GET /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
	/// Origin (or URL) of the page that opened the popup.
	pub redirect: Option<String>,
}

/// Form body of `POST /auth/submit`.
#[derive(Deserialize)]
pub struct SubmitForm {
	/// Account username.
	#[serde(default)]
	pub username: String,
	/// Account password.
	#[serde(default)]
	pub password: String,
	/// Delivery target carried over from the login form.
	#[serde(default)]
	pub redirect: Option<String>,
}
impl Debug for SubmitForm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SubmitForm").field("redirect", &self.redirect).finish_non_exhaustive()
	}
}

/// Query string of `GET /token`.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
	/// Exchange code to redeem.
	pub code: Option<String>,
}

const NO_STORE: &str = "no-store";

/// `GET /`
pub async fn index() -> &'static str {
	pages::banner()
}

/// `GET /auth/login`: renders the login form for an allow-listed requester.
pub async fn login_page(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Response {
	match state.coordinator.origins.resolve_target(query.redirect.as_deref()) {
		Ok(target) => Html(pages::login_form(&target)).into_response(),
		Err(_) => forbidden(),
	}
}

/// `POST /auth/submit`: logs in through the authority and hands the code to the opener.
pub async fn submit(State(state): State<AppState>, Form(form): Form<SubmitForm>) -> Response {
	if form.username.trim().is_empty() || form.password.is_empty() {
		return page(
			StatusCode::BAD_REQUEST,
			"Missing credentials",
			"Username and password are both required.",
		);
	}

	let coordinator = &state.coordinator;
	let handle = match coordinator.begin_login(form.redirect.as_deref()) {
		Ok(handle) => handle,
		Err(_) => return forbidden(),
	};

	match coordinator.login(handle, &form.username, &form.password).await {
		Ok(issued) => match issued.message().to_json() {
			Ok(message) =>
				([(CACHE_CONTROL, NO_STORE)], Html(pages::completion(issued.target(), &message)))
					.into_response(),
			Err(_) => internal_error(),
		},
		Err(Error::LoginFailed { .. } | Error::IncompleteCredential { .. }) => page(
			StatusCode::BAD_GATEWAY,
			"Sign-in failed",
			"Authentication failed. Check your credentials and try again.",
		),
		Err(Error::OriginNotAllowed { .. }) => forbidden(),
		Err(_) => internal_error(),
	}
}

/// `GET /token`: redeems a code exactly once.
///
/// An `Origin` header that does not parse as an origin (for example `null`) is treated as
/// absent, the same as a non-browser client.
pub async fn token(
	State(state): State<AppState>,
	Query(query): Query<TokenQuery>,
	headers: HeaderMap,
) -> Response {
	let presenter = headers
		.get(ORIGIN)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| Origin::parse(value).ok());

	match state.coordinator.redeem_presented(query.code.as_deref(), presenter.as_ref()) {
		Ok(redemption) =>
			(StatusCode::OK, [(CACHE_CONTROL, NO_STORE)], Json(redemption.payload)).into_response(),
		Err(Error::MissingCode) => token_error(StatusCode::BAD_REQUEST, "missing_code"),
		Err(_) => token_error(StatusCode::NOT_FOUND, "code_not_found_or_expired"),
	}
}

fn token_error(status: StatusCode, error: &str) -> Response {
	(status, [(CACHE_CONTROL, NO_STORE)], Json(json!({ "error": error }))).into_response()
}

fn page(status: StatusCode, title: &str, detail: &str) -> Response {
	(status, Html(pages::failure(title, detail))).into_response()
}

fn forbidden() -> Response {
	page(StatusCode::FORBIDDEN, "Not allowed", "This site is not allowed to request a sign-in.")
}

fn internal_error() -> Response {
	page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong", "Please try again later.")
}
