//! Reqwest-backed [`LoginBroker`] for the cookie-session authority.
//!
//! Each attempt runs on its own cookie jar so sessions never bleed between users. The
//! sequence is: open a session, submit credentials, read the tokens out of the redirect URI
//! fragment, then (only with an access token) fetch the entitlements token and subject id.

// crates.io
use reqwest::{RequestBuilder, StatusCode, header::CONTENT_TYPE, redirect::Policy};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenSecret},
	login::{
		AuthorityEndpoints, AuthorizationParams, DEFAULT_LOGIN_TIMEOUT, LoginBroker, LoginError,
		LoginFuture,
	},
};

/// Thin login proxy over the authority's HTTP API.
#[derive(Clone, Debug)]
pub struct AuthorityLoginBroker {
	endpoints: AuthorityEndpoints,
	params: AuthorizationParams,
	timeout: Duration,
}
impl AuthorityLoginBroker {
	/// Creates a broker for the provided endpoints with default client parameters.
	pub fn new(endpoints: AuthorityEndpoints) -> Self {
		Self { endpoints, params: AuthorizationParams::default(), timeout: DEFAULT_LOGIN_TIMEOUT }
	}

	/// Overrides the client parameters sent when opening a session.
	pub fn with_params(mut self, params: AuthorizationParams) -> Self {
		self.params = params;

		self
	}

	/// Overrides the per-request timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		if timeout.is_positive() {
			self.timeout = timeout;
		}

		self
	}

	fn session_client(&self) -> Result<ReqwestClient, LoginError> {
		ReqwestClient::builder()
			.cookie_store(true)
			.redirect(Policy::none())
			.timeout(self.timeout.unsigned_abs())
			.build()
			.map_err(|e| LoginError::network("authorization", e))
	}

	async fn login(&self, username: &str, password: &str) -> Result<Credentials, LoginError> {
		let client = self.session_client()?;
		let session_body = serde_json::json!({
			"client_id": self.params.client_id,
			"nonce": self.params.nonce,
			"redirect_uri": self.params.redirect_uri,
			"response_type": self.params.response_type,
			"prompt": self.params.prompt,
		});
		let (status, _) = send(
			"authorization",
			json_body(client.post(self.endpoints.authorization.clone()), &session_body),
		)
		.await?;

		ensure_not_server_error("authorization", status)?;

		let credential_body = serde_json::json!({
			"type": "auth",
			"username": username,
			"password": password,
			"remember": false,
		});
		let (status, body) = send(
			"authorization",
			json_body(client.put(self.endpoints.authorization.clone()), &credential_body),
		)
		.await?;

		ensure_not_server_error("authorization", status)?;

		let uri = redirect_uri_from(status, &body)?;
		let fragment = FragmentTokens::parse(&uri);
		let mut credentials = Credentials {
			access_token: fragment.access_token.map(TokenSecret::new),
			id_token: fragment.id_token.map(TokenSecret::new),
			..Default::default()
		};
		let Some(access) = credentials.access_token.clone() else {
			return Ok(credentials);
		};
		let (status, body) = send(
			"entitlements",
			json_body(client.post(self.endpoints.entitlements.clone()), &serde_json::json!({}))
				.bearer_auth(access.expose()),
		)
		.await?;

		ensure_success("entitlements", status)?;

		let entitlements: EntitlementsBody = parse_json("entitlements", &body)?;

		credentials.entitlements_token = entitlements.into_token().map(TokenSecret::new);

		let (status, body) = send(
			"userinfo",
			client.post(self.endpoints.userinfo.clone()).bearer_auth(access.expose()),
		)
		.await?;

		ensure_success("userinfo", status)?;

		let userinfo: UserInfoBody = parse_json("userinfo", &body)?;

		credentials.subject_id = userinfo.into_subject();

		Ok(credentials)
	}
}
impl LoginBroker for AuthorityLoginBroker {
	fn perform_login<'a>(&'a self, username: &'a str, password: &'a str) -> LoginFuture<'a> {
		Box::pin(self.login(username, password))
	}
}

#[derive(Debug, Deserialize)]
struct CredentialResponseBody {
	#[serde(rename = "type")]
	kind: Option<String>,
	error: Option<String>,
	response: Option<CredentialResponse>,
}

#[derive(Debug, Deserialize)]
struct CredentialResponse {
	parameters: Option<CredentialResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct CredentialResponseParameters {
	uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntitlementsBody {
	entitlements_token: Option<String>,
	token: Option<String>,
}
impl EntitlementsBody {
	fn into_token(self) -> Option<String> {
		self.entitlements_token.filter(|token| !token.is_empty()).or(self.token)
	}
}

#[derive(Debug, Deserialize)]
struct UserInfoBody {
	sub: Option<String>,
	puuid: Option<String>,
}
impl UserInfoBody {
	fn into_subject(self) -> Option<String> {
		self.sub.filter(|sub| !sub.is_empty()).or(self.puuid)
	}
}

/// Tokens carried in the redirect URI fragment.
#[derive(Debug, Default, PartialEq, Eq)]
struct FragmentTokens {
	access_token: Option<String>,
	id_token: Option<String>,
}
impl FragmentTokens {
	fn parse(uri: &str) -> Self {
		let Some((_, fragment)) = uri.split_once('#') else {
			return Self::default();
		};
		let mut tokens = Self::default();

		for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
			let value = Some(value.into_owned()).filter(|v| !v.is_empty());

			match key.as_ref() {
				"access_token" => tokens.access_token = value,
				"id_token" => tokens.id_token = value,
				_ => {},
			}
		}

		tokens
	}
}

fn json_body(builder: RequestBuilder, body: &serde_json::Value) -> RequestBuilder {
	builder.header(CONTENT_TYPE, "application/json").body(body.to_string())
}

async fn send(
	endpoint: &'static str,
	request: RequestBuilder,
) -> Result<(StatusCode, Vec<u8>), LoginError> {
	let response = request.send().await.map_err(|e| LoginError::network(endpoint, e))?;
	let status = response.status();
	let body = response.bytes().await.map_err(|e| LoginError::network(endpoint, e))?;

	Ok((status, body.to_vec()))
}

fn ensure_not_server_error(endpoint: &'static str, status: StatusCode) -> Result<(), LoginError> {
	if status.is_server_error() {
		Err(LoginError::UnexpectedStatus { endpoint, status: status.as_u16() })
	} else {
		Ok(())
	}
}

fn ensure_success(endpoint: &'static str, status: StatusCode) -> Result<(), LoginError> {
	if status.is_success() {
		Ok(())
	} else {
		Err(LoginError::UnexpectedStatus { endpoint, status: status.as_u16() })
	}
}

fn parse_json<T>(endpoint: &'static str, body: &[u8]) -> Result<T, LoginError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| LoginError::MalformedResponse { endpoint, source })
}

fn redirect_uri_from(status: StatusCode, body: &[u8]) -> Result<String, LoginError> {
	let parsed: CredentialResponseBody = match parse_json("authorization", body) {
		Ok(parsed) => parsed,
		Err(_) if status.is_client_error() =>
			return Err(LoginError::Rejected { reason: format!("http_{}", status.as_u16()) }),
		Err(e) => return Err(e),
	};

	if let Some(error) = parsed.error {
		return Err(LoginError::Rejected { reason: error });
	}

	parsed.response.and_then(|response| response.parameters).and_then(|params| params.uri).ok_or(
		LoginError::Rejected { reason: parsed.kind.unwrap_or_else(|| "missing_redirect_uri".into()) },
	)
}
