//! Endpoints and client parameters of the external authority.

// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_AUTHORIZATION: &str = "https://auth.riotgames.com/api/v1/authorization";
const DEFAULT_ENTITLEMENTS: &str = "https://entitlements.auth.riotgames.com/api/token/v1";
const DEFAULT_USERINFO: &str = "https://auth.riotgames.com/userinfo";

/// Validated endpoint set for the authority.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorityEndpoints {
	/// Authorization endpoint: session start (`POST`) and credential submission (`PUT`).
	pub authorization: Url,
	/// Entitlements token endpoint.
	pub entitlements: Url,
	/// User info endpoint returning the subject identifier.
	pub userinfo: Url,
}
impl AuthorityEndpoints {
	/// Starts a builder seeded with the public authority endpoints.
	pub fn builder() -> AuthorityEndpointsBuilder {
		AuthorityEndpointsBuilder::default()
	}

	/// Endpoint set where every path hangs off `base` (useful for mock authorities).
	pub fn rooted_at(base: &Url) -> Result<Self, ConfigError> {
		let join = |endpoint: &'static str, path: &str| {
			base.join(path).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
		};

		Self::builder()
			.authorization(join("authorization", "api/v1/authorization")?)
			.entitlements(join("entitlements", "api/token/v1")?)
			.userinfo(join("userinfo", "userinfo")?)
			.build()
	}

	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("authorization", &self.authorization)?;
		validate_endpoint("entitlements", &self.entitlements)?;
		validate_endpoint("userinfo", &self.userinfo)?;

		Ok(())
	}
}
impl Default for AuthorityEndpoints {
	fn default() -> Self {
		Self {
			authorization: default_url(DEFAULT_AUTHORIZATION),
			entitlements: default_url(DEFAULT_ENTITLEMENTS),
			userinfo: default_url(DEFAULT_USERINFO),
		}
	}
}

/// Builder for [`AuthorityEndpoints`].
#[derive(Debug, Default)]
pub struct AuthorityEndpointsBuilder(AuthorityEndpoints);
impl AuthorityEndpointsBuilder {
	/// Overrides the authorization endpoint.
	pub fn authorization(mut self, url: Url) -> Self {
		self.0.authorization = url;

		self
	}

	/// Overrides the entitlements endpoint.
	pub fn entitlements(mut self, url: Url) -> Self {
		self.0.entitlements = url;

		self
	}

	/// Overrides the user info endpoint.
	pub fn userinfo(mut self, url: Url) -> Self {
		self.0.userinfo = url;

		self
	}

	/// Validates and returns the endpoint set.
	pub fn build(self) -> Result<AuthorityEndpoints, ConfigError> {
		self.0.validate()?;

		Ok(self.0)
	}
}

/// Client parameters sent when opening an authorization session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationParams {
	/// Public client identifier.
	pub client_id: String,
	/// Nonce echoed into the identity token.
	pub nonce: String,
	/// Redirect URI whose fragment carries the tokens.
	pub redirect_uri: String,
	/// Requested response types.
	pub response_type: String,
	/// Prompt mode.
	pub prompt: String,
}
impl Default for AuthorizationParams {
	fn default() -> Self {
		Self {
			client_id: "play-valorant-web-prod".into(),
			nonce: "1".into(),
			redirect_uri: "https://playvalorant.com/opt_in".into(),
			response_type: "token id_token".into(),
			prompt: "none".into(),
		}
	}
}

fn default_url(raw: &str) -> Url {
	Url::parse(raw).unwrap_or_else(|_| unreachable!("built-in endpoint `{raw}` must parse"))
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
