//! Runtime configuration for the handoff service.

// std
use std::net::{IpAddr, Ipv4Addr};
// self
use crate::{
	_prelude::*,
	auth::{Origin, OriginPolicy},
	error::ConfigError,
	ext::RateLimitPolicy,
	login::{AuthorityEndpoints, DEFAULT_LOGIN_TIMEOUT},
	store::{DEFAULT_CODE_TTL, sweeper::DEFAULT_SWEEP_INTERVAL},
};

/// Longest code lifetime the service accepts.
pub const MAX_CODE_TTL: Duration = Duration::hours(1);
/// Port used when neither `PORT` nor `AUTH_HANDOFF_BIND` is set.
pub const DEFAULT_PORT: u16 = 3000;

const ENV_PORT: &str = "PORT";
const ENV_BIND: &str = "AUTH_HANDOFF_BIND";
const ENV_ALLOWED_ORIGIN: &str = "FRONTEND_ALLOWED_ORIGIN";
const ENV_DEV_MODE: &str = "AUTH_HANDOFF_DEV_MODE";
const ENV_CODE_TTL: &str = "AUTH_HANDOFF_CODE_TTL_SECS";
const ENV_SWEEP_INTERVAL: &str = "AUTH_HANDOFF_SWEEP_INTERVAL_MS";
const ENV_RATE_LIMIT: &str = "AUTH_HANDOFF_RATE_LIMIT";
const ENV_RATE_WINDOW: &str = "AUTH_HANDOFF_RATE_WINDOW_SECS";
const ENV_TRUST_FORWARDED_FOR: &str = "AUTH_HANDOFF_TRUST_FORWARDED_FOR";
const ENV_LOGIN_TIMEOUT: &str = "AUTH_HANDOFF_LOGIN_TIMEOUT_SECS";
const ENV_AUTHORITY_URL: &str = "AUTH_HANDOFF_AUTHORITY_URL";
const ENV_ENTITLEMENTS_URL: &str = "AUTH_HANDOFF_ENTITLEMENTS_URL";
const ENV_USERINFO_URL: &str = "AUTH_HANDOFF_USERINFO_URL";

/// Validated service configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Listen address.
	pub bind: SocketAddr,
	/// Origins that may receive and redeem codes.
	pub origins: OriginPolicy,
	/// Whether development conveniences (wildcard origin) are enabled.
	pub dev_mode: bool,
	/// Lifetime of every issued code.
	pub code_ttl: Duration,
	/// Expiry sweep cadence; also the bound on how long an expired entry may linger.
	pub sweep_interval: Duration,
	/// Per-client request budget.
	pub rate_limit: RateLimitPolicy,
	/// Whether the budget is keyed on `X-Forwarded-For` set by a fronting proxy.
	pub trust_forwarded_for: bool,
	/// External authority endpoints.
	pub authority: AuthorityEndpoints,
	/// Per-request timeout for authority calls.
	pub login_timeout: Duration,
}
impl RelayConfig {
	/// Starts a builder with every default applied and no allowed origin.
	pub fn builder() -> RelayConfigBuilder {
		RelayConfigBuilder::default()
	}

	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads configuration through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &str| {
			lookup(key).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
		};
		let mut builder = Self::builder();

		if let Some(raw) = var(ENV_BIND) {
			builder = builder.bind(parse_env(ENV_BIND, raw)?);
		} else if let Some(raw) = var(ENV_PORT) {
			let port: u16 = parse_env(ENV_PORT, raw)?;

			builder = builder.bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
		}
		if let Some(raw) = var(ENV_ALLOWED_ORIGIN) {
			for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
				builder = if entry == "*" {
					builder.allow_any_origin()
				} else {
					builder.allow_origin(Origin::parse(entry)?)
				};
			}
		}
		if let Some(raw) = var(ENV_DEV_MODE) {
			builder = builder.dev_mode(parse_flag(ENV_DEV_MODE, raw)?);
		}
		if let Some(raw) = var(ENV_CODE_TTL) {
			builder = builder.code_ttl(Duration::seconds(parse_env(ENV_CODE_TTL, raw)?));
		}
		if let Some(raw) = var(ENV_SWEEP_INTERVAL) {
			builder =
				builder.sweep_interval(Duration::milliseconds(parse_env(ENV_SWEEP_INTERVAL, raw)?));
		}

		let mut rate_limit = RateLimitPolicy::default();

		if let Some(raw) = var(ENV_RATE_LIMIT) {
			rate_limit.max_requests = parse_env(ENV_RATE_LIMIT, raw)?;
		}
		if let Some(raw) = var(ENV_RATE_WINDOW) {
			rate_limit.window = Duration::seconds(parse_env(ENV_RATE_WINDOW, raw)?);
		}

		builder = builder.rate_limit(rate_limit);

		if let Some(raw) = var(ENV_TRUST_FORWARDED_FOR) {
			builder = builder.trust_forwarded_for(parse_flag(ENV_TRUST_FORWARDED_FOR, raw)?);
		}

		if let Some(raw) = var(ENV_LOGIN_TIMEOUT) {
			builder = builder.login_timeout(Duration::seconds(parse_env(ENV_LOGIN_TIMEOUT, raw)?));
		}

		let mut authority = AuthorityEndpoints::builder();

		if let Some(raw) = var(ENV_AUTHORITY_URL) {
			authority = authority.authorization(parse_url("authorization", &raw)?);
		}
		if let Some(raw) = var(ENV_ENTITLEMENTS_URL) {
			authority = authority.entitlements(parse_url("entitlements", &raw)?);
		}
		if let Some(raw) = var(ENV_USERINFO_URL) {
			authority = authority.userinfo(parse_url("userinfo", &raw)?);
		}

		builder.authority(authority.build()?).build()
	}

	/// Re-checks the invariants enforced by [`RelayConfigBuilder::build`].
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.code_ttl.is_positive() || self.code_ttl > MAX_CODE_TTL {
			return Err(ConfigError::InvalidTtl { max: MAX_CODE_TTL });
		}
		if !self.sweep_interval.is_positive() || self.sweep_interval > self.code_ttl {
			return Err(ConfigError::InvalidSweepInterval);
		}
		if self.origins.is_wildcard() && !self.dev_mode {
			return Err(ConfigError::WildcardOriginOutsideDevMode);
		}
		if !self.login_timeout.is_positive() {
			return Err(ConfigError::InvalidEnv {
				key: ENV_LOGIN_TIMEOUT,
				value: self.login_timeout.whole_seconds().to_string(),
			});
		}

		self.rate_limit.validate()
	}
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
	bind: SocketAddr,
	origins: Vec<Origin>,
	allow_any_origin: bool,
	dev_mode: bool,
	code_ttl: Duration,
	sweep_interval: Duration,
	rate_limit: RateLimitPolicy,
	trust_forwarded_for: bool,
	authority: AuthorityEndpoints,
	login_timeout: Duration,
}
impl RelayConfigBuilder {
	/// Overrides the listen address.
	pub fn bind(mut self, bind: SocketAddr) -> Self {
		self.bind = bind;

		self
	}

	/// Appends an allowed origin. The first one added is the default delivery target.
	pub fn allow_origin(mut self, origin: Origin) -> Self {
		self.origins.push(origin);

		self
	}

	/// Accepts every origin. Only valid together with [`Self::dev_mode`].
	pub fn allow_any_origin(mut self) -> Self {
		self.allow_any_origin = true;

		self
	}

	/// Toggles development mode.
	pub fn dev_mode(mut self, enabled: bool) -> Self {
		self.dev_mode = enabled;

		self
	}

	/// Overrides the code TTL.
	pub fn code_ttl(mut self, ttl: Duration) -> Self {
		self.code_ttl = ttl;

		self
	}

	/// Overrides the sweep interval.
	pub fn sweep_interval(mut self, interval: Duration) -> Self {
		self.sweep_interval = interval;

		self
	}

	/// Overrides the per-client request budget.
	pub fn rate_limit(mut self, policy: RateLimitPolicy) -> Self {
		self.rate_limit = policy;

		self
	}

	/// Keys the request budget on `X-Forwarded-For`. Only safe behind a proxy that sets it.
	pub fn trust_forwarded_for(mut self, trusted: bool) -> Self {
		self.trust_forwarded_for = trusted;

		self
	}

	/// Overrides the authority endpoints.
	pub fn authority(mut self, endpoints: AuthorityEndpoints) -> Self {
		self.authority = endpoints;

		self
	}

	/// Overrides the authority call timeout.
	pub fn login_timeout(mut self, timeout: Duration) -> Self {
		self.login_timeout = timeout;

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<RelayConfig, ConfigError> {
		let origins = if self.allow_any_origin {
			if !self.dev_mode {
				return Err(ConfigError::WildcardOriginOutsideDevMode);
			}

			OriginPolicy::any_insecure()
		} else {
			OriginPolicy::allow_list(self.origins)?
		};
		let config = RelayConfig {
			bind: self.bind,
			origins,
			dev_mode: self.dev_mode,
			code_ttl: self.code_ttl,
			sweep_interval: self.sweep_interval,
			rate_limit: self.rate_limit,
			trust_forwarded_for: self.trust_forwarded_for,
			authority: self.authority,
			login_timeout: self.login_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}
impl Default for RelayConfigBuilder {
	fn default() -> Self {
		Self {
			bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
			origins: Vec::new(),
			allow_any_origin: false,
			dev_mode: false,
			code_ttl: DEFAULT_CODE_TTL,
			sweep_interval: DEFAULT_SWEEP_INTERVAL,
			rate_limit: RateLimitPolicy::default(),
			trust_forwarded_for: false,
			authority: AuthorityEndpoints::default(),
			login_timeout: DEFAULT_LOGIN_TIMEOUT,
		}
	}
}

fn parse_env<T>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
	T: FromStr,
{
	raw.parse().map_err(|_| ConfigError::InvalidEnv { key, value: raw })
}

fn parse_flag(key: &'static str, raw: String) -> Result<bool, ConfigError> {
	match raw.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidEnv { key, value: raw }),
	}
}

fn parse_url(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}
