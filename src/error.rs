//! Crate-level error types shared by the coordinator, the store, and the HTTP surface.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Listener or socket failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Handoff attempt was driven through an illegal transition.
	#[error(transparent)]
	State(#[from] crate::handoff::TransitionError),

	/// The external authority rejected the credentials or could not be reached.
	#[error("Login failed: {reason}.")]
	LoginFailed {
		/// User-presentable reason; never contains credential material.
		reason: String,
	},
	/// Login nominally succeeded but a required token field was absent.
	#[error("Login response is missing the required {field} field.")]
	IncompleteCredential {
		/// Name of the missing field.
		field: &'static str,
	},
	/// The code was never issued, was already redeemed, or expired.
	#[error("Exchange code was not found or has expired.")]
	CodeNotFound,
	/// Redemption was requested without a code.
	#[error("Exchange code is missing from the request.")]
	MissingCode,
	/// The requested out-of-band target origin is not allow-listed.
	#[error("Origin `{origin}` is not allowed to receive exchange codes.")]
	OriginNotAllowed {
		/// Origin supplied by the caller.
		origin: String,
	},
}
impl From<crate::store::StoreError> for Error {
	fn from(e: crate::store::StoreError) -> Self {
		match e {
			crate::store::StoreError::NotFound => Self::CodeNotFound,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An origin could not be parsed.
	#[error("Origin is invalid.")]
	InvalidOrigin(#[from] crate::auth::OriginError),
	/// No origin may receive codes.
	#[error("At least one allowed origin must be configured.")]
	MissingAllowedOrigin,
	/// `*` was configured outside dev mode.
	#[error("Wildcard origins are only permitted in dev mode.")]
	WildcardOriginOutsideDevMode,
	/// Authority endpoint is not HTTPS and not loopback.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Authority endpoint cannot be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Code TTL is non-positive or longer than the permitted maximum.
	#[error("Code TTL must be positive and at most {max}.")]
	InvalidTtl {
		/// Maximum permitted TTL.
		max: Duration,
	},
	/// Sweep interval is non-positive or longer than the code TTL.
	#[error("Sweep interval must be positive and no longer than the code TTL.")]
	InvalidSweepInterval,
	/// Rate limit must allow at least one request per positive window.
	#[error("Rate limit must allow at least one request per positive window.")]
	InvalidRateLimit,
	/// Environment variable holds an unparsable value.
	#[error("Environment variable {key} has an invalid value `{value}`.")]
	InvalidEnv {
		/// Variable name.
		key: &'static str,
		/// Raw value.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Listener-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying IO failure while binding or serving.
	#[error("I/O error occurred while serving the handoff endpoints.")]
	Io(#[from] std::io::Error),
}
