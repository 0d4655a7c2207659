//! Contract for the interactive login performed against the external authority.
//!
//! The coordinator treats [`LoginBroker::perform_login`] as opaque, possibly slow, and possibly
//! failing. It never retries, and it never holds a store lock across the call.

pub mod endpoints;

#[cfg(feature = "reqwest")] pub mod authority;

#[cfg(feature = "reqwest")] pub use authority::AuthorityLoginBroker;
pub use endpoints::*;

// self
use crate::{_prelude::*, auth::Credentials};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default per-request timeout for authority calls.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::seconds(15);

/// Boxed future returned by [`LoginBroker::perform_login`].
pub type LoginFuture<'a> = Pin<Box<dyn Future<Output = Result<Credentials, LoginError>> + 'a + Send>>;

/// Performs the username/password login against the external authority.
pub trait LoginBroker
where
	Self: Send + Sync,
{
	/// Exchanges a username/password pair for a raw credential bundle.
	fn perform_login<'a>(&'a self, username: &'a str, password: &'a str) -> LoginFuture<'a>;
}

/// Failures raised at the login broker boundary.
#[derive(Debug, ThisError)]
pub enum LoginError {
	/// The authority refused the credentials or asked for a step the proxy cannot perform.
	#[error("Authority rejected the login: {reason}.")]
	Rejected {
		/// Authority-supplied error label.
		reason: String,
	},
	/// The authority could not be reached.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label.
		endpoint: &'static str,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The authority answered with an unexpected HTTP status.
	#[error("The {endpoint} endpoint returned HTTP {status}.")]
	UnexpectedStatus {
		/// Endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
	},
	/// The authority answered with JSON of an unexpected shape.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Endpoint label.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl LoginError {
	/// Wraps a transport-specific failure.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Whether the authority explicitly refused the credentials.
	pub fn is_rejection(&self) -> bool {
		matches!(self, Self::Rejected { .. })
	}
}
