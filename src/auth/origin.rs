//! Web origins and the allow-list that decides who may receive exchange codes.

// self
use crate::{_prelude::*, error::ConfigError};

/// Serialized web origin (`scheme://host[:port]`), including extension origins such as
/// `chrome-extension://<id>`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Origin(String);
impl Origin {
	/// Parses a bare origin. Paths other than `/`, queries, fragments, and userinfo are rejected.
	pub fn parse(value: &str) -> Result<Self, OriginError> {
		let trimmed = value.trim();

		if trimmed == "*" {
			return Err(OriginError::Wildcard);
		}

		let url = Url::parse(trimmed).map_err(|source| OriginError::Unparsable { source })?;

		if !matches!(url.path(), "" | "/")
			|| url.query().is_some()
			|| url.fragment().is_some()
			|| !url.username().is_empty()
			|| url.password().is_some()
		{
			return Err(OriginError::NotAnOrigin { value: trimmed.to_owned() });
		}

		Self::of_url(&url)
	}

	/// Extracts the origin of an arbitrary URL, ignoring its path, query, and fragment.
	pub fn of_url(url: &Url) -> Result<Self, OriginError> {
		let host = url
			.host_str()
			.filter(|host| !host.is_empty())
			.ok_or_else(|| OriginError::MissingHost { value: url.to_string() })?;
		let serialized = match url.port() {
			Some(port) => format!("{}://{}:{port}", url.scheme(), host.to_ascii_lowercase()),
			None => format!("{}://{}", url.scheme(), host.to_ascii_lowercase()),
		};

		Ok(Self(serialized))
	}

	/// Returns the serialized origin.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Origin {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<Origin> for String {
	fn from(value: Origin) -> Self {
		value.0
	}
}
impl TryFrom<String> for Origin {
	type Error = OriginError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::parse(&value)
	}
}
impl FromStr for Origin {
	type Err = OriginError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for Origin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Origin({})", self.0)
	}
}
impl Display for Origin {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when an origin cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum OriginError {
	/// `*` is a policy, not an origin.
	#[error("Wildcard is not a concrete origin.")]
	Wildcard,
	/// Value is not a URL.
	#[error("Origin is not a valid URL.")]
	Unparsable {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// URL carries more than scheme, host, and port.
	#[error("`{value}` is a URL, not an origin.")]
	NotAnOrigin {
		/// Raw value.
		value: String,
	},
	/// URL has no host component.
	#[error("`{value}` has no host.")]
	MissingHost {
		/// Raw value.
		value: String,
	},
}

/// Where the login completion page may post the exchange code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetOrigin {
	/// Only this origin receives the message and may redeem the code.
	Exact(Origin),
	/// Any origin receives the message. Only reachable in dev mode.
	Any,
}
impl TargetOrigin {
	/// Value for the `targetOrigin` argument of `postMessage`.
	pub fn as_post_message_target(&self) -> &str {
		match self {
			Self::Exact(origin) => origin.as_str(),
			Self::Any => "*",
		}
	}

	/// Origin the issued code is bound to, if any.
	pub fn binding(&self) -> Option<&Origin> {
		match self {
			Self::Exact(origin) => Some(origin),
			Self::Any => None,
		}
	}
}

/// Allow-list of origins that may receive exchange codes and call the redemption endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginPolicy {
	allowed: Vec<Origin>,
	allow_any: bool,
}
impl OriginPolicy {
	/// Policy restricted to the provided origins; the first one is the default target.
	pub fn allow_list<I>(origins: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = Origin>,
	{
		let mut allowed = Vec::new();

		for origin in origins {
			if !allowed.contains(&origin) {
				allowed.push(origin);
			}
		}

		if allowed.is_empty() {
			return Err(ConfigError::MissingAllowedOrigin);
		}

		Ok(Self { allowed, allow_any: false })
	}

	/// Wildcard policy for local development; codes are not origin-bound.
	pub fn any_insecure() -> Self {
		Self { allowed: Vec::new(), allow_any: true }
	}

	/// Whether this policy accepts every origin.
	pub fn is_wildcard(&self) -> bool {
		self.allow_any
	}

	/// Allow-listed origins in priority order.
	pub fn allowed(&self) -> &[Origin] {
		&self.allowed
	}

	/// Whether `origin` may receive codes.
	pub fn is_allowed(&self, origin: &Origin) -> bool {
		self.allow_any || self.allowed.contains(origin)
	}

	/// Resolves the out-of-band target for a login attempt.
	///
	/// A non-empty `hint` (origin or URL) must be allow-listed; without one the first
	/// allow-listed origin is used, or [`TargetOrigin::Any`] under the wildcard policy.
	pub fn resolve_target(&self, hint: Option<&str>) -> Result<TargetOrigin> {
		let hint = hint.map(str::trim).filter(|value| !value.is_empty());

		match hint {
			Some(raw) => {
				let origin = Url::parse(raw)
					.ok()
					.and_then(|url| Origin::of_url(&url).ok())
					.ok_or_else(|| Error::OriginNotAllowed { origin: raw.to_owned() })?;

				if self.is_allowed(&origin) {
					Ok(TargetOrigin::Exact(origin))
				} else {
					Err(Error::OriginNotAllowed { origin: origin.into() })
				}
			},
			None => match self.allowed.first() {
				Some(origin) => Ok(TargetOrigin::Exact(origin.clone())),
				None => Ok(TargetOrigin::Any),
			},
		}
	}

	/// Value for `Access-Control-Allow-Origin` given a request's `Origin` header.
	pub fn cors_allow_origin(&self, request_origin: Option<&str>) -> Option<String> {
		if self.allow_any {
			return Some("*".into());
		}

		let origin = Origin::parse(request_origin?).ok()?;

		self.allowed.contains(&origin).then(|| origin.into())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn origin(value: &str) -> Origin {
		Origin::parse(value).expect("Origin fixture should parse.")
	}

	#[test]
	fn parses_web_and_extension_origins() {
		assert_eq!(origin("https://Example.com").as_str(), "https://example.com");
		assert_eq!(origin("https://example.com:8443/").as_str(), "https://example.com:8443");
		assert_eq!(origin("https://example.com:443").as_str(), "https://example.com");
		assert_eq!(origin("chrome-extension://abcdef").as_str(), "chrome-extension://abcdef");
	}

	#[test]
	fn rejects_non_origins() {
		assert_eq!(Origin::parse("*"), Err(OriginError::Wildcard));
		assert!(matches!(Origin::parse("https://a.com/path"), Err(OriginError::NotAnOrigin { .. })));
		assert!(matches!(Origin::parse("https://a.com/?q=1"), Err(OriginError::NotAnOrigin { .. })));
		assert!(matches!(Origin::parse("not a url"), Err(OriginError::Unparsable { .. })));
	}

	#[test]
	fn resolve_target_prefers_allow_listed_hint() {
		let policy = OriginPolicy::allow_list([origin("https://a.com"), origin("https://b.com")])
			.expect("Allow-list should build.");

		assert_eq!(policy.resolve_target(None).ok(), Some(TargetOrigin::Exact(origin("https://a.com"))));
		assert_eq!(
			policy.resolve_target(Some("https://b.com/popup.html")).ok(),
			Some(TargetOrigin::Exact(origin("https://b.com")))
		);
		assert!(matches!(
			policy.resolve_target(Some("https://evil.com")),
			Err(Error::OriginNotAllowed { .. })
		));
		assert!(matches!(
			policy.resolve_target(Some("javascript:alert(1)")),
			Err(Error::OriginNotAllowed { .. })
		));
	}

	#[test]
	fn wildcard_policy_targets_any_without_binding() {
		let policy = OriginPolicy::any_insecure();
		let target = policy.resolve_target(Some("")).expect("Wildcard policy should resolve.");

		assert_eq!(target, TargetOrigin::Any);
		assert_eq!(target.as_post_message_target(), "*");
		assert!(target.binding().is_none());
		assert_eq!(policy.cors_allow_origin(None), Some("*".into()));
	}

	#[test]
	fn empty_allow_list_is_rejected() {
		assert!(matches!(
			OriginPolicy::allow_list(Vec::new()),
			Err(ConfigError::MissingAllowedOrigin)
		));
	}

	#[test]
	fn cors_echoes_only_allow_listed_origins() {
		let policy = OriginPolicy::allow_list([origin("https://a.com")])
			.expect("Allow-list should build.");

		assert_eq!(policy.cors_allow_origin(Some("https://a.com")), Some("https://a.com".into()));
		assert_eq!(policy.cors_allow_origin(Some("https://b.com")), None);
		assert_eq!(policy.cors_allow_origin(None), None);
	}
}
