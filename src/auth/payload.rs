//! Opaque string-to-string bundle carried from the login context to the redeeming context.

// self
use crate::_prelude::*;

/// Credential bundle released on redemption.
///
/// The store and coordinator never interpret the entries; they only move the map. `Debug`
/// prints the keys and hides every value.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, String>);
impl Payload {
	/// Key holding the access token.
	pub const ACCESS_TOKEN: &'static str = "access_token";
	/// Key holding the entitlements token.
	pub const ENTITLEMENTS_TOKEN: &'static str = "entitlements_token";
	/// Key holding the identity token.
	pub const ID_TOKEN: &'static str = "id_token";
	/// Key holding the subject identifier.
	pub const SUBJECT_ID: &'static str = "puuid";

	/// Creates an empty payload.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds or replaces an entry, returning the payload for chaining.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Adds or replaces an entry.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	/// Looks up an entry.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Whether an entry exists for `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Iterates over the keys in sorted order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the payload has no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Consumes the payload and returns the raw map.
	pub fn into_inner(self) -> BTreeMap<String, String> {
		self.0
	}
}
impl<K, V> FromIterator<(K, V)> for Payload
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl Debug for Payload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Payload").field("keys", &self.0.keys().collect::<Vec<_>>()).finish()
	}
}
