//! Handoff attempt identifiers.

// std
use std::ops::Deref;
// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const ATTEMPT_ID_LEN: usize = 16;
const ATTEMPT_ID_MAX_LEN: usize = 64;

/// Identifier for a single handoff attempt; safe to log, carries no authority.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttemptId(String);
impl AttemptId {
	/// Creates an identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Draws a fresh random identifier.
	pub fn generate() -> Self {
		Self(rand::rng().sample_iter(Alphanumeric).take(ATTEMPT_ID_LEN).map(char::from).collect())
	}
}
impl Deref for AttemptId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AttemptId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl From<AttemptId> for String {
	fn from(value: AttemptId) -> Self {
		value.0
	}
}
impl TryFrom<String> for AttemptId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for AttemptId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Attempt({})", self.0)
	}
}
impl Display for AttemptId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for AttemptId {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Attempt identifier cannot be empty.")]
	Empty,
	/// The identifier contains characters outside `[A-Za-z0-9_-]`.
	#[error("Attempt identifier contains unsupported characters.")]
	InvalidCharacters,
	/// The identifier exceeded the allowed character count.
	#[error("Attempt identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if !view.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
		return Err(IdentifierError::InvalidCharacters);
	}
	if view.len() > ATTEMPT_ID_MAX_LEN {
		return Err(IdentifierError::TooLong { max: ATTEMPT_ID_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn generated_identifiers_validate() {
		let id = AttemptId::generate();

		assert_eq!(id.len(), ATTEMPT_ID_LEN);
		assert_eq!(AttemptId::new(id.as_ref()), Ok(id));
	}

	#[test]
	fn rejects_markup_and_whitespace() {
		assert_eq!(AttemptId::new(""), Err(IdentifierError::Empty));
		assert_eq!(AttemptId::new("a b"), Err(IdentifierError::InvalidCharacters));
		assert_eq!(AttemptId::new("<script>"), Err(IdentifierError::InvalidCharacters));
		assert!(AttemptId::new("a".repeat(ATTEMPT_ID_MAX_LEN + 1)).is_err());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let id: AttemptId =
			serde_json::from_str("\"attempt-1\"").expect("Attempt id should deserialize.");

		assert_eq!(id.as_ref(), "attempt-1");
		assert!(serde_json::from_str::<AttemptId>("\"with space\"").is_err());
	}
}
