//! Opaque bearer codes minted once per successful login.

// std
use std::borrow::Borrow;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const CODE_ENTROPY_BYTES: usize = 32;
const FINGERPRINT_DIGEST_BYTES: usize = 9;
const FINGERPRINT_LEN: usize = 12;

/// Single-use exchange code; a bearer secret for its lifetime.
///
/// `Debug` and `Display` redact the value. Use [`ExchangeCode::fingerprint`] to correlate log
/// lines and [`ExchangeCode::expose`] only when handing the code to its recipient.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeCode(String);
impl ExchangeCode {
	/// Length of a freshly generated code.
	pub const LEN: usize = 43;

	/// Draws a fresh code from the thread-local CSPRNG (256 bits, base64url without padding).
	pub fn generate() -> Self {
		let mut bytes = [0_u8; CODE_ENTROPY_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Wraps a code presented by a client. The value is not validated; unknown codes simply
	/// fail to redeem.
	pub fn presented(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw code. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Short, non-reversible identifier that is safe to log.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());

		URL_SAFE_NO_PAD.encode(&digest[..FINGERPRINT_DIGEST_BYTES])
	}
}
impl Borrow<str> for ExchangeCode {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl Debug for ExchangeCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ExchangeCode({})", self.fingerprint())
	}
}
impl Display for ExchangeCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn generated_codes_are_url_safe_and_distinct() {
		let codes: HashSet<String> =
			(0..1_000).map(|_| ExchangeCode::generate().expose().to_owned()).collect();

		assert_eq!(codes.len(), 1_000);

		for code in &codes {
			assert_eq!(code.len(), ExchangeCode::LEN);
			assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
		}
	}

	#[test]
	fn formatters_never_print_the_code() {
		let code = ExchangeCode::presented("plain-code");

		assert_eq!(format!("{code}"), "<redacted>");
		assert!(!format!("{code:?}").contains("plain-code"));
		assert_eq!(code.fingerprint().len(), FINGERPRINT_LEN);
	}

	#[test]
	fn fingerprint_is_stable_per_value() {
		let a = ExchangeCode::presented("same");
		let b = ExchangeCode::presented("same");

		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), ExchangeCode::presented("other").fingerprint());
	}

	#[test]
	fn fingerprint_is_a_base64url_digest_prefix() {
		let fingerprint = ExchangeCode::presented("abc").fingerprint();
		let digest = Sha256::digest(b"abc");

		assert_eq!(fingerprint.len(), FINGERPRINT_LEN);
		assert_eq!(
			URL_SAFE_NO_PAD.decode(&fingerprint).expect("Fingerprint should be base64url."),
			digest[..FINGERPRINT_DIGEST_BYTES].to_vec()
		);
	}
}
