//! Raw credential bundle returned by a [`LoginBroker`](crate::login::LoginBroker).

// self
use crate::{
	_prelude::*,
	auth::{Payload, TokenSecret},
};

/// Tokens and subject identifier produced by a successful interactive login.
///
/// Every field is optional because the authority may omit any of them; the coordinator
/// decides which absences are fatal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
	/// Bearer access token.
	pub access_token: Option<TokenSecret>,
	/// Identity token.
	pub id_token: Option<TokenSecret>,
	/// Entitlements token.
	pub entitlements_token: Option<TokenSecret>,
	/// Stable subject identifier (the account's puuid).
	pub subject_id: Option<String>,
}
impl Credentials {
	/// Returns a builder for credential bundles.
	pub fn builder() -> CredentialsBuilder {
		CredentialsBuilder::default()
	}

	/// Whether a usable access token is present.
	pub fn has_access_token(&self) -> bool {
		self.access_token.as_ref().is_some_and(|secret| !secret.is_blank())
	}

	/// Flattens the bundle into the opaque payload, skipping absent fields.
	pub fn into_payload(self) -> Payload {
		let mut payload = Payload::new();
		let Credentials { access_token, id_token, entitlements_token, subject_id } = self;

		if let Some(secret) = access_token {
			payload.insert(Payload::ACCESS_TOKEN, secret.into_inner());
		}
		if let Some(secret) = id_token {
			payload.insert(Payload::ID_TOKEN, secret.into_inner());
		}
		if let Some(secret) = entitlements_token {
			payload.insert(Payload::ENTITLEMENTS_TOKEN, secret.into_inner());
		}
		if let Some(subject) = subject_id {
			payload.insert(Payload::SUBJECT_ID, subject);
		}

		payload
	}
}

/// Builder for [`Credentials`].
#[derive(Debug, Default)]
pub struct CredentialsBuilder(Credentials);
impl CredentialsBuilder {
	/// Sets the access token.
	pub fn access_token(mut self, value: impl Into<String>) -> Self {
		self.0.access_token = Some(TokenSecret::new(value));

		self
	}

	/// Sets the identity token.
	pub fn id_token(mut self, value: impl Into<String>) -> Self {
		self.0.id_token = Some(TokenSecret::new(value));

		self
	}

	/// Sets the entitlements token.
	pub fn entitlements_token(mut self, value: impl Into<String>) -> Self {
		self.0.entitlements_token = Some(TokenSecret::new(value));

		self
	}

	/// Sets the subject identifier.
	pub fn subject_id(mut self, value: impl Into<String>) -> Self {
		self.0.subject_id = Some(value.into());

		self
	}

	/// Finishes the bundle.
	pub fn build(self) -> Credentials {
		self.0
	}
}
