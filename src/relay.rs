//! Thin client for the isolated context: receive the code, redeem it once, persist the result.

// crates.io
use reqwest::{StatusCode, header::ORIGIN};
// self
use crate::{
	_prelude::*,
	auth::{ExchangeCode, Origin, Payload},
	channel::{ChannelError, CodeReceiver},
	error::ConfigError,
};

/// Destination for a redeemed credential bundle (e.g. extension-local storage).
pub trait CredentialSink
where
	Self: Send + Sync,
{
	/// Persists `payload`, replacing whatever was stored before.
	fn persist(&self, payload: Payload);
}

/// In-memory [`CredentialSink`] that keeps the latest bundle.
#[derive(Debug, Default)]
pub struct MemoryCredentialSink(Mutex<Option<Payload>>);
impl MemoryCredentialSink {
	/// Most recently persisted bundle.
	pub fn latest(&self) -> Option<Payload> {
		self.0.lock().clone()
	}
}
impl CredentialSink for MemoryCredentialSink {
	fn persist(&self, payload: Payload) {
		*self.0.lock() = Some(payload);
	}
}

/// Failures surfaced by [`ClientRelay`].
#[derive(Debug, ThisError)]
pub enum RelayError {
	/// Waiting for the out-of-band message failed.
	#[error(transparent)]
	Channel(#[from] ChannelError),
	/// The redemption request could not be sent or read.
	#[error("Redemption request failed.")]
	Transport {
		/// Underlying transport failure.
		#[source]
		source: ReqwestError,
	},
	/// The backend reported that no code was sent.
	#[error("Backend reported a missing exchange code.")]
	MissingCode,
	/// The code was unknown, already used, or expired.
	#[error("Exchange code was not found or has expired.")]
	CodeRejected,
	/// The backend answered with an unexpected status.
	#[error("Backend answered with unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
	},
	/// The redeemed payload could not be decoded.
	#[error("Redeemed payload is malformed at {path}.")]
	MalformedPayload {
		/// JSON path of the failure.
		path: String,
		/// Underlying parse failure.
		#[source]
		source: serde_json::Error,
	},
	/// The redeemed payload lacks an access token.
	#[error("Redeemed payload has no access token.")]
	MissingAccessToken,
}
impl From<ReqwestError> for RelayError {
	fn from(source: ReqwestError) -> Self {
		Self::Transport { source }
	}
}

/// Redeems codes against the handoff backend on behalf of the isolated context.
#[derive(Clone)]
pub struct ClientRelay {
	token_endpoint: Url,
	http: ReqwestClient,
	sink: Arc<dyn CredentialSink>,
	own_origin: Option<Origin>,
}
impl ClientRelay {
	/// Creates a relay for the backend rooted at `backend`.
	pub fn new(backend: &Url, sink: Arc<dyn CredentialSink>) -> Result<Self, ConfigError> {
		let token_endpoint = backend
			.join("token")
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let http = ReqwestClient::builder().build()?;

		Ok(Self { token_endpoint, http, sink, own_origin: None })
	}

	/// Sends `origin` as the `Origin` header on redemption.
	pub fn with_origin(mut self, origin: Origin) -> Self {
		self.own_origin = Some(origin);

		self
	}

	/// Replaces the HTTP client.
	pub fn with_http_client(mut self, http: ReqwestClient) -> Self {
		self.http = http;

		self
	}

	/// Waits for the code on `receiver`, then redeems it.
	pub async fn complete(&self, receiver: CodeReceiver) -> Result<Payload, RelayError> {
		let code = receiver.receive().await?;

		self.redeem(&code).await
	}

	/// Redeems `code` once and persists the bundle through the sink.
	pub async fn redeem(&self, code: &ExchangeCode) -> Result<Payload, RelayError> {
		let mut request = self.http.get(self.token_endpoint.clone()).query(&[("code", code.expose())]);

		if let Some(origin) = &self.own_origin {
			request = request.header(ORIGIN, origin.as_str());
		}

		let response = request.send().await?;

		match response.status() {
			StatusCode::OK => {},
			StatusCode::BAD_REQUEST => return Err(RelayError::MissingCode),
			StatusCode::NOT_FOUND => return Err(RelayError::CodeRejected),
			status => return Err(RelayError::UnexpectedStatus { status: status.as_u16() }),
		}

		let body = response.bytes().await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);
		let payload: Payload = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
			RelayError::MalformedPayload { path: e.path().to_string(), source: e.into_inner() }
		})?;

		if payload.get(Payload::ACCESS_TOKEN).is_none_or(str::is_empty) {
			return Err(RelayError::MissingAccessToken);
		}

		self.sink.persist(payload.clone());

		Ok(payload)
	}
}
impl Debug for ClientRelay {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientRelay")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("own_origin", &self.own_origin)
			.finish_non_exhaustive()
	}
}
