//! Out-of-band delivery of exchange codes from the login page to the waiting client.
//!
//! In a browser this is `window.opener.postMessage`. The types here carry the same contract
//! for native clients and tests: the message holds only the code, the receiver trusts only
//! the backend's origin, and anything else is dropped.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{ExchangeCode, Origin},
};

/// `type` discriminator of the code message.
pub const AUTH_CODE_MESSAGE_TYPE: &str = "auth-code";

/// Wire shape of the out-of-band message: `{"type":"auth-code","code":"..."}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCodeMessage {
	/// Message discriminator.
	#[serde(rename = "type")]
	pub kind: String,
	/// The exchange code.
	pub code: ExchangeCode,
}
impl AuthCodeMessage {
	/// Wraps `code` in an `auth-code` message.
	pub fn new(code: ExchangeCode) -> Self {
		Self { kind: AUTH_CODE_MESSAGE_TYPE.into(), code }
	}

	/// Whether the discriminator is `auth-code`.
	pub fn is_auth_code(&self) -> bool {
		self.kind == AUTH_CODE_MESSAGE_TYPE
	}

	/// JSON rendering for embedding in the completion page.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}
}

/// Reasons a receiver refused or never got a message.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ChannelError {
	/// The sending side went away without delivering.
	#[error("Code channel closed before a message arrived.")]
	Closed,
	/// The message came from an origin other than the backend's.
	#[error("Message from unexpected origin `{origin}` was ignored.")]
	UnexpectedSender {
		/// Origin of the ignored message.
		origin: Origin,
	},
	/// The message was not an `auth-code` message.
	#[error("Message of type `{kind}` was ignored.")]
	UnexpectedMessage {
		/// Discriminator of the ignored message.
		kind: String,
	},
	/// The message carried an empty code.
	#[error("Message carried an empty exchange code.")]
	EmptyCode,
}

#[derive(Debug)]
struct Envelope {
	from: Origin,
	message: AuthCodeMessage,
}

/// Creates a one-shot channel whose receiver accepts messages only from `expected_sender`.
pub fn code_channel(expected_sender: Origin) -> (CodeSender, CodeReceiver) {
	let (tx, rx) = oneshot::channel();

	(CodeSender { tx }, CodeReceiver { expected_sender, rx })
}

/// Posting half, held by the login page.
#[derive(Debug)]
pub struct CodeSender {
	tx: oneshot::Sender<Envelope>,
}
impl CodeSender {
	/// Posts an `auth-code` message carrying `code`, as sent from `from`.
	///
	/// Delivery is fire-and-forget; a receiver that already went away is not an error.
	pub fn deliver(self, from: Origin, code: ExchangeCode) {
		self.post(from, AuthCodeMessage::new(code));
	}

	/// Posts an arbitrary message, as sent from `from`.
	pub fn post(self, from: Origin, message: AuthCodeMessage) {
		let _ = self.tx.send(Envelope { from, message });
	}
}

/// Listening half, held by the isolated client context.
#[derive(Debug)]
pub struct CodeReceiver {
	expected_sender: Origin,
	rx: oneshot::Receiver<Envelope>,
}
impl CodeReceiver {
	/// Origin this receiver trusts.
	pub fn expected_sender(&self) -> &Origin {
		&self.expected_sender
	}

	/// Waits for the message and returns its code if the message is trustworthy.
	pub async fn receive(self) -> Result<ExchangeCode, ChannelError> {
		let Envelope { from, message } = self.rx.await.map_err(|_| ChannelError::Closed)?;

		if from != self.expected_sender {
			return Err(ChannelError::UnexpectedSender { origin: from });
		}
		if !message.is_auth_code() {
			return Err(ChannelError::UnexpectedMessage { kind: message.kind });
		}
		if message.code.expose().is_empty() {
			return Err(ChannelError::EmptyCode);
		}

		Ok(message.code)
	}
}
