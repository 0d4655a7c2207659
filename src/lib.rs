//! One-time exchange codes for cross-context credential handoff.
//!
//! A login popup obtains a credential bundle, the crate mints a short-lived single-use code
//! for it, the code crosses an out-of-band channel to an isolated extension context, and that
//! context redeems the code exactly once for the bundle.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod channel;
pub mod config;
pub mod error;
pub mod ext;
pub mod handoff;
pub mod login;
pub mod obs;
#[cfg(feature = "reqwest")] pub mod relay;
pub mod server;
pub mod store;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Credentials, Origin},
		config::RelayConfig,
		handoff::HandoffCoordinator,
		login::{LoginBroker, LoginError, LoginFuture},
		store::{ExchangeStore, MemoryExchangeStore},
	};

	/// Scripted reply produced by [`ScriptedLoginBroker`].
	#[derive(Clone, Debug)]
	pub enum ScriptedLogin {
		/// The authority accepted the credentials and returned this bundle.
		Accept(Credentials),
		/// The authority rejected the credentials.
		Reject(String),
	}

	/// [`LoginBroker`] fake that replays one configured reply and records every username it saw.
	#[derive(Debug)]
	pub struct ScriptedLoginBroker {
		reply: ScriptedLogin,
		seen: Mutex<Vec<String>>,
	}
	impl ScriptedLoginBroker {
		/// Broker that accepts any username/password with the provided credentials.
		pub fn accepting(credentials: Credentials) -> Self {
			Self { reply: ScriptedLogin::Accept(credentials), seen: Default::default() }
		}

		/// Broker that rejects every attempt with the provided reason.
		pub fn rejecting(reason: impl Into<String>) -> Self {
			Self { reply: ScriptedLogin::Reject(reason.into()), seen: Default::default() }
		}

		/// Usernames observed so far.
		pub fn usernames(&self) -> Vec<String> {
			self.seen.lock().clone()
		}
	}
	impl LoginBroker for ScriptedLoginBroker {
		fn perform_login<'a>(&'a self, username: &'a str, _password: &'a str) -> LoginFuture<'a> {
			self.seen.lock().push(username.to_owned());

			let reply = self.reply.clone();

			Box::pin(async move {
				match reply {
					ScriptedLogin::Accept(credentials) => Ok(credentials),
					ScriptedLogin::Reject(reason) => Err(LoginError::Rejected { reason }),
				}
			})
		}
	}

	/// Complete credential bundle used across tests.
	pub fn full_credentials() -> Credentials {
		Credentials::builder()
			.access_token("access-abc")
			.id_token("id-abc")
			.entitlements_token("entitlements-abc")
			.subject_id("puuid-abc")
			.build()
	}

	/// Allow-listed origin used across tests.
	pub fn extension_origin() -> Origin {
		Origin::parse("chrome-extension://abcdefghijklmnop")
			.expect("Extension origin fixture should parse.")
	}

	/// Builds a coordinator over a fresh memory store with `extension_origin` allow-listed.
	pub fn build_test_coordinator(
		broker: Arc<dyn LoginBroker>,
	) -> (HandoffCoordinator, Arc<MemoryExchangeStore>) {
		let config = RelayConfig::builder()
			.allow_origin(extension_origin())
			.build()
			.expect("Test relay config should validate.");
		let store_backend = Arc::new(MemoryExchangeStore::default());
		let store: Arc<dyn ExchangeStore> = store_backend.clone();
		let coordinator = HandoffCoordinator::new(store, broker, &config);

		(coordinator, store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		net::SocketAddr,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
use {color_eyre as _, tracing_subscriber as _};
#[cfg(test)] use httpmock as _;
