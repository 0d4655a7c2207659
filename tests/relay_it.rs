#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use tokio::{sync::oneshot, task::JoinHandle};
// self
use auth_handoff::{
	_preludet::*,
	auth::{ExchangeCode, Origin, Payload},
	channel::{ChannelError, code_channel},
	ext::RateLimitPolicy,
	relay::{ClientRelay, CredentialSink, MemoryCredentialSink, RelayError},
	server::{self, AppState},
};

async fn start_backend() -> (Url, oneshot::Sender<()>, JoinHandle<()>) {
	let (coordinator, _) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let listener = server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
		.await
		.expect("Test listener should bind.");
	let addr = listener.local_addr().expect("Test listener should expose its address.");
	let (stop_tx, stop_rx) = oneshot::channel::<()>();
	let task = tokio::spawn(async move {
		let state = AppState::new(coordinator, RateLimitPolicy::default());

		server::serve(listener, state, async move {
			let _ = stop_rx.await;
		})
		.await
		.expect("Test server should shut down cleanly.");
	});
	let base = Url::parse(&format!("http://{addr}/")).expect("Backend URL should parse.");

	(base, stop_tx, task)
}

async fn login_code(base: &Url) -> ExchangeCode {
	let page = ReqwestClient::new()
		.post(base.join("auth/submit").expect("Submit URL should join."))
		.form(&[("username", "alice"), ("password", "hunter2")])
		.send()
		.await
		.expect("Submit request should complete.")
		.text()
		.await
		.expect("Completion page should be readable.");
	let start = page.find("\"code\":\"").expect("Completion page should embed the code.") + 8;
	let len = page[start..].find('"').expect("Embedded code should be terminated.");

	ExchangeCode::presented(&page[start..start + len])
}

#[tokio::test]
async fn relay_completes_the_handoff_once() {
	let (base, stop, task) = start_backend().await;
	let backend_origin = Origin::of_url(&base).expect("Backend origin should derive.");
	let sink = Arc::new(MemoryCredentialSink::default());
	let relay = ClientRelay::new(&base, sink.clone())
		.expect("Relay should build.")
		.with_origin(extension_origin());
	let code = login_code(&base).await;
	let (tx, rx) = code_channel(backend_origin.clone());

	tx.deliver(backend_origin, code.clone());

	let payload = relay.complete(rx).await.expect("Relay should redeem the delivered code.");

	assert_eq!(payload.get(Payload::ACCESS_TOKEN), Some("access-abc"));
	assert_eq!(sink.latest(), Some(payload));
	assert!(matches!(relay.redeem(&code).await, Err(RelayError::CodeRejected)));

	let _ = stop.send(());

	task.await.expect("Test server task should join.");
}

#[tokio::test]
async fn relay_ignores_messages_from_other_origins() {
	let (base, stop, task) = start_backend().await;
	let backend_origin = Origin::of_url(&base).expect("Backend origin should derive.");
	let foreign = Origin::parse("https://evil.example").expect("Origin fixture should parse.");
	let sink = Arc::new(MemoryCredentialSink::default());
	let relay = ClientRelay::new(&base, sink.clone()).expect("Relay should build.");
	let code = login_code(&base).await;
	let (tx, rx) = code_channel(backend_origin);

	tx.deliver(foreign.clone(), code.clone());

	let err = relay.complete(rx).await.expect_err("Foreign messages must be ignored.");

	assert!(matches!(err, RelayError::Channel(ChannelError::UnexpectedSender { ref origin }) if *origin == foreign));
	assert!(sink.latest().is_none());
	assert!(relay.redeem(&code).await.is_ok(), "The ignored code must still be redeemable.");

	let _ = stop.send(());

	task.await.expect("Test server task should join.");
}

#[tokio::test]
async fn payload_without_access_token_is_not_persisted() {
	let server = MockServer::start_async().await;
	let _token = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("code", "abc");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id_token\":\"id-only\"}");
		})
		.await;
	let base = Url::parse(&server.url("/")).expect("Mock server URL should parse.");
	let sink = Arc::new(MemoryCredentialSink::default());
	let relay = ClientRelay::new(&base, sink.clone()).expect("Relay should build.");
	let err = relay
		.redeem(&ExchangeCode::presented("abc"))
		.await
		.expect_err("Payloads without an access token must be refused.");

	assert!(matches!(err, RelayError::MissingAccessToken));
	assert!(sink.latest().is_none());
}

#[tokio::test]
async fn backend_statuses_map_to_relay_errors() {
	let server = MockServer::start_async().await;
	let _missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("code", "empty");
			then.status(400).body("{\"error\":\"missing_code\"}");
		})
		.await;
	let _outage = server
		.mock_async(|when, then| {
			when.method(GET).path("/token").query_param("code", "outage");
			then.status(503);
		})
		.await;
	let base = Url::parse(&server.url("/")).expect("Mock server URL should parse.");
	let sink: Arc<dyn CredentialSink> = Arc::new(MemoryCredentialSink::default());
	let relay = ClientRelay::new(&base, sink).expect("Relay should build.");

	assert!(matches!(
		relay.redeem(&ExchangeCode::presented("empty")).await,
		Err(RelayError::MissingCode)
	));
	assert!(matches!(
		relay.redeem(&ExchangeCode::presented("outage")).await,
		Err(RelayError::UnexpectedStatus { status: 503 })
	));
}
