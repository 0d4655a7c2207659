#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use auth_handoff::{
	_preludet::*,
	auth::Payload,
	config::RelayConfig,
	handoff::HandoffCoordinator,
	login::{AuthorityEndpoints, AuthorityLoginBroker, LoginBroker, LoginError},
	store::{ExchangeStore, MemoryExchangeStore},
};

const REDIRECT_WITH_TOKENS: &str = "{\"type\":\"response\",\"response\":{\"mode\":\"fragment\",\"parameters\":{\"uri\":\"https://playvalorant.com/opt_in#access_token=access-xyz&scope=account&id_token=id-xyz&token_type=Bearer&expires_in=3600\"}}}";

fn broker_for(server: &MockServer) -> AuthorityLoginBroker {
	let base = Url::parse(&server.url("/")).expect("Mock server URL should parse.");
	let endpoints =
		AuthorityEndpoints::rooted_at(&base).expect("Loopback endpoints should validate.");

	AuthorityLoginBroker::new(endpoints).with_timeout(Duration::seconds(5))
}

async fn mock_session(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/authorization");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "asid=session-1; Path=/")
				.body("{\"type\":\"auth\"}");
		})
		.await
}

#[tokio::test]
async fn login_collects_the_full_bundle() {
	let server = MockServer::start_async().await;
	let session = mock_session(&server).await;
	let credentials = server
		.mock_async(|when, then| {
			when.method(PUT).path("/api/v1/authorization").header("content-type", "application/json");
			then.status(200).header("content-type", "application/json").body(REDIRECT_WITH_TOKENS);
		})
		.await;
	let entitlements = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token/v1").header("authorization", "Bearer access-xyz");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"entitlements_token\":\"ent-xyz\"}");
		})
		.await;
	let userinfo = server
		.mock_async(|when, then| {
			when.method(POST).path("/userinfo").header("authorization", "Bearer access-xyz");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"sub\":\"puuid-xyz\",\"country\":\"usa\"}");
		})
		.await;
	let bundle = broker_for(&server)
		.perform_login("alice", "hunter2")
		.await
		.expect("Login against the mock authority should succeed.");

	session.assert_async().await;
	credentials.assert_async().await;
	entitlements.assert_async().await;
	userinfo.assert_async().await;

	let payload = bundle.into_payload();

	assert_eq!(payload.get(Payload::ACCESS_TOKEN), Some("access-xyz"));
	assert_eq!(payload.get(Payload::ID_TOKEN), Some("id-xyz"));
	assert_eq!(payload.get(Payload::ENTITLEMENTS_TOKEN), Some("ent-xyz"));
	assert_eq!(payload.get(Payload::SUBJECT_ID), Some("puuid-xyz"));
}

#[tokio::test]
async fn authority_error_body_is_a_rejection() {
	let server = MockServer::start_async().await;
	let _session = mock_session(&server).await;
	let _credentials = server
		.mock_async(|when, then| {
			when.method(PUT).path("/api/v1/authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"type\":\"auth\",\"error\":\"auth_failure\"}");
		})
		.await;
	let entitlements = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token/v1");
			then.status(200).body("{}");
		})
		.await;
	let err = broker_for(&server)
		.perform_login("alice", "wrong")
		.await
		.expect_err("An error body must reject the login.");

	assert!(matches!(err, LoginError::Rejected { ref reason } if reason == "auth_failure"));
	assert!(err.is_rejection());
	assert_eq!(entitlements.hits_async().await, 0);
}

#[tokio::test]
async fn authority_outage_is_an_unexpected_status() {
	let server = MockServer::start_async().await;
	let _session = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/authorization");
			then.status(503).body("maintenance");
		})
		.await;
	let err = broker_for(&server)
		.perform_login("alice", "hunter2")
		.await
		.expect_err("A 5xx session response must fail the login.");

	assert!(matches!(err, LoginError::UnexpectedStatus { endpoint: "authorization", status: 503 }));
	assert!(!err.is_rejection());
}

#[tokio::test]
async fn redirect_without_access_token_fails_closed_in_the_coordinator() {
	let server = MockServer::start_async().await;
	let _session = mock_session(&server).await;
	let _credentials = server
		.mock_async(|when, then| {
			when.method(PUT).path("/api/v1/authorization");
			then.status(200).header("content-type", "application/json").body(
				"{\"type\":\"response\",\"response\":{\"parameters\":{\"uri\":\"https://playvalorant.com/opt_in#id_token=id-only\"}}}",
			);
		})
		.await;
	let entitlements = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token/v1");
			then.status(200).body("{}");
		})
		.await;
	let config = RelayConfig::builder()
		.allow_origin(extension_origin())
		.build()
		.expect("Relay config should validate.");
	let store = Arc::new(MemoryExchangeStore::default());
	let coordinator = HandoffCoordinator::new(store.clone(), Arc::new(broker_for(&server)), &config);
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");
	let err = coordinator
		.login(handle, "alice", "hunter2")
		.await
		.expect_err("A bundle without an access token must not issue a code.");

	assert!(matches!(err, Error::IncompleteCredential { field: "access_token" }));
	assert!(store.is_empty());
	assert_eq!(entitlements.hits_async().await, 0);
}
