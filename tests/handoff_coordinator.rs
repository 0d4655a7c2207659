// self
use auth_handoff::{
	_preludet::*,
	auth::{Credentials, Origin, Payload, TargetOrigin},
	handoff::HandoffState,
	login::LoginError,
	store::ExchangeStore,
};

#[tokio::test]
async fn successful_login_issues_a_single_use_code() {
	let broker = Arc::new(ScriptedLoginBroker::accepting(full_credentials()));
	let (coordinator, store) = build_test_coordinator(broker.clone());
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");

	assert_eq!(handle.target(), &TargetOrigin::Exact(extension_origin()));

	let issued =
		coordinator.login(handle, "alice", "hunter2").await.expect("Login should issue a code.");

	assert_eq!(broker.usernames(), vec!["alice".to_owned()]);
	assert_eq!(issued.attempt.state(), HandoffState::CodeIssued);
	assert_eq!(
		issued.attempt.history(),
		&[HandoffState::Idle, HandoffState::LoginInFlight, HandoffState::Authenticated]
	);
	assert_eq!(store.len(), 1);

	let message = issued.message();

	assert!(message.is_auth_code());
	assert_eq!(message.code, issued.code);

	let payload = coordinator.redeem(issued.code.expose()).expect("First redemption should succeed.");

	assert_eq!(payload.get(Payload::ACCESS_TOKEN), Some("access-abc"));
	assert_eq!(payload.get(Payload::ID_TOKEN), Some("id-abc"));
	assert_eq!(payload.get(Payload::ENTITLEMENTS_TOKEN), Some("entitlements-abc"));
	assert_eq!(payload.get(Payload::SUBJECT_ID), Some("puuid-abc"));
	assert!(matches!(coordinator.redeem(issued.code.expose()), Err(Error::CodeNotFound)));
	assert_eq!(coordinator.metrics.issued(), 1);
	assert_eq!(coordinator.metrics.redeemed(), 1);
	assert_eq!(coordinator.metrics.redemption_misses(), 1);
}

#[tokio::test]
async fn rejected_login_issues_nothing() {
	let broker = Arc::new(ScriptedLoginBroker::rejecting("auth_failure"));
	let (coordinator, store) = build_test_coordinator(broker);
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");
	let err = coordinator
		.login(handle, "alice", "wrong")
		.await
		.expect_err("Rejected login must not issue a code.");

	match err {
		Error::LoginFailed { reason } => {
			assert!(!reason.contains("wrong"));
			assert!(!reason.contains("alice"));
		},
		other => panic!("unexpected error: {other:?}"),
	}

	assert!(store.is_empty());
	assert_eq!(coordinator.metrics.login_failures(), 1);
	assert_eq!(coordinator.metrics.issued(), 0);
}

#[test]
fn incomplete_credentials_fail_closed() {
	let (coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let bundle = Credentials::builder().id_token("id-only").subject_id("puuid-abc").build();
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");
	let err = coordinator
		.complete_login(handle, Ok(bundle))
		.expect_err("A bundle without an access token must not issue a code.");

	assert!(matches!(err, Error::IncompleteCredential { field: "access_token" }));
	assert!(store.is_empty());
	assert_eq!(coordinator.metrics.incomplete_credentials(), 1);
}

#[test]
fn blank_access_token_fails_closed() {
	let (coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let bundle = Credentials::builder().access_token("   ").build();
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");

	assert!(coordinator.complete_login(handle, Ok(bundle)).is_err());
	assert!(store.is_empty());
}

#[test]
fn transport_failures_are_reported_without_detail() {
	let (coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let handle = coordinator.begin_login(None).expect("Default target should resolve.");
	let outcome = Err(LoginError::UnexpectedStatus { endpoint: "authorization", status: 503 });
	let err = coordinator.complete_login(handle, outcome).expect_err("Authority outage must fail.");

	assert!(
		matches!(err, Error::LoginFailed { ref reason } if reason == "the authority could not complete the login")
	);
	assert!(store.is_empty());
}

#[test]
fn redemption_requires_a_code() {
	let (coordinator, _) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));

	assert!(matches!(coordinator.redeem_presented(None, None), Err(Error::MissingCode)));
	assert!(matches!(coordinator.redeem_presented(Some(""), None), Err(Error::MissingCode)));
	assert!(matches!(coordinator.redeem("never-issued"), Err(Error::CodeNotFound)));
}

#[test]
fn unlisted_redirect_hint_is_refused() {
	let (coordinator, _) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let err = coordinator
		.begin_login(Some("https://evil.example/phish"))
		.expect_err("Unlisted origins must not receive codes.");

	assert!(matches!(err, Error::OriginNotAllowed { .. }));

	let handle = coordinator
		.begin_login(Some("chrome-extension://abcdefghijklmnop/popup.html"))
		.expect("Allow-listed URL hint should resolve to its origin.");

	assert_eq!(handle.target().as_post_message_target(), "chrome-extension://abcdefghijklmnop");
}

#[tokio::test]
async fn issued_codes_are_bound_to_their_target() {
	let (coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let foreign = Origin::parse("https://evil.example").expect("Origin fixture should parse.");
	let first = coordinator
		.login(coordinator.begin_login(None).expect("Target should resolve."), "alice", "pw")
		.await
		.expect("Login should issue a code.");

	assert!(matches!(
		coordinator.redeem_presented(Some(first.code.expose()), Some(&foreign)),
		Err(Error::CodeNotFound)
	));
	assert!(store.is_empty(), "A wrong-origin presentation must burn the code.");

	let second = coordinator
		.login(coordinator.begin_login(None).expect("Target should resolve."), "alice", "pw")
		.await
		.expect("Login should issue a code.");

	coordinator
		.redeem_presented(Some(second.code.expose()), Some(&extension_origin()))
		.expect("Bound origin should redeem its code.");
}

#[tokio::test]
async fn sweeper_reclaims_unredeemed_codes() {
	let (mut coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));

	coordinator.code_ttl = Duration::milliseconds(20);
	coordinator.sweep_interval = Duration::milliseconds(10);

	let sweeper = coordinator.spawn_sweeper();

	coordinator
		.login(coordinator.begin_login(None).expect("Target should resolve."), "alice", "pw")
		.await
		.expect("Login should issue a code.");

	assert_eq!(store.len(), 1);

	tokio::time::sleep(std::time::Duration::from_millis(150)).await;

	assert!(store.is_empty(), "Sweeper should delete the expired entry within the grace bound.");
	assert_eq!(coordinator.metrics.expired(), 1);

	sweeper.shutdown().await;
}

#[tokio::test]
async fn redemption_closes_the_attempt_as_redeemed() {
	let (coordinator, _) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let issued = coordinator
		.login(coordinator.begin_login(None).expect("Target should resolve."), "alice", "pw")
		.await
		.expect("Login should issue a code.");
	let redemption = coordinator
		.redeem_presented(Some(issued.code.expose()), Some(&extension_origin()))
		.expect("Bound origin should redeem its code.");
	let attempt = redemption.attempt.expect("Coordinator-issued codes should carry their attempt.");

	assert_eq!(attempt.id(), issued.attempt.id());
	assert_eq!(attempt.state(), HandoffState::Redeemed);
	assert_eq!(
		attempt.history(),
		&[
			HandoffState::Idle,
			HandoffState::LoginInFlight,
			HandoffState::Authenticated,
			HandoffState::CodeIssued
		]
	);
	assert_eq!(redemption.payload.get(Payload::ACCESS_TOKEN), Some("access-abc"));
}

#[tokio::test]
async fn sweep_closes_unredeemed_attempts_as_expired() {
	let (coordinator, store) =
		build_test_coordinator(Arc::new(ScriptedLoginBroker::accepting(full_credentials())));
	let issued = coordinator
		.login(coordinator.begin_login(None).expect("Target should resolve."), "alice", "pw")
		.await
		.expect("Login should issue a code.");

	assert!(coordinator.sweep_at(OffsetDateTime::now_utc()).is_empty());

	let expired = coordinator.sweep_at(OffsetDateTime::now_utc() + coordinator.code_ttl);

	assert_eq!(expired.len(), 1);
	assert_eq!(expired[0].id(), issued.attempt.id());
	assert_eq!(expired[0].state(), HandoffState::Expired);
	assert!(store.is_empty());
	assert_eq!(coordinator.metrics.expired(), 1);
	assert!(matches!(coordinator.redeem(issued.code.expose()), Err(Error::CodeNotFound)));
}
