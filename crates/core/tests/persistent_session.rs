// Persistent Session Integration Tests
//
// Operations must reuse an open persistent session as is and never open a
// connection of their own while one is available.

mod support;

use std::sync::Arc;

use serde_json::{Value, json};
use support::{FixedProvider, Recorded, RecordingSession, ScriptedRouter};
use wamp::{CallOptions, CallResult, ClientConfig, ClientSessionManager, Kwargs, PublishOptions, SessionSlot, SessionSource};

fn config() -> ClientConfig {
	ClientConfig::new("realm1", "127.0.0.1", 8080)
}

#[tokio::test]
async fn test_publish_reuses_persistent_session() {
	let router = ScriptedRouter::new();
	let session = RecordingSession::new(CallResult::default());
	let slot = Arc::new(SessionSlot::new());
	slot.install(session.clone()).unwrap();

	let manager = ClientSessionManager::builder(config(), router.provider())
		.persistent(slot)
		.build()
		.unwrap();

	let mut kwargs = Kwargs::new();
	kwargs.insert("room".to_string(), json!("lobby"));
	let options = PublishOptions::new().exclude_me(false);

	let pending = manager.publish("chat.message", &["hello"], &kwargs, options.clone()).unwrap();
	assert_eq!(pending.source(), SessionSource::Persistent);
	pending.await.unwrap();

	assert_eq!(
		session.requests.lock().clone(),
		vec![Recorded::Publish {
			topic: "chat.message".to_string(),
			args: vec![json!("hello")],
			kwargs,
			options,
		}]
	);
	assert!(router.connections().is_empty());
}

#[tokio::test]
async fn test_persistent_publish_keeps_caller_options() {
	let router = ScriptedRouter::new();
	let session = RecordingSession::new(CallResult::default());
	let manager = ClientSessionManager::builder(config(), router.provider())
		.persistent(Arc::new(FixedProvider {
			initialized: true,
			session: Some(session.clone()),
		}))
		.build()
		.unwrap();

	manager
		.publish("chat.message", &json!("hi"), &Value::Null, PublishOptions::new())
		.unwrap()
		.await
		.unwrap();

	match session.requests.lock().first() {
		Some(Recorded::Publish { options, args, .. }) => {
			assert_eq!(options.acknowledge, None);
			assert_eq!(args, &vec![json!("hi")]);
		}
		other => panic!("Expected publish, got {other:?}"),
	}
}

#[tokio::test]
async fn test_call_forwards_canonical_args_and_returns_remote_result() {
	let router = ScriptedRouter::new();
	let remote = CallResult {
		args: vec![json!(5), json!({ "exact": true })],
		kwargs: Kwargs::new(),
	};
	let session = RecordingSession::new(remote.clone());
	let manager = ClientSessionManager::builder(config(), router.provider())
		.persistent(Arc::new(FixedProvider {
			initialized: true,
			session: Some(session.clone()),
		}))
		.build()
		.unwrap();

	let pending = manager
		.call_with("add", &(2, 3), &json!({ "precision": 0 }), CallOptions::new().timeout(500))
		.unwrap();
	assert_eq!(pending.source(), SessionSource::Persistent);
	assert_eq!(pending.await.unwrap(), remote);

	match session.requests.lock().first() {
		Some(Recorded::Call { procedure, args, kwargs }) => {
			assert_eq!(procedure, "add");
			assert_eq!(args, &vec![json!(2), json!(3)]);
			assert_eq!(kwargs.get("precision"), Some(&json!(0)));
		}
		other => panic!("Expected call, got {other:?}"),
	}
	assert!(router.connections().is_empty());
}

#[tokio::test]
async fn test_uninitialized_provider_falls_back_to_ephemeral() {
	let router = ScriptedRouter::new();
	let session = RecordingSession::new(CallResult::default());
	let manager = ClientSessionManager::builder(config(), router.provider())
		.persistent(Arc::new(FixedProvider {
			initialized: false,
			session: Some(session.clone()),
		}))
		.build()
		.unwrap();

	let pending = manager.call("add", &[2, 3]).unwrap();
	assert_eq!(pending.source(), SessionSource::Ephemeral);
	assert_eq!(pending.await.unwrap().first(), Some(&json!(5)));

	assert!(session.requests.lock().is_empty());
	assert_eq!(router.connections().len(), 1);
}

#[tokio::test]
async fn test_taken_slot_falls_back_to_ephemeral() {
	let router = ScriptedRouter::new();
	let slot = Arc::new(SessionSlot::new());
	slot.install(RecordingSession::new(CallResult::default())).unwrap();

	let manager = ClientSessionManager::builder(config(), router.provider())
		.persistent(slot.clone())
		.build()
		.unwrap();

	assert!(slot.take().is_some());

	let pending = manager.publish("chat.message", &["hello"], &(), PublishOptions::new()).unwrap();
	assert_eq!(pending.source(), SessionSource::Ephemeral);
	pending.await.unwrap();
	assert_eq!(router.connections().len(), 1);
}
