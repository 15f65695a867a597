use futures_util::future::BoxFuture;
use serde_json::json;
use wamp_runtime::{Endpoint, TransportParts};

use super::*;

/// Provider that must never be reached.
struct NoTransport;

impl TransportProvider for NoTransport {
	fn connect(&self, endpoint: &Endpoint) -> BoxFuture<'_, Result<TransportParts>> {
		let endpoint = endpoint.url();
		Box::pin(async move { Err(Error::Transport(format!("unexpected connect to {endpoint}"))) })
	}
}

fn manager() -> ClientSessionManager {
	ClientSessionManager::builder(ClientConfig::new("realm1", "127.0.0.1", 8080), Arc::new(NoTransport))
		.build()
		.unwrap()
}

#[test]
fn build_rejects_invalid_config() {
	let result = ClientSessionManager::builder(ClientConfig::new("realm1", "", 8080), Arc::new(NoTransport)).build();
	assert!(matches!(result, Err(Error::Configuration(_))));
}

#[tokio::test]
async fn empty_topic_fails_synchronously() {
	let err = manager().publish("", &json!(["hi"]), &Value::Null, PublishOptions::new()).unwrap_err();
	assert!(matches!(err, Error::InvalidArgument(_)));

	let err = manager().call("  ", &json!([1])).unwrap_err();
	assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn non_object_kwargs_fail_synchronously() {
	let err = manager()
		.publish("chat.message", &json!(["hi"]), &json!([1, 2]), PublishOptions::new())
		.unwrap_err();
	assert!(matches!(err, Error::InvalidArgument(_)));

	let err = manager()
		.call_with("add", &json!([2, 3]), &"not a map", CallOptions::default())
		.unwrap_err();
	assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn missing_runtime_fails_synchronously() {
	let err = manager().call("add", &json!([2, 3])).unwrap_err();
	assert!(matches!(err, Error::Runtime(_)));
}

#[tokio::test]
async fn connect_errors_reject_the_pending() {
	let pending = manager().call("add", &json!([2, 3])).unwrap();
	assert_eq!(pending.source(), SessionSource::Ephemeral);

	let err = pending.await.unwrap_err();
	match err {
		Error::ConnectionFailed { endpoint, reason } => {
			assert_eq!(endpoint, "ws://127.0.0.1:8080");
			assert!(reason.contains("unexpected connect"));
		}
		other => panic!("Expected ConnectionFailed, got {other:?}"),
	}
}
