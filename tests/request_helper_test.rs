mod common;

use common::{client, MockTransport};
use pipefy_flow::{PipefyError, TransportError};
use serde_json::json;

#[tokio::test]
async fn success_is_wrapped_under_data_and_additional_data() {
    let transport = MockTransport::new();
    transport.respond(json!({ "pipe": { "id": "1" } }));

    let response = client(&transport).request("{ pipe(id: 1) { id } }").await.unwrap();

    assert_eq!(response.data, json!({ "pipe": { "id": "1" } }));
    assert_eq!(response.additional_data, response.data);
    assert_eq!(response.get("/pipe/id"), Some(&json!("1")));
    assert_eq!(transport.tokens(), vec!["test-token"]);
    assert_eq!(transport.queries(), vec!["{ pipe(id: 1) { id } }"]);
}

#[tokio::test]
async fn success_false_becomes_remote_error() {
    let transport = MockTransport::new();
    transport.respond(json!({ "success": false, "error": "E", "error_info": "I" }));

    let err = client(&transport).request("{ me { id } }").await.unwrap_err();

    assert!(matches!(err, PipefyError::Remote { .. }));
    let message = err.to_string();
    assert!(message.contains('E'));
    assert!(message.contains('I'));
}

#[tokio::test]
async fn http_401_is_invalid_credentials_regardless_of_body() {
    for body in [None, Some(json!({ "error": "Unauthorized", "error_info": "token expired" }))] {
        let transport = MockTransport::new();
        transport.fail(TransportError::Http { status: 401, body });

        let err = client(&transport).request("{ me { id } }").await.unwrap_err();
        assert!(matches!(err, PipefyError::InvalidCredentials));
        assert_eq!(err.to_string(), "The Pipefy credentials are not valid!");
    }
}

#[tokio::test]
async fn structured_error_body_is_formatted() {
    let transport = MockTransport::new();
    transport.fail(TransportError::Http {
        status: 400,
        body: Some(json!({ "error": "Bad request" })),
    });

    let err = client(&transport).request("mutation { x }").await.unwrap_err();
    match err {
        PipefyError::Formatted { status, ref message, ref detail } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Bad request");
            assert!(detail.is_none());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn other_failures_pass_through_unchanged() {
    let transport = MockTransport::new();
    transport.fail(TransportError::GraphQl(vec!["Field 'nope' doesn't exist".to_string()]));

    let err = client(&transport).request("{ nope }").await.unwrap_err();
    match err {
        PipefyError::Transport(TransportError::GraphQl(messages)) => {
            assert_eq!(messages, vec!["Field 'nope' doesn't exist"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
