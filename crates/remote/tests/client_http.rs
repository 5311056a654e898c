//! HTTP-level tests for `RemoteAgentClient` against a local wiremock server.

use std::time::Duration;

use af_domain::config::RemoteConfig;
use af_domain::{Credentials, Error};
use af_remote::{
    AgentApi, CreateSessionRequest, RemoteAgentClient, SendMessageRequest, NO_RESPONSE_TEXT,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn creds(server: &MockServer) -> Credentials {
    Credentials {
        base_url: server.uri(),
        api_url: server.uri(),
        agent_id: "agent-1".into(),
        client_id: "cid".into(),
        client_secret: "csecret".into(),
        client_email: "bot@example.com".into(),
    }
}

fn client() -> RemoteAgentClient {
    RemoteAgentClient::from_config(&RemoteConfig::default()).unwrap()
}

fn message_req<'a>(api_url: &'a str, seq: u64, text: &'a str) -> SendMessageRequest<'a> {
    SendMessageRequest {
        api_url,
        remote_session_id: "sess-1",
        access_token: "tok-1",
        sequence_id: seq,
        text,
        correlation_id: "corr-1",
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Token exchange
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn token_exchange_posts_client_credentials_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(header("x-correlation-id", "corr-1"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=cid"))
        .and(body_string_contains("client_secret=csecret"))
        .and(body_string_contains("client_email=bot%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "instance_url": "https://org.example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let grant = client()
        .exchange_token(&creds(&server), "corr-1")
        .await
        .unwrap();
    assert_eq!(grant.access_token, "tok-1");
    assert_eq!(grant.instance_url, "https://org.example.com");
}

#[tokio::test]
async fn token_exchange_non_2xx_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client()
        .exchange_token(&creds(&server), "corr-1")
        .await
        .unwrap_err();
    match err {
        Error::Auth(msg) => {
            assert!(msg.contains("HTTP 400"));
            assert!(msg.contains("invalid_client"));
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn token_exchange_timeout_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({ "access_token": "t", "instance_url": "u" })),
        )
        .mount(&server)
        .await;

    let cfg = RemoteConfig {
        token_timeout_secs: 1,
        ..RemoteConfig::default()
    };
    let client = RemoteAgentClient::from_config(&cfg).unwrap();
    let err = client.exchange_token(&creds(&server), "c").await.unwrap_err();
    match err {
        Error::Auth(msg) => assert!(msg.contains("timed out after 1s"), "{msg}"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session creation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn create_session_sends_bearer_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/agents/agent-1/sessions"))
        .and(header("authorization", "Bearer tok-1"))
        .and(header("x-correlation-id", "corr-1"))
        .and(body_partial_json(json!({
            "instanceConfig": { "endpoint": "https://org.example.com" },
            "streamingCapabilities": { "chunkTypes": ["Text"] },
            "bypassUser": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessionId": "sess-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let session = client()
        .create_remote_session(CreateSessionRequest {
            api_url: &uri,
            agent_id: "agent-1",
            access_token: "tok-1",
            instance_url: "https://org.example.com",
            correlation_id: "corr-1",
        })
        .await
        .unwrap();
    assert_eq!(session.remote_session_id, "sess-1");
}

#[tokio::test]
async fn create_session_401_is_session_error_not_token_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/agents/agent-1/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = client()
        .create_remote_session(CreateSessionRequest {
            api_url: &uri,
            agent_id: "agent-1",
            access_token: "stale",
            instance_url: "https://org.example.com",
            correlation_id: "corr-1",
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Session(_)), "{err:?}");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message send
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn send_message_extracts_first_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/sessions/sess-1/messages"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({
            "message": { "sequenceId": 4, "type": "Text", "text": "hello" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{ "type": "Inform", "message": "hi there" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let reply = client()
        .send_remote_message(message_req(&uri, 4, "hello"))
        .await
        .unwrap();
    assert_eq!(reply.text, "hi there");
}

#[tokio::test]
async fn send_message_without_messages_uses_fallback_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": [] })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let reply = client()
        .send_remote_message(message_req(&uri, 1, "hello"))
        .await
        .unwrap();
    assert_eq!(reply.text, NO_RESPONSE_TEXT);
}

#[tokio::test]
async fn send_message_401_is_token_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Session expired or invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = client()
        .send_remote_message(message_req(&uri, 1, "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TokenExpired(_)), "{err:?}");
}

#[tokio::test]
async fn send_message_500_is_message_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/einstein/ai-agent/v1/sessions/sess-1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let err = client()
        .send_remote_message(message_req(&uri, 1, "hello"))
        .await
        .unwrap_err();
    match err {
        Error::Message(msg) => assert!(msg.contains("HTTP 500") && msg.contains("boom")),
        other => panic!("expected Message error, got {other:?}"),
    }
}
