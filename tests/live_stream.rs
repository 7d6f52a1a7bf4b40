//! End-to-end: issue a token, ingest over HTTP, receive over WebSocket.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use prost::Message as _;
use tokio_tungstenite::tungstenite::Message;

use trackstar_live::api;
use trackstar_live::app_state::AppState;
use trackstar_live::auth::TokenAuthority;
use trackstar_live::domain::{SubscriberRegistry, Token, TrackUpdate};
use trackstar_live::persistence::{SqliteStore, TrackStore};
use trackstar_live::service::TrackService;
use trackstar_live::ws::messages::LiveUpdateMessage;

const KEY: &str = "secret";
const WAIT: Duration = Duration::from_secs(5);

struct Server {
    addr: SocketAddr,
    service: Arc<TrackService>,
    client: reqwest::Client,
}

impl Server {
    async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("binding test listener");
        let addr = listener.local_addr().expect("local addr");

        let store = SqliteStore::connect("sqlite::memory:", 1)
            .await
            .expect("opening in-memory database");
        let service = Arc::new(TrackService::new(
            Arc::new(TokenAuthority::new(&format!("http://{addr}"), KEY)),
            Arc::new(store) as Arc<dyn TrackStore>,
            Arc::new(SubscriberRegistry::new(16)),
        ));
        let app = api::build_app(AppState {
            track_service: Arc::clone(&service),
        });
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serving");
        });

        Self {
            addr,
            service,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn issue(&self, user_id: &str) -> Token {
        let response = self
            .client
            .post(self.url("/_issue"))
            .header("x-extension-jwt", KEY)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(format!("user_id={user_id}"))
            .send()
            .await
            .expect("issuing token");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let bytes = response.bytes().await.expect("token body");
        Token::decode(bytes.as_ref()).expect("token is protobuf")
    }

    async fn post_update(
        &self,
        token: &Token,
        user_id: &str,
        started: i64,
        update: &TrackUpdate,
    ) -> reqwest::StatusCode {
        self.client
            .post(self.url(&format!("/_trackUpdate/{user_id}/{started}")))
            .header("x-extension-jwt", token.raw_token.as_str())
            .header("content-type", "application/protobuf")
            .body(update.encode_to_vec())
            .send()
            .await
            .expect("posting update")
            .status()
    }

    async fn wait_for_subscribers(&self, user_id: &str, expected: usize) {
        let subscribers = self.service.subscribers();
        tokio::time::timeout(WAIT, async {
            while subscribers.subscriber_count(user_id) != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("subscriber count never settled");
    }
}

#[tokio::test]
async fn viewer_receives_ingested_update() {
    let server = Server::start().await;
    let token = server.issue("alice").await;

    let (mut viewer, _) = tokio_tungstenite::connect_async(format!("ws://{}/_sub/alice", server.addr))
        .await
        .expect("connecting viewer");
    server.wait_for_subscribers("alice", 1).await;

    let update = TrackUpdate::new("d1", "A", "B", 1_000_005, 0);
    let status = server.post_update(&token, "alice", 1_000_000, &update).await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let frame = tokio::time::timeout(WAIT, viewer.next())
        .await
        .expect("viewer timed out")
        .expect("stream ended")
        .expect("websocket error");
    let Message::Text(text) = frame else {
        panic!("expected a text frame, got {frame:?}");
    };
    let pushed: LiveUpdateMessage = serde_json::from_str(text.as_str()).expect("frame is json");
    assert_eq!(pushed.user_id, "alice");
    assert_eq!(pushed.started, 1_000_000);
    assert_eq!(pushed.update.track.map(|t| t.artist), Some("A".to_string()));

    let sessions: serde_json::Value = server
        .client
        .get(server.url("/_trackUpdate/alice"))
        .send()
        .await
        .expect("listing sessions")
        .json()
        .await
        .expect("sessions json");
    assert_eq!(sessions, serde_json::json!({"sessions": [1_000_000]}));
}

#[tokio::test]
async fn duplicate_resubmission_is_tolerated() {
    let server = Server::start().await;
    let token = server.issue("alice").await;
    let update = TrackUpdate::new("d1", "A", "B", 1_000_005, 0);

    let first = server.post_update(&token, "alice", 1_000_000, &update).await;
    let retry = server.post_update(&token, "alice", 1_000_000, &update).await;
    assert_eq!(first, reqwest::StatusCode::OK);
    assert_eq!(retry, reqwest::StatusCode::INSUFFICIENT_STORAGE);

    let session: serde_json::Value = server
        .client
        .get(server.url("/_trackUpdate/alice/1000000"))
        .send()
        .await
        .expect("reading session")
        .json()
        .await
        .expect("session json");
    assert_eq!(session["updates"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn viewers_only_see_their_user() {
    let server = Server::start().await;
    let alice = server.issue("alice").await;
    let bob = server.issue("bob").await;

    let (mut bob_viewer, _) = tokio_tungstenite::connect_async(format!("ws://{}/_sub/bob", server.addr))
        .await
        .expect("connecting viewer");
    server.wait_for_subscribers("bob", 1).await;

    let alice_update = TrackUpdate::new("d1", "Alice Artist", "x", 10, 0);
    let bob_update = TrackUpdate::new("d1", "Bob Artist", "y", 20, 0);
    assert_eq!(
        server.post_update(&alice, "alice", 1, &alice_update).await,
        reqwest::StatusCode::OK
    );
    assert_eq!(
        server.post_update(&bob, "bob", 2, &bob_update).await,
        reqwest::StatusCode::OK
    );

    let frame = tokio::time::timeout(WAIT, bob_viewer.next())
        .await
        .expect("viewer timed out")
        .expect("stream ended")
        .expect("websocket error");
    let pushed: LiveUpdateMessage =
        serde_json::from_str(frame.to_text().expect("text frame")).expect("frame is json");
    assert_eq!(pushed.user_id, "bob");
    assert_eq!(pushed.started, 2);
}

#[tokio::test]
async fn disconnect_deregisters_viewer() {
    let server = Server::start().await;

    let (mut viewer, _) = tokio_tungstenite::connect_async(format!("ws://{}/_sub/alice", server.addr))
        .await
        .expect("connecting viewer");
    server.wait_for_subscribers("alice", 1).await;

    viewer.close(None).await.expect("closing viewer");
    server.wait_for_subscribers("alice", 0).await;
}

#[tokio::test]
async fn registry_shutdown_closes_viewers() {
    let server = Server::start().await;

    let (mut viewer, _) = tokio_tungstenite::connect_async(format!("ws://{}/_sub/alice", server.addr))
        .await
        .expect("connecting viewer");
    server.wait_for_subscribers("alice", 1).await;

    server.service.subscribers().shutdown();

    let next = tokio::time::timeout(WAIT, viewer.next())
        .await
        .expect("viewer timed out");
    match next {
        None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
        Some(Ok(other)) => panic!("expected the stream to close, got {other:?}"),
    }
}
