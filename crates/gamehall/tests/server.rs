//! Integration tests for the gamehall server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gamehall::prelude::*;
use gamehall_protocol::PlayerView;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const WAIT: Duration = Duration::from_secs(2);

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(GamehallServer::builder()).await
}

async fn start_server_with(builder: GamehallServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// A connected client that already consumed its `connected` greeting.
struct Client {
    ws: ClientWs,
    id: ConnectionId,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        let mut client = Self {
            ws,
            id: ConnectionId::new(0),
        };
        match client.next().await {
            ServerEvent::Connected { id } => client.id = id,
            other => panic!("expected connected, got {other:?}"),
        }
        client
    }

    async fn emit(&mut self, event: serde_json::Value) {
        self.ws
            .send(Message::Text(event.to_string().into()))
            .await
            .expect("send");
    }

    async fn join(&mut self, room: &str, name: &str) {
        self.emit(json!({"event": "join", "data": {"roomId": room, "name": name}}))
            .await;
    }

    /// Next server event, failing the test if none arrives in time.
    async fn next(&mut self) -> ServerEvent {
        loop {
            let msg = tokio::time::timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .expect("recv");
            match msg {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("decode event");
                }
                Message::Binary(bytes) => {
                    return serde_json::from_slice(&bytes).expect("decode event");
                }
                _ => continue,
            }
        }
    }

    /// Skips events until one matches.
    async fn until(&mut self, mut want: impl FnMut(&ServerEvent) -> bool) -> ServerEvent {
        loop {
            let event = self.next().await;
            if want(&event) {
                return event;
            }
        }
    }

    /// Skips frames until one carries `event`, returning its raw JSON.
    async fn until_raw(&mut self, event: &str) -> serde_json::Value {
        loop {
            let msg = tokio::time::timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .expect("recv");
            if let Message::Text(text) = msg {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).expect("json");
                if value["event"] == event {
                    return value;
                }
            }
        }
    }

    /// Waits for a roster of exactly `names`.
    async fn roster(&mut self, names: &[&str]) -> (RoomStatus, Vec<PlayerView>) {
        let event = self
            .until(|e| match e {
                ServerEvent::RoomUpdate { players, .. } => {
                    players.iter().map(|p| p.name.as_str()).eq(names.iter().copied())
                }
                _ => false,
            })
            .await;
        match event {
            ServerEvent::RoomUpdate { status, players } => (status, players),
            _ => unreachable!(),
        }
    }

    /// Asserts nothing but `roomUpdate`s arrive within a short window.
    async fn expect_quiet(&mut self) {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(150);
        loop {
            match tokio::time::timeout_at(deadline, self.ws.next()).await {
                Err(_) => return,
                Ok(Some(Ok(Message::Text(text)))) => {
                    let event: ServerEvent = serde_json::from_str(text.as_str()).expect("decode");
                    assert!(
                        matches!(event, ServerEvent::RoomUpdate { .. }),
                        "unexpected event {event:?}"
                    );
                }
                Ok(_) => return,
            }
        }
    }
}

fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connected_greeting_carries_distinct_ids() {
    let addr = start_server().await;
    let a = Client::connect(&addr).await;
    let b = Client::connect(&addr).await;
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_frames_are_json_text() {
    let addr = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    let msg = ws.next().await.unwrap().unwrap();
    let Message::Text(text) = msg else {
        panic!("expected a text frame, got {msg:?}");
    };
    let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
    assert_eq!(value["event"], "connected");
    assert!(value["data"]["id"].is_u64());
}

#[tokio::test]
async fn test_join_broadcasts_roster_in_join_order() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;

    alice.join("r1", "Alice").await;
    let (status, players) = alice.roster(&["Alice"]).await;
    assert_eq!(status, RoomStatus::Waiting);
    assert_eq!(players[0].id, alice.id);

    bob.join("r1", "Bob").await;
    let (_, players) = alice.roster(&["Alice", "Bob"]).await;
    assert_eq!(players[1].id, bob.id);
    bob.roster(&["Alice", "Bob"]).await;
}

#[tokio::test]
async fn test_fifth_player_gets_room_full() {
    let addr = start_server().await;
    let mut players = Vec::new();
    for name in ["A", "B", "C", "D"] {
        let mut client = Client::connect(&addr).await;
        client.join("full", name).await;
        client.until(|e| matches!(e, ServerEvent::RoomUpdate { .. })).await;
        players.push(client);
    }
    players[0].roster(&["A", "B", "C", "D"]).await;

    let mut late = Client::connect(&addr).await;
    late.join("full", "E").await;
    assert_eq!(late.next().await, ServerEvent::RoomFull {});

    // The room is unchanged and the late client is not a member.
    players[0]
        .emit(json!({"event": "playerChoice", "data": {"roomId": "full", "choice": 1}}))
        .await;
    players[0].until(|e| matches!(e, ServerEvent::PlayerChoice { .. })).await;
    late.expect_quiet().await;
}

#[tokio::test]
async fn test_room_capacity_follows_config() {
    let config = RoomConfig {
        max_players: 2,
        ..RoomConfig::default()
    };
    let addr = start_server_with(GamehallServer::builder().room_config(config)).await;

    let mut a = Client::connect(&addr).await;
    let mut b = Client::connect(&addr).await;
    let mut c = Client::connect(&addr).await;
    a.join("pair", "A").await;
    a.roster(&["A"]).await;
    b.join("pair", "B").await;
    b.roster(&["A", "B"]).await;

    c.join("pair", "C").await;
    assert_eq!(c.next().await, ServerEvent::RoomFull {});
}

#[tokio::test]
async fn test_start_game_by_creator() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("r1", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("r1", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;

    alice.emit(json!({"event": "startGame", "data": {"roomId": "r1"}})).await;

    for client in [&mut alice, &mut bob] {
        client.until(|e| *e == ServerEvent::GameStarted {}).await;
        let (status, _) = client.roster(&["Alice", "Bob"]).await;
        assert_eq!(status, RoomStatus::Playing);
    }
}

#[tokio::test]
async fn test_start_game_rejections_go_to_requester_only() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;

    alice.join("r1", "Alice").await;
    alice.roster(&["Alice"]).await;
    alice.emit(json!({"event": "startGame", "data": {"roomId": "r1"}})).await;
    assert_eq!(
        alice.next().await,
        ServerEvent::Error {
            message: "at least 2 players are needed to start".into()
        }
    );

    bob.join("r1", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;
    bob.emit(json!({"event": "startGame", "data": {"roomId": "r1"}})).await;
    let event = bob.until(|e| matches!(e, ServerEvent::Error { .. })).await;
    assert_eq!(
        event,
        ServerEvent::Error {
            message: "only the room creator can start the game".into()
        }
    );
    alice.expect_quiet().await;
}

#[tokio::test]
async fn test_player_choice_relayed_to_all_with_sender_id() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("r1", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("r1", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;

    // A spoofed playerId is ignored.
    bob.emit(json!({
        "event": "playerChoice",
        "data": {"roomId": "r1", "playerId": 999, "choice": {"card": "rock"}}
    }))
    .await;

    let expected = ServerEvent::PlayerChoice {
        player_id: bob.id,
        choice: json!({"card": "rock"}),
    };
    for client in [&mut alice, &mut bob] {
        let got = client.until(|e| matches!(e, ServerEvent::PlayerChoice { .. })).await;
        assert_eq!(got, expected);
    }
}

#[tokio::test]
async fn test_td_events_are_relayed() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("td", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("td", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;

    alice
        .emit(json!({"event": "td_toggle", "data": {"roomId": "td", "enabled": true}}))
        .await;
    assert_eq!(
        bob.until(|e| e.name() == "td_toggle").await,
        ServerEvent::TdToggle(object(json!({"enabled": true})))
    );

    alice
        .emit(json!({
            "event": "td_challenge",
            "data": {"roomId": "td", "loserId": bob.id, "winnerId": alice.id, "text": "truth?"}
        }))
        .await;
    assert_eq!(
        bob.until(|e| e.name() == "td_challenge").await,
        ServerEvent::TdChallenge(object(
            json!({"loserId": bob.id, "winnerId": alice.id, "text": "truth?"})
        ))
    );

    bob.emit(json!({
        "event": "td_response",
        "data": {"roomId": "td", "loserId": bob.id, "response": "fine"}
    }))
    .await;
    assert_eq!(
        alice.until(|e| e.name() == "td_response").await,
        ServerEvent::TdResponse(object(json!({"loserId": bob.id, "response": "fine"})))
    );

    bob.emit(json!({"event": "td_complete", "data": {"roomId": "td"}}))
        .await;
    assert_eq!(
        alice.until(|e| e.name() == "td_complete").await,
        ServerEvent::TdComplete(serde_json::Map::new())
    );
}

#[tokio::test]
async fn test_td_payload_fields_arrive_unchanged() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("td", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("td", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;

    alice
        .emit(json!({
            "event": "td_challenge",
            "data": {
                "roomId": "td",
                "loserId": "socket-b",
                "winnerId": "socket-a",
                "text": "truth?",
                "category": "spicy"
            }
        }))
        .await;

    let raw = bob.until_raw("td_challenge").await;
    assert_eq!(
        raw,
        json!({
            "event": "td_challenge",
            "data": {
                "loserId": "socket-b",
                "winnerId": "socket-a",
                "text": "truth?",
                "category": "spicy"
            }
        })
    );

    bob.emit(json!({
        "event": "td_choice",
        "data": {"roomId": "td", "choice": "dare", "playerId": "spoofed"}
    }))
    .await;
    assert_eq!(
        alice.until(|e| e.name() == "td_choice").await,
        ServerEvent::TdChoice(object(json!({"choice": "dare", "playerId": bob.id})))
    );
}

#[tokio::test]
async fn test_disconnect_updates_remaining_players() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("r1", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("r1", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;
    alice.emit(json!({"event": "startGame", "data": {"roomId": "r1"}})).await;
    bob.until(|e| *e == ServerEvent::GameStarted {}).await;

    alice.ws.close(None).await.expect("close");

    let (status, players) = bob.roster(&["Bob"]).await;
    assert_eq!(status, RoomStatus::Waiting);
    assert_eq!(players[0].id, bob.id);

    // Bob is now first on the roster and holds start authority.
    let mut cara = Client::connect(&addr).await;
    cara.join("r1", "Cara").await;
    cara.roster(&["Bob", "Cara"]).await;
    bob.emit(json!({"event": "startGame", "data": {"roomId": "r1"}})).await;
    cara.until(|e| *e == ServerEvent::GameStarted {}).await;
}

#[tokio::test]
async fn test_emptied_room_is_recreated_fresh() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    alice.join("solo", "Alice").await;
    alice.roster(&["Alice"]).await;
    drop(alice);

    let mut bob = Client::connect(&addr).await;
    bob.join("solo", "Bob").await;
    // Alice's entry is gone and Bob is the new creator.
    let (status, players) = bob.roster(&["Bob"]).await;
    assert_eq!(status, RoomStatus::Waiting);
    assert_eq!(players.len(), 1);
}

#[tokio::test]
async fn test_garbage_frames_are_ignored() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice.ws.send(Message::Text("not json".into())).await.unwrap();
    alice.emit(json!({"event": "fly", "data": {}})).await;
    alice.emit(json!({"event": "join", "data": {}})).await;
    alice.ws.send(Message::Binary(vec![0xff, 0x00].into())).await.unwrap();

    // The connection still works.
    alice.join("r1", "Alice").await;
    alice.roster(&["Alice"]).await;
}

#[tokio::test]
async fn test_events_for_unknown_room_are_dropped() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice.emit(json!({"event": "startGame", "data": {"roomId": "ghost"}})).await;
    alice
        .emit(json!({"event": "playerChoice", "data": {"roomId": "ghost", "choice": 1}}))
        .await;
    alice.expect_quiet().await;
}

#[tokio::test]
async fn test_switching_rooms_leaves_the_old_one() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;
    let mut bob = Client::connect(&addr).await;
    alice.join("one", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.join("one", "Bob").await;
    bob.roster(&["Alice", "Bob"]).await;

    alice.join("two", "Alice").await;
    alice.roster(&["Alice"]).await;
    bob.roster(&["Bob"]).await;

    // Relays in "one" no longer reach Alice.
    bob.emit(json!({"event": "playerChoice", "data": {"roomId": "one", "choice": 2}}))
        .await;
    bob.until(|e| matches!(e, ServerEvent::PlayerChoice { .. })).await;
    alice.expect_quiet().await;
}

#[tokio::test]
async fn test_idle_connection_is_disconnected() {
    let addr = start_server_with(
        GamehallServer::builder().idle_timeout(Duration::from_millis(400)),
    )
    .await;
    let mut idle = Client::connect(&addr).await;
    idle.join("r1", "Idle").await;
    idle.roster(&["Idle"]).await;

    let mut watcher = Client::connect(&addr).await;
    watcher.join("r1", "Watcher").await;
    watcher.roster(&["Idle", "Watcher"]).await;

    // Watcher keeps talking; Idle stays silent and gets dropped.
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        watcher
            .emit(json!({"event": "td_toggle", "data": {"roomId": "r1", "enabled": false}}))
            .await;
    }
    let (_, players) = watcher.roster(&["Watcher"]).await;
    assert_eq!(players[0].id, watcher.id);
}
