//! Integration tests for the game client against a scripted WebSocket
//! server.
//!
//! Each test binds a real server on a random local port, lets the client
//! dial it, and plays the server's side of the conversation frame by
//! frame.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use sketchwire::prelude::*;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

// =========================================================================
// Scripted server helpers
// =========================================================================

async fn bind_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr");
    (listener, format!("ws://{addr}"))
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client should dial")
        .expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake should succeed")
}

/// Next JSON frame from the client, or `None` once it closed.
async fn recv_json(ws: &mut ServerWs) -> Option<Value> {
    loop {
        let frame = timeout(WAIT, ws.next()).await.expect("client should talk");
        match frame {
            Some(Ok(WsMessage::Text(text))) => {
                return Some(serde_json::from_str(text.as_str()).unwrap());
            }
            Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn send_json(ws: &mut ServerWs, value: Value) {
    ws.send(WsMessage::Text(value.to_string().into()))
        .await
        .expect("server send should succeed");
}

/// Waits for the first event matching `pred`, skipping the rest.
async fn wait_for(
    events: &mut ClientEvents,
    pred: impl Fn(&ClientEvent) -> bool,
) -> ClientEvent {
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event stream should stay open");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("expected event should arrive")
}

fn connect(url: &str) -> (GameClient, ClientEvents) {
    GameClient::builder()
        .server_url(url)
        .participant_name("ada")
        .room_name("lobby")
        .client_id(ClientId::new("c-ada"))
        .session_config(SessionConfig {
            reconnect_interval: Duration::from_millis(50),
            ..Default::default()
        })
        .connect()
        .expect("config is valid")
}

/// Accepts the client and consumes its join handshake.
async fn accept_joined(listener: &TcpListener) -> ServerWs {
    let mut ws = accept(listener).await;
    let handshake = recv_json(&mut ws).await.expect("handshake frame");
    assert_eq!(handshake["type"], "TYPE_JOIN_ROOM_HANDSHAKE");
    ws
}

/// Makes `drawer` the drawing participant of an active round.
async fn start_round(ws: &mut ServerWs, events: &mut ClientEvents, drawer: &str) {
    send_json(
        ws,
        json!({
            "type": "TYPE_GAME_STATE",
            "drawingPlayerName": drawer,
            "drawingPlayerClientId": drawer,
            "wordToGuess": "apple",
        }),
    )
    .await;
    send_json(
        ws,
        json!({
            "type": "TYPE_GAME_PHASE_UPDATE",
            "gamePhase": "ROUND_IN_PROGRESS",
            "countdownTimerMillis": 60000,
        }),
    )
    .await;
    wait_for(events, |e| {
        matches!(e, ClientEvent::PhaseChanged { transition, .. } if transition.to == Phase::RoundActive)
    })
    .await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_client_sends_join_handshake_on_open() {
    let (listener, url) = bind_server().await;
    let (_client, mut events) = connect(&url);

    let mut ws = accept(&listener).await;
    let handshake = recv_json(&mut ws).await.unwrap();

    assert_eq!(handshake["type"], "TYPE_JOIN_ROOM_HANDSHAKE");
    assert_eq!(handshake["playerName"], "ada");
    assert_eq!(handshake["roomName"], "lobby");
    assert_eq!(handshake["clientId"], "c-ada");
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;
}

#[tokio::test]
async fn test_client_answers_keep_alive_with_own_name() {
    let (listener, url) = bind_server().await;
    let (_client, _events) = connect(&url);
    let mut ws = accept_joined(&listener).await;

    send_json(&mut ws, json!({"type": "TYPE_PING"})).await;

    let reply = recv_json(&mut ws).await.unwrap();
    assert_eq!(reply, json!({"type": "TYPE_PING", "playerName": "ada"}));
}

#[tokio::test]
async fn test_client_rejoins_after_server_drop() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let first = accept_joined(&listener).await;

    drop(first);
    wait_for(&mut events, |e| matches!(e, ClientEvent::ConnectionLost { .. })).await;

    let mut second = accept(&listener).await;
    let handshake = recv_json(&mut second).await.unwrap();
    assert_eq!(handshake["type"], "TYPE_JOIN_ROOM_HANDSHAKE");
    assert_eq!(handshake["clientId"], "c-ada");
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_frames_before_drop_are_applied_before_connection_loss() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;

    send_json(
        &mut ws,
        json!({
            "type": "TYPE_GAME_PHASE_UPDATE",
            "gamePhase": "ROUND_IN_PROGRESS",
            "countdownTimerMillis": 30000,
        }),
    )
    .await;
    ws.send(WsMessage::Close(None)).await.unwrap();
    drop(ws);

    let mut seen = Vec::new();
    timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event stream should stay open");
            let lost = matches!(event, ClientEvent::ConnectionLost { .. });
            seen.push(event);
            if lost {
                break;
            }
        }
    })
    .await
    .expect("connection loss should be reported");

    assert!(seen.iter().any(|e| matches!(
        e,
        ClientEvent::PhaseChanged { transition, .. } if transition.to == Phase::RoundActive
    )));
    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, Phase::Initial);
    assert_eq!(snapshot.countdown_millis, None);
    assert!(!snapshot.flags.chat_enabled);
}

#[tokio::test]
async fn test_game_error_is_terminal() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;

    send_json(
        &mut ws,
        json!({"type": "TYPE_GAME_ERROR", "errorType": 1}),
    )
    .await;

    let event = wait_for(&mut events, |e| {
        matches!(e, ClientEvent::ApplicationError(_))
    })
    .await;
    assert!(matches!(
        event,
        ClientEvent::ApplicationError(ErrorEvent {
            kind: ErrorKind::RoomNotFound,
            ..
        })
    ));
    wait_for(&mut events, |e| *e == ClientEvent::Stopped).await;

    // The client hangs up and never dials again.
    assert_eq!(recv_json(&mut ws).await, None);
    assert!(matches!(client.snapshot().await, Err(ClientError::Closed)));
    assert!(
        timeout(Duration::from_millis(300), listener.accept())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_non_drawing_participant_cannot_draw() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;
    client.resize(1000.0, 1000.0).await.unwrap();

    start_round(&mut ws, &mut events, "c-bob").await;

    let err = client
        .pointer(DevicePoint::new(100.0, 100.0), StrokePhase::Down)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Game(GameError::NotDrawingParticipant)
    ));
    assert!(matches!(
        client.undo().await,
        Err(ClientError::Game(GameError::NotDrawingParticipant))
    ));
}

#[tokio::test]
async fn test_drawing_participant_strokes_reach_server() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;
    client.resize(1000.0, 500.0).await.unwrap();
    start_round(&mut ws, &mut events, "c-ada").await;

    client
        .pointer(DevicePoint::new(100.0, 100.0), StrokePhase::Down)
        .await
        .unwrap();
    client
        .pointer(DevicePoint::new(500.0, 250.0), StrokePhase::Up)
        .await
        .unwrap();

    let down = recv_json(&mut ws).await.unwrap();
    assert_eq!(down["type"], "TYPE_DRAW_DATA");
    assert_eq!(down["motionEvent"], "ACTION_DOWN");
    assert_eq!(down["roomName"], "lobby");
    assert!((down["toX"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    assert!((down["toY"].as_f64().unwrap() - 0.2).abs() < 1e-6);

    let up = recv_json(&mut ws).await.unwrap();
    assert_eq!(up["motionEvent"], "ACTION_UP");

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.strokes.len(), 1);
    assert!(snapshot.can_draw);
}

#[tokio::test]
async fn test_round_history_rebuilds_canvas_for_late_joiner() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;

    let point = |phase: &str, x: f32| {
        json!({
            "type": "TYPE_DRAW_DATA",
            "roomName": "lobby",
            "color": -16777216,
            "thickness": 12.0,
            "fromX": x,
            "fromY": x,
            "toX": x,
            "toY": x,
            "motionEvent": phase,
        })
        .to_string()
    };
    send_json(
        &mut ws,
        json!({
            "type": "TYPE_CUR_ROUND_DRAW_DATA",
            "data": [
                point("ACTION_DOWN", 0.1),
                point("ACTION_MOVE", 0.4),
                point("ACTION_UP", 0.4),
                point("ACTION_DOWN", 0.6),
                point("ACTION_UP", 0.6),
                json!({"type": "TYPE_DRAW_ACTION", "action": "UNDO"}).to_string(),
            ],
        }),
    )
    .await;
    wait_for(&mut events, |e| *e == ClientEvent::CanvasChanged).await;

    let snapshot = client.snapshot().await.unwrap();
    assert_eq!(snapshot.strokes.len(), 1);
    assert!(snapshot.current_stroke.is_none());
}

#[tokio::test]
async fn test_chat_reaches_server_and_blank_chat_is_rejected() {
    let (listener, url) = bind_server().await;
    let (client, _events) = connect(&url);
    let mut ws = accept_joined(&listener).await;

    assert!(matches!(
        client.chat("   ").await,
        Err(ClientError::Game(GameError::EmptyChatMessage))
    ));
    client.chat("is it a cat?").await.unwrap();

    let chat = recv_json(&mut ws).await.unwrap();
    assert_eq!(chat["type"], "TYPE_CHAT_MESSAGE");
    assert_eq!(chat["message"], "is it a cat?");
    assert_eq!(chat["fromPlayerName"], "ada");
}

#[tokio::test]
async fn test_pick_word_sends_choice() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;

    send_json(
        &mut ws,
        json!({"type": "TYPE_WORDS_TO_PICK_HOLDER", "words": ["apple", "pear"]}),
    )
    .await;
    wait_for(&mut events, |e| matches!(e, ClientEvent::WordsOffered(_))).await;

    client.pick_word("pear").await.unwrap();

    let pick = recv_json(&mut ws).await.unwrap();
    assert_eq!(pick["type"], "TYPE_SET_WORD_TO_GUESS");
    assert_eq!(pick["wordToGuess"], "pear");
    assert_eq!(pick["roomName"], "lobby");
}

#[tokio::test]
async fn test_leave_sends_disconnect_request_and_stops() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;

    client.leave().await.unwrap();

    let farewell = recv_json(&mut ws).await.unwrap();
    assert_eq!(farewell["type"], "TYPE_DISCONNECT_REQUEST");
    assert_eq!(farewell["isPermanentDisconnect"], true);
    wait_for(&mut events, |e| *e == ClientEvent::Stopped).await;
    assert!(matches!(client.chat("hi").await, Err(ClientError::Closed)));
}

#[tokio::test]
async fn test_builder_rejects_blank_participant_name() {
    let result = GameClient::builder()
        .server_url("ws://127.0.0.1:9")
        .room_name("lobby")
        .connect();
    assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_suspend_sends_temporary_disconnect_and_resume_rejoins() {
    let (listener, url) = bind_server().await;
    let (client, mut events) = connect(&url);
    let mut ws = accept_joined(&listener).await;
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;

    client.suspend().await.unwrap();

    let farewell = recv_json(&mut ws).await.unwrap();
    assert_eq!(
        farewell,
        json!({"type": "TYPE_DISCONNECT_REQUEST", "isPermanentDisconnect": false})
    );
    assert_eq!(recv_json(&mut ws).await, None);
    wait_for(&mut events, |e| matches!(e, ClientEvent::ConnectionLost { .. })).await;
    assert!(client.is_suspended());
    assert!(matches!(
        client.chat("still there?").await,
        Err(ClientError::Transport(TransportError::NotConnected))
    ));
    // No redial while suspended, well past the reconnect interval.
    assert!(
        timeout(Duration::from_millis(300), listener.accept())
            .await
            .is_err()
    );

    client.resume().await.unwrap();

    let mut second = accept(&listener).await;
    let handshake = recv_json(&mut second).await.unwrap();
    assert_eq!(handshake["type"], "TYPE_JOIN_ROOM_HANDSHAKE");
    assert_eq!(handshake["clientId"], "c-ada");
    wait_for(&mut events, |e| *e == ClientEvent::Connected).await;
    assert!(!client.is_suspended());
    client.chat("back").await.unwrap();
    let chat = recv_json(&mut second).await.unwrap();
    assert_eq!(chat["message"], "back");
}
