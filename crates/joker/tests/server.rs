//! End-to-end tests: real sockets against a running server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use joker::prelude::*;
use serde_json::Value;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address and
/// controller.
async fn start_server() -> (String, Arc<GameController<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    store
        .create_question(QuestionLevel::Normal, "Worst haircut you ever had?")
        .unwrap();
    let server = JokerServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(store)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let controller = server.controller();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    (addr, controller)
}

async fn connect(addr: &str, path: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("should connect");
    ws
}

/// Connects as `player_id` and waits until the room lists the socket.
async fn join_socket(
    addr: &str,
    controller: &GameController<MemoryStore>,
    code: &GameCode,
    player_id: PlayerId,
) -> ClientWs {
    let ws = connect(addr, &format!("/ws/games/{code}?player_id={}", player_id.0)).await;
    timeout(Duration::from_secs(2), async {
        loop {
            if let Some(room) = controller.registry().get_room(code).await {
                if room.info().await.is_ok_and(|info| info.is_connected(player_id)) {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("socket was not attached");
    ws
}

/// The next text frame, decoded.
async fn next_event(ws: &mut ClientWs) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("read failed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("valid json");
        }
    }
}

/// Asserts that the server closes the socket without sending events.
async fn expect_closed(ws: &mut ClientWs) {
    let ended = timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(Message::Text(text))) => {
                    panic!("unexpected event {}", text.as_str())
                }
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "socket was not closed");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connected_players_receive_broadcasts() {
    let (addr, controller) = start_server().await;
    let game = controller.create_game().await.unwrap();
    let mut players = Vec::new();
    for name in ["ann", "ben", "cat"] {
        players.push(controller.join_game(&game.code, name).await.unwrap());
    }

    let mut sockets = Vec::new();
    for player in &players {
        sockets.push(join_socket(&addr, &controller, &game.code, player.id).await);
    }

    let round = controller
        .start_game(&game.code, players[0].id)
        .await
        .unwrap();
    for ws in &mut sockets {
        let event = next_event(ws).await;
        assert_eq!(event["type"], "game_started");
        assert_eq!(event["data"]["roundId"], round.id.0);
        assert_eq!(event["data"]["answererId"], players[1].id.0);
    }

    let question = controller.random_questions(1).unwrap().remove(0);
    controller
        .submit_question(&game.code, round.id, question.id, players[0].id)
        .await
        .unwrap();
    assert_eq!(next_event(&mut sockets[0]).await["type"], "answer_time");
    assert_eq!(next_event(&mut sockets[1]).await["type"], "answer_time");
    let private = next_event(&mut sockets[1]).await;
    assert_eq!(private["type"], "round_question");
    assert_eq!(private["data"]["content"], "Worst haircut you ever had?");
}

#[tokio::test]
async fn test_unknown_route_is_closed() {
    let (addr, _controller) = start_server().await;
    let mut ws = connect(&addr, "/lobby").await;
    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn test_unknown_game_or_player_is_closed() {
    let (addr, controller) = start_server().await;
    let game = controller.create_game().await.unwrap();
    controller.join_game(&game.code, "ann").await.unwrap();

    let mut ws = connect(&addr, "/ws/games/ZZZZZZ?player_id=1").await;
    expect_closed(&mut ws).await;

    let mut ws = connect(&addr, &format!("/ws/games/{}?player_id=9999", game.code)).await;
    expect_closed(&mut ws).await;

    let mut ws = connect(&addr, &format!("/ws/games/{}", game.code)).await;
    expect_closed(&mut ws).await;
}

#[tokio::test]
async fn test_closing_socket_in_lobby_removes_player() {
    let (addr, controller) = start_server().await;
    let game = controller.create_game().await.unwrap();
    let ann = controller.join_game(&game.code, "ann").await.unwrap();
    let ben = controller.join_game(&game.code, "ben").await.unwrap();

    let mut ann_ws = join_socket(&addr, &controller, &game.code, ann.id).await;
    let mut ben_ws = join_socket(&addr, &controller, &game.code, ben.id).await;
    ben_ws.close(None).await.unwrap();

    let event = next_event(&mut ann_ws).await;
    assert_eq!(event["type"], "player_left");
    assert_eq!(event["data"]["nickname"], "ben");

    let players = controller.players(&game.code).unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].id, ann.id);
}

#[tokio::test]
async fn test_offline_player_comes_back_online() {
    let (addr, controller) = start_server().await;
    let game = controller.create_game().await.unwrap();
    let mut players = Vec::new();
    for name in ["ann", "ben", "cat", "dan"] {
        players.push(controller.join_game(&game.code, name).await.unwrap());
    }
    let mut ann_ws = join_socket(&addr, &controller, &game.code, players[0].id).await;
    let mut dan_ws = join_socket(&addr, &controller, &game.code, players[3].id).await;
    controller
        .start_game(&game.code, players[0].id)
        .await
        .unwrap();
    assert_eq!(next_event(&mut ann_ws).await["type"], "game_started");

    dan_ws.close(None).await.unwrap();
    let event = next_event(&mut ann_ws).await;
    assert_eq!(event["type"], "player_offline");
    assert_eq!(event["data"]["nickname"], "dan");

    let _dan_ws = join_socket(&addr, &controller, &game.code, players[3].id).await;
    let dan = controller
        .players(&game.code)
        .unwrap()
        .into_iter()
        .find(|p| p.id == players[3].id)
        .unwrap();
    assert_eq!(dan.status, PlayerStatus::Online);
}
