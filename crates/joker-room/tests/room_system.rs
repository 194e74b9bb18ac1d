//! Integration tests for rooms and the registry using in-process clients.

use std::time::Duration;

use joker_protocol::{
    GameCode, GameEnded, NoPayload, PlayerId, PlayerRef, ServerEvent,
};
use joker_room::{Client, Frame, OutboundReceiver, RoomError, RoomRegistry};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::timeout;

// =========================================================================
// Helpers
// =========================================================================

fn code(raw: &str) -> GameCode {
    GameCode::parse(raw).unwrap()
}

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

/// Waits for the next frame and decodes it.
async fn next_event(rx: &mut OutboundReceiver) -> ServerEvent {
    let frame = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("queue closed");
    serde_json::from_str(&frame).unwrap()
}

/// Waits until the queue reports closed.
async fn expect_closed(rx: &mut OutboundReceiver) {
    let next = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for the queue to close");
    assert!(next.is_none(), "expected a closed queue, got {next:?}");
}

fn offline(id: u64) -> ServerEvent {
    ServerEvent::PlayerOffline(PlayerRef {
        id: pid(id),
        nickname: format!("p{id}"),
    })
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_get_room_after_create_observes_room() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let found = registry.get_room(&code("AAAAAA")).await.unwrap();
    assert_eq!(found.code(), room.code());
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test]
async fn test_get_room_unknown_code_is_none() {
    let registry = RoomRegistry::new();
    assert!(registry.get_room(&code("ZZZZZZ")).await.is_none());
}

#[tokio::test]
async fn test_create_room_replaces_and_shuts_down_old_room() {
    let registry = RoomRegistry::new();
    let old = registry.create_room(code("AAAAAA")).await;
    let (client, mut rx) = Client::new(pid(1));
    old.join(client).await.unwrap();

    let new = registry.create_room(code("AAAAAA")).await;

    // The old room dropped its client queues on shutdown.
    expect_closed(&mut rx).await;
    assert!(new.info().await.unwrap().player_ids.is_empty());
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test]
async fn test_delete_room_removes_and_stops_room() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (client, mut rx) = Client::new(pid(1));
    room.join(client).await.unwrap();

    assert!(registry.delete_room(&code("AAAAAA")).await);
    assert!(registry.get_room(&code("AAAAAA")).await.is_none());
    expect_closed(&mut rx).await;

    let err = room.info().await.unwrap_err();
    assert!(matches!(err, RoomError::Unavailable(_)));
}

#[tokio::test]
async fn test_delete_room_unknown_code_returns_false() {
    let registry = RoomRegistry::new();
    assert!(!registry.delete_room(&code("ZZZZZZ")).await);
}

#[tokio::test]
async fn test_get_or_create_reuses_existing_room() {
    let registry = RoomRegistry::new();
    let created = registry.create_room(code("AAAAAA")).await;
    let (client, _rx) = Client::new(pid(1));
    created.join(client).await.unwrap();

    let fetched = registry.get_or_create(&code("AAAAAA")).await;
    assert!(fetched.info().await.unwrap().is_connected(pid(1)));
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test]
async fn test_get_or_create_concurrent_first_connections_share_room() {
    let registry = std::sync::Arc::new(RoomRegistry::new());
    let mut tasks = Vec::new();
    for id in 1..=8 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let room = registry.get_or_create(&code("RACE01")).await;
            let (client, rx) = Client::new(pid(id));
            room.join(client).await.unwrap();
            rx
        }));
    }
    let mut receivers = Vec::new();
    for task in tasks {
        receivers.push(task.await.unwrap());
    }

    assert_eq!(registry.room_count().await, 1);
    let room = registry.get_room(&code("RACE01")).await.unwrap();
    assert_eq!(room.info().await.unwrap().client_count(), 8);
}

// =========================================================================
// Room membership and fan-out
// =========================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_client() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (a, mut rx_a) = Client::new(pid(1));
    let (b, mut rx_b) = Client::new(pid(2));
    room.join(a).await.unwrap();
    room.join(b).await.unwrap();

    room.broadcast(&ServerEvent::AnswerTime(NoPayload {}))
        .await
        .unwrap();

    assert_eq!(next_event(&mut rx_a).await.kind(), "answer_time");
    assert_eq!(next_event(&mut rx_b).await.kind(), "answer_time");
}

#[tokio::test]
async fn test_broadcast_preserves_order() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (a, mut rx) = Client::new(pid(1));
    room.join(a).await.unwrap();

    for id in 1..=5 {
        room.broadcast(&offline(id)).await.unwrap();
    }
    for id in 1..=5 {
        assert_eq!(next_event(&mut rx).await, offline(id));
    }
}

#[tokio::test]
async fn test_broadcast_frames_are_shared_text() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AB12CD")).await;
    let (a, mut rx) = Client::new(pid(1));
    room.join(a).await.unwrap();

    room.broadcast(&ServerEvent::GameEnded(GameEnded {
        game_code: code("AB12CD"),
    }))
    .await
    .unwrap();

    let frame: Frame = timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        &*frame,
        r#"{"type":"game_ended","data":{"gameCode":"AB12CD"}}"#
    );
}

#[tokio::test]
async fn test_send_to_reaches_only_target() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (a, mut rx_a) = Client::new(pid(1));
    let (b, mut rx_b) = Client::new(pid(2));
    room.join(a).await.unwrap();
    room.join(b).await.unwrap();

    room.send_to(pid(2), &offline(9)).await.unwrap();

    assert_eq!(next_event(&mut rx_b).await, offline(9));
    // Info is processed after the unicast, so nothing is still in flight.
    room.info().await.unwrap();
    assert!(matches!(rx_a.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_send_to_absent_player_is_dropped_not_buffered() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;

    room.send_to(pid(7), &offline(7)).await.unwrap();

    let (late, mut rx) = Client::new(pid(7));
    room.join(late).await.unwrap();
    room.info().await.unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_leave_stops_delivery() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (a, mut rx) = Client::new(pid(1));
    let client_id = a.id();
    room.join(a).await.unwrap();

    room.leave(pid(1), client_id).await.unwrap();

    // The room dropped the client, so its queue is closed.
    expect_closed(&mut rx).await;
    assert!(room.info().await.unwrap().player_ids.is_empty());
}

#[tokio::test]
async fn test_new_client_supersedes_previous_for_same_player() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (first, mut rx_first) = Client::new(pid(1));
    let (second, mut rx_second) = Client::new(pid(1));
    room.join(first).await.unwrap();
    room.join(second).await.unwrap();

    expect_closed(&mut rx_first).await;

    room.broadcast(&offline(1)).await.unwrap();
    assert_eq!(next_event(&mut rx_second).await, offline(1));

    let info = room.info().await.unwrap();
    assert_eq!(info.player_ids, vec![pid(1)]);
}

#[tokio::test]
async fn test_stale_leave_does_not_remove_successor() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (first, _rx_first) = Client::new(pid(1));
    let stale_id = first.id();
    let (second, mut rx_second) = Client::new(pid(1));
    room.join(first).await.unwrap();
    room.join(second).await.unwrap();

    room.leave(pid(1), stale_id).await.unwrap();

    assert!(room.info().await.unwrap().is_connected(pid(1)));
    room.send_to(pid(1), &offline(1)).await.unwrap();
    assert_eq!(next_event(&mut rx_second).await, offline(1));
}

#[tokio::test]
async fn test_info_lists_connected_players_sorted() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let mut receivers = Vec::new();
    for id in [3, 1, 2] {
        let (client, rx) = Client::new(pid(id));
        room.join(client).await.unwrap();
        receivers.push(rx);
    }

    let info = room.info().await.unwrap();
    assert_eq!(info.code, code("AAAAAA"));
    assert_eq!(info.player_ids, vec![pid(1), pid(2), pid(3)]);
    assert_eq!(info.client_count(), 3);
}

#[tokio::test]
async fn test_broadcast_skips_client_whose_writer_is_gone() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    let (gone, rx_gone) = Client::new(pid(1));
    let (alive, mut rx_alive) = Client::new(pid(2));
    room.join(gone).await.unwrap();
    room.join(alive).await.unwrap();
    drop(rx_gone);

    room.broadcast(&offline(1)).await.unwrap();
    assert_eq!(next_event(&mut rx_alive).await, offline(1));
}

#[tokio::test]
async fn test_commands_after_shutdown_fail_unavailable() {
    let registry = RoomRegistry::new();
    let room = registry.create_room(code("AAAAAA")).await;
    room.shutdown().await.unwrap();

    // Give the actor a moment to drop its receiver.
    timeout(Duration::from_secs(1), async {
        while !room.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let (client, _rx) = Client::new(pid(1));
    assert!(matches!(
        room.join(client).await,
        Err(RoomError::Unavailable(_))
    ));
}
