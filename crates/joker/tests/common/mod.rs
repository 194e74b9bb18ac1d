//! Shared fixture: a game whose players each hold an in-process client
//! queue in the game's room, in place of a WebSocket.

#![allow(dead_code)]

use std::sync::Arc;

use joker::{DisconnectEvent, DisconnectOutcome, GameController};
use joker_game::{GameRules, MemoryStore, Player, Question, QuestionLevel, Store};
use joker_protocol::{GameCode, PlayerId};
use joker_room::{Client, ClientId, OutboundReceiver, RoomHandle, RoomRegistry};
use serde_json::Value;

pub struct Session {
    pub controller: Arc<GameController<MemoryStore>>,
    pub code: GameCode,
    pub players: Vec<Player>,
    pub question: Question,
    inboxes: Vec<OutboundReceiver>,
    clients: Vec<ClientId>,
}

/// A waiting game with one player per name, in join order, each connected.
pub async fn session(names: &[&str]) -> Session {
    let store = Arc::new(MemoryStore::new());
    let question = store
        .create_question(QuestionLevel::Spicy, "Biggest lie you ever told?")
        .unwrap();
    let registry = Arc::new(RoomRegistry::new());
    let controller = Arc::new(GameController::new(
        store,
        registry,
        GameRules::default(),
    ));

    let game = controller.create_game().await.unwrap();
    let mut players = Vec::new();
    for name in names {
        players.push(controller.join_game(&game.code, name).await.unwrap());
    }

    let mut session = Session {
        controller,
        code: game.code,
        players: Vec::new(),
        question,
        inboxes: Vec::new(),
        clients: Vec::new(),
    };
    for player in players {
        session.connect(player).await;
    }
    session
}

impl Session {
    pub async fn room(&self) -> RoomHandle {
        self.controller
            .registry()
            .get_room(&self.code)
            .await
            .expect("room exists")
    }

    pub fn id(&self, seat: usize) -> PlayerId {
        self.players[seat].id
    }

    pub fn client(&self, seat: usize) -> ClientId {
        self.clients[seat]
    }

    /// Adds `player` as the next seat and attaches a client for it.
    pub async fn connect(&mut self, player: Player) {
        let (client, inbox) = Client::new(player.id);
        self.clients.push(client.id());
        self.room().await.join(client).await.unwrap();
        self.players.push(player);
        self.inboxes.push(inbox);
    }

    /// Waits until the room has processed every command queued so far.
    pub async fn settle(&self) {
        if let Some(room) = self.controller.registry().get_room(&self.code).await {
            let _ = room.info().await;
        }
    }

    /// Every event delivered to `seat` so far.
    pub async fn events(&mut self, seat: usize) -> Vec<Value> {
        self.settle().await;
        let mut events = Vec::new();
        while let Ok(frame) = self.inboxes[seat].try_recv() {
            events.push(serde_json::from_str(&frame).unwrap());
        }
        events
    }

    /// Discards everything delivered so far.
    pub async fn clear(&mut self) {
        for seat in 0..self.inboxes.len() {
            self.events(seat).await;
        }
    }

    /// Closes `seat`'s client the way the socket teardown does: leave the
    /// room, then report the disconnect.
    pub async fn drop_socket(&mut self, seat: usize) -> DisconnectOutcome {
        self.room()
            .await
            .leave(self.id(seat), self.client(seat))
            .await
            .unwrap();
        self.disconnect(seat).await
    }

    pub async fn disconnect(&self, seat: usize) -> DisconnectOutcome {
        self.controller
            .handle_disconnect(self.event(seat))
            .await
            .unwrap()
    }

    pub fn event(&self, seat: usize) -> DisconnectEvent {
        DisconnectEvent {
            game_code: self.code.clone(),
            player_id: self.id(seat),
        }
    }

    /// Starts the game as the first seat (the host).
    pub async fn start(&mut self) {
        self.controller
            .start_game(&self.code, self.id(0))
            .await
            .unwrap();
    }
}

pub fn kinds(events: &[Value]) -> Vec<&str> {
    events
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect()
}

pub fn json_id<T: serde::Serialize>(id: T) -> Value {
    serde_json::to_value(id).unwrap()
}
